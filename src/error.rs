use std::fmt;

use thiserror::Error;

/// The resolution strategy that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Variables,
    Math,
    Functions,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variables => write!(f, "variables"),
            Self::Math => write!(f, "math"),
            Self::Functions => write!(f, "functions"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("unbalanced '{open}{close}' brackets in `{text}`")]
    MalformedBracket { open: char, close: char, text: String },

    #[error("error parsing math {{{expression}}}: {message}")]
    MalformedExpression { expression: String, message: String },

    #[error("{function}: {message}")]
    FunctionArgument { function: String, message: String },

    #[error("error executing internal function {function}: {source}")]
    FunctionExecution {
        function: String,
        #[source]
        source: Box<ScriptError>,
    },

    #[error("unknown variable '{name}'")]
    UnresolvedVariable { name: String },

    #[error("error implementing variable {variable}: {source}")]
    VariableSubstitution {
        variable: String,
        #[source]
        source: Box<ScriptError>,
    },

    #[error("resolution did not converge after {limit} steps (last value `{partial}`)")]
    DidNotConverge { limit: usize, partial: String },

    #[error("nested fallback exceeded depth {depth}")]
    RecursionLimit { depth: usize },

    #[error("line {index}: directive has no name")]
    EmptyName { index: usize },

    #[error("line {index} `{line}`: {message}")]
    Syntax {
        index: usize,
        line: String,
        message: String,
    },

    #[error("line {index} `{line}`: {source}")]
    Directive {
        index: usize,
        line: String,
        #[source]
        source: Box<ScriptError>,
    },
}

impl ScriptError {
    /// Shorthand used by built-in functions to reject their arguments.
    pub fn argument(function: &str, message: impl Into<String>) -> Self {
        Self::FunctionArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    /// Attach the originating line to an error.
    pub fn at_line(self, index: usize, line: &str) -> Self {
        Self::Directive {
            index,
            line: line.to_string(),
            source: Box::new(self),
        }
    }

    /// Follow wrapped sources down to the error that started it all.
    pub fn innermost(&self) -> &ScriptError {
        match self {
            Self::FunctionExecution { source, .. }
            | Self::VariableSubstitution { source, .. }
            | Self::Directive { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// Which strategy failed, if the error came out of resolution.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::MalformedBracket { open: '{', .. } | Self::MalformedExpression { .. } => {
                Some(Strategy::Math)
            }
            Self::MalformedBracket { .. }
            | Self::FunctionArgument { .. }
            | Self::FunctionExecution { .. } => Some(Strategy::Functions),
            Self::UnresolvedVariable { .. } | Self::VariableSubstitution { .. } => {
                Some(Strategy::Variables)
            }
            Self::Directive { source, .. } => source.strategy(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_unwraps_every_layer() {
        let err = ScriptError::FunctionExecution {
            function: "double".into(),
            source: Box::new(ScriptError::argument("double", "'x' is not a number")),
        }
        .at_line(4, "position:double(x)");

        assert!(matches!(
            err.innermost(),
            ScriptError::FunctionArgument { function, .. } if function == "double"
        ));
        assert_eq!(err.strategy(), Some(Strategy::Functions));
    }

    #[test]
    fn bracket_strategy_follows_delimiter() {
        let math = ScriptError::MalformedBracket { open: '{', close: '}', text: "{1+".into() };
        let call = ScriptError::MalformedBracket { open: '(', close: ')', text: "f(".into() };
        assert_eq!(math.strategy(), Some(Strategy::Math));
        assert_eq!(call.strategy(), Some(Strategy::Functions));
    }

    #[test]
    fn display_carries_line_context() {
        let err = ScriptError::UnresolvedVariable { name: "speed".into() }.at_line(7, "njs:speed");
        assert_eq!(err.to_string(), "line 7 `njs:speed`: unknown variable 'speed'");
    }
}
