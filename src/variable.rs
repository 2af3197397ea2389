use std::fmt;

/// A name paired with optional string data.
///
/// Used for the literal `name:data` split of a line and as a substitution
/// target during resolution. `Clone` yields an independent copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub data: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Some(data.into()),
        }
    }

    /// A variable with a name but no data (a line without `:`).
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    /// Split a line on its first `:`.
    pub fn split_line(line: &str) -> Self {
        match line.split_once(':') {
            Some((name, data)) => Self::new(name, data),
            None => Self::bare(line),
        }
    }

    pub fn data_or_empty(&self) -> &str {
        self.data.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name:{} Data:{}", self.name, self.data_or_empty())
    }
}

/// Drop every whitespace character.
pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Case-folded, whitespace-free form used for directive and function names.
pub fn normalize_name(s: &str) -> String {
    strip_whitespace(s).to_lowercase()
}
