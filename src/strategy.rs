//! The three rewrite strategies driven by [`Resolver`](crate::resolver::Resolver).
//!
//! Each one is a pure function from a string to a [`Rewrite`]. The math and
//! function strategies share a recovery rule: when a span fails before any
//! edit was made, the text inside the span is tried on its own and, if that
//! makes progress, re-wrapped in the original delimiters.

use tracing::debug;

use crate::bracket::{contains_unescaped, find_call, focus_call, focus_first, BracketSpan};
use crate::error::{Result, ScriptError};
use crate::expression::eval_expression;
use crate::functions::{FunctionArgs, FunctionRegistry};
use crate::resolver::ResolverConfig;
use crate::scope::Scope;

/// Output of one strategy application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub changed: bool,
    pub output: String,
}

impl Rewrite {
    fn compare(input: &str, output: String) -> Self {
        Self {
            changed: input != output,
            output,
        }
    }

    fn partial(output: &str) -> Self {
        Self {
            changed: true,
            output: output.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Replace every literal occurrence of each variable's name with its data,
/// in scope order (locals first).
///
/// A name missing from the text is simply skipped.
pub fn substitute_variables(
    input: &str,
    scope: &Scope<'_>,
    config: &ResolverConfig,
) -> Result<Rewrite> {
    let mut s = input.to_string();
    for var in scope.iter() {
        if var.name.is_empty() {
            continue;
        }
        let data = var.data_or_empty();
        let mut expansions = 0usize;
        while s.contains(var.name.as_str()) {
            expansions += 1;
            if expansions > config.max_expansions {
                return Err(ScriptError::VariableSubstitution {
                    variable: var.name.clone(),
                    source: Box::new(ScriptError::DidNotConverge {
                        limit: config.max_expansions,
                        partial: s,
                    }),
                });
            }
            s = s.replacen(var.name.as_str(), data, 1);
        }
    }
    Ok(Rewrite::compare(input, s))
}

// ---------------------------------------------------------------------------
// Math
// ---------------------------------------------------------------------------

/// Evaluate `{...}` spans left to right, replacing each with its value.
pub fn evaluate_math(input: &str, config: &ResolverConfig, depth: usize) -> Result<Rewrite> {
    if depth > config.max_depth {
        return Err(ScriptError::RecursionLimit {
            depth: config.max_depth,
        });
    }

    let mut s = input.to_string();
    let mut steps = 0usize;
    while contains_unescaped(&s, '{') {
        steps += 1;
        if steps > config.max_expansions {
            let error = ScriptError::DidNotConverge {
                limit: config.max_expansions,
                partial: s.clone(),
            };
            return recover_math(input, &s, None, error, config, depth);
        }
        let next = match focus_first(&s, '{', '}') {
            Ok(span) => match eval_expression(span.inside) {
                Ok(value) => span.splice(&value),
                Err(error) => return recover_math(input, &s, Some(span), error, config, depth),
            },
            Err(error) => return recover_math(input, &s, None, error, config, depth),
        };
        s = next;
    }

    Ok(Rewrite::compare(input, s))
}

fn recover_math(
    input: &str,
    current: &str,
    span: Option<BracketSpan<'_>>,
    error: ScriptError,
    config: &ResolverConfig,
    depth: usize,
) -> Result<Rewrite> {
    if current != input {
        debug!(%error, "math stopped early, keeping partial progress");
        return Ok(Rewrite::partial(current));
    }
    let Some(span) = span else {
        return Err(error);
    };

    match evaluate_math(span.inside, config, depth + 1) {
        Ok(inner) if inner.changed => {
            debug!(inner = %inner.output, "math resolved a nested expression");
            Ok(Rewrite::partial(&span.rewrap(&inner.output)))
        }
        Err(limit @ ScriptError::RecursionLimit { .. }) => Err(limit),
        _ => Err(error),
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Exhaust every `name(...)` call site of each registered function in
/// registry order, splicing in the function's output.
pub fn invoke_functions(
    input: &str,
    registry: &FunctionRegistry,
    config: &ResolverConfig,
    depth: usize,
) -> Result<Rewrite> {
    if depth > config.max_depth {
        return Err(ScriptError::RecursionLimit {
            depth: config.max_depth,
        });
    }

    let mut s = input.to_string();
    for (name, func) in registry.iter() {
        let mut calls = 0usize;
        while find_call(&s, name, '(').is_some() {
            calls += 1;
            if calls > config.max_expansions {
                let error = ScriptError::FunctionExecution {
                    function: name.to_string(),
                    source: Box::new(ScriptError::DidNotConverge {
                        limit: config.max_expansions,
                        partial: s.clone(),
                    }),
                };
                return recover_call(input, &s, None, error, registry, config, depth);
            }
            let next = match focus_call(&s, name, '(', ')') {
                Ok(span) => match func.call(&FunctionArgs::new(name, span.inside)) {
                    Ok(output) => span.splice(&output),
                    Err(source) => {
                        let error = ScriptError::FunctionExecution {
                            function: name.to_string(),
                            source: Box::new(source),
                        };
                        return recover_call(input, &s, Some(span), error, registry, config, depth);
                    }
                },
                Err(error) => return recover_call(input, &s, None, error, registry, config, depth),
            };
            s = next;
        }
    }

    Ok(Rewrite::compare(input, s))
}

fn recover_call(
    input: &str,
    current: &str,
    span: Option<BracketSpan<'_>>,
    error: ScriptError,
    registry: &FunctionRegistry,
    config: &ResolverConfig,
    depth: usize,
) -> Result<Rewrite> {
    if current != input {
        debug!(%error, "functions stopped early, keeping partial progress");
        return Ok(Rewrite::partial(current));
    }
    let Some(span) = span else {
        return Err(error);
    };

    match invoke_functions(span.inside, registry, config, depth + 1) {
        Ok(inner) if inner.changed => {
            debug!(inner = %inner.output, "functions resolved a nested call");
            Ok(Rewrite::partial(&span.rewrap(&inner.output)))
        }
        Err(limit @ ScriptError::RecursionLimit { .. }) => Err(limit),
        _ => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::functions::format_number;
    use crate::variable::Variable;

    fn config() -> ResolverConfig {
        ResolverConfig::default()
    }

    fn double(args: &FunctionArgs<'_>) -> Result<String> {
        let n: f64 = args
            .raw
            .trim()
            .parse()
            .map_err(|_| {
                ScriptError::argument(args.name, format!("'{}' is not a number", args.raw))
            })?;
        Ok(format_number(n * 2.0))
    }

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register("double", double);
        registry.register("join", |args: &FunctionArgs<'_>| -> Result<String> {
            Ok(args.args.iter().map(|a| a.trim()).collect::<Vec<_>>().join("-"))
        });
        registry
    }

    #[test]
    fn substitution_is_total_per_pass() {
        let globals = [Variable::new("A", "1"), Variable::new("B", "2")];
        let out = substitute_variables("A+B+A", &Scope::new(&[], &globals), &config()).unwrap();
        assert_eq!(out, Rewrite { changed: true, output: "1+2+1".into() });
    }

    #[test]
    fn substitution_without_names_is_unchanged() {
        let globals = [Variable::new("speed", "4")];
        let out = substitute_variables("[0,0,0]", &Scope::new(&[], &globals), &config()).unwrap();
        assert!(!out.changed);
        assert_eq!(out.output, "[0,0,0]");
    }

    #[test]
    fn self_referencing_variable_hits_the_expansion_limit() {
        let globals = [Variable::new("x", "x+1")];
        let cfg = ResolverConfig { max_expansions: 8, ..config() };
        let err = substitute_variables("x", &Scope::new(&[], &globals), &cfg).unwrap_err();
        match err {
            ScriptError::VariableSubstitution { variable, source } => {
                assert_eq!(variable, "x");
                assert!(matches!(*source, ScriptError::DidNotConverge { limit: 8, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn math_replaces_whole_span() {
        let out = evaluate_math("[{2+3},{10/2},0]", &config(), 0).unwrap();
        assert_eq!(out.output, "[5,5,0]");
        assert_eq!(evaluate_math("{1.5*2}", &config(), 0).unwrap().output, "3");
        assert_eq!(evaluate_math("{2 > 1}", &config(), 0).unwrap().output, "true");
    }

    #[test]
    fn math_divides_as_floats_and_knows_math_functions() {
        let out = evaluate_math("[{1/2},{Pow(2,3)},{Sin(0)}]", &config(), 0).unwrap();
        assert_eq!(out.output, "[0.5,8,0]");
    }

    #[test]
    fn math_narrows_into_nested_span() {
        let out = evaluate_math("{{2+3}*2}", &config(), 0).unwrap();
        assert_eq!(out, Rewrite { changed: true, output: "{5*2}".into() });
        assert_eq!(evaluate_math(&out.output, &config(), 0).unwrap().output, "10");
    }

    #[test]
    fn math_keeps_progress_made_before_a_failure() {
        let out = evaluate_math("{1+1} {nope+}", &config(), 0).unwrap();
        assert_eq!(out.output, "2 {nope+}");
    }

    #[test]
    fn math_reports_unbalanced_and_invalid_spans() {
        let err = evaluate_math("{2+", &config(), 0).unwrap_err();
        assert!(matches!(err, ScriptError::MalformedBracket { open: '{', .. }));

        let err = evaluate_math("{nope+}", &config(), 0).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MalformedExpression { ref expression, .. } if expression == "nope+"
        ));
    }

    #[test]
    fn math_depth_is_capped() {
        let cfg = ResolverConfig { max_depth: 0, ..config() };
        let err = evaluate_math("{{2+3}*2}", &cfg, 0).unwrap_err();
        assert!(matches!(err, ScriptError::RecursionLimit { depth: 0 }));
    }

    #[test]
    fn escaped_braces_are_not_math() {
        let out = evaluate_math(r"\{literal}", &config(), 0).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn functions_splice_their_output() {
        let out = invoke_functions("[double(2),Double( 4 ),0]", &registry(), &config(), 0).unwrap();
        assert_eq!(out.output, "[4,8,0]");
        assert_eq!(
            invoke_functions("join(a, b ,c)", &registry(), &config(), 0).unwrap().output,
            "a-b-c"
        );
    }

    #[test]
    fn unknown_names_are_left_alone() {
        let out = invoke_functions("triple(2)", &registry(), &config(), 0).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn functions_fall_back_to_nested_call() {
        let out = invoke_functions("double(double(2))", &registry(), &config(), 0).unwrap();
        assert_eq!(out.output, "double(4)");
    }

    #[test]
    fn bad_arguments_raise_function_execution() {
        let err = invoke_functions("double(x)", &registry(), &config(), 0).unwrap_err();
        match err {
            ScriptError::FunctionExecution { function, source } => {
                assert_eq!(function, "double");
                assert!(matches!(*source, ScriptError::FunctionArgument { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unclosed_call_is_malformed() {
        let err = invoke_functions("double(2", &registry(), &config(), 0).unwrap_err();
        assert!(matches!(err, ScriptError::MalformedBracket { open: '(', .. }));
    }
}
