use std::sync::Arc;

use crate::error::{Result, ScriptError};
use crate::variable::normalize_name;

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// Arguments handed to a function for one `name(...)` call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionArgs<'a> {
    /// Normalized name the function was registered under.
    pub name: &'a str,
    /// Text between the parentheses split on every `,`.
    pub args: Vec<&'a str>,
    /// Text between the parentheses, unsplit, for functions that take
    /// structured arguments containing commas.
    pub raw: &'a str,
}

impl<'a> FunctionArgs<'a> {
    pub fn new(name: &'a str, raw: &'a str) -> Self {
        Self {
            name,
            args: raw.split(',').collect(),
            raw,
        }
    }

    /// The `index`-th argument with surrounding whitespace trimmed.
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(|s| s.trim())
    }
}

/// Implement this trait to add a built-in macro function.
///
/// The return value is spliced in place of the whole `name(...)` span.
/// Reject malformed arguments with [`ScriptError::FunctionArgument`].
///
/// [`ScriptError::FunctionArgument`]: crate::error::ScriptError::FunctionArgument
pub trait MacroFunction: Send + Sync {
    fn call(&self, args: &FunctionArgs<'_>) -> Result<String>;
}

impl<F> MacroFunction for F
where
    F: Fn(&FunctionArgs<'_>) -> Result<String> + Send + Sync,
{
    fn call(&self, args: &FunctionArgs<'_>) -> Result<String> {
        self(args)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered name → function table. The order is the order in which the
/// function strategy exhausts each name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    entries: Vec<(String, Arc<dyn MacroFunction>)>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_all(&mut registry);
        registry
    }

    /// Register under the normalized form of `name`. Re-registering a name
    /// replaces the function but keeps its position.
    pub fn register<F: MacroFunction + 'static>(&mut self, name: &str, func: F) {
        let name = normalize_name(name);
        let func: Arc<dyn MacroFunction> = Arc::new(func);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = func,
            None => self.entries.push((name, func)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MacroFunction>> {
        let name = normalize_name(name);
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn MacroFunction>)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Format as an integer when there is no fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Parse a finite number; `NaN` and infinities are rejected.
pub(crate) fn parse_number(function: &str, s: &str) -> Result<f64> {
    let s = s.trim();
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ScriptError::argument(function, format!("'{}' is not a valid number", s))),
    }
}

// ---------------------------------------------------------------------------
// Built-in modules
// ---------------------------------------------------------------------------

pub mod color;  // hsltorgb
pub mod points; // multpointdefinition
pub mod random; // random, randomint

/// Register every built-in with the registry.
pub fn register_all(registry: &mut FunctionRegistry) {
    random::register(registry);
    color::register(registry);
    points::register(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_normalizes_and_keeps_order() {
        let mut registry = FunctionRegistry::new();
        registry.register("B", |_: &FunctionArgs<'_>| -> Result<String> { Ok("b".into()) });
        registry.register(" A ", |_: &FunctionArgs<'_>| -> Result<String> { Ok("a".into()) });
        registry.register("b", |_: &FunctionArgs<'_>| -> Result<String> { Ok("b2".into()) });

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        let args = FunctionArgs::new("b", "");
        assert_eq!(registry.get("B").unwrap().call(&args).unwrap(), "b2");
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn args_split_on_every_comma() {
        let args = FunctionArgs::new("f", "[1,2], 3");
        assert_eq!(args.args, vec!["[1", "2]", " 3"]);
        assert_eq!(args.arg(2), Some("3"));
        assert_eq!(args.raw, "[1,2], 3");
    }

    #[test]
    fn builtins_are_registered() {
        let registry = FunctionRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["random", "randomint", "hsltorgb", "multpointdefinition"]);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-2.5), "-2.5");
    }

    #[test]
    fn numbers_must_be_finite() {
        assert_eq!(parse_number("f", " 1e3 ").unwrap(), 1000.0);
        for bad in ["NaN", "inf", "-infinity", "1e400", "x"] {
            assert!(parse_number("f", bad).is_err(), "{bad} was accepted");
        }
    }
}
