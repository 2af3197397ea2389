use tracing::{debug, trace, warn};

use crate::error::{Result, ScriptError};
use crate::functions::FunctionRegistry;
use crate::scope::Scope;
use crate::strategy::{self, Rewrite};

/// Limits and error mode for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Full variable/math/function passes before giving up.
    pub max_passes: usize,
    /// Replacements of a single name within one strategy call.
    pub max_expansions: usize,
    /// Nesting depth for the narrowing fallback.
    pub max_depth: usize,
    /// Return the partially resolved string instead of failing.
    pub lenient: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_passes: 256,
            max_expansions: 4096,
            max_depth: 32,
            lenient: false,
        }
    }
}

impl ResolverConfig {
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }
}

/// Drives a string to its fixed point under variable substitution, math
/// evaluation and function invocation.
#[derive(Debug, Clone)]
pub struct Resolver {
    functions: FunctionRegistry,
    config: ResolverConfig,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(FunctionRegistry::with_builtins())
    }
}

impl Resolver {
    pub fn new(functions: FunctionRegistry) -> Self {
        Self {
            functions,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// Resolve `input` using the configured error mode.
    pub fn resolve(&self, input: &str, scope: &Scope<'_>) -> Result<String> {
        self.resolve_with(input, scope, self.config.lenient)
    }

    /// Resolve `input`, overriding the configured error mode.
    ///
    /// Every pass runs all three strategies. A failing strategy leaves the
    /// string untouched and its error pending; any later change clears it.
    /// Once a pass changes nothing, a pending error is returned unless
    /// `lenient` is set.
    pub fn resolve_with(&self, input: &str, scope: &Scope<'_>, lenient: bool) -> Result<String> {
        let config = &self.config;
        let mut current = input.to_string();
        let mut pending: Option<ScriptError> = None;

        for pass in 0..config.max_passes {
            let previous = current.clone();

            let step = strategy::substitute_variables(&current, scope, config);
            apply(step, &mut current, &mut pending);
            let step = strategy::evaluate_math(&current, config, 0);
            apply(step, &mut current, &mut pending);
            let step = strategy::invoke_functions(&current, &self.functions, config, 0);
            apply(step, &mut current, &mut pending);

            if current == previous {
                trace!(pass, output = %current, "resolution reached a fixed point");
                return match pending {
                    Some(error) if !lenient => Err(error),
                    Some(error) => {
                        warn!(%error, output = %current, "returning partially resolved value");
                        Ok(current)
                    }
                    None => Ok(current),
                };
            }
            debug!(pass, output = %current, "resolution pass changed value");
        }

        Err(ScriptError::DidNotConverge {
            limit: config.max_passes,
            partial: current,
        })
    }
}

fn apply(step: Result<Rewrite>, current: &mut String, pending: &mut Option<ScriptError>) {
    match step {
        Ok(rewrite) if rewrite.changed => {
            *current = rewrite.output;
            *pending = None;
        }
        Ok(_) => {}
        Err(error) => *pending = Some(error),
    }
}
