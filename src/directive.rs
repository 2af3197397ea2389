//! One `name:data` line of a script and its resolved value.

use std::cell::Cell;

use serde::Serialize;
use tracing::warn;

use crate::error::{Result, ScriptError};
use crate::resolver::Resolver;
use crate::scope::Scope;
use crate::variable::{normalize_name, strip_whitespace, Variable};

/// What a line declares, decided once from its normalized name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// `workspace:Name`
    Workspace,
    /// A line whose name starts with a digit, e.g. `0:Wall`.
    Function,
    /// Any other `name:value` line.
    Parameter,
    /// `var:Name`
    Variable,
    /// Built in code to hold an already-named variable; never parsed.
    VariableContainer,
}

impl DirectiveKind {
    pub const WORKSPACE: &'static str = "workspace";
    pub const VARIABLE: &'static str = "var";

    pub fn classify(normalized_name: &str) -> Self {
        if normalized_name.starts_with(|c: char| c.is_ascii_digit()) {
            Self::Function
        } else if normalized_name == Self::WORKSPACE {
            Self::Workspace
        } else if normalized_name == Self::VARIABLE {
            Self::Variable
        } else {
            Self::Parameter
        }
    }

    /// Kinds that open a block of parameters.
    pub fn is_header(self) -> bool {
        matches!(self, Self::Workspace | Self::Function | Self::Variable)
    }

    fn normalize_data(self, data: &str) -> String {
        match self {
            // function names are lowercase and without whitespace
            Self::Function => strip_whitespace(data).to_lowercase(),
            // variable names keep their casing
            Self::Variable => strip_whitespace(data),
            Self::Workspace | Self::Parameter | Self::VariableContainer => data.to_string(),
        }
    }
}

/// When a directive's value is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// Resolve from the normalized data on every read.
    #[default]
    OnEveryRead,
    /// Resolve at creation and again on each [`Directive::refresh`].
    OnEveryRefresh,
    /// Resolve once at creation.
    OnceAtCreation,
}

impl ResolvePolicy {
    /// Accepts `0`/`read`, `1`/`refresh`, `2`/`once`.
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_name(s).as_str() {
            "0" | "read" => Some(Self::OnEveryRead),
            "1" | "refresh" => Some(Self::OnEveryRefresh),
            "2" | "once" | "creation" => Some(Self::OnceAtCreation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Directive {
    line: String,
    index: usize,
    kind: DirectiveKind,
    raw: Variable,
    internal: Variable,
    instance: Option<Variable>,
    policy: ResolvePolicy,
    locals: Vec<Variable>,
    used: Cell<bool>,
}

impl Directive {
    /// Parse one script line. `index` is the source line number.
    pub fn parse(line: &str, index: usize) -> Result<Self> {
        let raw = Variable::split_line(line);
        let name = normalize_name(&raw.name);
        if name.is_empty() {
            return Err(ScriptError::EmptyName { index });
        }
        let kind = DirectiveKind::classify(&name);
        let internal = Variable {
            name,
            data: raw.data.as_deref().map(|d| kind.normalize_data(d)),
        };

        Ok(Self {
            line: line.to_string(),
            index,
            kind,
            raw,
            internal,
            instance: None,
            policy: ResolvePolicy::OnEveryRead,
            locals: Vec::new(),
            used: Cell::new(false),
        })
    }

    /// Build a variable container. The name is kept verbatim and `data` is
    /// resolved immediately against `globals`, whatever the policy.
    pub fn container(
        name: &str,
        data: &str,
        policy: ResolvePolicy,
        index: usize,
        resolver: &Resolver,
        globals: &[Variable],
    ) -> Result<Self> {
        let raw = Variable::new(name, data);
        let mut directive = Self {
            line: format!("{}:{}", name, data),
            index,
            kind: DirectiveKind::VariableContainer,
            internal: raw.clone(),
            raw,
            instance: None,
            policy,
            locals: Vec::new(),
            used: Cell::new(false),
        };
        directive.materialize(resolver, globals)?;
        Ok(directive)
    }

    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    /// Normalized name.
    pub fn name(&self) -> &str {
        &self.internal.name
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn raw(&self) -> &Variable {
        &self.raw
    }

    pub fn internal(&self) -> &Variable {
        &self.internal
    }

    /// Last materialized value. A parameter under
    /// [`ResolvePolicy::OnEveryRead`] holds none; a container is materialized
    /// when it is built, whatever its policy.
    pub fn instance(&self) -> Option<&Variable> {
        self.instance.as_ref()
    }

    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    pub fn locals(&self) -> &[Variable] {
        &self.locals
    }

    /// Set a directive-local variable, replacing one of the same name.
    pub fn set_local(&mut self, var: Variable) {
        match self.locals.iter_mut().find(|v| v.name == var.name) {
            Some(slot) => *slot = var,
            None => self.locals.push(var),
        }
    }

    pub fn was_used(&self) -> bool {
        self.used.get()
    }

    pub fn mark_unused(&self) {
        self.used.set(false);
    }

    /// Normalized data before any resolution. Marks the directive used.
    pub fn read_unresolved(&self) -> Option<&str> {
        self.used.set(true);
        self.internal.data.as_deref()
    }

    /// The resolved value. Marks the directive used.
    pub fn value(&self, resolver: &Resolver, globals: &[Variable]) -> Result<Option<String>> {
        self.used.set(true);
        self.current(resolver, globals)
    }

    /// The resolved value, leaving the used flag alone.
    pub fn current(&self, resolver: &Resolver, globals: &[Variable]) -> Result<Option<String>> {
        match (&self.instance, self.policy) {
            (Some(instance), ResolvePolicy::OnEveryRefresh | ResolvePolicy::OnceAtCreation) => {
                Ok(instance.data.clone())
            }
            _ => self.resolve_data(resolver, globals),
        }
    }

    /// Switch policy; anything but [`ResolvePolicy::OnEveryRead`]
    /// materializes the value now.
    pub fn set_policy(
        &mut self,
        policy: ResolvePolicy,
        resolver: &Resolver,
        globals: &[Variable],
    ) -> Result<()> {
        self.policy = policy;
        match policy {
            ResolvePolicy::OnEveryRead => self.instance = None,
            _ => self.materialize(resolver, globals)?,
        }
        Ok(())
    }

    /// Replace the normalized data, re-materializing when the policy keeps
    /// a cached value.
    pub fn set_data(
        &mut self,
        data: impl Into<String>,
        resolver: &Resolver,
        globals: &[Variable],
    ) -> Result<()> {
        self.internal.data = Some(data.into());
        let cached = self.policy != ResolvePolicy::OnEveryRead;
        if cached || self.kind == DirectiveKind::VariableContainer {
            self.materialize(resolver, globals)?;
        }
        Ok(())
    }

    /// Recompute under [`ResolvePolicy::OnEveryRefresh`]; returns whether
    /// anything was recomputed.
    pub fn refresh(&mut self, resolver: &Resolver, globals: &[Variable]) -> Result<bool> {
        if self.policy != ResolvePolicy::OnEveryRefresh {
            return Ok(false);
        }
        self.materialize(resolver, globals)?;
        Ok(true)
    }

    fn materialize(&mut self, resolver: &Resolver, globals: &[Variable]) -> Result<()> {
        let data = self.resolve_data(resolver, globals)?;
        self.instance = Some(Variable {
            name: self.internal.name.clone(),
            data,
        });
        Ok(())
    }

    fn resolve_data(&self, resolver: &Resolver, globals: &[Variable]) -> Result<Option<String>> {
        let Some(data) = self.internal.data.as_deref() else {
            return Ok(None);
        };
        resolver
            .resolve(data, &Scope::new(&self.locals, globals))
            .map(Some)
            .map_err(|e| e.at_line(self.index, &self.line))
    }
}

/// A directive nobody read before [`check_unused`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedDirective {
    pub name: String,
    pub index: usize,
}

pub fn reset_usage<'a>(directives: impl IntoIterator<Item = &'a Directive>) {
    for d in directives {
        d.mark_unused();
    }
}

/// Report every directive whose value was never read.
pub fn check_unused<'a>(
    directives: impl IntoIterator<Item = &'a Directive>,
) -> Vec<UnusedDirective> {
    directives
        .into_iter()
        .filter(|d| !d.was_used())
        .map(|d| {
            warn!(name = d.name(), line = d.index(), "parameter may be unused (misspelled?)");
            UnusedDirective {
                name: d.name().to_string(),
                index: d.index(),
            }
        })
        .collect()
}
