use crate::directive::{Directive, ResolvePolicy};
use crate::error::{Result, ScriptError};
use crate::resolver::Resolver;
use crate::variable::Variable;

/// Variables visible to one resolution: a directive's locals, then globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    locals: &'a [Variable],
    globals: &'a [Variable],
}

impl<'a> Scope<'a> {
    pub fn new(locals: &'a [Variable], globals: &'a [Variable]) -> Self {
        Self { locals, globals }
    }

    pub fn locals(&self) -> &'a [Variable] {
        self.locals
    }

    pub fn globals(&self) -> &'a [Variable] {
        self.globals
    }

    /// Locals first, so they shadow globals of the same name.
    pub fn iter(&self) -> impl Iterator<Item = &'a Variable> + 'a {
        self.locals.iter().chain(self.globals.iter())
    }

    pub fn get(&self, name: &str) -> Option<&'a Variable> {
        self.iter().find(|v| v.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&'a Variable> {
        self.get(name).ok_or_else(|| ScriptError::UnresolvedVariable {
            name: name.to_string(),
        })
    }
}

/// The global variable table of one document build.
///
/// Each entry only sees the entries defined before it, so a definition can
/// never resolve against itself.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    entries: Vec<Directive>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name`, resolving `data` now against the earlier entries.
    /// Redefining a name replaces it in place.
    pub fn define(
        &mut self,
        name: &str,
        data: &str,
        policy: ResolvePolicy,
        index: usize,
        resolver: &Resolver,
    ) -> Result<()> {
        let position = self.entries.iter().position(|d| d.name() == name);
        let visible = self.snapshot_prefix(position.unwrap_or(self.entries.len()), resolver)?;
        let container = Directive::container(name, data, policy, index, resolver, &visible)?;
        match position {
            Some(at) => self.entries[at] = container,
            None => self.entries.push(container),
        }
        Ok(())
    }

    /// Materialize every entry's current value.
    pub fn snapshot(&self, resolver: &Resolver) -> Result<Vec<Variable>> {
        self.snapshot_prefix(self.entries.len(), resolver)
    }

    fn snapshot_prefix(&self, end: usize, resolver: &Resolver) -> Result<Vec<Variable>> {
        let mut out: Vec<Variable> = Vec::with_capacity(end);
        for entry in &self.entries[..end] {
            let data = entry.current(resolver, &out)?;
            out.push(Variable {
                name: entry.name().to_string(),
                data,
            });
        }
        Ok(out)
    }

    /// Recompute every entry whose policy asks for it.
    pub fn refresh_all(&mut self, resolver: &Resolver) -> Result<()> {
        for i in 0..self.entries.len() {
            if self.entries[i].policy() != ResolvePolicy::OnEveryRefresh {
                continue;
            }
            let visible = self.snapshot_prefix(i, resolver)?;
            self.entries[i].refresh(resolver, &visible)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.entries.iter().find(|d| d.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
