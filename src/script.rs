//! Grouping directives into blocks and resolving a whole script.
//!
//! ```text
//! Workspace:Default
//!
//! var:offset
//!   data:{2*2}
//!
//! 5:Wall
//!   repeat:3
//!   position:[{offset+repeat},0,0]
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::directive::{
    check_unused, reset_usage, Directive, DirectiveKind, ResolvePolicy, UnusedDirective,
};
use crate::error::{Result, ScriptError};
use crate::resolver::Resolver;
use crate::scope::{Globals, Scope};
use crate::variable::Variable;

/// Local variable holding the zero-based iteration of a `repeat` block.
pub const REPEAT: &str = "repeat";

/// A header directive and the parameter lines under it.
#[derive(Debug, Clone)]
pub struct Block {
    header: Directive,
    params: Vec<Directive>,
}

impl Block {
    pub fn new(header: Directive) -> Self {
        Self {
            header,
            params: Vec::new(),
        }
    }

    pub fn header(&self) -> &Directive {
        &self.header
    }

    pub fn kind(&self) -> DirectiveKind {
        self.header.kind()
    }

    pub fn params(&self) -> &[Directive] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [Directive] {
        &mut self.params
    }

    pub fn push(&mut self, param: Directive) {
        self.params.push(param);
    }

    /// First parameter with the given normalized name.
    pub fn param(&self, name: &str) -> Option<&Directive> {
        self.params.iter().find(|p| p.name() == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    blocks: Vec<Block>,
}

impl Script {
    /// Parse a script. Blank lines and lines starting with `#` are skipped.
    pub fn parse(source: &str) -> Result<Self> {
        let mut blocks: Vec<Block> = Vec::new();
        for (lineno, line) in source.lines().enumerate() {
            let index = lineno + 1;
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let directive = Directive::parse(line, index)?;
            if directive.kind().is_header() {
                blocks.push(Block::new(directive));
                continue;
            }
            match blocks.last_mut() {
                Some(block) => block.push(directive),
                None => {
                    return Err(ScriptError::Syntax {
                        index,
                        line: line.to_string(),
                        message: "parameter appears before any workspace, function or var".into(),
                    })
                }
            }
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }
}

/// One resolved parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: Option<String>,
}

/// A block after resolution: one record per `repeat` iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBlock {
    pub kind: DirectiveKind,
    pub index: usize,
    pub name: String,
    pub data: Option<String>,
    pub records: Vec<Vec<Field>>,
    /// Parameters nothing read while the block resolved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unused: Vec<UnusedDirective>,
}

impl ResolvedBlock {
    pub fn field(&self, record: usize, name: &str) -> Option<&str> {
        self.records
            .get(record)?
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_deref())
    }
}

/// One document-build pass: the resolver plus the globals it accumulates.
pub struct Session<'r> {
    resolver: &'r Resolver,
    globals: Globals,
}

impl<'r> Session<'r> {
    pub fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            globals: Globals::new(),
        }
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Forget every global, ready for an independent build.
    pub fn reset(&mut self) {
        self.globals.clear();
    }

    pub fn run(&mut self, script: &mut Script) -> Result<Vec<ResolvedBlock>> {
        let mut out = Vec::with_capacity(script.blocks.len());
        for block in script.blocks_mut() {
            out.push(self.run_block(block)?);
        }
        info!(blocks = out.len(), globals = self.globals.len(), "script resolved");
        Ok(out)
    }

    pub fn run_block(&mut self, block: &mut Block) -> Result<ResolvedBlock> {
        reset_usage(block.params());
        let mut resolved = match block.kind() {
            DirectiveKind::Variable => self.define_variable(block)?,
            _ => self.expand(block)?,
        };
        resolved.unused = check_unused(block.params());
        Ok(resolved)
    }

    /// Current value of a global variable.
    pub fn variable(&self, name: &str) -> Result<String> {
        let vars = self.globals.snapshot(self.resolver)?;
        let var = Scope::new(&[], &vars).require(name)?;
        Ok(var.data_or_empty().to_string())
    }

    fn define_variable(&mut self, block: &Block) -> Result<ResolvedBlock> {
        let header = block.header();
        let name = header
            .read_unresolved()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| syntax(header, "var needs a name (var:Name)"))?
            .to_string();
        let visible = self.globals.snapshot(self.resolver)?;

        let data = block.param("data").and_then(Directive::read_unresolved).unwrap_or("");
        let policy = match block.param("recompute") {
            Some(p) => {
                let value = p.value(self.resolver, &visible)?.unwrap_or_default();
                ResolvePolicy::parse(&value).ok_or_else(|| {
                    syntax(p, &format!("unknown recompute mode `{}`", value.trim()))
                })?
            }
            None => ResolvePolicy::OnceAtCreation,
        };

        self.globals
            .define(&name, data, policy, header.index(), self.resolver)?;
        debug!(variable = %name, ?policy, "defined global");

        let value = Some(self.variable(&name)?);
        Ok(ResolvedBlock {
            kind: header.kind(),
            index: header.index(),
            name: header.name().to_string(),
            data: Some(name.clone()),
            records: vec![vec![Field { name, value }]],
            unused: Vec::new(),
        })
    }

    fn expand(&mut self, block: &mut Block) -> Result<ResolvedBlock> {
        let visible = self.globals.snapshot(self.resolver)?;
        let data = block.header().value(self.resolver, &visible)?;
        let count = match block.param(REPEAT) {
            Some(p) => {
                let value = p.value(self.resolver, &visible)?.unwrap_or_default();
                value.trim().parse::<usize>().map_err(|_| {
                    syntax(p, &format!("repeat must be a whole number, got `{}`", value.trim()))
                })?
            }
            None => 1,
        };

        let mut records = Vec::new();
        for iteration in 0..count {
            let globals = self.globals.snapshot(self.resolver)?;
            let mut fields = Vec::new();
            for param in block.params_mut().iter_mut().filter(|p| p.name() != REPEAT) {
                param.set_local(Variable::new(REPEAT, iteration.to_string()));
                fields.push(Field {
                    name: param.name().to_string(),
                    value: param.value(self.resolver, &globals)?,
                });
            }
            records.push(fields);
            self.globals.refresh_all(self.resolver)?;
        }

        let header = block.header();
        Ok(ResolvedBlock {
            kind: header.kind(),
            index: header.index(),
            name: header.name().to_string(),
            data,
            records,
            unused: Vec::new(),
        })
    }
}

fn syntax(directive: &Directive, message: &str) -> ScriptError {
    ScriptError::Syntax {
        index: directive.index(),
        line: directive.line().to_string(),
        message: message.to_string(),
    }
}
