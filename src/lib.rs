//! Macro resolution for line-based map authoring scripts.
//!
//! Every line of a script is a `name:data` directive. Before the data is
//! handed to whatever builds the output document it is resolved:
//!
//! | Syntax | Meaning |
//! |---|---|
//! | `speed` | replaced by the data of a variable named `speed` |
//! | `{2*speed}` | arithmetic / boolean expression |
//! | `randomint(1,4)` | call to a registered function |
//!
//! The three are applied over and over until the string stops changing, so
//! they compose in any order: `hsltorgb({hue/360},1,0.5)` is fine.
//!
//! ```no_run
//! use wallscript::{Resolver, Scope, Variable};
//!
//! let resolver = Resolver::default();
//! let globals = [Variable::new("hue", "180")];
//! let color = resolver.resolve("hsltorgb({hue/360.0},1,0.5)", &Scope::new(&[], &globals))?;
//! assert_eq!(color, "[0,1,1,1]");
//! # Ok::<(), wallscript::ScriptError>(())
//! ```

pub mod bracket;
pub mod directive;
pub mod error;
pub mod expression;
pub mod functions;
pub mod resolver;
pub mod scope;
pub mod script;
pub mod strategy;
pub mod variable;

pub use directive::{check_unused, Directive, DirectiveKind, ResolvePolicy, UnusedDirective};
pub use error::{Result, ScriptError, Strategy};
pub use functions::{FunctionArgs, FunctionRegistry, MacroFunction};
pub use resolver::{Resolver, ResolverConfig};
pub use scope::{Globals, Scope};
pub use script::{ResolvedBlock, Script, Session};
pub use variable::Variable;
