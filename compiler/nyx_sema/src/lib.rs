//! Semantic analysis for the Nyx front-end.
//!
//! [`Sema`] owns the AST context, the scope stack and the compiler-action
//! registry. The parser drives it through `act_on_*` methods: declaration
//! handling with redeclaration checks, canonical type formation, expression
//! typing with implicit cast synthesis, the `unsafe` discipline, and name
//! lookup over lexical scopes and declaration contexts.
//!
//! The [`eval`] module folds constant expressions; [`actions`] hosts the
//! compiler-action framework and the builtin actions.

pub mod actions;
mod declarator;
pub mod eval;
mod exprs;
mod lookup;
mod scope;
mod sema;

pub use actions::{ActionArg, ActionContext, ActionRegistry, ArgKind, CompilerAction};
pub use declarator::{Declarator, DeclaratorContext, DeclaratorId, Initializer};
pub use lookup::{LookupPurpose, LookupResult, LookupStatus};
pub use scope::{Scope, ScopeFlags};
pub use sema::{Sema, TypeNameResult};

pub use nyx_ir::AliasTarget;
