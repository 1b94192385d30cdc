//! Semantic analysis: the definition registry, scope resolution, and the
//! association tracker that ties syntax nodes to definitions.

mod builder;
mod context;
mod definitions;
mod tracker;

pub use builder::{DefinitionBuilder, install_core_types, registry_with_core_types};
pub use context::{Associations, PendingConstant, RunContext};
pub use definitions::{DefId, Definition, DefinitionKind, DefinitionRegistry, ScopeStack};
pub use tracker::AssociationTracker;
