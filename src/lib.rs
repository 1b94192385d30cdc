//! # lintel
//!
//! Core library for lintel: semantic model, scope resolution, and lint
//! passes for a dynamic object-oriented scripting language. Parsing and
//! presentation live in the host; this crate takes raw parse records and
//! produces diagnostics.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! analysis → run orchestration (AnalysisHost)
//!   ↓
//! checks   → lint passes over resolved associations
//!   ↓
//! sema     → definition registry, scopes, association tracker
//!   ↓
//! project  → constant-to-file resolution
//!   ↓
//! report   → diagnostic sink
//!   ↓
//! ast      → node model + tree iterator
//!   ↓
//! base     → primitives (LineCol)
//! ```

/// Foundation types: source positions
pub mod base;

/// Node model, tag normalization, and the listener-driven tree iterator
pub mod ast;

/// Diagnostics and the append-only report sink
pub mod report;

/// Project-level services: constant-to-file resolution
pub mod project;

/// Semantic model: definitions, scopes, and the association tracker
pub mod sema;

/// Lint passes
pub mod checks;

/// Run orchestration
pub mod analysis;

// Re-export the front-door types
pub use analysis::{AnalysisHost, AnalysisOutcome};
pub use ast::{build_tree, Listener, Node, NodeId, NodeKind, RawNode, TreeIterator};
pub use base::LineCol;
pub use report::{Diagnostic, Report, Severity};
pub use sema::{DefId, DefinitionKind, DefinitionRegistry, RunContext};
