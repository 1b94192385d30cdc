//! Per-run mutable state shared by the semantic and lint passes.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::ast::NodeId;
use crate::project::ConstantResolver;
use crate::report::Report;

use super::definitions::{DefId, DefinitionRegistry, ScopeStack};

/// Map from node identity to the definition last resolved for it.
///
/// Many nodes may share one definition. Entries are never removed; a known
/// association is only ever replaced by another known one, so later passes
/// cannot lose information a previous pass established.
#[derive(Debug, Default)]
pub struct Associations {
    map: FxHashMap<NodeId, DefId>,
}

impl Associations {
    /// Create an empty association map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolved definition for a node.
    ///
    /// An unknown result never overwrites an already-known association.
    pub fn set(&mut self, node: NodeId, def: DefId) {
        match self.map.get(&node) {
            Some(existing) if !existing.is_unknown() && def.is_unknown() => {}
            _ => {
                self.map.insert(node, def);
            }
        }
    }

    /// The definition last resolved for a node; the unknown sentinel when
    /// nothing was ever recorded.
    pub fn get(&self, node: NodeId) -> DefId {
        self.map.get(&node).copied().unwrap_or(DefId::UNKNOWN)
    }

    /// Number of recorded associations.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no associations were recorded.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A constant the run could not resolve locally, with the candidate files
/// the [`ConstantResolver`] proposed. The host may parse those files,
/// replay them into the registry, and run again.
#[derive(Clone, Debug)]
pub struct PendingConstant {
    /// The namespaced name as written.
    pub name: SmolStr,
    /// Candidate defining files, shortest-path-first.
    pub candidates: Vec<PathBuf>,
}

/// Everything one analysis run owns.
///
/// Exclusively owned by the run that created it; an aborted run's context
/// is discarded, never resumed.
pub struct RunContext {
    /// This run's private copy of the definition registry.
    pub registry: DefinitionRegistry,
    /// The active scope frames.
    pub scopes: ScopeStack,
    /// Node → definition associations.
    pub associations: Associations,
    /// The append-only diagnostic sink.
    pub report: Report,
    /// Shared, internally-cached constant-to-file resolver.
    pub resolver: Arc<ConstantResolver>,
    /// Constants that stayed unresolved, with file candidates.
    pub pending_constants: Vec<PendingConstant>,
}

impl RunContext {
    /// Build a context around a run-private registry clone.
    pub fn new(registry: DefinitionRegistry, resolver: Arc<ConstantResolver>) -> Self {
        let scopes = ScopeStack::new(registry.root());
        Self {
            registry,
            scopes,
            associations: Associations::new(),
            report: Report::new(),
            resolver,
            pending_constants: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_association_is_unknown() {
        let associations = Associations::new();
        assert!(associations.get(NodeId(7)).is_unknown());
    }

    #[test]
    fn test_unknown_never_overwrites_known() {
        let mut registry = DefinitionRegistry::new();
        let root = registry.root();
        let def = registry.define(
            root,
            super::super::definitions::DefinitionKind::Class,
            "Widget",
            None,
        );

        let mut associations = Associations::new();
        associations.set(NodeId(0), def);
        associations.set(NodeId(0), DefId::UNKNOWN);

        assert_eq!(associations.get(NodeId(0)), def);
    }

    #[test]
    fn test_known_replaces_known() {
        let mut registry = DefinitionRegistry::new();
        let root = registry.root();
        let kind = super::super::definitions::DefinitionKind::Class;
        let a = registry.define(root, kind, "A", None);
        let b = registry.define(root, kind, "B", None);

        let mut associations = Associations::new();
        associations.set(NodeId(0), a);
        associations.set(NodeId(0), b);

        assert_eq!(associations.get(NodeId(0)), b);
    }
}
