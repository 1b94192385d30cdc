//! The analysis host — owns the per-process template state and drives the
//! two passes of a run.
//!
//! A host is built once: the standard-library stubs go into a template
//! registry and the constant resolver indexes the project directories.
//! Each [`AnalysisHost::analyze`] call clones the template into a private
//! [`RunContext`], runs the semantic pass, then the lint passes, over the
//! same tree, and hands back the diagnostics plus any constants that would
//! need other files parsed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::ast::{build_tree, Listener, Node, RawNode, TreeIterator};
use crate::checks;
use crate::project::{ConfigError, ConstantResolver};
use crate::report::Diagnostic;
use crate::sema::{
    registry_with_core_types, AssociationTracker, DefinitionBuilder, DefinitionRegistry,
    PendingConstant, RunContext,
};

/// What one analysis run produced.
pub struct AnalysisOutcome {
    /// Diagnostics in traversal order.
    pub diagnostics: Vec<Diagnostic>,
    /// The normalized tree, with reclassifications applied.
    pub nodes: Vec<Node>,
    /// Constants that stayed unresolved, with candidate defining files.
    /// The caller may parse those files, feed them through
    /// [`AnalysisHost::extend_registry`], and analyze again.
    pub pending_constants: Vec<PendingConstant>,
}

/// Per-process analysis front end.
///
/// Construct once, then call [`AnalysisHost::analyze`] per tree; runs never
/// observe each other's registry mutations.
pub struct AnalysisHost {
    template: DefinitionRegistry,
    resolver: Arc<ConstantResolver>,
    check_factories: Vec<fn() -> Vec<Box<dyn Listener<RunContext>>>>,
}

impl AnalysisHost {
    /// A host with the core built-in types and the default checks, resolving
    /// constants against the given project root.
    pub fn for_project(root: &Path) -> Result<Self, ConfigError> {
        let resolver = ConstantResolver::for_project(root, Vec::new())?;
        Ok(Self::with_resolver(Arc::new(resolver)))
    }

    /// A host resolving constants against explicit directories.
    pub fn with_directories(directories: Vec<PathBuf>) -> Result<Self, ConfigError> {
        let resolver = ConstantResolver::new(directories, Vec::new())?;
        Ok(Self::with_resolver(Arc::new(resolver)))
    }

    /// A host around an existing resolver.
    pub fn with_resolver(resolver: Arc<ConstantResolver>) -> Self {
        Self {
            template: registry_with_core_types(),
            resolver,
            check_factories: vec![checks::default_checks],
        }
    }

    /// Extend the template registry, for ingesting additional stub corpora.
    /// Affects runs started after this call only.
    pub fn extend_registry(&mut self, ingest: impl FnOnce(&mut DefinitionBuilder<'_>)) {
        let mut builder = DefinitionBuilder::new(&mut self.template);
        ingest(&mut builder);
    }

    /// The template registry as runs will see it.
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.template
    }

    /// Analyze one tree of raw parse records.
    pub fn analyze(&self, raw: Vec<RawNode>) -> AnalysisOutcome {
        let mut nodes = build_tree(raw);
        let mut ctx = RunContext::new(self.template.clone(), self.resolver.clone());

        // Pass 1: semantics. The tracker reclassifies nodes and fills the
        // association map the checks read.
        let mut semantic = TreeIterator::new();
        semantic.bind(AssociationTracker::new());
        semantic.iterate(&mut nodes, &mut ctx);

        // Pass 2: checks, over the identical tree shape.
        let mut lint = TreeIterator::new();
        for factory in &self.check_factories {
            for check in factory() {
                lint.bind_boxed(check);
            }
        }
        lint.iterate(&mut nodes, &mut ctx);

        debug!(
            diagnostics = ctx.report.diagnostics().len(),
            definitions = ctx.registry.len(),
            pending = ctx.pending_constants.len(),
            "analysis run finished"
        );

        AnalysisOutcome {
            diagnostics: ctx.report.take(),
            nodes,
            pending_constants: ctx.pending_constants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::DefinitionKind;

    fn host() -> AnalysisHost {
        let resolver = ConstantResolver::new(Vec::new(), Vec::new()).unwrap();
        AnalysisHost::with_resolver(Arc::new(resolver))
    }

    #[test]
    fn test_runs_are_isolated() {
        let host = host();
        let before = host.registry().len();

        host.analyze(vec![RawNode::new("class").with_value("Widget")]);

        // The run defined Widget in its private clone, not the template.
        assert_eq!(host.registry().len(), before);
    }

    #[test]
    fn test_extend_registry_visible_to_later_runs() {
        let mut host = host();
        host.extend_registry(|b| {
            b.construct(DefinitionKind::Class, "Pathname", |c| {
                c.inherits("Object");
                c.instance_method("exist?", |_| {});
            });
        });

        let outcome = host.analyze(vec![RawNode::new("send")
            .with_value("new")
            .with_key(RawNode::new("const").with_value("Pathname"))]);

        assert!(outcome.pending_constants.is_empty());
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_end_to_end_contradictory_equality() {
        let outcome = host().analyze(vec![RawNode::new("send")
            .with_value("==")
            .with_key(RawNode::new("sym").with_value("on"))
            .with_children(vec![Some(RawNode::new("str").with_value("on"))])
            .at(2, 1)]);

        assert_eq!(outcome.diagnostics.len(), 1);
        let d = &outcome.diagnostics[0];
        assert_eq!(d.check, "contradictory_equality");
        assert!(d.message.contains("Symbol"));
        assert!(d.message.contains("String"));
    }
}
