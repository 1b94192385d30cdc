//! The association tracker — a single, non-executing forward pass that
//! builds the definition registry and records, per node, its currently
//! known definition.
//!
//! The tracker is an ordinary [`Listener`] over the shared tree iterator:
//! definition-introducing nodes upsert registry entries and bracket their
//! bodies with scope frames; reference nodes resolve against the scope
//! stack and record the result in the association map. Everything that
//! fails to resolve becomes the unknown sentinel — conservative "no
//! information", never an error.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::trace;

use crate::ast::{Listener, Node, NodeId, NodeKind};

use super::context::{PendingConstant, RunContext};
use super::definitions::{DefId, DefinitionKind};

/// Tag of the header sub-node naming a class's ancestor.
const SUPERCLASS_TAG: &str = "superclass";

/// The semantic walker.
pub struct AssociationTracker {
    /// Scope frames this tracker pushed, by the node that owns them.
    /// Release on leave is keyed by node id, so an aborted listener can
    /// never leave a frame behind for later nodes to trip over.
    pushed: Vec<NodeId>,
    /// Constant names already handed to the resolver this run.
    scanned: FxHashSet<SmolStr>,
}

impl AssociationTracker {
    /// Create a tracker for one run.
    pub fn new() -> Self {
        Self {
            pushed: Vec::new(),
            scanned: FxHashSet::default(),
        }
    }

    // ------------------------------------------------------------------
    // Definition-introducing nodes
    // ------------------------------------------------------------------

    fn enter_class(&mut self, node: &Node, ctx: &mut RunContext) {
        let Some(name) = node.name() else { return };

        let owner = ctx.scopes.current();
        let class = ctx
            .registry
            .define(owner, DefinitionKind::Class, name, Some(node.pos()));

        // The header resolves before the body is walked: the superclass
        // link must be in place for lookups inside the body.
        let ancestor_name = node
            .children()
            .iter()
            .find(|child| child.tag() == SUPERCLASS_TAG)
            .and_then(|child| child.name());

        if let Some(ancestor_name) = ancestor_name {
            let ancestor = self.resolve_constant_name(ctx, ancestor_name);
            if ancestor.is_unknown() {
                self.scan_constant(ctx, ancestor_name);
            } else {
                ctx.registry.mark_used(ancestor);
                ctx.registry.declare_inherits(class, ancestor);
            }
        } else if ctx.registry.get(class).superclass.is_none() && name != "Object" {
            let object =
                ctx.registry
                    .lookup_in(ctx.registry.root(), DefinitionKind::Class, "Object");
            if !object.is_unknown() {
                ctx.registry.declare_inherits(class, object);
            }
        }

        ctx.associations.set(node.id(), class);
        self.push_scope(node.id(), class, ctx);
    }

    fn enter_module(&mut self, node: &Node, ctx: &mut RunContext) {
        let Some(name) = node.name() else { return };

        let owner = ctx.scopes.current();
        let module = ctx
            .registry
            .define(owner, DefinitionKind::Module, name, Some(node.pos()));

        ctx.associations.set(node.id(), module);
        self.push_scope(node.id(), module, ctx);
    }

    fn enter_method(&mut self, node: &Node, ctx: &mut RunContext, kind: DefinitionKind) {
        let Some(name) = node.name() else { return };

        // Methods hang off the enclosing class or module, not off an
        // intervening method scope.
        let owner = ctx
            .scopes
            .innermost_where(&ctx.registry, |def| {
                matches!(def.kind, DefinitionKind::Class | DefinitionKind::Module)
            });
        let method = ctx.registry.define(owner, kind, name, Some(node.pos()));

        ctx.associations.set(node.id(), method);
        self.push_scope(node.id(), method, ctx);
    }

    fn enter_argument(&mut self, node: &Node, ctx: &mut RunContext) {
        let Some(name) = node.name() else { return };

        let owner = ctx.scopes.current();
        let arg = ctx
            .registry
            .define(owner, DefinitionKind::Argument, name, Some(node.pos()));
        ctx.associations.set(node.id(), arg);
    }

    fn leave_assign(&mut self, node: &Node, ctx: &mut RunContext, kind: DefinitionKind) {
        let Some(name) = node.name() else { return };

        // Binding happens on leave, after the right-hand side resolved:
        // a read after this write observes the write, a read before it
        // observed the outer scope or unknown.
        let value = node
            .children()
            .first()
            .map(|rhs| ctx.associations.get(rhs.id()))
            .unwrap_or(DefId::UNKNOWN);

        let owner = match kind {
            DefinitionKind::GlobalVariable => ctx.registry.root(),
            DefinitionKind::InstanceVariable | DefinitionKind::ClassVariable => {
                ctx.scopes.innermost_where(&ctx.registry, |def| {
                    matches!(def.kind, DefinitionKind::Class | DefinitionKind::Module)
                })
            }
            _ => ctx.scopes.current(),
        };

        // Each rebinding is a fresh definition that shadows the previous
        // one in the member table. Reads that already resolved keep their
        // binding; only reads after this point observe the new value.
        let var = if kind.is_variable() {
            ctx.registry.rebind(owner, kind, name, Some(node.pos()))
        } else {
            ctx.registry.define(owner, kind, name, Some(node.pos()))
        };
        ctx.registry.set_value(var, value);
        ctx.associations.set(node.id(), var);
    }

    // ------------------------------------------------------------------
    // Reference nodes
    // ------------------------------------------------------------------

    fn enter_identifier(&mut self, node: &mut Node, ctx: &mut RunContext) {
        let Some(name) = node.name().map(SmolStr::new) else { return };

        let var = self.lookup_variable(ctx, DefinitionKind::LocalVariable, &name);
        if !var.is_unknown() {
            // A bare identifier proven to be a local read: retag it so
            // later listeners dispatch on the proven kind.
            node.reclassify("lvar");
            ctx.registry.mark_used(var);
            ctx.associations.set(node.id(), var);
            return;
        }

        // Not a known local or argument; best effort as an implicit-self
        // method call.
        let method = self.lookup_callable(ctx, &name);
        if !method.is_unknown() {
            ctx.registry.mark_used(method);
        }
        ctx.associations.set(node.id(), method);
    }

    fn enter_variable(&mut self, node: &Node, ctx: &mut RunContext, kind: DefinitionKind) {
        let Some(name) = node.name() else { return };

        let found = match kind {
            DefinitionKind::GlobalVariable => {
                ctx.registry
                    .lookup_in(ctx.registry.root(), kind, name)
            }
            DefinitionKind::LocalVariable => self.lookup_variable(ctx, kind, name),
            _ => ctx.scopes.lookup(&ctx.registry, kind, name),
        };

        if !found.is_unknown() {
            ctx.registry.mark_used(found);
        } else {
            trace!(name, kind = kind.display(), "unresolved variable read");
        }
        ctx.associations.set(node.id(), found);
    }

    fn enter_constant(&mut self, node: &Node, ctx: &mut RunContext) {
        let Some(name) = node.name() else { return };

        let found = self.resolve_constant_name(ctx, name);
        if found.is_unknown() {
            self.scan_constant(ctx, name);
        } else {
            ctx.registry.mark_used(found);
        }
        ctx.associations.set(node.id(), found);
    }

    fn enter_self(&mut self, node: &Node, ctx: &mut RunContext) {
        let owner = ctx
            .scopes
            .innermost_where(&ctx.registry, |def| {
                matches!(def.kind, DefinitionKind::Class | DefinitionKind::Module)
            });
        ctx.associations.set(node.id(), owner);
    }

    fn enter_literal(&mut self, node: &Node, ctx: &mut RunContext, type_name: &str) {
        let class = ctx
            .registry
            .lookup_in(ctx.registry.root(), DefinitionKind::Class, type_name);
        ctx.associations.set(node.id(), class);
    }

    fn leave_send(&mut self, node: &Node, ctx: &mut RunContext) {
        let Some(name) = node.name() else { return };

        let target = match node.key() {
            // No receiver: an implicit-self call against the active scopes.
            None => self.lookup_callable(ctx, name),
            Some(receiver) => {
                let receiver_def = ctx.associations.get(receiver.id());
                if receiver_def.is_unknown() {
                    // Unknown receiver propagates unknown; guessing a
                    // return definition here would invent information.
                    DefId::UNKNOWN
                } else if receiver.kind() == &NodeKind::Constant {
                    // Constant receiver: the message goes to the construct
                    // itself.
                    ctx.registry
                        .lookup_in(receiver_def, DefinitionKind::Method, name)
                } else {
                    // Anything else is an instance of its resolved type.
                    let ty = self.value_type(ctx, receiver_def);
                    if ty.is_unknown() {
                        DefId::UNKNOWN
                    } else {
                        ctx.registry
                            .lookup_in(ty, DefinitionKind::InstanceMethod, name)
                    }
                }
            }
        };

        if !target.is_unknown() {
            ctx.registry.mark_used(target);
        }
        ctx.associations.set(node.id(), target);
    }

    // ------------------------------------------------------------------
    // Resolution helpers
    // ------------------------------------------------------------------

    /// Local, then argument — the two kinds a bare name can bind to.
    fn lookup_variable(&self, ctx: &RunContext, kind: DefinitionKind, name: &str) -> DefId {
        let found = ctx.scopes.lookup(&ctx.registry, kind, name);
        if !found.is_unknown() {
            return found;
        }
        ctx.scopes
            .lookup(&ctx.registry, DefinitionKind::Argument, name)
    }

    /// Instance method, then singleton method, against the scope stack.
    fn lookup_callable(&self, ctx: &RunContext, name: &str) -> DefId {
        let found = ctx
            .scopes
            .lookup(&ctx.registry, DefinitionKind::InstanceMethod, name);
        if !found.is_unknown() {
            return found;
        }
        ctx.scopes.lookup(&ctx.registry, DefinitionKind::Method, name)
    }

    /// Resolve a possibly namespaced constant name against the scopes.
    fn resolve_constant_name(&self, ctx: &RunContext, name: &str) -> DefId {
        const KINDS: [DefinitionKind; 3] = [
            DefinitionKind::Constant,
            DefinitionKind::Class,
            DefinitionKind::Module,
        ];

        let mut segments = name.split("::").filter(|s| !s.is_empty());
        let Some(first) = segments.next() else {
            return DefId::UNKNOWN;
        };

        let mut current = KINDS
            .iter()
            .map(|&kind| ctx.scopes.lookup(&ctx.registry, kind, first))
            .find(|id| !id.is_unknown())
            .unwrap_or(DefId::UNKNOWN);

        for segment in segments {
            if current.is_unknown() {
                return DefId::UNKNOWN;
            }
            current = KINDS
                .iter()
                .map(|&kind| ctx.registry.lookup_in(current, kind, segment))
                .find(|id| !id.is_unknown())
                .unwrap_or(DefId::UNKNOWN);
        }

        current
    }

    /// Ask the resolver for candidate defining files, once per name.
    fn scan_constant(&mut self, ctx: &mut RunContext, name: &str) {
        if !self.scanned.insert(SmolStr::new(name)) {
            return;
        }
        let candidates = ctx.resolver.scan(name);
        trace!(name, candidates = candidates.len(), "constant not in registry");
        if !candidates.is_empty() {
            ctx.pending_constants.push(PendingConstant {
                name: SmolStr::new(name),
                candidates: candidates.to_vec(),
            });
        }
    }

    /// Follow a variable's value chain to the class it holds an instance
    /// of; unknown when the chain ends anywhere else.
    fn value_type(&self, ctx: &RunContext, def: DefId) -> DefId {
        let mut current = def;
        let mut visited = FxHashSet::default();

        while visited.insert(current) {
            if current.is_unknown() {
                return DefId::UNKNOWN;
            }
            let definition = ctx.registry.get(current);
            match definition.kind {
                DefinitionKind::Class | DefinitionKind::Module => return current,
                kind if kind.is_variable() => match definition.value {
                    Some(value) => current = value,
                    None => return DefId::UNKNOWN,
                },
                _ => return DefId::UNKNOWN,
            }
        }

        DefId::UNKNOWN
    }

    // ------------------------------------------------------------------
    // Scope bracketing
    // ------------------------------------------------------------------

    fn push_scope(&mut self, node: NodeId, def: DefId, ctx: &mut RunContext) {
        ctx.scopes.enter_scope(def);
        self.pushed.push(node);
        trace!(depth = ctx.scopes.depth(), "entered scope");
    }

    fn release_scope(&mut self, node: NodeId, ctx: &mut RunContext) {
        if let Some(index) = self.pushed.iter().rposition(|&id| id == node) {
            // Pop this node's frame plus anything left dangling below it,
            // so one faulty node cannot skew every later scope.
            while self.pushed.len() > index {
                self.pushed.pop();
                ctx.scopes.exit_scope();
            }
            trace!(depth = ctx.scopes.depth(), "left scope");
        }
    }
}

impl Default for AssociationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener<RunContext> for AssociationTracker {
    fn enter(&mut self, node: &mut Node, ctx: &mut RunContext) {
        match node.event().clone() {
            NodeKind::Class => self.enter_class(node, ctx),
            NodeKind::Module => self.enter_module(node, ctx),
            NodeKind::MethodDef => {
                self.enter_method(node, ctx, DefinitionKind::InstanceMethod)
            }
            NodeKind::SingletonMethodDef => {
                self.enter_method(node, ctx, DefinitionKind::Method)
            }
            NodeKind::Argument => self.enter_argument(node, ctx),
            NodeKind::Identifier => self.enter_identifier(node, ctx),
            NodeKind::LocalVariable => {
                self.enter_variable(node, ctx, DefinitionKind::LocalVariable)
            }
            NodeKind::InstanceVariable => {
                self.enter_variable(node, ctx, DefinitionKind::InstanceVariable)
            }
            NodeKind::ClassVariable => {
                self.enter_variable(node, ctx, DefinitionKind::ClassVariable)
            }
            NodeKind::GlobalVariable => {
                self.enter_variable(node, ctx, DefinitionKind::GlobalVariable)
            }
            NodeKind::Constant => self.enter_constant(node, ctx),
            NodeKind::SelfRef => self.enter_self(node, ctx),
            NodeKind::Integer => self.enter_literal(node, ctx, "Integer"),
            NodeKind::Float => self.enter_literal(node, ctx, "Float"),
            NodeKind::Str => self.enter_literal(node, ctx, "String"),
            NodeKind::Symbol => self.enter_literal(node, ctx, "Symbol"),
            NodeKind::Array => self.enter_literal(node, ctx, "Array"),
            NodeKind::Hash => self.enter_literal(node, ctx, "Hash"),
            NodeKind::True => self.enter_literal(node, ctx, "TrueClass"),
            NodeKind::False => self.enter_literal(node, ctx, "FalseClass"),
            NodeKind::Nil => self.enter_literal(node, ctx, "NilClass"),
            _ => {}
        }
    }

    fn leave(&mut self, node: &mut Node, ctx: &mut RunContext) {
        match node.event().clone() {
            NodeKind::Class
            | NodeKind::Module
            | NodeKind::MethodDef
            | NodeKind::SingletonMethodDef => self.release_scope(node.id(), ctx),
            NodeKind::LocalAssign => {
                self.leave_assign(node, ctx, DefinitionKind::LocalVariable)
            }
            NodeKind::InstanceAssign => {
                self.leave_assign(node, ctx, DefinitionKind::InstanceVariable)
            }
            NodeKind::ClassVarAssign => {
                self.leave_assign(node, ctx, DefinitionKind::ClassVariable)
            }
            NodeKind::GlobalAssign => {
                self.leave_assign(node, ctx, DefinitionKind::GlobalVariable)
            }
            NodeKind::ConstantAssign => {
                self.leave_assign(node, ctx, DefinitionKind::Constant)
            }
            NodeKind::Send => self.leave_send(node, ctx),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ast::{build_tree, RawNode, TreeIterator};
    use crate::project::ConstantResolver;
    use crate::sema::builder::registry_with_core_types;

    fn track(raw: Vec<RawNode>) -> (Vec<crate::ast::Node>, RunContext) {
        track_with_resolver(
            raw,
            Arc::new(ConstantResolver::new(Vec::new(), Vec::new()).unwrap()),
        )
    }

    fn track_with_resolver(
        raw: Vec<RawNode>,
        resolver: Arc<ConstantResolver>,
    ) -> (Vec<crate::ast::Node>, RunContext) {
        let mut ctx = RunContext::new(registry_with_core_types(), resolver);
        let mut nodes = build_tree(raw);

        let mut iter = TreeIterator::new();
        iter.bind(AssociationTracker::new());
        iter.iterate(&mut nodes, &mut ctx);

        (nodes, ctx)
    }

    fn assign(tag: &str, name: &str, rhs: RawNode) -> RawNode {
        RawNode::new(tag)
            .with_value(name)
            .with_children(vec![Some(rhs)])
    }

    #[test]
    fn test_assignment_then_read_carries_type() {
        let (nodes, ctx) = track(vec![
            assign("lvasgn", "greeting", RawNode::new("str").with_value("hi")),
            RawNode::new("lvar").with_value("greeting"),
        ]);

        let read = ctx.associations.get(nodes[1].id());
        assert!(!read.is_unknown());
        assert_eq!(ctx.registry.definition_type(read), Some("String"));
        assert!(ctx.registry.get(read).used);
    }

    #[test]
    fn test_read_before_write_is_unknown() {
        let (nodes, ctx) = track(vec![
            RawNode::new("lvar").with_value("greeting"),
            assign("lvasgn", "greeting", RawNode::new("str").with_value("hi")),
        ]);

        assert!(ctx.associations.get(nodes[0].id()).is_unknown());
    }

    #[test]
    fn test_identifier_proven_local_is_reclassified() {
        let (nodes, ctx) = track(vec![
            assign("lvasgn", "count", RawNode::new("int").with_value("1")),
            RawNode::new("ident").with_value("count"),
        ]);

        assert_eq!(nodes[1].kind(), &NodeKind::LocalVariable);
        let def = ctx.associations.get(nodes[1].id());
        assert_eq!(ctx.registry.definition_type(def), Some("Integer"));
    }

    #[test]
    fn test_unproven_identifier_stays_put() {
        let (nodes, ctx) = track(vec![RawNode::new("ident").with_value("mystery")]);

        assert_eq!(nodes[0].kind(), &NodeKind::Identifier);
        assert!(ctx.associations.get(nodes[0].id()).is_unknown());
    }

    #[test]
    fn test_scopes_balanced_after_run() {
        let (_, ctx) = track(vec![RawNode::new("class").with_value("Widget").with_children(
            vec![Some(
                RawNode::new("def").with_value("run").with_children(vec![
                    Some(RawNode::new("args")),
                    Some(assign("lvasgn", "x", RawNode::new("int").with_value("1"))),
                ]),
            )],
        )]);

        assert_eq!(ctx.scopes.depth(), 1);
        assert_eq!(ctx.scopes.current(), ctx.registry.root());
    }

    #[test]
    fn test_method_argument_visible_in_body() {
        let (nodes, ctx) = track(vec![RawNode::new("def").with_value("shout").with_children(
            vec![
                Some(RawNode::new("args").with_children(vec![Some(
                    RawNode::new("arg").with_value("word"),
                )])),
                Some(RawNode::new("ident").with_value("word")),
            ],
        )]);

        let body_read = nodes[0].children().last().unwrap();
        let def = ctx.associations.get(body_read.id());
        assert!(!def.is_unknown());
        assert_eq!(ctx.registry.get(def).kind, DefinitionKind::Argument);
    }

    #[test]
    fn test_send_on_literal_resolves_instance_method() {
        let (nodes, ctx) = track(vec![RawNode::new("send")
            .with_value("length")
            .with_key(RawNode::new("str").with_value("hi"))]);

        let target = ctx.associations.get(nodes[0].id());
        assert!(!target.is_unknown());
        let def = ctx.registry.get(target);
        assert_eq!(def.kind, DefinitionKind::InstanceMethod);
        assert_eq!(def.name, "length");
        assert!(def.used);
    }

    #[test]
    fn test_send_on_variable_uses_bound_value_type() {
        let (nodes, ctx) = track(vec![
            assign("lvasgn", "name", RawNode::new("str").with_value("hi")),
            RawNode::new("send")
                .with_value("length")
                .with_key(RawNode::new("lvar").with_value("name")),
        ]);

        let target = ctx.associations.get(nodes[1].id());
        assert_eq!(ctx.registry.get(target).kind, DefinitionKind::InstanceMethod);
    }

    #[test]
    fn test_send_on_unknown_receiver_propagates_unknown() {
        let (nodes, ctx) = track(vec![RawNode::new("send")
            .with_value("==")
            .with_key(RawNode::new("lvar").with_value("phantom"))
            .with_children(vec![Some(RawNode::new("int").with_value("1"))])]);

        assert!(ctx.associations.get(nodes[0].id()).is_unknown());
    }

    #[test]
    fn test_superclass_header_links_ancestry() {
        let (nodes, ctx) = track(vec![
            RawNode::new("class").with_value("Base").with_children(vec![Some(
                RawNode::new("def")
                    .with_value("greet")
                    .with_children(vec![Some(RawNode::new("args"))]),
            )]),
            RawNode::new("class").with_value("Child").with_children(vec![Some(
                RawNode::new("superclass").with_value("Base"),
            )]),
        ]);

        let base = ctx.associations.get(nodes[0].id());
        let child = ctx.associations.get(nodes[1].id());
        assert_eq!(ctx.registry.get(child).superclass, Some(base));
        assert!(!ctx
            .registry
            .lookup_in(child, DefinitionKind::InstanceMethod, "greet")
            .is_unknown());
    }

    #[test]
    fn test_class_without_header_inherits_object() {
        let (nodes, ctx) = track(vec![RawNode::new("class").with_value("Widget")]);

        let widget = ctx.associations.get(nodes[0].id());
        let object = ctx
            .registry
            .lookup_in(ctx.registry.root(), DefinitionKind::Class, "Object");
        assert_eq!(ctx.registry.get(widget).superclass, Some(object));
    }

    #[test]
    fn test_reopened_class_is_same_definition() {
        let (nodes, ctx) = track(vec![
            RawNode::new("class").with_value("Widget"),
            RawNode::new("class").with_value("Widget"),
        ]);

        assert_eq!(
            ctx.associations.get(nodes[0].id()),
            ctx.associations.get(nodes[1].id())
        );
    }

    #[test]
    fn test_constant_assignment_then_reference() {
        let (nodes, ctx) = track(vec![
            assign("casgn", "MAX", RawNode::new("int").with_value("42")),
            RawNode::new("const").with_value("MAX"),
        ]);

        let read = ctx.associations.get(nodes[1].id());
        assert!(!read.is_unknown());
        assert_eq!(ctx.registry.get(read).kind, DefinitionKind::Constant);
    }

    #[test]
    fn test_namespaced_constant_resolution() {
        let (nodes, ctx) = track(vec![
            RawNode::new("module").with_value("Outer").with_children(vec![Some(
                RawNode::new("class").with_value("Inner"),
            )]),
            RawNode::new("const").with_value("Outer::Inner"),
        ]);

        let read = ctx.associations.get(nodes[1].id());
        assert!(!read.is_unknown());
        assert_eq!(ctx.registry.get(read).name, "Inner");
    }

    #[test]
    fn test_unresolved_constant_records_pending_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("widget.rb"), "").unwrap();
        let resolver =
            Arc::new(ConstantResolver::new(vec![dir.path().to_path_buf()], Vec::new()).unwrap());

        let (nodes, ctx) =
            track_with_resolver(vec![RawNode::new("const").with_value("Widget")], resolver);

        assert!(ctx.associations.get(nodes[0].id()).is_unknown());
        assert_eq!(ctx.pending_constants.len(), 1);
        assert_eq!(ctx.pending_constants[0].name, "Widget");
        assert!(!ctx.pending_constants[0].candidates.is_empty());
    }

    #[test]
    fn test_pending_scan_happens_once_per_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("widget.rb"), "").unwrap();
        let resolver =
            Arc::new(ConstantResolver::new(vec![dir.path().to_path_buf()], Vec::new()).unwrap());

        let (_, ctx) = track_with_resolver(
            vec![
                RawNode::new("const").with_value("Widget"),
                RawNode::new("const").with_value("Widget"),
            ],
            resolver,
        );

        assert_eq!(ctx.pending_constants.len(), 1);
    }

    #[test]
    fn test_self_associates_enclosing_class() {
        let (nodes, ctx) = track(vec![RawNode::new("class")
            .with_value("Widget")
            .with_children(vec![Some(RawNode::new("self"))])]);

        let class = ctx.associations.get(nodes[0].id());
        let this = ctx.associations.get(nodes[0].children()[0].id());
        assert_eq!(this, class);
    }

    #[test]
    fn test_instance_variable_lands_on_class_scope() {
        let (_, ctx) = track(vec![RawNode::new("class").with_value("Widget").with_children(
            vec![Some(
                RawNode::new("def").with_value("setup").with_children(vec![
                    Some(RawNode::new("args")),
                    Some(assign("ivasgn", "@size", RawNode::new("int").with_value("3"))),
                ]),
            )],
        )]);

        let widget = ctx
            .registry
            .lookup_in(ctx.registry.root(), DefinitionKind::Class, "Widget");
        assert!(ctx
            .registry
            .member(widget, DefinitionKind::InstanceVariable, "@size")
            .is_some());
    }

    #[test]
    fn test_global_variable_visible_across_scopes() {
        let (nodes, ctx) = track(vec![
            assign("gvasgn", "$mode", RawNode::new("sym").with_value("fast")),
            RawNode::new("class").with_value("Widget").with_children(vec![Some(
                RawNode::new("gvar").with_value("$mode"),
            )]),
        ]);

        let read = ctx.associations.get(nodes[1].children()[0].id());
        assert!(!read.is_unknown());
        assert_eq!(ctx.registry.definition_type(read), Some("Symbol"));
    }

    #[test]
    fn test_read_keeps_binding_from_before_later_reassignment() {
        let (nodes, ctx) = track(vec![
            assign("lvasgn", "value", RawNode::new("str").with_value("x")),
            RawNode::new("lvar").with_value("value"),
            assign("lvasgn", "value", RawNode::new("sym").with_value("x")),
        ]);

        // The read resolved between the two writes; the later rebinding
        // must not retroactively change its type.
        let read = ctx.associations.get(nodes[1].id());
        assert_eq!(ctx.registry.definition_type(read), Some("String"));

        let latest = ctx
            .registry
            .member(ctx.registry.root(), DefinitionKind::LocalVariable, "value")
            .unwrap();
        assert_eq!(ctx.registry.definition_type(latest), Some("Symbol"));
    }

    #[test]
    fn test_skipped_leave_cannot_leak_scope_frames() {
        let resolver = Arc::new(ConstantResolver::new(Vec::new(), Vec::new()).unwrap());
        let mut ctx = RunContext::new(registry_with_core_types(), resolver);
        let mut nodes = build_tree(vec![
            RawNode::new("class").with_value("Widget"),
            RawNode::new("def").with_value("run"),
        ]);
        let mut tracker = AssociationTracker::new();

        tracker.enter(&mut nodes[0], &mut ctx);
        tracker.enter(&mut nodes[1], &mut ctx);
        assert_eq!(ctx.scopes.depth(), 3);

        // The method's leave never fires. Releasing the class frame must
        // drop the dangling method frame along with it.
        tracker.leave(&mut nodes[0], &mut ctx);

        assert_eq!(ctx.scopes.depth(), 1);
        assert_eq!(ctx.scopes.current(), ctx.registry.root());
    }

    #[test]
    fn test_singleton_method_reachable_through_constant_receiver() {
        let (nodes, ctx) = track(vec![
            RawNode::new("class").with_value("Widget").with_children(vec![Some(
                RawNode::new("defs")
                    .with_value("build")
                    .with_children(vec![Some(RawNode::new("args"))]),
            )]),
            RawNode::new("send")
                .with_value("build")
                .with_key(RawNode::new("const").with_value("Widget")),
        ]);

        let target = ctx.associations.get(nodes[1].id());
        assert!(!target.is_unknown());
        assert_eq!(ctx.registry.get(target).kind, DefinitionKind::Method);
    }
}
