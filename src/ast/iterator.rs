//! Generic depth-first traversal with a two-phase listener protocol.

use super::node::Node;

/// A traversal callback bound to a [`TreeIterator`].
///
/// Both phases default to no-ops, so a listener only implements the phases
/// it cares about; dispatching on [`Node::event`] inside the handler is the
/// listener's own business. Handlers receive the node mutably: changes made
/// by one listener (reclassification, for instance) are visible to every
/// listener bound after it, and to both passes over the same tree.
///
/// `Ctx` is whatever shared state the listeners agree on — the iterator
/// itself never looks inside it.
pub trait Listener<Ctx> {
    /// Called before any of the node's sub-nodes are visited.
    fn enter(&mut self, node: &mut Node, ctx: &mut Ctx) {
        let _ = (node, ctx);
    }

    /// Called after every sub-node (however deeply nested) has been
    /// fully processed.
    fn leave(&mut self, node: &mut Node, ctx: &mut Ctx) {
        let _ = (node, ctx);
    }
}

/// Depth-first tree walker.
///
/// For each node, all bound listeners' enter handlers fire in registration
/// order, then the child groups recurse in order (value children, then the
/// key sub-node), then all leave handlers fire. The iterator has no notion
/// of scopes or definitions; the semantic pass and the lint passes reuse it
/// unchanged.
pub struct TreeIterator<Ctx> {
    listeners: Vec<Box<dyn Listener<Ctx>>>,
}

impl<Ctx> TreeIterator<Ctx> {
    /// Create an iterator with no listeners bound.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Append a listener to the active set.
    ///
    /// Listeners are never removed mid-traversal; bind a fresh iterator for
    /// a different pass configuration.
    pub fn bind(&mut self, listener: impl Listener<Ctx> + 'static) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Append an already-boxed listener, as produced by pass registries.
    pub fn bind_boxed(&mut self, listener: Box<dyn Listener<Ctx>>) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    /// Number of bound listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Walk a forest of nodes depth-first.
    pub fn iterate(&mut self, nodes: &mut [Node], ctx: &mut Ctx) {
        for node in nodes {
            self.process(node, ctx);
        }
    }

    fn process(&mut self, node: &mut Node, ctx: &mut Ctx) {
        for listener in &mut self.listeners {
            listener.enter(node, ctx);
        }

        for child in node.children_mut() {
            self.process(child, ctx);
        }
        if let Some(key) = node.key_mut() {
            self.process(key, ctx);
        }

        for listener in &mut self.listeners {
            listener.leave(node, ctx);
        }
    }
}

impl<Ctx> Default for TreeIterator<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{build_tree, RawNode};

    /// Records "<label>:<phase>:<tag>" into the shared context.
    struct Recorder {
        label: &'static str,
    }

    impl Listener<Vec<String>> for Recorder {
        fn enter(&mut self, node: &mut Node, log: &mut Vec<String>) {
            log.push(format!("{}:enter:{}", self.label, node.tag()));
        }

        fn leave(&mut self, node: &mut Node, log: &mut Vec<String>) {
            log.push(format!("{}:leave:{}", self.label, node.tag()));
        }
    }

    /// Only implements the enter phase; leave stays the default no-op.
    struct EnterOnly;

    impl Listener<Vec<String>> for EnterOnly {
        fn enter(&mut self, node: &mut Node, log: &mut Vec<String>) {
            log.push(format!("only:{}", node.tag()));
        }
    }

    fn nested_tree() -> Vec<Node> {
        // array(hash(sym))
        build_tree(vec![RawNode::new("array").with_children(vec![Some(
            RawNode::new("hash")
                .with_children(vec![Some(RawNode::new("sym").with_value("a"))]),
        )])])
    }

    #[test]
    fn test_enter_before_leave_across_listeners() {
        let mut tree = build_tree(vec![RawNode::new("int").with_value("1")]);
        let mut log = Vec::new();

        let mut iter = TreeIterator::new();
        iter.bind(Recorder { label: "a" });
        iter.bind(Recorder { label: "b" });
        iter.iterate(&mut tree, &mut log);

        assert_eq!(
            log,
            vec!["a:enter:int", "b:enter:int", "a:leave:int", "b:leave:int"]
        );
    }

    #[test]
    fn test_leave_fires_after_all_descendants() {
        let mut tree = nested_tree();
        let mut log = Vec::new();

        let mut iter = TreeIterator::new();
        iter.bind(Recorder { label: "a" });
        iter.iterate(&mut tree, &mut log);

        assert_eq!(
            log,
            vec![
                "a:enter:array",
                "a:enter:hash",
                "a:enter:sym",
                "a:leave:sym",
                "a:leave:hash",
                "a:leave:array",
            ]
        );
    }

    #[test]
    fn test_missing_handler_is_noop() {
        let mut tree = build_tree(vec![RawNode::new("int").with_value("1")]);
        let mut log = Vec::new();

        let mut iter = TreeIterator::new();
        iter.bind(EnterOnly);
        iter.iterate(&mut tree, &mut log);

        assert_eq!(log, vec!["only:int"]);
    }

    #[test]
    fn test_key_sub_node_is_traversed() {
        let mut tree = build_tree(vec![RawNode::new("send")
            .with_value("==")
            .with_key(RawNode::new("sym").with_value("a"))
            .with_children(vec![Some(RawNode::new("str").with_value("a"))])]);
        let mut log = Vec::new();

        let mut iter = TreeIterator::new();
        iter.bind(Recorder { label: "a" });
        iter.iterate(&mut tree, &mut log);

        // Value children first, then the key sub-node, then the send leaves.
        assert_eq!(
            log,
            vec![
                "a:enter:send",
                "a:enter:str",
                "a:leave:str",
                "a:enter:sym",
                "a:leave:sym",
                "a:leave:send",
            ]
        );
    }
}
