//! The uniform node model for parsed source.

use smol_str::SmolStr;
use std::fmt;

use crate::base::LineCol;

/// A tree-local identifier for a node.
///
/// Assigned sequentially by [`build_tree`]; unique within one tree, which is
/// all the association map needs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Normalized semantic classification of a node.
///
/// Upstream parser tags are opaque strings; this is the closed set the
/// semantic walker and the lint passes dispatch on. Tags with no mapping
/// are carried through as [`NodeKind::Other`] — never an error.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Root,
    Class,
    Module,
    MethodDef,
    SingletonMethodDef,
    Arguments,
    Argument,
    LocalAssign,
    InstanceAssign,
    ClassVarAssign,
    GlobalAssign,
    ConstantAssign,
    Identifier,
    LocalVariable,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
    Constant,
    SelfRef,
    Send,
    Block,
    Integer,
    Float,
    Str,
    Symbol,
    Array,
    Hash,
    True,
    False,
    Nil,
    /// An unmapped upstream tag, preserved verbatim.
    Other(SmolStr),
}

impl NodeKind {
    /// Normalize an upstream parser tag.
    ///
    /// The table is fixed: a given tag always maps to the same kind, no
    /// matter how often it is consulted.
    pub fn from_tag(tag: &str) -> NodeKind {
        match tag {
            "root" => NodeKind::Root,
            "class" => NodeKind::Class,
            "module" => NodeKind::Module,
            "def" => NodeKind::MethodDef,
            "defs" => NodeKind::SingletonMethodDef,
            "args" => NodeKind::Arguments,
            "arg" | "optarg" | "restarg" | "blockarg" | "kwarg" => NodeKind::Argument,
            "lvasgn" => NodeKind::LocalAssign,
            "ivasgn" => NodeKind::InstanceAssign,
            "cvasgn" => NodeKind::ClassVarAssign,
            "gvasgn" => NodeKind::GlobalAssign,
            "casgn" => NodeKind::ConstantAssign,
            "ident" => NodeKind::Identifier,
            "lvar" => NodeKind::LocalVariable,
            "ivar" => NodeKind::InstanceVariable,
            "cvar" => NodeKind::ClassVariable,
            "gvar" => NodeKind::GlobalVariable,
            "const" => NodeKind::Constant,
            "self" => NodeKind::SelfRef,
            "send" => NodeKind::Send,
            "block" => NodeKind::Block,
            "int" => NodeKind::Integer,
            "float" => NodeKind::Float,
            "str" => NodeKind::Str,
            "sym" => NodeKind::Symbol,
            "array" => NodeKind::Array,
            "hash" => NodeKind::Hash,
            "true" => NodeKind::True,
            "false" => NodeKind::False,
            "nil" => NodeKind::Nil,
            other => NodeKind::Other(SmolStr::new(other)),
        }
    }
}

/// A raw parse record, as produced by the external parser.
///
/// Child slots may be absent (`None`) where the grammar allows omission;
/// [`build_tree`] strips those so downstream code never sees a hole.
#[derive(Clone, Debug, Default)]
pub struct RawNode {
    /// Opaque upstream tag.
    pub tag: SmolStr,
    /// Scalar payload: a literal's text or a declared name.
    pub value: Option<SmolStr>,
    /// Ordered child records; `None` marks an absent slot.
    pub children: Vec<Option<RawNode>>,
    /// Member-access / receiver sub-node, when the construct has one.
    pub key: Option<Box<RawNode>>,
    /// 1-indexed source line, as parsers usually report it.
    pub line: u32,
    /// 1-indexed source column.
    pub col: u32,
    /// The text of the source line, for diagnostics.
    pub source_line: Option<SmolStr>,
}

impl RawNode {
    /// Create a record with just a tag.
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            line: 1,
            col: 1,
            ..Self::default()
        }
    }

    /// Set the scalar payload.
    pub fn with_value(mut self, value: impl Into<SmolStr>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the child records.
    pub fn with_children(mut self, children: Vec<Option<RawNode>>) -> Self {
        self.children = children;
        self
    }

    /// Set the member-access sub-node.
    pub fn with_key(mut self, key: RawNode) -> Self {
        self.key = Some(Box::new(key));
        self
    }

    /// Set the 1-indexed source position.
    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.line = line;
        self.col = col;
        self
    }
}

/// A normalized syntax node.
#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    tag: SmolStr,
    kind: NodeKind,
    event: NodeKind,
    value: Option<SmolStr>,
    children: Vec<Node>,
    key: Option<Box<Node>>,
    pos: LineCol,
    source_line: Option<SmolStr>,
}

impl Node {
    fn from_raw(raw: RawNode, next_id: &mut u32) -> Node {
        let id = NodeId(*next_id);
        *next_id += 1;

        let kind = NodeKind::from_tag(&raw.tag);
        let children = raw
            .children
            .into_iter()
            .flatten()
            .map(|child| Node::from_raw(child, next_id))
            .collect();
        let key = raw
            .key
            .map(|key| Box::new(Node::from_raw(*key, next_id)));

        Node {
            id,
            tag: raw.tag,
            event: kind.clone(),
            kind,
            value: raw.value,
            children,
            key,
            pos: LineCol::from_one_indexed(raw.line, raw.col),
            source_line: raw.source_line,
        }
    }

    /// The tree-local identifier.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The original upstream tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The normalized semantic kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The kind used for listener dispatch.
    ///
    /// Defaults to [`Node::kind`] and is re-derived whenever the node is
    /// reclassified, so the two never drift apart.
    pub fn event(&self) -> &NodeKind {
        &self.event
    }

    /// The scalar payload, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The declared or referenced name. Alias for the scalar payload, used
    /// where the payload carries an identifier rather than literal text.
    pub fn name(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Ordered child nodes (value group).
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Ordered child nodes, mutable.
    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    /// The member-access / receiver sub-node, if any.
    pub fn key(&self) -> Option<&Node> {
        self.key.as_deref()
    }

    /// The member-access sub-node, mutable.
    pub fn key_mut(&mut self) -> Option<&mut Node> {
        self.key.as_deref_mut()
    }

    /// Source position (0-indexed line/column).
    #[inline]
    pub fn pos(&self) -> LineCol {
        self.pos
    }

    /// The source line text, when the parser supplied it.
    pub fn source_line(&self) -> Option<&str> {
        self.source_line.as_deref()
    }

    /// All traversable sub-nodes: the value children in order, then the
    /// key sub-node. Pure query; the iterator relies on this to treat
    /// every node shape uniformly.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().chain(self.key.as_deref())
    }

    /// Re-tag this node, remapping the semantic kind through the fixed
    /// tag table and re-deriving the dispatch kind in the same step.
    pub fn reclassify(&mut self, tag: impl Into<SmolStr>) {
        self.tag = tag.into();
        self.kind = NodeKind::from_tag(&self.tag);
        self.event = self.kind.clone();
    }
}

/// Normalize a forest of raw parse records into nodes with tree-unique ids.
pub fn build_tree(roots: Vec<RawNode>) -> Vec<Node> {
    let mut next_id = 0;
    roots
        .into_iter()
        .map(|raw| Node::from_raw(raw, &mut next_id))
        .collect()
}
