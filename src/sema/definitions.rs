//! The definition registry — nested symbol tables with inheritance links.
//!
//! Every declared construct gets a [`Definition`] in a registry-owned arena
//! addressed by [`DefId`]. Slot 0 is the unknown sentinel: lookups that miss
//! return [`DefId::UNKNOWN`] instead of raising, and every consumer must
//! treat it as "no information".

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::fmt;

use crate::base::LineCol;

/// What a definition declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Class,
    Module,
    /// A method on the construct itself (singleton level).
    Method,
    /// A method on instances of the construct.
    InstanceMethod,
    Constant,
    LocalVariable,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
    Argument,
    /// The explicit "no information" kind.
    Unknown,
}

impl DefinitionKind {
    /// Human-readable kind name for messages.
    pub fn display(&self) -> &'static str {
        match self {
            DefinitionKind::Class => "class",
            DefinitionKind::Module => "module",
            DefinitionKind::Method => "method",
            DefinitionKind::InstanceMethod => "instance method",
            DefinitionKind::Constant => "constant",
            DefinitionKind::LocalVariable => "local variable",
            DefinitionKind::InstanceVariable => "instance variable",
            DefinitionKind::ClassVariable => "class variable",
            DefinitionKind::GlobalVariable => "global variable",
            DefinitionKind::Argument => "argument",
            DefinitionKind::Unknown => "unknown",
        }
    }

    /// Kinds that open a lexical scope of their own.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            DefinitionKind::Class
                | DefinitionKind::Module
                | DefinitionKind::Method
                | DefinitionKind::InstanceMethod
        )
    }

    /// Kinds whose definitions carry a bound value.
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            DefinitionKind::LocalVariable
                | DefinitionKind::InstanceVariable
                | DefinitionKind::ClassVariable
                | DefinitionKind::GlobalVariable
                | DefinitionKind::Argument
        )
    }
}

/// Index of a definition in the registry arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DefId(u32);

impl DefId {
    /// The unknown sentinel — slot 0 of every registry.
    pub const UNKNOWN: DefId = DefId(0);

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Is this the unknown sentinel?
    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "DefId(unknown)")
        } else {
            write!(f, "DefId({})", self.0)
        }
    }
}

/// A registry entry describing a declared construct.
#[derive(Clone, Debug)]
pub struct Definition {
    /// What this definition declares.
    pub kind: DefinitionKind,
    /// Declared name.
    pub name: SmolStr,
    /// Superclass link (class kinds only).
    pub superclass: Option<DefId>,
    /// Set for definitions ingested from the standard-library stub corpus.
    pub builtin: bool,
    /// For variables: the definition currently bound as the value.
    pub value: Option<DefId>,
    /// Source position, when declared in analyzed source.
    pub pos: Option<LineCol>,
    /// Whether any reference resolved to this definition.
    pub used: bool,
    /// Named members, unique per (kind, name), in declaration order.
    members: IndexMap<(DefinitionKind, SmolStr), DefId>,
}

impl Definition {
    fn new(kind: DefinitionKind, name: SmolStr) -> Self {
        Self {
            kind,
            name,
            superclass: None,
            builtin: false,
            value: None,
            pos: None,
            used: false,
            members: IndexMap::new(),
        }
    }

    /// Iterate members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (DefinitionKind, &str, DefId)> {
        self.members
            .iter()
            .map(|((kind, name), &id)| (*kind, name.as_str(), id))
    }
}

/// Arena of definitions plus the explicit root scope.
///
/// Built once per process with the standard-library stubs ingested, then
/// cloned into each run so no run ever observes another's mutations.
#[derive(Clone, Debug)]
pub struct DefinitionRegistry {
    defs: Vec<Definition>,
    root: DefId,
}

impl DefinitionRegistry {
    /// Create a registry containing only the unknown sentinel and an empty
    /// root scope.
    pub fn new() -> Self {
        let mut defs = Vec::with_capacity(64);
        defs.push(Definition::new(DefinitionKind::Unknown, SmolStr::new("unknown")));
        defs.push(Definition::new(DefinitionKind::Module, SmolStr::new("(root)")));
        Self {
            defs,
            root: DefId(1),
        }
    }

    /// The explicit root scope.
    #[inline]
    pub fn root(&self) -> DefId {
        self.root
    }

    /// Borrow a definition. The unknown sentinel is a real entry, so this
    /// never fails for ids produced by this registry.
    pub fn get(&self, id: DefId) -> &Definition {
        &self.defs[id.0 as usize]
    }

    fn get_mut(&mut self, id: DefId) -> &mut Definition {
        &mut self.defs[id.0 as usize]
    }

    /// Number of definitions, the sentinel and root included.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// A fresh registry is never empty; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Idempotent upsert of a member definition in `scope`.
    ///
    /// Redefinition merges: the existing entry keeps its members and
    /// superclass link, only the position is refreshed.
    pub fn define(
        &mut self,
        scope: DefId,
        kind: DefinitionKind,
        name: &str,
        pos: Option<LineCol>,
    ) -> DefId {
        let key = (kind, SmolStr::new(name));
        if let Some(&existing) = self.get(scope).members.get(&key) {
            if pos.is_some() {
                self.get_mut(existing).pos = pos;
            }
            return existing;
        }

        let id = DefId(self.defs.len() as u32);
        let mut def = Definition::new(kind, key.1.clone());
        def.pos = pos;
        self.defs.push(def);
        self.get_mut(scope).members.insert(key, id);
        id
    }

    /// Rebind a variable member of `scope` with a fresh arena entry.
    ///
    /// The new entry replaces the previous binding in the member table, so
    /// later lookups see the new binding while references that already
    /// resolved keep the definition they observed. Variable reassignment
    /// must go through this instead of [`DefinitionRegistry::define`]:
    /// mutating the merged entry in place would retroactively change the
    /// type every earlier read reports.
    pub fn rebind(
        &mut self,
        scope: DefId,
        kind: DefinitionKind,
        name: &str,
        pos: Option<LineCol>,
    ) -> DefId {
        let id = DefId(self.defs.len() as u32);
        let mut def = Definition::new(kind, SmolStr::new(name));
        def.pos = pos;
        self.defs.push(def);
        self.get_mut(scope).members.insert((kind, SmolStr::new(name)), id);
        id
    }

    /// Attach an ancestor link to a class definition. Later lookups walk
    /// this link for inherited members.
    pub fn declare_inherits(&mut self, class: DefId, ancestor: DefId) {
        if class.is_unknown() || ancestor.is_unknown() || class == ancestor {
            return;
        }
        self.get_mut(class).superclass = Some(ancestor);
    }

    /// Bind a variable definition's current value.
    pub fn set_value(&mut self, id: DefId, value: DefId) {
        if id.is_unknown() {
            return;
        }
        self.get_mut(id).value = if value.is_unknown() { None } else { Some(value) };
    }

    /// Mark the given definition builtin.
    pub fn mark_builtin(&mut self, id: DefId) {
        if !id.is_unknown() {
            self.get_mut(id).builtin = true;
        }
    }

    /// Record that a reference resolved to this definition.
    pub fn mark_used(&mut self, id: DefId) {
        if !id.is_unknown() {
            self.get_mut(id).used = true;
        }
    }

    /// Direct member lookup, no inheritance.
    pub fn member(&self, scope: DefId, kind: DefinitionKind, name: &str) -> Option<DefId> {
        self.get(scope)
            .members
            .get(&(kind, SmolStr::new(name)))
            .copied()
    }

    /// Member lookup walking the ancestor chain, cycle-guarded.
    ///
    /// Returns [`DefId::UNKNOWN`] on a miss — callers must treat that as
    /// data, never as an error.
    pub fn lookup_in(&self, scope: DefId, kind: DefinitionKind, name: &str) -> DefId {
        let mut current = scope;
        let mut visited = FxHashSet::default();

        while visited.insert(current) {
            if let Some(found) = self.member(current, kind, name) {
                return found;
            }
            match self.get(current).superclass {
                Some(ancestor) => current = ancestor,
                None => break,
            }
        }

        DefId::UNKNOWN
    }

    /// Derive the "definition type" name used by type-comparison checks.
    ///
    /// Built-in constructs and classes answer with their own name, variables
    /// with the type of their bound value, constants with their own name.
    /// Anything else — methods, arguments without values, the unknown
    /// sentinel — is unresolved (`None`).
    pub fn definition_type(&self, id: DefId) -> Option<&str> {
        let mut current = id;
        let mut visited = FxHashSet::default();

        while visited.insert(current) {
            if current.is_unknown() {
                return None;
            }
            let def = self.get(current);
            match def.kind {
                DefinitionKind::Class | DefinitionKind::Module | DefinitionKind::Constant => {
                    return Some(&def.name);
                }
                kind if kind.is_variable() => match def.value {
                    Some(value) => current = value,
                    None => return None,
                },
                _ => return None,
            }
        }

        None
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered stack of active definition contexts at a traversal point.
///
/// Resolution walks the frames innermost→outermost, then each frame's
/// ancestor chain. The root frame is permanent: [`ScopeStack::exit_scope`]
/// never pops it, so balance violations cannot cascade past a run's root.
#[derive(Clone, Debug)]
pub struct ScopeStack {
    frames: Vec<DefId>,
}

impl ScopeStack {
    /// Create a stack with the given root frame.
    pub fn new(root: DefId) -> Self {
        Self { frames: vec![root] }
    }

    /// The innermost active scope.
    pub fn current(&self) -> DefId {
        *self.frames.last().unwrap_or(&DefId::UNKNOWN)
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a scope frame.
    pub fn enter_scope(&mut self, def: DefId) {
        self.frames.push(def);
    }

    /// Pop the innermost frame. The root frame stays put.
    pub fn exit_scope(&mut self) -> Option<DefId> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// The innermost frame whose definition satisfies `pred`, else the
    /// outermost (root) frame.
    pub fn innermost_where<F>(&self, registry: &DefinitionRegistry, pred: F) -> DefId
    where
        F: Fn(&Definition) -> bool,
    {
        self.frames
            .iter()
            .rev()
            .copied()
            .find(|&id| pred(registry.get(id)))
            .unwrap_or_else(|| self.frames[0])
    }

    /// Resolve a name against the active scopes.
    ///
    /// Direct members of each frame are consulted innermost→outermost
    /// first; only then are the frames' ancestor chains walked, so a
    /// shadowing local wins over an inherited member.
    pub fn lookup(
        &self,
        registry: &DefinitionRegistry,
        kind: DefinitionKind,
        name: &str,
    ) -> DefId {
        for &frame in self.frames.iter().rev() {
            if let Some(found) = registry.member(frame, kind, name) {
                return found;
            }
        }
        for &frame in self.frames.iter().rev() {
            let found = registry.lookup_in(frame, kind, name);
            if !found.is_unknown() {
                return found;
            }
        }
        DefId::UNKNOWN
    }
}
