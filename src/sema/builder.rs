//! The ingestion DSL for standard-library stub definitions.
//!
//! The hand-authored stub corpus is pure data replayed through exactly five
//! primitives: define a named construct, declare inheritance, define a
//! method, define an instance method, define an argument. The corpus itself
//! lives outside this crate; [`install_core_types`] ships the minimal
//! bootstrap the semantic walker needs for literal types.

use super::definitions::{DefId, DefinitionKind, DefinitionRegistry};

/// Fluent builder targeting one scope of the registry.
///
/// Everything defined through a builder is marked builtin, since this is
/// the stub-ingestion path — user code enters the registry through the
/// semantic walker instead.
pub struct DefinitionBuilder<'a> {
    registry: &'a mut DefinitionRegistry,
    scope: DefId,
}

impl<'a> DefinitionBuilder<'a> {
    /// Create a builder targeting the registry's root scope.
    pub fn new(registry: &'a mut DefinitionRegistry) -> Self {
        let scope = registry.root();
        Self { registry, scope }
    }

    /// The scope this builder defines into.
    pub fn scope(&self) -> DefId {
        self.scope
    }

    /// Primitive 1: define a named construct of the given kind, then run
    /// `body` with a builder targeting it.
    pub fn construct(
        &mut self,
        kind: DefinitionKind,
        name: &str,
        body: impl FnOnce(&mut DefinitionBuilder<'_>),
    ) -> DefId {
        let id = self.registry.define(self.scope, kind, name, None);
        self.registry.mark_builtin(id);
        let mut child = DefinitionBuilder {
            registry: self.registry,
            scope: id,
        };
        body(&mut child);
        id
    }

    /// Primitive 2: declare that the current construct inherits from a
    /// root-level class, defining a placeholder for it when the corpus
    /// declares the ancestor later.
    pub fn inherits(&mut self, ancestor: &str) -> &mut Self {
        let root = self.registry.root();
        let ancestor_id = self.registry.define(root, DefinitionKind::Class, ancestor, None);
        self.registry.mark_builtin(ancestor_id);
        self.registry.declare_inherits(self.scope, ancestor_id);
        self
    }

    /// Primitive 3: define a method on the construct itself.
    pub fn method(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut DefinitionBuilder<'_>),
    ) -> DefId {
        self.construct(DefinitionKind::Method, name, body)
    }

    /// Primitive 4: define a method on instances of the construct.
    pub fn instance_method(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut DefinitionBuilder<'_>),
    ) -> DefId {
        self.construct(DefinitionKind::InstanceMethod, name, body)
    }

    /// Primitive 5: define an argument of the current method.
    pub fn argument(&mut self, name: &str) -> DefId {
        let id = self
            .registry
            .define(self.scope, DefinitionKind::Argument, name, None);
        self.registry.mark_builtin(id);
        id
    }
}

/// Ingest the core built-in types the walker needs to type literals.
///
/// Straight-line configuration code over the five primitives; hosts extend
/// the same registry with the full stub corpus through [`DefinitionBuilder`].
pub fn install_core_types(registry: &mut DefinitionRegistry) {
    let mut b = DefinitionBuilder::new(registry);

    b.construct(DefinitionKind::Class, "Object", |c| {
        c.instance_method("==", |m| {
            m.argument("other");
        });
        c.instance_method("class", |_| {});
        c.instance_method("inspect", |_| {});
        c.method("new", |_| {});
    });

    b.construct(DefinitionKind::Class, "Module", |c| {
        c.inherits("Object");
    });

    b.construct(DefinitionKind::Class, "Class", |c| {
        c.inherits("Module");
    });

    b.construct(DefinitionKind::Class, "String", |c| {
        c.inherits("Object");
        c.instance_method("length", |_| {});
        c.instance_method("empty?", |_| {});
        c.instance_method("include?", |m| {
            m.argument("other");
        });
        c.instance_method("to_sym", |_| {});
    });

    b.construct(DefinitionKind::Class, "Symbol", |c| {
        c.inherits("Object");
        c.instance_method("to_s", |_| {});
    });

    b.construct(DefinitionKind::Class, "Numeric", |c| {
        c.inherits("Object");
    });

    b.construct(DefinitionKind::Class, "Integer", |c| {
        c.inherits("Numeric");
        c.instance_method("times", |_| {});
        c.instance_method("to_f", |_| {});
    });

    b.construct(DefinitionKind::Class, "Float", |c| {
        c.inherits("Numeric");
        c.instance_method("to_i", |_| {});
    });

    b.construct(DefinitionKind::Class, "Array", |c| {
        c.inherits("Object");
        c.instance_method("length", |_| {});
        c.instance_method("push", |m| {
            m.argument("item");
        });
    });

    b.construct(DefinitionKind::Class, "Hash", |c| {
        c.inherits("Object");
        c.instance_method("fetch", |m| {
            m.argument("key");
        });
    });

    b.construct(DefinitionKind::Class, "NilClass", |c| {
        c.inherits("Object");
        c.instance_method("nil?", |_| {});
    });

    b.construct(DefinitionKind::Class, "TrueClass", |c| {
        c.inherits("Object");
    });

    b.construct(DefinitionKind::Class, "FalseClass", |c| {
        c.inherits("Object");
    });
}

/// Convenience: a fresh registry with the core types installed.
pub fn registry_with_core_types() -> DefinitionRegistry {
    let mut registry = DefinitionRegistry::new();
    install_core_types(&mut registry);
    registry
}
