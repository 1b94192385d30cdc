//! Flags equality comparisons whose operands are known to have different
//! types, and which therefore always evaluate to false.

use crate::ast::{Listener, Node, NodeKind};
use crate::sema::RunContext;

const CHECK: &str = "contradictory_equality";

/// Method names treated as equality comparisons.
const EQUALITY_METHODS: [&str; 3] = ["==", "eql?", "equal?"];

/// The contradictory-equality check.
///
/// Reads the associations the semantic pass established; both operands must
/// resolve to a definition with a derivable type before anything is flagged.
/// Anything unknown or unresolved is skipped, so the check never guesses.
pub struct ContradictoryEquality;

impl ContradictoryEquality {
    pub fn new() -> Self {
        Self
    }

    fn definition_type<'a>(ctx: &'a RunContext, node: &Node) -> Option<&'a str> {
        let def = ctx.associations.get(node.id());
        if def.is_unknown() {
            return None;
        }
        ctx.registry.definition_type(def)
    }
}

impl Default for ContradictoryEquality {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener<RunContext> for ContradictoryEquality {
    fn leave(&mut self, node: &mut Node, ctx: &mut RunContext) {
        if node.event() != &NodeKind::Send {
            return;
        }
        let Some(name) = node.name() else { return };
        if !EQUALITY_METHODS.contains(&name) {
            return;
        }

        let Some(receiver) = node.key() else { return };
        let Some(argument) = node.children().first() else {
            return;
        };

        if ctx.report.already_reported(node, CHECK) {
            return;
        }

        let Some(left) = Self::definition_type(ctx, receiver) else {
            return;
        };
        let Some(right) = Self::definition_type(ctx, argument) else {
            return;
        };

        if left != right {
            let message =
                format!("comparing {left} with {right} using `{name}` is always false");
            ctx.report.warn_node(CHECK, node, message);
        }
    }
}
