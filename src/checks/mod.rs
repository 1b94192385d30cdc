//! Lint passes. Every check is an ordinary [`Listener`] over the shared
//! tree iterator; checks read associations and write diagnostics, nothing
//! else.

mod contradictory_equality;

pub use contradictory_equality::ContradictoryEquality;

use crate::ast::Listener;
use crate::sema::RunContext;

/// The checks an analysis run binds by default.
pub fn default_checks() -> Vec<Box<dyn Listener<RunContext>>> {
    vec![Box::new(ContradictoryEquality::new())]
}
