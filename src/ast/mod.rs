//! Syntax tree representation and traversal.
//!
//! The concrete-syntax parser lives outside this crate; it hands us
//! [`RawNode`] records with opaque tags. [`build_tree`] normalizes those
//! into [`Node`] values with a closed [`NodeKind`] classification, and
//! [`TreeIterator`] drives [`Listener`] implementations over the result.

mod iterator;
mod node;

pub use iterator::{Listener, TreeIterator};
pub use node::{build_tree, Node, NodeId, NodeKind, RawNode};
