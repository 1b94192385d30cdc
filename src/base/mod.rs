//! Foundation types for the lintel semantic core.
//!
//! This module has NO dependencies on other lintel modules.

mod span;

pub use span::LineCol;
