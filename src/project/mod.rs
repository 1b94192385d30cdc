//! Project-level services: mapping namespaced constant names to the files
//! that may define them.

mod const_resolver;

pub use const_resolver::{ConfigError, ConstantResolver};
