//! Utility functions.

pub mod parser;

pub use parser::parse_ttl;
