//! Document layer: the parsed element tree and typed attribute access.
//!
//! This module is intentionally separate from graph building. It owns:
//! - the element tree built from the quick-xml event stream
//! - typed accessors (integers, keywords, hex payloads)
//! - the element/attribute names of the schema

pub mod attr;
pub mod schema;
pub mod tree;

pub use tree::{Element, Scan, parse_document};
