//! Compiler for MOST network configuration documents.
//!
//! [`compile`] turns a `<Unicens>` document into a [`Configuration`]: the
//! resource graph of every node, the routes between endpoints, the
//! per-node init scripts and the driver-channel records.

pub mod compile;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod model;
pub mod render;

pub use compile::{compile, compile_script, compile_script_with, compile_with};
pub use error::{CompileError, CompileResult, ErrorKind};
pub use model::Configuration;
