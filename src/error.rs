//! Error type shared by every compilation stage.
//!
//! Each variant belongs to one of three [`ErrorKind`]s. Line numbers refer to
//! the start tag of the offending element in the input document.

use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Coarse classification, ordered by reporting severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// The arena could not grow.
    Allocation,
    /// The document is malformed or violates the configuration schema.
    Document,
    /// The compiler produced inconsistent data of its own.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("allocation of {what} failed")]
    Allocation { what: &'static str },

    #[error("malformed document: {0}")]
    Markup(String),

    #[error("line {line}: <{element}> is missing mandatory element <{child}>")]
    MissingElement {
        element: String,
        child: String,
        line: usize,
    },

    #[error("line {line}: <{element}> is missing mandatory attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: String,
        line: usize,
    },

    #[error("line {line}: attribute '{attribute}' of <{element}> is not a number: '{value}'")]
    InvalidLiteral {
        element: String,
        attribute: String,
        value: String,
        line: usize,
    },

    #[error("line {line}: attribute '{attribute}' of <{element}> is out of range: {value} > {max}")]
    OutOfRange {
        element: String,
        attribute: String,
        value: String,
        max: u64,
        line: usize,
    },

    #[error("line {line}: attribute '{attribute}' of <{element}> has invalid value '{value}'")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
        line: usize,
    },

    #[error("line {line}: {message}")]
    Structure { message: String, line: usize },

    #[error("{0}")]
    Reference(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Allocation { .. } => ErrorKind::Allocation,
            CompileError::Internal(_) => ErrorKind::Internal,
            _ => ErrorKind::Document,
        }
    }

    pub(crate) fn structure(line: usize, message: impl Into<String>) -> Self {
        CompileError::Structure {
            message: message.into(),
            line,
        }
    }

    pub(crate) fn reference(message: impl Into<String>) -> Self {
        CompileError::Reference(message.into())
    }
}
