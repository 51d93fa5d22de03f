use alloc::string::String;

use thiserror::Error;

/// Result alias for reader operations.
pub type Result<T, E = ReadError> = core::result::Result<T, E>;

/// A failure of the underlying byte transport (fill source or sink).
///
/// Transport failures originate below the reader, so they carry no JSONPath.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StreamError {
    message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors reported by [`JsonReader`](crate::JsonReader).
///
/// Two kinds dominate: [`Syntax`](ReadError::Syntax) for malformed input and
/// [`Data`](ReadError::Data) for well-formed input that does not match the
/// requested shape. Both embed the reader's JSONPath at the point of failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The input is not well-formed JSON (or requires lenient mode).
    #[error("{msg} at path {path}")]
    Syntax { msg: String, path: String },

    /// The next token does not have the requested type or value range.
    #[error("{msg} at path {path}")]
    Data { msg: String, path: String },

    /// The input ended in the middle of a token or value.
    #[error("End of input at path {path}")]
    UnexpectedEof { path: String },

    /// An operation other than `close` was attempted on a closed reader.
    #[error("Reader is closed")]
    Closed,

    /// `close` was called while a value source from `next_source` was still
    /// open.
    #[error("Source from next_source() was not exhausted")]
    ValueSourceOpen,

    /// Object/array nesting exceeded the depth ceiling.
    #[error("Nesting too deep at path {path}")]
    NestingTooDeep { path: String },

    /// The underlying byte stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ReadError {
    /// The JSONPath at which the error was raised, if the error carries one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ReadError::Syntax { path, .. }
            | ReadError::Data { path, .. }
            | ReadError::UnexpectedEof { path }
            | ReadError::NestingTooDeep { path } => Some(path),
            ReadError::Closed | ReadError::ValueSourceOpen | ReadError::Stream(_) => None,
        }
    }

    /// Returns `true` for malformed-input errors.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ReadError::Syntax { .. })
    }

    /// Returns `true` for shape-mismatch errors on well-formed input.
    pub fn is_data(&self) -> bool {
        matches!(self, ReadError::Data { .. })
    }
}
