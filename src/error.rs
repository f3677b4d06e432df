//! Contains the error-related types for the `wiredoc` crate.

use thiserror::Error;

/// The result type for all fallible operations in the `wiredoc` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while constructing, reading, or mutating a [`crate::Document`].
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// An optional message giving more detail about the error.
    pub message: Option<String>,

    /// The document path associated with the error, if any.
    pub path: Option<String>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wiredoc error")?;

        if let Some(path) = self.path.as_deref() {
            write!(f, " at path \"{path}\"")?;
        }

        write!(f, ". Kind: {}", self.kind)?;
        if let Some(ref message) = self.message {
            write!(f, ". Message: {message}")?;
        }

        write!(f, ".")
    }
}

/// The kinds of errors that can occur in the `wiredoc` crate. These map directly onto the
/// error kinds named in the design: a type mismatch on a scalar accessor, a missing path, an
/// invalid map key, an out-of-bounds array index, a corrupt tag byte, writing past a writer
/// that has already closed, mutating a read-only buffer, or constructing a document with an
/// unsupported mode.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A scalar accessor (`as_integer`, `as_string`, ...) was called on a value of a
    /// different kind. No implicit coercion is performed.
    #[error("value has the wrong type for this operation")]
    TypeMismatch {
        /// The kind that was expected.
        expected: &'static str,
        /// The kind that was actually found.
        found: &'static str,
    },

    /// A `force`d filter or projection did not find every requested path.
    #[error("path was not found")]
    PathNotFound {},

    /// A map key was empty or contained characters other than ASCII alphanumerics and `_`.
    #[error("\"{key}\" is not a valid map key")]
    InvalidKey {
        /// The offending key.
        key: String,
    },

    /// An array index (for projection) was not within the bounds of the array.
    #[error("index {index} is out of bounds for an array of size {size}")]
    OutOfBounds {
        /// The requested index.
        index: usize,
        /// The size of the array.
        size: usize,
    },

    /// A tag byte did not correspond to any known value kind, or a container's stored
    /// `byte_size`/`count` header was inconsistent with the bytes that followed it.
    #[error("corrupt encoding")]
    CorruptEncoding {},

    /// A write was attempted on a [`crate::writer::Writer`] that had already closed (its
    /// outermost container ended, or a top-level scalar was already written).
    #[error("writer is already closed")]
    WriterClosed {},

    /// A mutating operation (`insert`, `add`) was attempted against a document that does not
    /// own or mutably borrow its buffer.
    #[error("cannot mutate a read-only document")]
    ReadOnlyViolation {},

    /// An unrecognized [`crate::document::DocumentMode`] or unsupported construction path was
    /// requested.
    #[error("unsupported mode: {message}")]
    UnsupportedMode {
        /// A description of what was unsupported.
        message: String,
    },
}

impl Error {
    pub(crate) fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub(crate) fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub(crate) fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::from(ErrorKind::TypeMismatch { expected, found })
    }

    pub(crate) fn path_not_found() -> Self {
        Self::from(ErrorKind::PathNotFound {})
    }

    pub(crate) fn invalid_key(key: impl Into<String>) -> Self {
        Self::from(ErrorKind::InvalidKey { key: key.into() })
    }

    pub(crate) fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::from(ErrorKind::OutOfBounds { index, size })
    }

    pub(crate) fn corrupt_encoding() -> Self {
        Self::from(ErrorKind::CorruptEncoding {})
    }

    pub(crate) fn writer_closed() -> Self {
        Self::from(ErrorKind::WriterClosed {})
    }

    pub(crate) fn read_only_violation() -> Self {
        Self::from(ErrorKind::ReadOnlyViolation {})
    }

    pub(crate) fn unsupported_mode(message: impl Into<String>) -> Self {
        Self::from(ErrorKind::UnsupportedMode {
            message: message.into(),
        })
    }

    /// Returns `true` if this error is a [`ErrorKind::CorruptEncoding`].
    pub fn is_corrupt_encoding(&self) -> bool {
        matches!(self.kind, ErrorKind::CorruptEncoding {})
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            path: None,
        }
    }
}
