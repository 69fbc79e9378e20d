use std::fmt;

/// Error kind for store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Create called for an id that already has a record.
    DuplicateKey,
    /// I/O, connection or store-internal failure.
    Unavailable,
    /// Caller-supplied path segment is not a plain field name.
    MalformedPath,
    /// An intermediate level of the addressed path exists but is not an object.
    PathConflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::DuplicateKey => f.write_str("duplicate_key"),
            ErrorKind::Unavailable => f.write_str("unavailable"),
            ErrorKind::MalformedPath => f.write_str("malformed_path"),
            ErrorKind::PathConflict => f.write_str("path_conflict"),
        }
    }
}

/// Store error, returned by all `CorrelationStore` methods and path constructors.
#[derive(Debug, Clone)]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn duplicate_key(id: &str) -> Self {
        Self {
            kind: ErrorKind::DuplicateKey,
            message: format!("record '{id}' already exists"),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Unavailable, message: msg.into() }
    }

    pub fn malformed_path(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::MalformedPath, message: msg.into() }
    }

    pub fn path_conflict(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::PathConflict, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// From impls: backend error types → StoreError::Unavailable
// ---------------------------------------------------------------------------

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::unavailable(e.to_string())
    }
}

/// A stored document that no longer parses is a store-internal failure,
/// not a caller error.
impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::unavailable(format!("corrupt document: {e}"))
    }
}
