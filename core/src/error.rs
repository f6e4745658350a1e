//! Stable error kinds for the engine. Callers match on [`ErrorKind`], never
//! on the `Display` text — wrapping may add context but must never lose it.

use std::fmt;

/// A stable, matchable error category. See spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Read of a nonexistent or soft-deleted row.
    NotFound,
    /// Entity self-validation failed before any backend call.
    ValidationError,
    /// Unique-constraint violation on insert.
    Conflict,
    /// Guarded update affected zero rows.
    VersionConflict,
    /// A pessimistic lock held by another user blocks the mutation.
    LockHeld,
    /// Deadline expired or the backend reported cancellation.
    Timeout,
    /// Any other backend failure: connection, I/O, syntax.
    BackendError,
    /// Engine initialization failed.
    InitError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::VersionConflict => "VERSION_CONFLICT",
            ErrorKind::LockHeld => "LOCK_HELD",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::BackendError => "BACKEND_ERROR",
            ErrorKind::InitError => "INIT_ERROR",
        };
        f.write_str(s)
    }
}

/// The engine's single error type. Carries a stable [`ErrorKind`] plus a
/// human-readable message for logs; the message is not part of the
/// contract and must never be pattern-matched on by callers.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn version_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VersionConflict, message)
    }

    pub fn lock_held(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LockHeld, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendError, message)
    }

    pub fn init(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InitError, message)
    }

    /// Add context to the message without losing the kind.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
