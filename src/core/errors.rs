/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of a lock an operation targeted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LockFacet {
    /// Exclusive mutex
    Mutex,
    /// Shared side of a read-write lock
    Read,
    /// Exclusive side of a read-write lock
    Write,
}

impl LockFacet {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LockFacet::Mutex => "mutex",
            LockFacet::Read => "read",
            LockFacet::Write => "write",
        }
    }
}

impl fmt::Display for LockFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock contract violations with serialization support
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LockError {
    #[error("lock not held ({facet})")]
    #[diagnostic(
        code(lock::not_held),
        help("unlock() was called without a matching lock(). Check for double-unlock or unbalanced lock/unlock pairs.")
    )]
    NotHeld { facet: LockFacet },

    #[error("lock unavailable ({facet})")]
    #[diagnostic(
        code(lock::would_block),
        help("The lock is held or has queued waiters. Use lock().await to wait for it.")
    )]
    WouldBlock { facet: LockFacet },
}

impl LockError {
    #[inline]
    pub const fn not_held(facet: LockFacet) -> Self {
        LockError::NotHeld { facet }
    }

    #[inline]
    pub const fn would_block(facet: LockFacet) -> Self {
        LockError::WouldBlock { facet }
    }

    /// Facet the failed operation targeted
    pub const fn facet(&self) -> LockFacet {
        match self {
            LockError::NotHeld { facet } | LockError::WouldBlock { facet } => *facet,
        }
    }

    /// True for unbalanced-unlock errors, which indicate a caller bug
    pub const fn is_not_held(&self) -> bool {
        matches!(self, LockError::NotHeld { .. })
    }
}

/// Serializable error representation for API responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SerializableError {
    /// Create a new serializable error
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a new serializable error with details
    pub fn with_details(
        error_type: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

impl From<LockError> for SerializableError {
    fn from(err: LockError) -> Self {
        let error_type = match &err {
            LockError::NotHeld { .. } => "not_held",
            LockError::WouldBlock { .. } => "would_block",
        };
        SerializableError::with_details(error_type, err.to_string(), err.facet().as_str())
    }
}

/// Result type for lock operations
///
/// # Must Use
/// An `Err` from `unlock()` is a programming error and must not be discarded
pub type Result<T> = std::result::Result<T, LockError>;
