//! Error types for the model and the collaborator ports

use crate::types::RootCauseId;

/// Model construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Unknown taxonomy type, or a type/project combination that cannot exist
    #[error("illegal root cause type: {0}")]
    IllegalType(String),
}

/// Errors reported by a [`RootCauseStore`](crate::RootCauseStore)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record addressed by id does not exist
    #[error("record not found: {0}")]
    NotFound(RootCauseId),

    /// Write rejected by a storage-level unique index
    #[error("unique index '{index}' violated by name '{name}'")]
    UniqueViolation {
        /// Index that rejected the write
        index: String,
        /// Offending name
        name: String,
    },

    /// Storage temporarily unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create unique-violation error
    pub fn unique_violation(index: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UniqueViolation {
            index: index.into(),
            name: name.into(),
        }
    }

    /// Check if error is transient
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors reported by a [`TestRunLinkBreaker`](crate::TestRunLinkBreaker)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// Test-run service temporarily unreachable
    #[error("test run service unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("test run backend error: {0}")]
    Backend(String),
}

impl LinkError {
    /// Check if error is transient
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
