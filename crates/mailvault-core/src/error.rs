//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::service::TransportError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested entry, record or message is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entry exists on disk but is past its age window.
    #[error("Expired: {0}")]
    Expired(String),

    /// Migration destination exists, or several folders claim one identity.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Filesystem boundary error, with the operation and path that failed.
    #[error("I/O error while {context}: {source}")]
    Io {
        /// Operation and path that failed.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed record or invalid request parameter.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Account not found in the configuration.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Mail transport reported a failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Identity rewrite failed after a folder rename; the rename was undone.
    #[error(
        "Failed to relabel {} (folder restored to {}): {source}",
        to.display(),
        from.display()
    )]
    MigrationRolledBack {
        /// Original folder location.
        from: PathBuf,
        /// Destination that was attempted.
        to: PathBuf,
        /// Identity write failure.
        #[source]
        source: Box<Error>,
    },

    /// Identity rewrite failed and the folder could not be moved back.
    #[error(
        "Failed to relabel {} and could not restore {}: {source}; rollback error: {rollback}",
        to.display(),
        from.display()
    )]
    RollbackFailed {
        /// Original folder location.
        from: PathBuf,
        /// Where the folder now lives.
        to: PathBuf,
        /// Identity write failure.
        #[source]
        source: Box<Error>,
        /// Rename-back failure.
        rollback: std::io::Error,
    },

    /// A lock guarding shared state was poisoned by a panicking holder.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl Error {
    /// Returns a mapper that wraps an I/O error with operation context.
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    /// Whether the caller should fetch the item from the mail server again.
    #[must_use]
    pub const fn requires_refetch(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Expired(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_mapper_keeps_context() {
        let err = Error::io("reading /tmp/x")(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "I/O error while reading /tmp/x: boom");
    }

    #[test]
    fn refetch_signal() {
        assert!(Error::NotFound("a".into()).requires_refetch());
        assert!(Error::Expired("a".into()).requires_refetch());
        assert!(!Error::Conflict("a".into()).requires_refetch());
        assert!(!Error::Validation("a".into()).requires_refetch());
    }
}
