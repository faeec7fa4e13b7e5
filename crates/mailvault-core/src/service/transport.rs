//! Mail transport seam.
//!
//! The IMAP/SMTP clients live outside this crate; they plug in through
//! [`MailTransport`] and are built per account by a [`TransportFactory`].

use std::future::Future;

use crate::config::AccountConfig;
use crate::message::{
    AttachmentData, AttachmentSelection, Email, EmailHeader, Folder, HeaderFilters, OutgoingMessage,
};

/// Errors reported by a mail transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Message or folder doesn't exist on the server.
    #[error("Not found on server: {0}")]
    NotFound(String),

    /// Operation did not finish within the account timeout.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Operation failed.
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Mail operations for one account with resolved credentials.
pub trait MailTransport: Send + Sync {
    /// Lists the mailbox folders.
    fn list_folders(&self) -> impl Future<Output = Result<Vec<Folder>, TransportError>> + Send;

    /// Lists message envelopes in `folder`, newest first, at most `limit`.
    fn fetch_headers(
        &self,
        folder: &str,
        filters: &HeaderFilters,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<EmailHeader>, TransportError>> + Send;

    /// Fetches one message with its bodies.
    fn fetch_email(
        &self,
        message_id: &str,
    ) -> impl Future<Output = Result<Email, TransportError>> + Send;

    /// Downloads the selected attachments of a message.
    fn fetch_attachments(
        &self,
        message_id: &str,
        selection: &AttachmentSelection,
    ) -> impl Future<Output = Result<Vec<AttachmentData>, TransportError>> + Send;

    /// Sends a message.
    fn send_email(
        &self,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Builds the transport for an account.
pub trait TransportFactory: Send + Sync {
    /// Transport type produced.
    type Transport: MailTransport;

    /// Creates a transport for `account`. Connecting may be deferred to the
    /// first operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the account can't be served by this factory.
    fn build(&self, account: &AccountConfig) -> Result<Self::Transport, TransportError>;
}
