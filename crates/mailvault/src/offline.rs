//! Transport stand-in for commands that only touch local storage.

use mailvault_core::config::AccountConfig;
use mailvault_core::message::{
    AttachmentData, AttachmentSelection, Email, EmailHeader, Folder, HeaderFilters, OutgoingMessage,
};
use mailvault_core::{MailTransport, TransportError, TransportFactory};

/// Builds [`OfflineTransport`]s.
#[derive(Debug, Clone, Copy)]
pub struct OfflineFactory;

impl TransportFactory for OfflineFactory {
    type Transport = OfflineTransport;

    fn build(&self, account: &AccountConfig) -> Result<OfflineTransport, TransportError> {
        Ok(OfflineTransport {
            account: account.id.clone(),
        })
    }
}

/// Refuses every network operation.
#[derive(Debug)]
pub struct OfflineTransport {
    account: String,
}

impl OfflineTransport {
    fn refuse(&self) -> TransportError {
        TransportError::Connection(format!("{} has no mail transport in this tool", self.account))
    }
}

impl MailTransport for OfflineTransport {
    async fn list_folders(&self) -> Result<Vec<Folder>, TransportError> {
        Err(self.refuse())
    }

    async fn fetch_headers(
        &self,
        _folder: &str,
        _filters: &HeaderFilters,
        _limit: usize,
    ) -> Result<Vec<EmailHeader>, TransportError> {
        Err(self.refuse())
    }

    async fn fetch_email(&self, _message_id: &str) -> Result<Email, TransportError> {
        Err(self.refuse())
    }

    async fn fetch_attachments(
        &self,
        _message_id: &str,
        _selection: &AttachmentSelection,
    ) -> Result<Vec<AttachmentData>, TransportError> {
        Err(self.refuse())
    }

    async fn send_email(&self, _message: OutgoingMessage) -> Result<(), TransportError> {
        Err(self.refuse())
    }
}
