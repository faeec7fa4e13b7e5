//! Mail service facade.
//!
//! Every operation takes an optional account id; `None` or an empty id
//! means the configured default. Storage work is synchronous and bounded;
//! transport calls are wrapped in the account timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::registry::{AccountHandle, AccountRegistry};
use super::transport::{MailTransport, TransportError, TransportFactory};
use crate::attachments::SavedAttachment;
use crate::bootstrap::{self, BootstrapReport};
use crate::cache::{CacheStats, EvictionSummary};
use crate::config::{Config, Provider};
use crate::content::{BodyChunk, BodyFormat, DEFAULT_CHUNK_LIMIT, DEFAULT_PREVIEW_LENGTH, MessageSummary};
use crate::drafts::{Draft, DraftSummary};
use crate::message::{
    AttachmentData, AttachmentSelection, EmailHeader, Folder, HeaderFilters, OutgoingMessage,
    SendRequest,
};
use crate::{Error, Result};

/// Shortest pause between drafts in a batch send.
pub const MIN_BATCH_DELAY: Duration = Duration::from_secs(2);
/// Longest pause between drafts in a batch send.
pub const MAX_BATCH_DELAY: Duration = Duration::from_secs(60);

/// Configured account as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    /// Account id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Provider preset.
    pub provider: Provider,
    /// Whether requests without an account id go here.
    pub is_default: bool,
}

/// Options for sending every saved draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSendOptions {
    /// Pause between drafts, clamped to 2..=60 seconds.
    pub delay: Duration,
    /// Check drafts without sending or deleting them.
    pub dry_run: bool,
    /// Stop at the first failure.
    pub stop_on_error: bool,
}

impl Default for BatchSendOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            dry_run: false,
            stop_on_error: false,
        }
    }
}

/// Outcome for one draft in a batch send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSendStatus {
    /// Sent and removed from drafts.
    Sent,
    /// Would have been sent.
    WouldSend,
    /// Not sent.
    Failed,
}

/// Result for one draft in a batch send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftSendResult {
    /// Draft id.
    pub draft_id: String,
    /// Subject line.
    pub subject: String,
    /// Primary recipients.
    pub to: Vec<String>,
    /// What happened.
    pub status: DraftSendStatus,
    /// Why it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Multi-account mail service.
#[derive(Debug)]
pub struct MailService<F: TransportFactory> {
    config: Arc<Config>,
    registry: AccountRegistry<F>,
    bootstrap: BootstrapReport,
}

impl<F: TransportFactory> MailService<F> {
    /// Runs the load pass (migrations first) and sets up the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the files root can't be prepared.
    pub fn new(config: Config, factory: F) -> Result<Self> {
        let bootstrap = bootstrap::prepare(&config)?;
        let config = Arc::new(config);
        Ok(Self {
            registry: AccountRegistry::new(Arc::clone(&config), factory),
            config,
            bootstrap,
        })
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// What the load pass did.
    #[must_use]
    pub const fn bootstrap_report(&self) -> &BootstrapReport {
        &self.bootstrap
    }

    /// Handle of an account, built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] for an unknown id.
    pub async fn account(&self, id: Option<&str>) -> Result<Arc<AccountHandle<F::Transport>>> {
        self.registry.get(id).await
    }

    /// Configured accounts, default first, then by id.
    #[must_use]
    pub fn list_accounts(&self) -> Vec<AccountInfo> {
        let mut accounts: Vec<AccountInfo> = self
            .config
            .accounts
            .values()
            .map(|account| AccountInfo {
                id: account.id.clone(),
                email: account.email.clone(),
                provider: account.provider,
                is_default: self.config.is_default(&account.id),
            })
            .collect();
        accounts.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.id.cmp(&b.id)));
        accounts
    }

    /// Fetches a message into the cache unless it is already there, and
    /// returns its envelope with a preview.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or the cache write fails.
    pub async fn fetch_and_cache(
        &self,
        account: Option<&str>,
        message_id: &str,
        preview_length: Option<usize>,
    ) -> Result<MessageSummary> {
        require("message_id", message_id)?;
        let handle = self.account(account).await?;

        if handle.content.is_cached(message_id) {
            debug!("Message {message_id} already cached for {}", handle.account.id);
        } else {
            let email = with_timeout(&handle, handle.transport.fetch_email(message_id)).await?;
            handle.content.save(&email, &handle.account.id)?;
        }

        handle
            .content
            .summary(message_id, preview_length.unwrap_or(DEFAULT_PREVIEW_LENGTH))
    }

    /// Reads one window of a cached body.
    ///
    /// # Errors
    ///
    /// Returns an error whose [`Error::requires_refetch`] is true if the
    /// message is absent or expired, [`Error::Validation`] for bad window
    /// parameters, or an I/O error.
    pub async fn read_cached_body(
        &self,
        account: Option<&str>,
        message_id: &str,
        format: BodyFormat,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<BodyChunk> {
        require("message_id", message_id)?;
        let handle = self.account(account).await?;
        handle
            .content
            .read_chunk(message_id, format, offset, limit.unwrap_or(DEFAULT_CHUNK_LIMIT))
    }

    /// Cache statistics of an account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] for an unknown id.
    pub async fn cache_stats(&self, account: Option<&str>) -> Result<CacheStats> {
        self.account(account).await?.ledger.stats()
    }

    /// Runs an eviction pass on an account's cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger can't be persisted.
    pub async fn evict_cache(&self, account: Option<&str>) -> Result<EvictionSummary> {
        self.account(account).await?.ledger.evict()
    }

    /// Deletes everything in an account's cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger can't be persisted.
    pub async fn clear_cache(&self, account: Option<&str>) -> Result<()> {
        let handle = self.account(account).await?;
        handle.ledger.clear()?;
        info!("Cleared cache for {}", handle.account.id);
        Ok(())
    }

    /// Mailbox folders of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub async fn list_folders(&self, account: Option<&str>) -> Result<Vec<Folder>> {
        let handle = self.account(account).await?;
        with_timeout(&handle, handle.transport.list_folders()).await
    }

    /// Message envelopes of a folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub async fn fetch_headers(
        &self,
        account: Option<&str>,
        folder: &str,
        filters: &HeaderFilters,
        limit: usize,
    ) -> Result<Vec<EmailHeader>> {
        let handle = self.account(account).await?;
        let folder = if folder.trim().is_empty() { "INBOX" } else { folder };
        with_timeout(&handle, handle.transport.fetch_headers(folder, filters, limit)).await
    }

    /// Downloads attachments of a message into the attachment cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if specific names were requested and none
    /// exist, or an error if the transport or ledger fails.
    pub async fn fetch_attachments(
        &self,
        account: Option<&str>,
        message_id: &str,
        selection: &AttachmentSelection,
    ) -> Result<Vec<SavedAttachment>> {
        require("message_id", message_id)?;
        let handle = self.account(account).await?;
        let downloaded =
            with_timeout(&handle, handle.transport.fetch_attachments(message_id, selection)).await?;

        let mut saved = Vec::new();
        for attachment in downloaded.iter().filter(|a| selection.includes(&a.filename)) {
            saved.push(handle.attachments.save(&attachment.filename, &attachment.data)?);
        }

        if saved.is_empty() && matches!(selection, AttachmentSelection::Named(names) if !names.is_empty()) {
            return Err(Error::NotFound(format!("requested attachments of {message_id}")));
        }
        Ok(saved)
    }

    /// Sends a message; attachment cache ids are resolved to their files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an incomplete message,
    /// [`Error::NotFound`] for an unknown attachment, or a transport error.
    pub async fn send_email(&self, account: Option<&str>, request: SendRequest) -> Result<()> {
        let handle = self.account(account).await?;
        send_with(&handle, request).await
    }

    /// Saves a new draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft can't be written.
    pub async fn create_draft(&self, account: Option<&str>, request: SendRequest) -> Result<Draft> {
        self.account(account).await?.drafts.create(request)
    }

    /// Loads a draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown draft.
    pub async fn get_draft(&self, account: Option<&str>, draft_id: &str) -> Result<Draft> {
        self.account(account).await?.drafts.get(draft_id)
    }

    /// Saved drafts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the drafts directory can't be listed.
    pub async fn list_drafts(&self, account: Option<&str>) -> Result<Vec<DraftSummary>> {
        self.account(account).await?.drafts.list()
    }

    /// Replaces a draft's contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown draft.
    pub async fn update_draft(
        &self,
        account: Option<&str>,
        draft_id: &str,
        request: SendRequest,
    ) -> Result<Draft> {
        self.account(account).await?.drafts.update(draft_id, request)
    }

    /// Deletes a draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown draft.
    pub async fn delete_draft(&self, account: Option<&str>, draft_id: &str) -> Result<()> {
        self.account(account).await?.drafts.delete(draft_id)
    }

    /// Sends a draft, then removes it.
    ///
    /// A failure to remove the sent draft is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown draft, or any error of
    /// [`Self::send_email`].
    pub async fn send_draft(&self, account: Option<&str>, draft_id: &str) -> Result<Draft> {
        let handle = self.account(account).await?;
        let draft = handle.drafts.get(draft_id)?;
        send_with(&handle, draft.message.clone()).await?;
        if let Err(e) = handle.drafts.delete(draft_id) {
            warn!("Sent draft {draft_id} but could not remove it: {e}");
        }
        Ok(draft)
    }

    /// Sends every saved draft, oldest first, pausing between sends.
    ///
    /// # Errors
    ///
    /// Returns an error only if the drafts can't be listed; per-draft
    /// failures are reported in the results.
    pub async fn send_all_drafts(
        &self,
        account: Option<&str>,
        options: BatchSendOptions,
    ) -> Result<Vec<DraftSendResult>> {
        let handle = self.account(account).await?;
        let mut drafts = handle.drafts.list()?;
        drafts.reverse();
        let delay = options.delay.clamp(MIN_BATCH_DELAY, MAX_BATCH_DELAY);

        let mut results = Vec::with_capacity(drafts.len());
        for (i, summary) in drafts.into_iter().enumerate() {
            if i > 0 && !options.dry_run {
                tokio::time::sleep(delay).await;
            }

            let outcome = match handle.drafts.get(&summary.id) {
                Ok(draft) if options.dry_run => draft.message.validate(),
                Ok(draft) => send_with(&handle, draft.message).await,
                Err(e) => Err(e),
            };

            let (status, error) = match outcome {
                Ok(()) if options.dry_run => (DraftSendStatus::WouldSend, None),
                Ok(()) => {
                    if let Err(e) = handle.drafts.delete(&summary.id) {
                        warn!("Sent draft {} but could not remove it: {e}", summary.id);
                    }
                    (DraftSendStatus::Sent, None)
                }
                Err(e) => (DraftSendStatus::Failed, Some(e.to_string())),
            };
            let failed = status == DraftSendStatus::Failed;
            results.push(DraftSendResult {
                draft_id: summary.id,
                subject: summary.subject,
                to: summary.to,
                status,
                error,
            });
            if failed && options.stop_on_error {
                break;
            }
        }

        let sent = results.iter().filter(|r| r.status == DraftSendStatus::Sent).count();
        info!("Batch send for {}: {sent} of {} sent", handle.account.id, results.len());
        Ok(results)
    }
}

async fn send_with<T: MailTransport>(handle: &AccountHandle<T>, request: SendRequest) -> Result<()> {
    request.validate()?;

    let mut attachments = Vec::with_capacity(request.attachments.len());
    for cache_id in &request.attachments {
        attachments.push(AttachmentData {
            filename: cache_id.clone(),
            content_type: None,
            data: handle.attachments.load(cache_id)?,
        });
    }

    let message = OutgoingMessage {
        to: request.to,
        cc: request.cc,
        bcc: request.bcc,
        subject: request.subject,
        body: request.body,
        html_body: request.html_body,
        in_reply_to: request.in_reply_to,
        references: request.references,
        attachments,
    };
    let recipients = message.to.len() + message.cc.len() + message.bcc.len();
    with_timeout(handle, handle.transport.send_email(message)).await?;
    info!("Sent message from {} to {recipients} recipient(s)", handle.account.id);
    Ok(())
}

async fn with_timeout<T, R>(
    handle: &AccountHandle<T>,
    operation: impl Future<Output = std::result::Result<R, TransportError>>,
) -> Result<R> {
    let limit = handle.account.timeout;
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result.map_err(Error::from),
        Err(_) => Err(TransportError::Timeout(limit.as_secs()).into()),
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{name} parameter is required")));
    }
    Ok(())
}
