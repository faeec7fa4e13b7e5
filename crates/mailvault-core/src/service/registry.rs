//! Per-account handles, built once on first use.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use super::transport::TransportFactory;
use crate::attachments::AttachmentStore;
use crate::cache::CacheLedger;
use crate::config::{AccountConfig, Config};
use crate::content::ContentStore;
use crate::drafts::DraftStore;
use crate::layout::AccountLayout;
use crate::{Error, Result};

/// Everything needed to serve one account.
#[derive(Debug)]
pub struct AccountHandle<T> {
    /// Account configuration.
    pub account: AccountConfig,
    /// On-disk layout.
    pub layout: AccountLayout,
    /// Cache ledger shared by the content and attachment stores.
    pub ledger: Arc<CacheLedger>,
    /// Cached messages.
    pub content: ContentStore,
    /// Cached attachments.
    pub attachments: AttachmentStore,
    /// Saved drafts.
    pub drafts: DraftStore,
    /// Mail transport.
    pub transport: T,
}

/// Map from account id to its lazily built handle.
///
/// The key set is fixed at construction; each key has its own
/// initialization guard, so concurrent first requests for one account build
/// it exactly once while other accounts proceed independently.
pub struct AccountRegistry<F: TransportFactory> {
    config: Arc<Config>,
    factory: F,
    handles: HashMap<String, OnceCell<Arc<AccountHandle<F::Transport>>>>,
}

impl<F: TransportFactory> AccountRegistry<F> {
    /// Creates an empty registry for every configured account.
    #[must_use]
    pub fn new(config: Arc<Config>, factory: F) -> Self {
        let handles = config
            .accounts
            .keys()
            .map(|id| (id.clone(), OnceCell::new()))
            .collect();
        Self {
            config,
            factory,
            handles,
        }
    }

    /// Handle for `id` (or the default account), building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] for an unknown id, or an error if
    /// the ledger can't be opened or the transport can't be built.
    pub async fn get(&self, id: Option<&str>) -> Result<Arc<AccountHandle<F::Transport>>> {
        let account = self.config.account(id)?;
        let cell = self
            .handles
            .get(&account.id)
            .ok_or_else(|| Error::AccountNotFound(account.id.clone()))?;

        cell.get_or_try_init(|| async { self.build(account).map(Arc::new) })
            .await
            .cloned()
    }

    /// Whether the handle for `id` has been built.
    #[must_use]
    pub fn is_initialized(&self, id: &str) -> bool {
        self.handles.get(id).is_some_and(OnceCell::initialized)
    }

    fn build(&self, account: &AccountConfig) -> Result<AccountHandle<F::Transport>> {
        debug!("Initializing account {}", account.id);
        let layout = self.config.layout(&account.id);
        let ledger = Arc::new(CacheLedger::open(layout.ledger_file(), self.config.cache_max_size)?);
        let transport = self.factory.build(account)?;

        Ok(AccountHandle {
            content: ContentStore::new(layout.emails_dir(), Arc::clone(&ledger)),
            attachments: AttachmentStore::new(
                layout.attachments_dir(),
                Arc::clone(&ledger),
                self.config.max_attachment_size,
            ),
            drafts: DraftStore::new(layout.drafts_dir()),
            account: account.clone(),
            layout,
            ledger,
            transport,
        })
    }
}

impl<F: TransportFactory> std::fmt::Debug for AccountRegistry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRegistry")
            .field("accounts", &self.handles.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
