//! Paths inside one account folder.

use std::path::{Path, PathBuf};

/// Directory layout of `{files_root}/{account_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLayout {
    root: PathBuf,
}

impl AccountLayout {
    /// Layout rooted at an account folder.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The account folder itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saved drafts.
    #[must_use]
    pub fn drafts_dir(&self) -> PathBuf {
        self.root.join("drafts")
    }

    /// Everything tracked by the cache ledger.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Cached message directories.
    #[must_use]
    pub fn emails_dir(&self) -> PathBuf {
        self.cache_dir().join("emails")
    }

    /// Cached attachment files.
    #[must_use]
    pub fn attachments_dir(&self) -> PathBuf {
        self.cache_dir().join("attachments")
    }

    /// Cache ledger record.
    #[must_use]
    pub fn ledger_file(&self) -> PathBuf {
        self.cache_dir().join("cache_metadata.yaml")
    }

    /// Directories created for every configured account.
    #[must_use]
    pub fn required_dirs(&self) -> [PathBuf; 3] {
        [self.drafts_dir(), self.emails_dir(), self.attachments_dir()]
    }
}
