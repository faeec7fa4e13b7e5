//! Account identity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who an account-scoped folder belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Configured account id the folder was last labelled with.
    pub account_id: String,
    /// Email address of the account; stable across renames.
    pub email_address: String,
    /// When the folder was first labelled. Never changes once set.
    pub created_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl AccountIdentity {
    /// Creates a fresh identity stamped with the current time.
    #[must_use]
    pub fn new(account_id: impl Into<String>, email_address: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            account_id: account_id.into(),
            email_address: email_address.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy relabelled to `account_id`, keeping email and creation time.
    #[must_use]
    pub fn relabelled(&self, account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            email_address: self.email_address.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}
