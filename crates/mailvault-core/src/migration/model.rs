//! Migration data models.

use crate::Error;
use crate::identity::AccountIdentity;

/// One folder rename, produced and consumed within a single load pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Current folder name under the files root.
    pub old_folder_name: String,
    /// Configured account id the folder should be renamed to.
    pub new_account_id: String,
    /// Email address shared by the folder and the configured account.
    pub email_address: String,
    /// Identity record as scanned before the rename.
    pub identity_snapshot: AccountIdentity,
}

/// Planner output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationAnalysis {
    /// Folders to rename, in folder-name order.
    pub plans: Vec<MigrationPlan>,
    /// Folders whose email matches no configured account.
    pub orphaned: Vec<String>,
    /// Folders passed over because a newer folder claims the same email.
    pub conflicted: Vec<String>,
}

/// A plan that could not be applied.
#[derive(Debug)]
pub struct MigrationFailure {
    /// The plan that failed.
    pub plan: MigrationPlan,
    /// Why it failed.
    pub error: Error,
}

/// Outcome of executing a batch of plans.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Plans applied successfully.
    pub migrated: Vec<MigrationPlan>,
    /// Plans that failed, each with its error.
    pub failures: Vec<MigrationFailure>,
}

impl MigrationReport {
    /// Whether every plan was applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
