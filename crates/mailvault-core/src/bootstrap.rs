//! Configuration-load pass over the files root.
//!
//! Runs before any per-account store is opened: folders are migrated first,
//! then every configured account gets its directories and identity record.

use std::fs;

use tracing::{info, warn};

use crate::config::Config;
use crate::identity;
use crate::migration::{self, MigrationFailure, MigrationPlan};
use crate::{Error, Result};

/// What the load pass did.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// Folders renamed to their new account id.
    pub migrated: Vec<MigrationPlan>,
    /// Renames that failed; the folders were left in place.
    pub failures: Vec<MigrationFailure>,
    /// Folders whose email matches no configured account.
    pub orphaned: Vec<String>,
    /// Folders passed over because a newer folder claims the same email.
    pub conflicted: Vec<String>,
}

/// Migrates renamed account folders and prepares every configured account.
///
/// Migration problems are collected into the report and never abort the
/// pass.
///
/// # Errors
///
/// Returns an error if the files root can't be listed, or an account's
/// directories or identity record can't be written.
pub fn prepare(config: &Config) -> Result<BootstrapReport> {
    let analysis = migration::detect_migrations(&config.files_root, &config.account_emails())?;

    let mut report = BootstrapReport {
        orphaned: analysis.orphaned,
        conflicted: analysis.conflicted,
        ..BootstrapReport::default()
    };

    if !analysis.plans.is_empty() {
        info!("Detected {} account folder migration(s)", analysis.plans.len());
        let outcome = migration::execute_all(&config.files_root, analysis.plans);
        if outcome.is_clean() {
            info!("All migrations completed successfully");
        } else {
            warn!("{} migration(s) failed, continuing with existing folders", outcome.failures.len());
        }
        report.migrated = outcome.migrated;
        report.failures = outcome.failures;
    }

    for account in config.accounts.values() {
        let layout = config.layout(&account.id);
        for dir in layout.required_dirs() {
            fs::create_dir_all(&dir).map_err(Error::io(format!("creating {}", dir.display())))?;
        }
        identity::write_identity(layout.root(), &account.id, &account.email)?;
    }

    Ok(report)
}
