//! Applying migration plans to the filesystem.

use std::fs;
use std::path::Path;

use tracing::{error, info};

use super::model::{MigrationFailure, MigrationPlan, MigrationReport};
use crate::identity;
use crate::{Error, Result, fsutil};

/// Renames the plan's folder and relabels its identity record.
///
/// The source must exist and the destination must not; otherwise nothing is
/// touched. If relabelling fails the rename is undone.
///
/// # Errors
///
/// Returns [`Error::NotFound`] or [`Error::Conflict`] for a violated
/// precondition, an I/O error if the rename fails,
/// [`Error::MigrationRolledBack`] if relabelling failed and the folder was
/// restored, or [`Error::RollbackFailed`] if it could not be restored.
pub fn execute_migration(root: &Path, plan: &MigrationPlan) -> Result<()> {
    let from = root.join(&plan.old_folder_name);
    let to = root.join(&plan.new_account_id);

    if !from.is_dir() {
        return Err(Error::NotFound(format!("source folder {}", from.display())));
    }
    if fsutil::exists(&to) {
        return Err(Error::Conflict(format!(
            "target folder {} already exists, refusing to overwrite",
            to.display()
        )));
    }

    fs::rename(&from, &to).map_err(Error::io(format!(
        "renaming {} to {}",
        from.display(),
        to.display()
    )))?;

    let relabelled = plan.identity_snapshot.relabelled(&plan.new_account_id);
    if let Err(source) = identity::write_record(&to, &relabelled) {
        return match fs::rename(&to, &from) {
            Ok(()) => Err(Error::MigrationRolledBack {
                from,
                to,
                source: Box::new(source),
            }),
            Err(rollback) => Err(Error::RollbackFailed {
                from,
                to,
                source: Box::new(source),
                rollback,
            }),
        };
    }

    info!(
        "Migrated account folder {} -> {} ({})",
        plan.old_folder_name, plan.new_account_id, plan.email_address
    );
    Ok(())
}

/// Executes every plan independently, collecting failures.
///
/// A failed plan never blocks or undoes the others.
#[must_use]
pub fn execute_all(root: &Path, plans: Vec<MigrationPlan>) -> MigrationReport {
    let mut report = MigrationReport::default();
    for plan in plans {
        match execute_migration(root, &plan) {
            Ok(()) => report.migrated.push(plan),
            Err(e) => {
                error!(
                    "Migration failed for {} -> {}: {e}",
                    plan.old_folder_name, plan.new_account_id
                );
                report.failures.push(MigrationFailure { plan, error: e });
            }
        }
    }
    report
}
