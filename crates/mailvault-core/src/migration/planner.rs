//! Migration planning.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use super::model::{MigrationAnalysis, MigrationPlan};
use crate::Result;
use crate::identity::{self, AccountIdentity};

/// Scans `root` and plans migrations against `accounts` (account id → email).
///
/// # Errors
///
/// Returns an error if the files root exists but can't be listed.
pub fn detect_migrations(
    root: &Path,
    accounts: &BTreeMap<String, String>,
) -> Result<MigrationAnalysis> {
    let folders = identity::scan_folders(root)?;
    Ok(plan_migrations(&folders, accounts))
}

/// Decides which folders to rename.
///
/// A folder is matched to a configured account by exact email comparison.
/// When several folders share an email, only the one with the latest
/// `updated_at` is migrated; ties go to the lexicographically smallest name.
#[must_use]
pub fn plan_migrations(
    folders: &BTreeMap<String, AccountIdentity>,
    accounts: &BTreeMap<String, String>,
) -> MigrationAnalysis {
    let mut analysis = MigrationAnalysis::default();

    for (name, identity) in folders {
        if *name == identity.account_id
            && accounts.get(name).is_some_and(|email| *email == identity.email_address)
        {
            continue;
        }

        let Some(target) = accounts
            .iter()
            .find(|(_, email)| **email == identity.email_address)
            .map(|(id, _)| id)
        else {
            analysis.orphaned.push(name.clone());
            continue;
        };

        if target == name {
            continue;
        }

        if let Some(winner) = newest_folder_for(folders, &identity.email_address)
            && winner != name
        {
            warn!(
                "Folders {winner} and {name} both belong to {}, migrating {winner} only",
                identity.email_address
            );
            analysis.conflicted.push(name.clone());
            continue;
        }

        analysis.plans.push(MigrationPlan {
            old_folder_name: name.clone(),
            new_account_id: target.clone(),
            email_address: identity.email_address.clone(),
            identity_snapshot: identity.clone(),
        });
    }

    if !analysis.orphaned.is_empty() {
        warn!(
            "Found {} orphaned folder(s) with no matching account: {:?}. They are kept but unused.",
            analysis.orphaned.len(),
            analysis.orphaned
        );
    }

    analysis
}

/// Folder with the latest `updated_at` among those claiming `email`.
fn newest_folder_for<'a>(
    folders: &'a BTreeMap<String, AccountIdentity>,
    email: &str,
) -> Option<&'a String> {
    // BTreeMap iterates in name order, so `>` keeps the smallest name on ties.
    folders
        .iter()
        .filter(|(_, identity)| identity.email_address == email)
        .fold(None, |best: Option<(&String, &AccountIdentity)>, (name, identity)| {
            match best {
                Some((_, current)) if identity.updated_at <= current.updated_at => best,
                _ => Some((name, identity)),
            }
        })
        .map(|(name, _)| name)
}
