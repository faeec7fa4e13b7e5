//! Reading, writing and scanning identity records.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use super::model::AccountIdentity;
use crate::fsutil;
use crate::{Error, Result};

/// File name of the identity record inside an account folder.
pub const IDENTITY_FILE: &str = "metadata.yaml";

/// Path of the identity record for `folder`.
#[must_use]
pub fn identity_path(folder: &Path) -> PathBuf {
    folder.join(IDENTITY_FILE)
}

/// Labels `folder` with `account_id` and `email`.
///
/// An existing record keeps its `created_at`; only the labels and
/// `updated_at` change. An unreadable existing record is replaced as new.
///
/// # Errors
///
/// Returns an error if the record can't be encoded or written.
pub fn write_identity(folder: &Path, account_id: &str, email: &str) -> Result<AccountIdentity> {
    let identity = match read_identity(folder) {
        Ok(existing) => AccountIdentity {
            account_id: account_id.to_string(),
            email_address: email.to_string(),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        },
        Err(Error::NotFound(_)) => AccountIdentity::new(account_id, email),
        Err(e) => {
            warn!("Replacing unreadable identity in {}: {e}", folder.display());
            AccountIdentity::new(account_id, email)
        }
    };
    write_record(folder, &identity)?;
    Ok(identity)
}

/// Writes `identity` verbatim as the record for `folder`.
///
/// # Errors
///
/// Returns an error if the record can't be encoded or written.
pub fn write_record(folder: &Path, identity: &AccountIdentity) -> Result<()> {
    let yaml = serde_yaml::to_string(identity)?;
    fsutil::write_atomic(&identity_path(folder), yaml.as_bytes())
}

/// Reads the identity record of `folder`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if there is no record, [`Error::Validation`]
/// if it is malformed or has empty labels, or an I/O error.
pub fn read_identity(folder: &Path) -> Result<AccountIdentity> {
    let path = identity_path(folder);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("identity record {}", path.display())));
        }
        Err(e) => return Err(Error::io(format!("reading {}", path.display()))(e)),
    };

    let identity: AccountIdentity = serde_yaml::from_str(&data)
        .map_err(|e| Error::Validation(format!("malformed identity {}: {e}", path.display())))?;

    if identity.account_id.trim().is_empty() || identity.email_address.trim().is_empty() {
        return Err(Error::Validation(format!(
            "identity {} has an empty account id or email",
            path.display()
        )));
    }
    Ok(identity)
}

/// Reads the identity of every immediate subdirectory of `root`.
///
/// Folders without a valid record are skipped with a warning. A missing
/// root yields an empty map.
///
/// # Errors
///
/// Returns an error if `root` exists but can't be listed.
pub fn scan_folders(root: &Path) -> Result<BTreeMap<String, AccountIdentity>> {
    let mut folders = BTreeMap::new();

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(folders),
        Err(e) => return Err(Error::io(format!("listing {}", root.display()))(e)),
    };

    for entry in entries {
        let entry = entry.map_err(Error::io(format!("listing {}", root.display())))?;
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if !is_dir {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping folder with non UTF-8 name: {:?}", entry.file_name());
            continue;
        };

        match read_identity(&entry.path()) {
            Ok(identity) => {
                debug!("Found folder {name} for {}", identity.email_address);
                folders.insert(name, identity);
            }
            Err(e) => {
                warn!("Folder {name} has no valid identity record, ignoring it: {e}");
            }
        }
    }

    Ok(folders)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        write_identity(dir.path(), "TestAccount", "test@example.com").unwrap();

        let identity = read_identity(dir.path()).unwrap();
        assert_eq!(identity.account_id, "TestAccount");
        assert_eq!(identity.email_address, "test@example.com");
        assert!(identity.updated_at >= identity.created_at);
    }

    #[test]
    fn rewrite_preserves_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_identity(dir.path(), "Work", "w@example.com").unwrap();
        let second = write_identity(dir.path(), "Office", "w@example.com").unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(read_identity(dir.path()).unwrap().account_id, "Office");
    }

    #[test]
    fn missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_identity(dir.path()), Err(Error::NotFound(_))));
    }

    #[test]
    fn malformed_record_is_validation_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(identity_path(dir.path()), "account_id: [unterminated").unwrap();
        assert!(matches!(read_identity(dir.path()), Err(Error::Validation(_))));

        fs::write(
            identity_path(dir.path()),
            "account_id: ''\nemail_address: a@b.com\ncreated_at: 2024-01-01T00:00:00Z\nupdated_at: 2024-01-01T00:00:00Z\n",
        )
        .unwrap();
        assert!(matches!(read_identity(dir.path()), Err(Error::Validation(_))));
    }

    #[test]
    fn scan_collects_valid_folders_only() {
        let dir = tempfile::tempdir().unwrap();
        for (name, email) in [("Personal", "personal@example.com"), ("Business", "business@example.com")] {
            let folder = dir.path().join(name);
            fs::create_dir_all(&folder).unwrap();
            write_identity(&folder, name, email).unwrap();
        }
        fs::create_dir_all(dir.path().join("stray")).unwrap();
        fs::write(dir.path().join("loose-file.txt"), b"x").unwrap();

        let scanned = scan_folders(dir.path()).unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned["Personal"].email_address, "personal@example.com");
        assert_eq!(scanned["Business"].email_address, "business@example.com");
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_folders(&dir.path().join("nonexistent")).unwrap().is_empty());
    }
}
