//! Draft files under `{account}/drafts`.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};

use super::model::{Draft, DraftSummary};
use crate::message::SendRequest;
use crate::{Error, Result, fsutil};

const FILE_PREFIX: &str = "draft_";
const FILE_SUFFIX: &str = ".yaml";

/// Draft storage for one account.
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Saves a new draft and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft can't be encoded or written.
    pub fn create(&self, message: SendRequest) -> Result<Draft> {
        let draft = Draft {
            id: self.next_id(),
            created_at: Utc::now(),
            updated_at: None,
            message,
        };
        self.write(&draft)?;
        debug!("Saved draft {}", draft.id);
        Ok(draft)
    }

    /// Loads a draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such draft,
    /// [`Error::Validation`] if its file is malformed, or an I/O error.
    pub fn get(&self, id: &str) -> Result<Draft> {
        let path = self.path(id)?;
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("draft {id}")));
            }
            Err(e) => return Err(Error::io(format!("reading {}", path.display()))(e)),
        };
        serde_yaml::from_str(&data)
            .map_err(|e| Error::Validation(format!("malformed draft {}: {e}", path.display())))
    }

    /// Summaries of every readable draft, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the drafts directory exists but can't be listed.
    pub fn list(&self) -> Result<Vec<DraftSummary>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(format!("listing {}", self.dir.display()))(e)),
        };

        let mut drafts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::io(format!("listing {}", self.dir.display())))?;
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX))
            else {
                continue;
            };
            match self.get(id) {
                Ok(draft) => drafts.push(DraftSummary::from(&draft)),
                Err(e) => warn!("Skipping unreadable draft {id}: {e}"),
            }
        }

        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(drafts)
    }

    /// Replaces the contents of a draft, keeping its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such draft, or an error if
    /// it can't be written.
    pub fn update(&self, id: &str, message: SendRequest) -> Result<Draft> {
        let existing = self.get(id)?;
        let draft = Draft {
            updated_at: Some(Utc::now()),
            message,
            ..existing
        };
        self.write(&draft)?;
        Ok(draft)
    }

    /// Deletes a draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such draft, or an I/O error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("draft {id}")))
            }
            Err(e) => Err(Error::io(format!("removing {}", path.display()))(e)),
        }
    }

    fn write(&self, draft: &Draft) -> Result<()> {
        let yaml = serde_yaml::to_string(draft)?;
        fsutil::write_atomic(&self.path(&draft.id)?, yaml.as_bytes())
    }

    fn path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::NotFound(format!("draft {id}")));
        }
        Ok(self.dir.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}")))
    }

    /// `{unix seconds}_{hex}`, bumped until no file with that name exists.
    fn next_id(&self) -> String {
        let now = Utc::now();
        let seconds = now.timestamp();
        let mut suffix = now.timestamp_subsec_nanos() % 1_000_000;
        loop {
            let id = format!("{seconds}_{suffix:x}");
            let taken = self.path(&id).is_ok_and(|path| fsutil::exists(&path));
            if !taken {
                return id;
            }
            suffix = suffix.wrapping_add(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(subject: &str) -> SendRequest {
        SendRequest {
            to: vec!["friend@example.com".to_string()],
            subject: subject.to_string(),
            body: "Hi!".to_string(),
            attachments: vec!["att_0123456789ab.pdf".to_string()],
            ..SendRequest::default()
        }
    }

    #[test]
    fn create_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path());

        let draft = store.create(request("Lunch")).unwrap();
        assert!(dir.path().join(format!("draft_{}.yaml", draft.id)).is_file());
        assert_eq!(store.get(&draft.id).unwrap(), draft);
    }

    #[test]
    fn ids_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path());
        let ids: std::collections::HashSet<String> =
            (0..20).map(|i| store.create(request(&format!("d{i}"))).unwrap().id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn list_is_newest_first_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path());
        let first = store.create(request("first")).unwrap();
        let mut second = store.create(request("second")).unwrap();
        second.created_at = first.created_at + chrono::Duration::seconds(5);
        store.write(&second).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a draft").unwrap();
        fs::write(dir.path().join("draft_broken.yaml"), "to: [").unwrap();

        let listed = store.list().unwrap();
        let subjects: Vec<&str> = listed.iter().map(|d| d.subject.as_str()).collect();
        assert_eq!(subjects, ["second", "first"]);
    }

    #[test]
    fn update_keeps_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path());
        let draft = store.create(request("v1")).unwrap();

        let updated = store.update(&draft.id, request("v2")).unwrap();
        assert_eq!(updated.id, draft.id);
        assert_eq!(updated.created_at, draft.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(store.get(&draft.id).unwrap().message.subject, "v2");
    }

    #[test]
    fn missing_drafts_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path());
        assert!(matches!(store.get("123_abc"), Err(Error::NotFound(_))));
        assert!(matches!(store.delete("123_abc"), Err(Error::NotFound(_))));
        assert!(matches!(store.update("123_abc", request("x")), Err(Error::NotFound(_))));
        assert!(matches!(store.get("../escape"), Err(Error::NotFound(_))));

        let draft = store.create(request("gone")).unwrap();
        store.delete(&draft.id).unwrap();
        assert!(matches!(store.get(&draft.id), Err(Error::NotFound(_))));
    }
}
