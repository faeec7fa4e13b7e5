//! Content store: message directories registered with the account ledger.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use super::chunk;
use super::html::html_to_text;
use super::id::content_id;
use super::model::{BodyChunk, BodyFormat, BodySource, CachedMessage, MessageSummary};
use crate::cache::{CacheLedger, EntryKind};
use crate::message::Email;
use crate::{Error, Result, fsutil};

/// Hours a cached message stays readable.
pub const CONTENT_EXPIRY_HOURS: i64 = 96;

/// Preview length used when the caller gives none.
pub const DEFAULT_PREVIEW_LENGTH: usize = 500;

/// Chunk size used when the caller gives none.
pub const DEFAULT_CHUNK_LIMIT: u64 = 10_000;

const METADATA_FILE: &str = "metadata.yaml";
const TEXT_FILE: &str = "body_text.txt";
const HTML_FILE: &str = "body_html.txt";
const CONVERTED_FILE: &str = "body_converted.txt";

/// Message cache for one account.
#[derive(Debug)]
pub struct ContentStore {
    dir: PathBuf,
    ledger: Arc<CacheLedger>,
    expiry: Duration,
}

impl ContentStore {
    /// Creates a store rooted at `dir` (`cache/emails`).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ledger: Arc<CacheLedger>) -> Self {
        Self {
            dir: dir.into(),
            ledger,
            expiry: Duration::hours(CONTENT_EXPIRY_HOURS),
        }
    }

    /// Overrides the expiry window.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Directory holding the cached message `message_id`.
    #[must_use]
    pub fn message_dir(&self, message_id: &str) -> PathBuf {
        self.dir.join(content_id(message_id))
    }

    /// Writes `email` to the cache and registers it with the ledger.
    ///
    /// Bodies are only written if non-empty. An HTML-only message also gets
    /// its converted text written eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if any file or the ledger can't be written.
    pub fn save(&self, email: &Email, account_id: &str) -> Result<CachedMessage> {
        let id = content_id(&email.message_id);
        let dir = self.dir.join(&id);
        fs::create_dir_all(&dir).map_err(Error::io(format!("creating {}", dir.display())))?;

        // A refetch may carry different bodies; drop whatever the last one left.
        for name in [TEXT_FILE, HTML_FILE, CONVERTED_FILE] {
            fsutil::remove_path(&dir.join(name))
                .map_err(Error::io(format!("removing stale {name} in {}", dir.display())))?;
        }

        let mut meta = CachedMessage {
            message_id: email.message_id.clone(),
            account_id: account_id.to_string(),
            folder: email.folder.clone(),
            from: email.from.clone(),
            to: email.to.clone(),
            cc: email.cc.clone(),
            subject: email.subject.clone(),
            date: email.date,
            in_reply_to: email.in_reply_to.clone(),
            references: email.references.clone(),
            attachments: email.attachments.clone(),
            cached_at: Utc::now(),
            text_body_size: email.body.len() as u64,
            html_body_size: email.html_body.len() as u64,
            converted_text_size: 0,
        };

        if !email.body.is_empty() {
            write_body(&dir, TEXT_FILE, &email.body)?;
        }
        if !email.html_body.is_empty() {
            write_body(&dir, HTML_FILE, &email.html_body)?;
            if email.body.is_empty() {
                let converted = html_to_text(&email.html_body);
                if !converted.is_empty() {
                    write_body(&dir, CONVERTED_FILE, &converted)?;
                    meta.converted_text_size = converted.len() as u64;
                }
            }
        }

        let record = serde_yaml::to_string(&meta)?;
        fsutil::write_atomic(&dir.join(METADATA_FILE), record.as_bytes())?;

        let size = fsutil::dir_size(&dir).map_err(Error::io(format!("measuring {}", dir.display())))?;
        self.ledger.add_or_touch(&id, EntryKind::Content, &dir, size)?;

        debug!("Cached message {} as {id} ({size} bytes)", email.message_id);
        Ok(meta)
    }

    /// Loads the metadata record of a cached message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the message was never cached or has been
    /// evicted, [`Error::Expired`] if it is past the expiry window, or an
    /// error if the record can't be read.
    pub fn load_metadata(&self, message_id: &str) -> Result<CachedMessage> {
        let path = self.message_dir(message_id).join(METADATA_FILE);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("message {message_id} is not cached")));
            }
            Err(e) => return Err(Error::io(format!("reading {}", path.display()))(e)),
        };

        let meta: CachedMessage = serde_yaml::from_str(&data)
            .map_err(|e| Error::Validation(format!("malformed {}: {e}", path.display())))?;

        if Utc::now() - meta.cached_at > self.expiry {
            return Err(Error::Expired(format!("message {message_id} cache entry expired")));
        }
        Ok(meta)
    }

    /// Whether `message_id` is cached and not expired.
    #[must_use]
    pub fn is_cached(&self, message_id: &str) -> bool {
        self.load_metadata(message_id).is_ok()
    }

    /// Envelope and body info of a cached message, with a preview of up to
    /// `preview_len` bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_metadata`].
    pub fn summary(&self, message_id: &str, preview_len: usize) -> Result<MessageSummary> {
        let meta = self.load_metadata(message_id)?;
        let preview = self.preview_of(&meta, preview_len);
        Ok(MessageSummary::new(meta, preview))
    }

    /// Leading text of a cached message, at most `max_len` bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_metadata`].
    pub fn preview(&self, message_id: &str, max_len: usize) -> Result<String> {
        let meta = self.load_metadata(message_id)?;
        Ok(self.preview_of(&meta, max_len))
    }

    fn preview_of(&self, meta: &CachedMessage, max_len: usize) -> String {
        if max_len == 0 {
            return String::new();
        }
        let dir = self.message_dir(&meta.message_id);
        let limit = max_len as u64;

        for (size, name) in [
            (meta.text_body_size, TEXT_FILE),
            (meta.converted_text_size, CONVERTED_FILE),
        ] {
            if size == 0 {
                continue;
            }
            match chunk::read_file_window(&dir.join(name), 0, limit) {
                Ok((text, _)) => return text,
                Err(e) => debug!("Preview could not read {name} in {}: {e}", dir.display()),
            }
        }

        if meta.html_body_size > 0 {
            match fs::read_to_string(dir.join(HTML_FILE)) {
                Ok(html) => {
                    let converted = self.convert_and_persist(&dir, meta, &html);
                    return chunk::read_bytes_window(converted.as_bytes(), 0, limit).0;
                }
                Err(e) => debug!("Preview could not read HTML in {}: {e}", dir.display()),
            }
        }

        String::new()
    }

    /// Reads one window of a cached body.
    ///
    /// `Text` prefers the plain-text body, then the converted HTML, then
    /// converts the HTML on the spot. `RawHtml` reads the HTML body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`]/[`Error::Expired`] as
    /// [`Self::load_metadata`] does, [`Error::Validation`] for a zero limit
    /// or an offset past the end, or an I/O error reading an existing body.
    pub fn read_chunk(
        &self,
        message_id: &str,
        format: BodyFormat,
        offset: u64,
        limit: u64,
    ) -> Result<BodyChunk> {
        let meta = self.load_metadata(message_id)?;
        let dir = self.message_dir(message_id);

        let (source, name, total) = match format {
            BodyFormat::RawHtml if meta.html_body_size > 0 => {
                (BodySource::HtmlBody, HTML_FILE, meta.html_body_size)
            }
            BodyFormat::Text if meta.text_body_size > 0 => {
                (BodySource::TextBody, TEXT_FILE, meta.text_body_size)
            }
            BodyFormat::Text if meta.converted_text_size > 0 => {
                (BodySource::HtmlConverted, CONVERTED_FILE, meta.converted_text_size)
            }
            BodyFormat::Text if meta.html_body_size > 0 => {
                let path = dir.join(HTML_FILE);
                let html = fs::read_to_string(&path)
                    .map_err(Error::io(format!("reading {}", path.display())))?;
                let converted = self.convert_and_persist(&dir, &meta, &html);
                let total = converted.len() as u64;
                chunk::validate(offset, limit, total)?;
                let window = chunk::read_bytes_window(converted.as_bytes(), offset, limit);
                return Ok(chunk::chunk(
                    format,
                    BodySource::HtmlConverted,
                    total,
                    offset,
                    limit,
                    window,
                ));
            }
            _ => {
                chunk::validate(offset, limit, 0)?;
                return Ok(chunk::empty(format, limit));
            }
        };

        chunk::validate(offset, limit, total)?;
        let path = dir.join(name);
        let window = chunk::read_file_window(&path, offset, limit)
            .map_err(Error::io(format!("reading {}", path.display())))?;
        Ok(chunk::chunk(format, source, total, offset, limit, window))
    }

    /// Converts `html` and tries to keep the result for next time.
    ///
    /// Write-back failures are logged; the converted text is returned
    /// regardless.
    fn convert_and_persist(&self, dir: &Path, meta: &CachedMessage, html: &str) -> String {
        let converted = html_to_text(html);
        if converted.is_empty() {
            return converted;
        }

        if let Err(e) = write_body(dir, CONVERTED_FILE, &converted) {
            warn!("Could not keep converted text in {}: {e}", dir.display());
            return converted;
        }

        let mut updated = meta.clone();
        updated.converted_text_size = converted.len() as u64;
        let written = serde_yaml::to_string(&updated)
            .map_err(Error::from)
            .and_then(|record| fsutil::write_atomic(&dir.join(METADATA_FILE), record.as_bytes()));
        if let Err(e) = written {
            warn!("Could not record converted size in {}: {e}", self.dir.display());
        }
        converted
    }
}

fn write_body(dir: &Path, name: &str, body: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, body).map_err(Error::io(format!("writing {}", path.display())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::AttachmentInfo;

    fn store(dir: &Path) -> ContentStore {
        let ledger = CacheLedger::open(dir.join("cache_metadata.yaml"), 10 * 1024 * 1024).unwrap();
        ContentStore::new(dir.join("emails"), Arc::new(ledger))
    }

    fn email(id: &str, body: &str, html: &str) -> Email {
        Email {
            message_id: id.to_string(),
            folder: "INBOX".to_string(),
            from: "sender@example.com".to_string(),
            to: vec!["me@example.com".to_string()],
            cc: vec!["cc@example.com".to_string()],
            subject: "Quarterly report".to_string(),
            date: Some(Utc::now()),
            body: body.to_string(),
            html_body: html.to_string(),
            attachments: vec![AttachmentInfo {
                filename: "report.pdf".to_string(),
                size: 1234,
                content_type: Some("application/pdf".to_string()),
                cache_id: None,
            }],
            in_reply_to: Some("<parent@example.com>".to_string()),
            references: vec!["<root@example.com>".to_string()],
        }
    }

    #[test]
    fn save_then_load_reproduces_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let original = email("<m1@example.com>", "plain body", "<p>html body</p>");

        let saved = store.save(&original, "Work").unwrap();
        let loaded = store.load_metadata("<m1@example.com>").unwrap();

        assert_eq!(loaded, saved);
        assert_eq!(loaded.from, original.from);
        assert_eq!(loaded.to, original.to);
        assert_eq!(loaded.cc, original.cc);
        assert_eq!(loaded.subject, original.subject);
        assert_eq!(loaded.date, original.date);
        assert_eq!(loaded.in_reply_to, original.in_reply_to);
        assert_eq!(loaded.references, original.references);
        assert_eq!(loaded.attachments, original.attachments);
        assert_eq!(loaded.text_body_size, 10);
        assert_eq!(loaded.html_body_size, 16);
        assert_eq!(loaded.converted_text_size, 0);
    }

    #[test]
    fn save_registers_aggregate_size_with_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m2", "0123456789", ""), "Work").unwrap();

        let entries = store.ledger.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "m2");
        assert_eq!(entries[0].kind, EntryKind::Content);
        let record_len = fs::metadata(store.message_dir("m2").join(METADATA_FILE)).unwrap().len();
        assert_eq!(entries[0].size, 10 + record_len);
    }

    #[test]
    fn registered_size_is_measured_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let message_dir = store.message_dir("m3");
        fs::create_dir_all(message_dir.join("extra")).unwrap();
        fs::write(message_dir.join("extra").join("part.bin"), b"12345").unwrap();

        store.save(&email("m3", "", "<p>only html</p>"), "Work").unwrap();

        let on_disk: u64 = [METADATA_FILE, HTML_FILE, CONVERTED_FILE]
            .iter()
            .map(|name| fs::metadata(message_dir.join(name)).unwrap().len())
            .sum();
        let entry = store.ledger.get("m3").unwrap();
        assert_eq!(entry.size, on_disk + 5);
    }

    #[test]
    fn html_only_message_is_converted_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let meta = store.save(&email("m3", "", "<p>Hello from HTML</p>"), "Work").unwrap();

        assert!(meta.converted_text_size > 0);
        assert!(store.message_dir("m3").join(CONVERTED_FILE).exists());
        assert!(!store.message_dir("m3").join(TEXT_FILE).exists());

        let chunk = store.read_chunk("m3", BodyFormat::Text, 0, 1000).unwrap();
        assert_eq!(chunk.source, BodySource::HtmlConverted);
        assert!(chunk.content.contains("Hello from HTML"));
    }

    #[test]
    fn missing_and_expired_messages_ask_for_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).with_expiry(Duration::hours(96));
        let err = store.load_metadata("never").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.requires_refetch());

        let mut meta = store.save(&email("old", "body", ""), "Work").unwrap();
        meta.cached_at = Utc::now() - Duration::hours(97);
        fs::write(
            store.message_dir("old").join(METADATA_FILE),
            serde_yaml::to_string(&meta).unwrap(),
        )
        .unwrap();

        let err = store.read_chunk("old", BodyFormat::Text, 0, 10).unwrap_err();
        assert!(matches!(err, Error::Expired(_)));
        assert!(!store.is_cached("old"));
    }

    #[test]
    fn preview_prefers_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m4", "plain text wins", "<p>html loses</p>"), "Work").unwrap();
        assert_eq!(store.preview("m4", 5).unwrap(), "plain");

        let summary = store.summary("m4", 500).unwrap();
        assert_eq!(summary.body.preview, "plain text wins");
        assert!(summary.body.has_text && summary.body.has_html);
    }

    #[test]
    fn preview_converts_on_the_fly_and_keeps_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m5", "", "<p>Converted later</p>"), "Work").unwrap();
        let message_dir = store.message_dir("m5");

        // Simulate a cache written before conversion was available.
        fs::remove_file(message_dir.join(CONVERTED_FILE)).unwrap();
        let mut meta = store.load_metadata("m5").unwrap();
        meta.converted_text_size = 0;
        fs::write(message_dir.join(METADATA_FILE), serde_yaml::to_string(&meta).unwrap()).unwrap();

        assert!(store.preview("m5", 500).unwrap().contains("Converted later"));
        assert!(message_dir.join(CONVERTED_FILE).exists());
        assert!(store.load_metadata("m5").unwrap().converted_text_size > 0);
    }

    #[test]
    fn message_without_body_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m6", "", ""), "Work").unwrap();

        assert_eq!(store.preview("m6", 100).unwrap(), "");
        let chunk = store.read_chunk("m6", BodyFormat::RawHtml, 0, 100).unwrap();
        assert_eq!(chunk.source, BodySource::None);
        assert!(chunk.is_complete);
        assert_eq!(chunk.total_size, 0);
    }

    #[test]
    fn raw_html_reads_the_markup() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m7", "text", "<b>bold</b>"), "Work").unwrap();

        let chunk = store.read_chunk("m7", BodyFormat::RawHtml, 3, 4).unwrap();
        assert_eq!(chunk.content, "bold");
        assert_eq!(chunk.source, BodySource::HtmlBody);
        assert_eq!(chunk.remaining, 4);
        assert!(!chunk.is_complete);
    }

    #[test]
    fn bad_window_parameters_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m8", "short", ""), "Work").unwrap();

        assert!(matches!(
            store.read_chunk("m8", BodyFormat::Text, 0, 0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.read_chunk("m8", BodyFormat::Text, 6, 10),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn refetch_removes_stale_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&email("m9", "first", "<p>first</p>"), "Work").unwrap();
        store.save(&email("m9", "second", ""), "Work").unwrap();

        assert!(!store.message_dir("m9").join(HTML_FILE).exists());
        assert_eq!(store.ledger.entries().unwrap().len(), 1);
        let chunk = store.read_chunk("m9", BodyFormat::RawHtml, 0, 10).unwrap();
        assert_eq!(chunk.source, BodySource::None);
    }
}
