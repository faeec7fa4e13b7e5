//! Message types exchanged with the mail transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A fully fetched message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Message-ID header value.
    pub message_id: String,
    /// Folder the message was fetched from.
    #[serde(default)]
    pub folder: String,
    /// Sender address.
    pub from: String,
    /// Primary recipients.
    #[serde(default)]
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Date header.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Plain-text body; empty if the message has none.
    #[serde(default)]
    pub body: String,
    /// Raw HTML body; empty if the message has none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_body: String,
    /// Attachment descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentInfo>,
    /// Message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Reply-chain references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

/// Envelope-only view of a message, as listed from a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailHeader {
    /// Message-ID header value.
    pub message_id: String,
    /// Sender address.
    pub from: String,
    /// Primary recipients.
    #[serde(default)]
    pub to: Vec<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Date header.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Whether the message has been read.
    #[serde(default)]
    pub seen: bool,
}

/// Name and size of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// File name as sent.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Local cache id once downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_id: Option<String>,
}

/// Downloaded attachment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    /// File name as sent.
    pub filename: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// Raw bytes.
    pub data: Vec<u8>,
}

/// A mailbox folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Folder name.
    pub name: String,
    /// Messages in the folder.
    pub message_count: u32,
    /// Unread messages in the folder.
    pub unread_count: u32,
}

/// Header search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFilters {
    /// Only messages on or after this date.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Only messages before this date.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    /// Sender substring.
    #[serde(default)]
    pub from: Option<String>,
    /// Subject substring.
    #[serde(default)]
    pub subject_contains: Option<String>,
    /// Only unread messages.
    #[serde(default)]
    pub unread_only: bool,
}

/// Which attachments of a message to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSelection {
    /// Every attachment.
    All,
    /// Only attachments with these file names.
    Named(Vec<String>),
}

impl AttachmentSelection {
    /// Whether `filename` is selected.
    #[must_use]
    pub fn includes(&self, filename: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.iter().any(|n| n == filename),
        }
    }
}

/// A message to send, with attachments already resolved to bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional HTML body.
    pub html_body: Option<String>,
    /// Message this one replies to.
    pub in_reply_to: Option<String>,
    /// Reply-chain references.
    pub references: Vec<String>,
    /// Attachments to include.
    pub attachments: Vec<AttachmentData>,
}

/// A send request as issued by callers; attachments are cache ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Plain-text body.
    #[serde(default)]
    pub body: String,
    /// Optional HTML body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    /// Attachment cache ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    /// Message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Reply-chain references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl SendRequest {
    /// Checks that the message has recipients, a subject and a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first missing part.
    pub fn validate(&self) -> Result<()> {
        if self.to.iter().all(|addr| addr.trim().is_empty()) {
            return Err(Error::Validation("at least one 'to' recipient is required".into()));
        }
        if self.subject.trim().is_empty() {
            return Err(Error::Validation("subject is required".into()));
        }
        if self.body.is_empty() && self.html_body.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Validation("either 'body' or 'html_body' is required".into()));
        }
        Ok(())
    }
}
