//! Cached content data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::AttachmentInfo;

/// Metadata record of a cached message (`metadata.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMessage {
    /// External Message-ID.
    pub message_id: String,
    /// Account the message was fetched for.
    pub account_id: String,
    /// Folder the message came from.
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
    /// Message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Reply-chain references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Attachment names and sizes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentInfo>,
    /// When the message was written to the cache.
    pub cached_at: DateTime<Utc>,
    /// Bytes in `body_text.txt`.
    #[serde(default)]
    pub text_body_size: u64,
    /// Bytes in `body_html.txt`.
    #[serde(default)]
    pub html_body_size: u64,
    /// Bytes in `body_converted.txt`.
    #[serde(default)]
    pub converted_text_size: u64,
}

/// Which representation of the body to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    /// Plain text, converting HTML if that is all there is.
    #[default]
    Text,
    /// The HTML body as received.
    RawHtml,
}

/// File a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySource {
    /// `body_text.txt`.
    TextBody,
    /// `body_converted.txt`.
    HtmlConverted,
    /// `body_html.txt`.
    HtmlBody,
    /// The message has no body in the requested format.
    None,
}

/// One window of a cached body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyChunk {
    /// Decoded text of the window.
    pub content: String,
    /// Requested format.
    pub format: BodyFormat,
    /// Representation the window came from.
    pub source: BodySource,
    /// Bytes in the whole representation.
    pub total_size: u64,
    /// Byte offset the window starts at.
    pub offset: u64,
    /// Requested window size in bytes.
    pub limit: u64,
    /// Bytes consumed by this window; the next offset is `offset + length`.
    pub length: u64,
    /// Bytes left after this window.
    pub remaining: u64,
    /// Whether this window reaches the end.
    pub is_complete: bool,
}

/// Body availability and preview, as returned after a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyInfo {
    /// Bytes of plain text.
    pub text_size: u64,
    /// Bytes of HTML.
    pub html_size: u64,
    /// Whether a plain-text body exists.
    pub has_text: bool,
    /// Whether an HTML body exists.
    pub has_html: bool,
    /// Leading part of the best available text.
    pub preview: String,
}

/// Envelope plus body info of a cached message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// External Message-ID.
    pub message_id: String,
    /// Sender address.
    pub from: String,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Date header.
    pub date: Option<DateTime<Utc>>,
    /// Message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Reply-chain references.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Attachment names and sizes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentInfo>,
    /// Body sizes and preview.
    pub body: BodyInfo,
}

impl MessageSummary {
    /// Builds a summary from a metadata record and a preview.
    #[must_use]
    pub fn new(meta: CachedMessage, preview: String) -> Self {
        Self {
            body: BodyInfo {
                text_size: meta.text_body_size,
                html_size: meta.html_body_size,
                has_text: meta.text_body_size > 0,
                has_html: meta.html_body_size > 0,
                preview,
            },
            message_id: meta.message_id,
            from: meta.from,
            to: meta.to,
            cc: meta.cc,
            subject: meta.subject,
            date: meta.date,
            in_reply_to: meta.in_reply_to,
            references: meta.references,
            attachments: meta.attachments,
        }
    }
}
