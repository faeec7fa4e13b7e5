//! Draft data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::SendRequest;

/// A saved, unsent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Draft id (`{unix seconds}_{hex}`).
    pub id: String,
    /// When the draft was first saved.
    pub created_at: DateTime<Utc>,
    /// When the draft was last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Message contents; attachments are cache ids.
    #[serde(flatten)]
    pub message: SendRequest,
}

/// Listing view of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftSummary {
    /// Draft id.
    pub id: String,
    /// When the draft was first saved.
    pub created_at: DateTime<Utc>,
    /// Subject line.
    pub subject: String,
    /// Primary recipients.
    pub to: Vec<String>,
}

impl From<&Draft> for DraftSummary {
    fn from(draft: &Draft) -> Self {
        Self {
            id: draft.id.clone(),
            created_at: draft.created_at,
            subject: draft.message.subject.clone(),
            to: draft.message.to.clone(),
        }
    }
}
