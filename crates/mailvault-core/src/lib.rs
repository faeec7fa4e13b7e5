//! # mailvault-core
//!
//! Storage and caching engine for a multi-account mail service.
//!
//! This crate provides:
//! - Per-account cache ledgers with size and age eviction
//! - Cached message content with chunked body reads
//! - Account identity records and folder migration on account rename
//! - Attachment cache and saved drafts
//! - Environment configuration and the load-time bootstrap pass
//! - A service facade over a pluggable mail transport

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod attachments;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod content;
pub mod drafts;
mod error;
mod fsutil;
pub mod identity;
pub mod layout;
pub mod message;
pub mod migration;
pub mod service;

pub use attachments::{AttachmentStore, SavedAttachment};
pub use bootstrap::BootstrapReport;
pub use cache::{CacheEntry, CacheLedger, CacheStats, EntryKind, EvictionSummary};
pub use config::{AccountConfig, Config, Provider, Security, ValidationError, validate_account};
pub use content::{BodyChunk, BodyFormat, BodySource, ContentStore, MessageSummary, content_id};
pub use drafts::{Draft, DraftStore, DraftSummary};
pub use error::{Error, Result};
pub use identity::AccountIdentity;
pub use layout::AccountLayout;
pub use message::{Email, SendRequest};
pub use migration::{MigrationPlan, MigrationReport};
pub use service::{AccountInfo, MailService, MailTransport, TransportError, TransportFactory};
