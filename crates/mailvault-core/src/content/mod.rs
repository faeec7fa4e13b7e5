//! Cached message content.
//!
//! Each message gets one directory named by its content id, holding a
//! metadata record plus up to three body files. Bodies are read back in
//! bounded byte windows so large messages never have to be loaded whole.

mod chunk;
mod html;
mod id;
mod model;
mod store;

pub use html::html_to_text;
pub use id::{MAX_CONTENT_ID_LEN, content_id};
pub use model::{BodyChunk, BodyFormat, BodyInfo, BodySource, CachedMessage, MessageSummary};
pub use store::{
    CONTENT_EXPIRY_HOURS, ContentStore, DEFAULT_CHUNK_LIMIT, DEFAULT_PREVIEW_LENGTH,
};
