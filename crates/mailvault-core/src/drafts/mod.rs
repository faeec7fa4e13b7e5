//! Saved drafts, one YAML file per draft.

mod model;
mod store;

pub use model::{Draft, DraftSummary};
pub use store::DraftStore;
