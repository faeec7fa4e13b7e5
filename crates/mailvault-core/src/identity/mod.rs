//! Durable record of which account owns an account-scoped folder.
//!
//! Each folder under the files root carries a `metadata.yaml` naming the
//! account id and email it was created for. Migration uses the email as the
//! stable attribute when account ids are renamed.

mod model;
mod store;

pub use model::AccountIdentity;
pub use store::{IDENTITY_FILE, identity_path, read_identity, scan_folders, write_identity, write_record};
