//! Service configuration.
//!
//! Loaded from environment variables: global storage settings plus one
//! block of `ACCOUNT_{ID}_*` variables per account.

mod env;
mod model;
mod validation;

pub use env::{DEFAULT_ATTACHMENT_MAX_SIZE, DEFAULT_CACHE_MAX_SIZE, DEFAULT_TIMEOUT_SECONDS};
pub use model::{AccountConfig, Config, Endpoint, Provider, Security};
pub use validation::{ValidationError, ValidationResult, validate_account};
