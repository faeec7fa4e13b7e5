//! Service layer: per-account handles over the stores plus the mail
//! transport seam, behind one facade.

mod mail;
mod registry;
mod transport;

pub use mail::{
    AccountInfo, BatchSendOptions, DraftSendResult, DraftSendStatus, MAX_BATCH_DELAY, MIN_BATCH_DELAY,
    MailService,
};
pub use registry::{AccountHandle, AccountRegistry};
pub use transport::{MailTransport, TransportError, TransportFactory};
