//! Configuration model types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::layout::AccountLayout;
use crate::{Error, Result};

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Security mode implied by an IMAP port.
    #[must_use]
    pub const fn for_imap_port(port: u16) -> Self {
        match port {
            143 => Self::StartTls,
            _ => Self::Tls,
        }
    }

    /// Security mode implied by an SMTP port.
    #[must_use]
    pub const fn for_smtp_port(port: u16) -> Self {
        match port {
            465 => Self::Tls,
            25 => Self::None,
            _ => Self::StartTls,
        }
    }
}

/// Mail provider presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Mail.
    Gmail,
    /// Microsoft Outlook / Office 365.
    Outlook,
    /// Anything else; endpoints must be configured explicitly.
    Custom,
}

impl Provider {
    /// Parses a provider name; unknown names are [`Provider::Custom`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gmail" => Self::Gmail,
            "outlook" => Self::Outlook,
            _ => Self::Custom,
        }
    }

    /// Name as shown to callers.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
            Self::Custom => "custom",
        }
    }

    /// Preset IMAP and SMTP endpoints, if the provider has any.
    #[must_use]
    pub fn endpoints(&self) -> Option<(Endpoint, Endpoint)> {
        let (imap, smtp) = match self {
            Self::Gmail => ("imap.gmail.com", "smtp.gmail.com"),
            Self::Outlook => ("outlook.office365.com", "smtp-mail.outlook.com"),
            Self::Custom => return None,
        };
        Some((
            Endpoint::new(imap, 993, Security::Tls),
            Endpoint::new(smtp, 587, Security::StartTls),
        ))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One server endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Self {
        Self {
            host: host.into(),
            port,
            security,
        }
    }
}

/// One configured account.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Account id, as used in `ACCOUNT_{ID}_*` and as the folder name.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Password or app password.
    pub password: String,
    /// Provider preset.
    pub provider: Provider,
    /// IMAP server.
    pub imap: Endpoint,
    /// SMTP server.
    pub smtp: Endpoint,
    /// Network timeout for transport operations.
    pub timeout: Duration,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .field("imap", &self.imap)
            .field("smtp", &self.smtp)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one folder per account.
    pub files_root: PathBuf,
    /// Per-account cache ledger limit in bytes.
    pub cache_max_size: u64,
    /// Largest attachment kept in the cache, in bytes.
    pub max_attachment_size: u64,
    /// Accounts by id.
    pub accounts: BTreeMap<String, AccountConfig>,
    /// Account used when a request names none. `None` only without accounts.
    pub default_account: Option<String>,
}

impl Config {
    /// Resolves an account id, treating `None` or an empty id as the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if the id isn't configured, or if no
    /// accounts are configured at all.
    pub fn account(&self, id: Option<&str>) -> Result<&AccountConfig> {
        let id = match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self
                .default_account
                .as_deref()
                .ok_or_else(|| Error::AccountNotFound("no accounts configured".into()))?,
        };
        self.accounts
            .get(id)
            .ok_or_else(|| Error::AccountNotFound(id.to_string()))
    }

    /// Whether `id` is the default account.
    #[must_use]
    pub fn is_default(&self, id: &str) -> bool {
        self.default_account.as_deref() == Some(id)
    }

    /// Configured account id → email mapping, as used for migration.
    #[must_use]
    pub fn account_emails(&self) -> BTreeMap<String, String> {
        self.accounts
            .iter()
            .map(|(id, account)| (id.clone(), account.email.clone()))
            .collect()
    }

    /// On-disk layout of account `id`.
    #[must_use]
    pub fn layout(&self, id: &str) -> AccountLayout {
        AccountLayout::new(self.files_root.join(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names() {
        assert_eq!(Provider::from_name("Gmail"), Provider::Gmail);
        assert_eq!(Provider::from_name("outlook"), Provider::Outlook);
        assert_eq!(Provider::from_name("fastmail"), Provider::Custom);
        assert!(Provider::Custom.endpoints().is_none());
    }

    #[test]
    fn port_implied_security() {
        assert_eq!(Security::for_imap_port(993), Security::Tls);
        assert_eq!(Security::for_imap_port(143), Security::StartTls);
        assert_eq!(Security::for_smtp_port(465), Security::Tls);
        assert_eq!(Security::for_smtp_port(587), Security::StartTls);
    }

    #[test]
    fn debug_redacts_password() {
        let account = AccountConfig {
            id: "Work".into(),
            email: "w@example.com".into(),
            password: "hunter2".into(),
            provider: Provider::Gmail,
            imap: Endpoint::default(),
            smtp: Endpoint::default(),
            timeout: Duration::from_secs(120),
        };
        assert!(!format!("{account:?}").contains("hunter2"));
    }
}
