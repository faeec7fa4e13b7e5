//! Account validation.

use super::model::AccountConfig;

/// Problem with one account's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Password is empty.
    EmptyPassword,
    /// IMAP host is empty.
    EmptyImapHost,
    /// IMAP port is zero.
    InvalidImapPort,
    /// SMTP host is empty.
    EmptySmtpHost,
    /// SMTP port is zero.
    InvalidSmtpPort,
}

impl ValidationError {
    /// Human-readable message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptyPassword => "Password is required",
            Self::EmptyImapHost => "IMAP server is required",
            Self::InvalidImapPort => "IMAP port must be 1-65535",
            Self::EmptySmtpHost => "SMTP server is required",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
        }
    }

    /// Variable suffix this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "EMAIL",
            Self::EmptyPassword => "PASSWORD",
            Self::EmptyImapHost => "IMAP_SERVER",
            Self::InvalidImapPort => "IMAP_PORT",
            Self::EmptySmtpHost => "SMTP_SERVER",
            Self::InvalidSmtpPort => "SMTP_PORT",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Checks every field of `account`, collecting all problems.
///
/// # Errors
///
/// Returns the list of problems if any field is invalid.
pub fn validate_account(account: &AccountConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if account.email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !is_valid_email(&account.email) {
        errors.push(ValidationError::InvalidEmail);
    }
    if account.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }

    if account.imap.host.trim().is_empty() {
        errors.push(ValidationError::EmptyImapHost);
    }
    if account.imap.port == 0 {
        errors.push(ValidationError::InvalidImapPort);
    }
    if account.smtp.host.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpHost);
    }
    if account.smtp.port == 0 {
        errors.push(ValidationError::InvalidSmtpPort);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// One `@`, a non-empty local part and a dotted domain without empty labels.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{Endpoint, Provider, Security};

    fn account() -> AccountConfig {
        AccountConfig {
            id: "Work".into(),
            email: "me@example.com".into(),
            password: "secret".into(),
            provider: Provider::Custom,
            imap: Endpoint::new("imap.example.com", 993, Security::Tls),
            smtp: Endpoint::new("smtp.example.com", 587, Security::StartTls),
            timeout: Duration::from_secs(120),
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@sub.example.com"));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn complete_account_is_valid() {
        assert!(validate_account(&account()).is_ok());
    }

    #[test]
    fn every_problem_is_reported() {
        let mut broken = account();
        broken.password.clear();
        broken.imap.host.clear();
        broken.smtp.port = 0;

        let errors = validate_account(&broken).unwrap_err();
        assert_eq!(
            errors,
            [
                ValidationError::EmptyPassword,
                ValidationError::EmptyImapHost,
                ValidationError::InvalidSmtpPort
            ]
        );
        assert_eq!(errors[1].field(), "IMAP_SERVER");
    }
}
