//! Loading configuration from environment variables.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use super::model::{AccountConfig, Config, Provider, Security};
use super::validation::validate_account;
use crate::{Error, Result};

/// Cache ledger limit when `EMAIL_CACHE_MAX_SIZE` is unset (10 MiB).
pub const DEFAULT_CACHE_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Attachment size limit when `EMAIL_MAX_ATTACHMENT_SIZE` is unset (25 MiB).
pub const DEFAULT_ATTACHMENT_MAX_SIZE: u64 = 25 * 1024 * 1024;

/// Transport timeout when `ACCOUNT_{ID}_TIMEOUT_SECONDS` is unset.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

const ACCOUNT_PREFIX: &str = "ACCOUNT_";
const EMAIL_SUFFIX: &str = "_EMAIL";

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Loads configuration from `(name, value)` pairs.
    ///
    /// Accounts are discovered from `ACCOUNT_{ID}_EMAIL` variables. Empty
    /// values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric variable doesn't parse, an
    /// account fails validation, or `DEFAULT_ACCOUNT_ID` names an unknown
    /// account.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        let get = |name: &str| vars.get(name).map(|v| v.trim());

        let files_root = get("FILES_ROOT").map_or_else(default_files_root, PathBuf::from);
        let cache_max_size = parse_or(get("EMAIL_CACHE_MAX_SIZE"), "EMAIL_CACHE_MAX_SIZE", DEFAULT_CACHE_MAX_SIZE)?;
        let max_attachment_size = parse_or(
            get("EMAIL_MAX_ATTACHMENT_SIZE"),
            "EMAIL_MAX_ATTACHMENT_SIZE",
            DEFAULT_ATTACHMENT_MAX_SIZE,
        )?;

        let mut accounts = BTreeMap::new();
        for id in discover_account_ids(vars.keys()) {
            let account = load_account(&id, &get)?;
            accounts.insert(id, account);
        }

        let default_account = match get("DEFAULT_ACCOUNT_ID") {
            Some(id) if accounts.contains_key(id) => Some(id.to_string()),
            Some(id) => {
                return Err(Error::Config(format!(
                    "default account {id} not found in configured accounts"
                )));
            }
            None => accounts.keys().next().cloned(),
        };

        debug!(
            "Loaded {} account(s), default {:?}, files root {}",
            accounts.len(),
            default_account,
            files_root.display()
        );

        Ok(Self {
            files_root,
            cache_max_size,
            max_attachment_size,
            accounts,
            default_account,
        })
    }
}

fn default_files_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mailvault")
}

fn discover_account_ids<'a>(names: impl Iterator<Item = &'a String>) -> BTreeSet<String> {
    names
        .filter_map(|name| name.strip_prefix(ACCOUNT_PREFIX)?.strip_suffix(EMAIL_SUFFIX))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn load_account<'a>(id: &str, get: &impl Fn(&str) -> Option<&'a str>) -> Result<AccountConfig> {
    let var = |suffix: &str| format!("{ACCOUNT_PREFIX}{id}_{suffix}");
    let value = |suffix: &str| get(&var(suffix));

    // Unset provider means gmail, matching the most common deployment.
    let provider = value("PROVIDER").map_or(Provider::Gmail, Provider::from_name);
    let (mut imap, mut smtp) = provider.endpoints().unwrap_or_default();

    if let Some(host) = value("IMAP_SERVER") {
        imap.host = host.to_string();
    }
    if let Some(port) = value("IMAP_PORT") {
        imap.port = parse(port, &var("IMAP_PORT"))?;
        imap.security = Security::for_imap_port(imap.port);
    }
    if let Some(host) = value("SMTP_SERVER") {
        smtp.host = host.to_string();
    }
    if let Some(port) = value("SMTP_PORT") {
        smtp.port = parse(port, &var("SMTP_PORT"))?;
        smtp.security = Security::for_smtp_port(smtp.port);
    }
    let timeout = parse_or(value("TIMEOUT_SECONDS"), &var("TIMEOUT_SECONDS"), DEFAULT_TIMEOUT_SECONDS)?;

    let account = AccountConfig {
        id: id.to_string(),
        email: value("EMAIL").unwrap_or_default().to_string(),
        password: value("PASSWORD").unwrap_or_default().to_string(),
        provider,
        imap,
        smtp,
        timeout: Duration::from_secs(timeout),
    };

    validate_account(&account).map_err(|errors| {
        let details: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", var(e.field()), e.message()))
            .collect();
        Error::Config(format!("account {id} is invalid: {}", details.join("; ")))
    })?;

    Ok(account)
}

fn parse<T: FromStr>(raw: &str, name: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| Error::Config(format!("invalid {name} {raw:?}: {e}")))
}

fn parse_or<T: FromStr>(raw: Option<&str>, name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse(raw, name))
}
