//! `mailvault` - maintenance tool for MailVault storage.
//!
//! Loads the environment configuration (which migrates renamed account
//! folders), then prints accounts, drafts or cache statistics as JSON, or
//! evicts and clears account caches.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod offline;

use std::io::Write;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailvault_core::{Config, MailService};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline::OfflineFactory;

#[derive(Parser)]
#[command(name = "mailvault")]
#[command(about = "Inspect and maintain MailVault account storage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// List configured accounts
    Accounts,
    /// Show what the load pass migrated
    Migrate,
    /// Show cache statistics
    Stats {
        /// Account id (default account if omitted)
        account: Option<String>,
    },
    /// Run an eviction pass
    Evict {
        /// Account id (default account if omitted)
        account: Option<String>,
    },
    /// Delete everything in the cache
    Clear {
        /// Account id (default account if omitted)
        account: Option<String>,
    },
    /// List saved drafts
    Drafts {
        /// Account id (default account if omitted)
        account: Option<String>,
    },
}

/// What the load pass did, as printed by `migrate`.
#[derive(Debug, Serialize)]
struct MigrateOutput<'a> {
    migrated: Vec<Renamed<'a>>,
    failed: Vec<String>,
    orphaned: &'a [String],
    conflicted: &'a [String],
}

#[derive(Debug, Serialize)]
struct Renamed<'a> {
    from: &'a str,
    to: &'a str,
    email: &'a str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailvault=info,mailvault_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("loading configuration")?;
    info!("Files root {}", config.files_root.display());
    let service = MailService::new(config, OfflineFactory).context("preparing account folders")?;

    let output = match cli.command {
        Command::Accounts => serde_json::to_value(service.list_accounts())?,
        Command::Migrate => {
            let report = service.bootstrap_report();
            serde_json::to_value(MigrateOutput {
                migrated: report
                    .migrated
                    .iter()
                    .map(|plan| Renamed {
                        from: &plan.old_folder_name,
                        to: &plan.new_account_id,
                        email: &plan.email_address,
                    })
                    .collect(),
                failed: report
                    .failures
                    .iter()
                    .map(|f| format!("{}: {}", f.plan.old_folder_name, f.error))
                    .collect(),
                orphaned: &report.orphaned,
                conflicted: &report.conflicted,
            })?
        }
        Command::Stats { account } => {
            serde_json::to_value(service.cache_stats(account.as_deref()).await?)?
        }
        Command::Evict { account } => {
            serde_json::to_value(service.evict_cache(account.as_deref()).await?)?
        }
        Command::Clear { account } => {
            service.clear_cache(account.as_deref()).await?;
            serde_json::json!({ "cleared": true })
        }
        Command::Drafts { account } => {
            serde_json::to_value(service.list_drafts(account.as_deref()).await?)?
        }
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("mailvault").chain(args.iter().copied())).map(|cli| cli.command)
    }

    #[test]
    fn account_argument_is_optional() {
        assert_eq!(parse(&["stats"]).ok(), Some(Command::Stats { account: None }));
        assert_eq!(
            parse(&["clear", "Work"]).ok(),
            Some(Command::Clear { account: Some("Work".into()) })
        );
        assert_eq!(parse(&["accounts"]).ok(), Some(Command::Accounts));
    }

    #[test]
    fn unknown_commands_and_help_stop_parsing() {
        assert!(parse(&["bogus"]).is_err());
        let help = parse(&["--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(parse(&["accounts", "extra"]).is_err());
    }
}
