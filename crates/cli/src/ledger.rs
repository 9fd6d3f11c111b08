//! `skufilter ledger`: read-only views of the seen-SKU ledger.

use std::path::PathBuf;

use clap::Subcommand;

use crate::filter::{load_config, resolve_ledger};
use crate::CliError;

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Print every recorded SKU, one per line
    #[command(after_help = "\
Examples:
  skufilter ledger show
  skufilter ledger show --path seen.csv
  skufilter ledger show --config acme.toml")]
    Show {
        /// Ledger CSV path (defaults to the configured or per-user ledger)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Filter config whose [ledger] section locates the ledger
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Print the number of recorded SKUs
    Count {
        #[arg(long)]
        path: Option<PathBuf>,

        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

pub fn cmd_ledger(cmd: LedgerCommands) -> Result<(), CliError> {
    let (path, config_path, count_only) = match cmd {
        LedgerCommands::Show { path, config } => (path, config, false),
        LedgerCommands::Count { path, config } => (path, config, true),
    };

    let config = load_config(config_path.as_deref())?;
    let ledger = resolve_ledger(&config, config_path.as_deref(), path, true)?
        .ok_or_else(|| CliError::args("no ledger configured"))?;

    let keys = ledger.load()?;
    if count_only {
        println!("{}", keys.len());
    } else {
        for key in &keys {
            println!("{key}");
        }
    }
    log::info!("ledger {}: {} SKUs", ledger.path().display(), keys.len());
    Ok(())
}
