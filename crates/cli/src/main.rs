// skufilter CLI - extract new SKUs from a vendor feed for catalog import

mod exit_codes;
mod filter;
mod ledger;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use skufilter_engine::FilterError;

use exit_codes::{filter_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "skufilter")]
#[command(about = "Extract products absent from your catalog out of a vendor inventory feed")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff a vendor feed against the master catalog and write the new products
    #[command(after_help = "\
Examples:
  skufilter run --vendor vendor.csv --master shopify_export.csv
  skufilter run --vendor vendor.csv --master shopify_export.csv -o new_skus.csv
  skufilter run --vendor vendor.csv --config acme.toml --json
  skufilter run --vendor vendor.csv --ledger
  skufilter run --vendor vendor.csv --ledger-path seen.csv --dry-run -o -")]
    Run(filter::RunArgs),

    /// Validate a filter config without running
    #[command(after_help = "\
Examples:
  skufilter validate acme.toml")]
    Validate {
        /// Path to the .toml config file
        config: std::path::PathBuf,
    },

    /// Inspect the cumulative seen-SKU ledger
    Ledger {
        #[command(subcommand)]
        command: ledger::LedgerCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  skufilter-engine ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => filter::cmd_run(args),
        Commands::Validate { config } => filter::cmd_validate(config),
        Commands::Ledger { command } => ledger::cmd_ledger(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code and hint.
    pub fn filter(err: FilterError) -> Self {
        let code = filter_exit_code(&err);
        let hint = match &err {
            FilterError::MissingInput(skufilter_engine::TableRole::Vendor) => {
                Some("pass the vendor feed with --vendor <csv>".to_string())
            }
            FilterError::MissingInput(_) => {
                Some("pass the catalog export with --master <csv>, or set require_master = false".to_string())
            }
            FilterError::MissingColumns { table: skufilter_engine::TableRole::Output, .. } => {
                Some("add the columns to the feed, or set projection.policy = \"warn\"".to_string())
            }
            FilterError::MissingColumns { .. } => {
                Some("column names are matched ignoring case and surrounding spaces".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<FilterError> for CliError {
    fn from(err: FilterError) -> Self {
        Self::filter(err)
    }
}
