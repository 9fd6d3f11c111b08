//! `skufilter run` / `skufilter validate`: the upload/download boundary.
//!
//! Reads the two CSV tables, hands them to the engine, writes the output
//! table and reports one status line. Business logic lives in the engine.

use std::path::{Path, PathBuf};

use clap::Args;
use skufilter_engine::config::FilterConfig;
use skufilter_engine::{FilterInput, Ledger, Table};

use crate::CliError;

const DEFAULT_OUTPUT: &str = "new_skus_for_upload.csv";

#[derive(Args)]
pub struct RunArgs {
    /// Vendor inventory CSV (the new feed)
    #[arg(long)]
    pub vendor: Option<PathBuf>,

    /// Master inventory CSV (current catalog export). Omit for a first run.
    #[arg(long)]
    pub master: Option<PathBuf>,

    /// Filter config (.toml). Defaults apply when omitted.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output CSV path, or "-" for stdout
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Use the seen-SKU ledger at its configured or default location
    #[arg(long)]
    pub ledger: bool,

    /// Use the seen-SKU ledger at this path (implies --ledger)
    #[arg(long, value_name = "PATH")]
    pub ledger_path: Option<PathBuf>,

    /// Do not record new SKUs in the ledger
    #[arg(long)]
    pub dry_run: bool,

    /// Print a JSON report to stdout
    #[arg(long)]
    pub json: bool,
}

/// Load a config file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, CliError> {
    let Some(path) = path else {
        return Ok(FilterConfig::default());
    };
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    Ok(FilterConfig::from_toml(&config_str)?)
}

/// Ledger location: explicit path, then config (relative to the config
/// file's directory), then the per-user default. `None` when disabled.
pub fn resolve_ledger(
    config: &FilterConfig,
    config_path: Option<&Path>,
    explicit: Option<PathBuf>,
    enabled: bool,
) -> Result<Option<Ledger>, CliError> {
    let label = config.columns.identifier.clone();

    if let Some(path) = explicit {
        return Ok(Some(Ledger::new(path, label)));
    }

    let configured = config.ledger.as_ref();
    if !enabled && configured.is_none() {
        return Ok(None);
    }

    if let Some(path) = configured.and_then(|l| l.path.as_ref()) {
        let base_dir = config_path
            .and_then(|p| p.parent())
            .unwrap_or_else(|| Path::new("."));
        return Ok(Some(Ledger::new(base_dir.join(path), label)));
    }

    let path = Ledger::default_path().ok_or_else(|| {
        CliError::io("cannot determine a data directory for the ledger")
            .with_hint("pass --ledger-path <csv>")
    })?;
    Ok(Some(Ledger::new(path, label)))
}

fn read_table(path: &Path) -> Result<Table, CliError> {
    let table = Table::read_csv(path)?;
    log::debug!("{}: {} columns, {} rows", path.display(), table.headers.len(), table.len());
    Ok(table)
}

/// Write CSV text atomically: .tmp then rename.
fn write_output(path: &Path, csv: &str) -> Result<(), CliError> {
    let tmp_path = path.with_extension("csv.tmp");
    std::fs::write(&tmp_path, csv)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", tmp_path.display())))?;
    std::fs::rename(&tmp_path, path)
        .map_err(|e| CliError::io(format!("failed to rename tmp to output: {e}")))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let to_stdout = args.output.as_os_str() == "-";
    if to_stdout && args.json {
        return Err(CliError::args("--json and -o - both write to stdout")
            .with_hint("write the CSV to a file with -o <path>"));
    }

    let config = load_config(args.config.as_deref())?;
    let ledger = resolve_ledger(
        &config,
        args.config.as_deref(),
        args.ledger_path,
        args.ledger,
    )?;

    let vendor = args.vendor.as_deref().map(read_table).transpose()?;
    let master = args.master.as_deref().map(read_table).transpose()?;
    let seen = match ledger {
        Some(ref ledger) => {
            let seen = ledger.load()?;
            log::info!("ledger {}: {} known SKUs", ledger.path().display(), seen.len());
            seen
        }
        None => Default::default(),
    };

    let outcome = skufilter_engine::run(&config, FilterInput { vendor, master, seen })?;
    let status = outcome.status();

    let csv = outcome.table.to_csv()?;
    if to_stdout {
        print!("{csv}");
    } else {
        write_output(&args.output, &csv)?;
        eprintln!("wrote {} ({} rows)", args.output.display(), outcome.table.len());
    }

    // Ledger mutation is a separate step, after the output exists.
    let mut recorded = None;
    if let Some(ref ledger) = ledger {
        if args.dry_run {
            eprintln!("ledger: dry run, {} new SKU(s) not recorded", outcome.new_keys.len());
        } else {
            let added = ledger.append(&outcome.new_keys)?;
            eprintln!("ledger: {added} SKU(s) recorded in {}", ledger.path().display());
            recorded = Some(added);
        }
    }

    if args.json {
        let report = serde_json::json!({
            "status": status,
            "meta": outcome.meta,
            "summary": outcome.summary,
            "warnings": outcome.warnings,
            "new_skus": outcome.new_keys,
            "output": args.output.display().to_string(),
            "ledger_recorded": recorded,
        });
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!("{status}");
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(config_path.as_path()))?;

    let mut features = Vec::new();
    if config.columns.expand_groups {
        features.push(format!("groups by '{}'", config.columns.group));
    }
    if config.regroup.enabled {
        features.push(format!("fuzzy regroup at {}", config.regroup.threshold));
    } else if config.regroup.format_groups {
        features.push("group formatting".to_string());
    }
    if let Some(targets) = config.projection.targets() {
        features.push(format!("{} output columns ({:?})", targets.len(), config.projection.policy));
    }
    if config.ledger.is_some() {
        features.push("ledger".to_string());
    }

    eprintln!("config ok: \"{}\" keyed on '{}'", config.name, config.columns.identifier);
    if !features.is_empty() {
        eprintln!("  {}", features.join(", "));
    }
    Ok(())
}
