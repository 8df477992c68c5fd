mod config;

use anyhow::Context;
use bulkedit_core::adapters::{FsCatalog, FsWritePort, StaticSpecProvider, file_sha256};
use bulkedit_core::artifacts::write_report_artifacts;
use bulkedit_core::ports::EventSink;
use bulkedit_core::{BulkAttributeCorrector, CancelFlag, CatalogPorts, RunSettings, SweepError};
use bulkedit_render::{render_event_line, render_summary_line};
use bulkedit_types::event::SweepEvent;
use bulkedit_types::report::ReportToolInfo;
use bulkedit_types::spec::CorrectionSpec;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{BulkeditConfig, ConfigMerger, RunOverrides};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUT_DIR: &str = "artifacts/bulkedit";

#[derive(Debug, Parser)]
#[command(
    name = "bulkedit",
    version,
    about = "Rename attribute values on variable products and their variations."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sweep the catalog and apply the correction list.
    Run(RunArgs),
    /// Print the effective correction list.
    Specs(SpecsArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Product ids to correct, comma-separated or repeated. Empty sweeps the catalog.
    ids: Vec<String>,

    /// Catalog JSON file.
    #[arg(long, default_value = "catalog.json")]
    catalog: Utf8PathBuf,

    /// Report planned changes without writing anything.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Product status to match (`any` matches every status).
    #[arg(long)]
    status: Option<String>,

    /// Products fetched per page.
    #[arg(long)]
    page_size: Option<u32>,

    /// Number of matching products to skip.
    #[arg(long)]
    offset: Option<u64>,

    /// Pass-through query filter, `field=value`. Repeatable.
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Extra correction, `attribute:old=new`. Repeatable; runs after config corrections.
    #[arg(long = "rename")]
    renames: Vec<String>,

    /// Output directory for report artifacts (default: artifacts/bulkedit).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Config file (default: ./bulkedit.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct SpecsArgs {
    /// Extra correction, `attribute:old=new`. Repeatable.
    #[arg(long = "rename")]
    renames: Vec<String>,

    /// Config file (default: ./bulkedit.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        let code = e
            .downcast_ref::<SweepError>()
            .map(SweepError::exit_code)
            .unwrap_or(1);
        return ExitCode::from(code);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Specs(args) => cmd_specs(args),
    }
}

/// Prints one line per event on stdout.
struct StdoutSink;

impl EventSink for StdoutSink {
    fn on_event(&self, event: &SweepEvent) {
        if let Some(line) = render_event_line(event) {
            println!("{}", line);
        }
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let file_config = load_file_config(args.config.as_deref())?;
    let overrides = RunOverrides {
        status: args.status,
        page_size: args.page_size,
        offset: args.offset,
        filters: config::parse_cli_filters(&args.filters)?,
        renames: parse_renames(&args.renames)?,
        out_dir: args.out_dir,
    };
    let merged = ConfigMerger::new(file_config).merge_run_args(overrides);
    let target_ids = config::parse_target_ids(&args.ids)?;

    debug!(
        "merged config: filters={:?}, specs={}, targets={:?}",
        merged.filters,
        merged.specs.len(),
        target_ids
    );

    let catalog = FsCatalog::open(args.catalog.clone())?;
    let sha_before = file_sha256(&args.catalog)?;

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.cancel()) {
        debug!("could not install Ctrl+C handler: {}", e);
    }

    let specs = StaticSpecProvider::new(merged.specs);
    let sink = StdoutSink;
    let corrector = BulkAttributeCorrector::new(CatalogPorts::from_backend(&catalog), &specs, &sink)
        .with_cancel(cancel)
        .with_tool(ReportToolInfo {
            name: "bulkedit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        });

    let settings = RunSettings {
        target_ids,
        filters: merged.filters,
        dry_run: args.dry_run,
    };
    let mut report = corrector.run(&settings)?;

    let sha_after = file_sha256(&args.catalog)?;
    report.data = Some(serde_json::json!({
        "catalog": args.catalog.as_str(),
        "catalog_sha256_before": sha_before,
        "catalog_sha256_after": sha_after,
    }));

    println!("{}", render_summary_line(&report));

    let out_dir = merged
        .out_dir
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUT_DIR));
    if let Err(e) = write_report_artifacts(&report, &out_dir, &FsWritePort) {
        error!("write report artifacts to {}: {:?}", out_dir, e);
    } else {
        info!("wrote report to {}", out_dir);
    }
    Ok(())
}

fn cmd_specs(args: SpecsArgs) -> anyhow::Result<()> {
    let file_config = load_file_config(args.config.as_deref())?;
    let renames = parse_renames(&args.renames)?;
    let specs = ConfigMerger::new(file_config).merge_specs(&renames);

    match args.format {
        OutputFormat::Text => {
            if specs.is_empty() {
                println!("No correction specs.");
            }
            for spec in &specs {
                println!(
                    "{} ({}): {} -> {}",
                    spec.attribute_key,
                    spec.taxonomy(),
                    spec.old_value,
                    spec.new_value
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
    }
    Ok(())
}

fn load_file_config(path: Option<&Utf8Path>) -> anyhow::Result<BulkeditConfig> {
    match path {
        Some(path) => config::load_config(path),
        None => config::load_or_default(Utf8Path::new(".")).context("load bulkedit.toml config"),
    }
}

fn parse_renames(raw: &[String]) -> anyhow::Result<Vec<CorrectionSpec>> {
    raw.iter().map(|r| config::parse_rename(r)).collect()
}
