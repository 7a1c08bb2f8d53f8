use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};

use labelsort::config::{default_config_path, load_config, Config};
use labelsort::error::{ConfigError, LabelsortError, WorkerError};
use labelsort::logging::{self, LogFormat};
use labelsort::pipeline::{LogProgress, Pipeline, PipelineConfig, PipelineContext, PipelineError};
use labelsort::worker::{InboxService, Job};

#[derive(Parser)]
#[command(name = "labelsort")]
#[command(about = "Sort a shipment manifest and reorder its shipping labels to match")]
#[command(version)]
struct Cli {
    /// Log output format (text or json)
    #[arg(long, global = true, default_value = "text", env = "LABELSORT_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one manifest and label document
    #[command(after_help = "\
Examples:
  labelsort run --manifest orders.xlsx --document labels.pdf --out sorted/
  labelsort run --manifest orders.xlsx --document labels.pdf --out sorted/ --report report.json --json")]
    Run(RunArgs),

    /// Watch the inbox directory and process every manifest/document pair dropped into it
    Watch {
        /// Configuration file (defaults to the per-user config path)
        #[arg(long, env = "LABELSORT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file and exit
    CheckConfig {
        /// Configuration file (defaults to the per-user config path)
        #[arg(long, env = "LABELSORT_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Order manifest spreadsheet (.xlsx, .xls, .xlsb, .ods)
    #[arg(long)]
    manifest: PathBuf,

    /// Shipping label PDF
    #[arg(long)]
    document: PathBuf,

    /// Directory receiving the sorted outputs
    #[arg(long)]
    out: PathBuf,

    /// Configuration file supplying column layout and output names
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worksheet to read instead of the first one
    #[arg(long)]
    sheet: Option<String>,

    /// Also write a JSON reconciliation report under this file name
    #[arg(long)]
    report: Option<String>,

    /// Print the job summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format) {
        eprintln!("warning: {}", e);
    }

    let result = match cli.command {
        Commands::Run(args) => run_once(args),
        Commands::Watch { config } => watch(config),
        Commands::CheckConfig { config } => check_config(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_once(args: RunArgs) -> Result<(), LabelsortError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    let mut pipeline_config = PipelineConfig::from_config(&config);
    pipeline_config.output_directory = args.out;
    if args.sheet.is_some() {
        pipeline_config.sheet = args.sheet;
    }
    if args.report.is_some() {
        pipeline_config.report_filename = args.report;
    }

    let pipeline = Pipeline::from_config(Arc::new(pipeline_config));
    let job = Job::new(args.manifest, args.document);
    let progress = LogProgress::new(job.id.as_str());
    let mut ctx = PipelineContext::new(job);

    let output = pipeline.run(&mut ctx, &progress)?;

    for warning in &ctx.warnings {
        warn!("{}", warning);
    }

    if args.json {
        let summary = serde_json::to_string_pretty(&output).map_err(PipelineError::Report)?;
        println!("{}", summary);
        return Ok(());
    }

    println!(
        "{} orders, {} cancelled, {} of {} pages kept",
        output.order_count,
        output.placeholder_count,
        output.output_page_count,
        output.source_page_count
    );
    for path in output.paths() {
        println!("  {}", path.display());
    }
    for line in output.reconciliation.summary_lines() {
        println!("{}", line);
    }
    Ok(())
}

fn resolve_config_path(config: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    config
        .or_else(default_config_path)
        .ok_or_else(|| ConfigError::Validation {
            message: "No --config given and no default config directory on this platform"
                .to_string(),
        })
}

fn watch(config: Option<PathBuf>) -> Result<(), LabelsortError> {
    let path = resolve_config_path(config)?;
    let config = load_config(&path)?;
    info!("Loaded config from {}", path.display());

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Interrupt received, finishing current job...");
        flag.store(true, Ordering::Relaxed);
    })
    .map_err(|e| WorkerError::WatchError(format!("Failed to install Ctrl-C handler: {}", e)))?;

    InboxService::new(config).run(shutdown)
}

fn check_config(config: Option<PathBuf>) -> Result<(), LabelsortError> {
    let path = resolve_config_path(config)?;
    let config = load_config(&path)?;

    println!("{}: OK", path.display());
    println!("  inbox:   {}", config.inbox_directory);
    println!("  outbox:  {}", config.outbox_directory);
    println!(
        "  columns: order_id={} sku={} quantity={} status={} (skip {} row(s))",
        config.manifest.columns.order_id,
        config.manifest.columns.sku,
        config.manifest.columns.quantity,
        config.manifest.columns.status,
        config.manifest.skip_rows
    );
    Ok(())
}
