//! Firestorm CLI
//!
//! Thin shell over the engine library:
//! - `rates`: dense rate table of a record file
//! - `window`: activity window of the burst
//! - `phases`: change points and the phases they induce
//! - `summary`: metadata summary of a catalogued firestorm
//!
//! Payloads go to stdout as JSON; logs and errors go to stderr.

use clap::{Args, Parser, Subcommand, ValueEnum};
use firestorm_common::{parse_records, Error, Record, Result};
use firestorm_config::{load_config, Catalog, LoadedConfig};
use firestorm_core::exit_codes::ExitCode;
use firestorm_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use firestorm_core::{
    summary, ActivityWindowDetector, Firestorm, Granularity, PhaseSegmenter, TrackedRate,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Firestorm time-series engine
#[derive(Parser)]
#[command(name = "firestorm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Engine configuration file (engine.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dense per-interval rate table
    Rates(RatesArgs),

    /// Activity window of the burst
    Window(WindowArgs),

    /// Change points and phases
    Phases(PhasesArgs),

    /// Metadata summary of a catalogued firestorm
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct RecordsArg {
    /// JSON array of records
    #[arg(long)]
    records: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GranularityArg {
    Hour,
    SixHour,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Hour => Granularity::Hour,
            GranularityArg::SixHour => Granularity::SixHourSlot,
        }
    }
}

#[derive(Args, Debug)]
struct RatesArgs {
    #[command(flatten)]
    input: RecordsArg,

    /// Interval width
    #[arg(long, value_enum, default_value = "hour")]
    granularity: GranularityArg,
}

#[derive(Args, Debug)]
struct WindowArgs {
    #[command(flatten)]
    input: RecordsArg,

    /// Absolute activity floor (overrides config)
    #[arg(long)]
    min_threshold: Option<f64>,

    /// Fraction of the peak count that counts as active (overrides config)
    #[arg(long)]
    factor: Option<f64>,
}

#[derive(Args, Debug)]
struct PhasesArgs {
    #[command(flatten)]
    input: RecordsArg,

    /// Change-point penalty (overrides config)
    #[arg(long)]
    penalty: Option<f64>,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[command(flatten)]
    input: RecordsArg,

    /// Firestorm catalog (JSON map of descriptors)
    #[arg(long)]
    catalog: PathBuf,

    /// Catalog entry to summarize
    #[arg(long)]
    key: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_level = if cli.global.quiet {
        LogLevel::Error
    } else {
        match cli.global.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    };
    let explicit_level = (cli.global.quiet || cli.global.verbose > 0).then_some(log_level);
    init_logging(&LogConfig::from_env(explicit_level, cli.global.log_format));

    let run_id = generate_run_id();
    let exit_code = match run(&cli, &run_id) {
        Ok(payload) => match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::Clean
            }
            Err(e) => {
                error!(error = %e, "failed to render output");
                ExitCode::InternalError
            }
        },
        Err(e) => output_error(&run_id, &e),
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli, run_id: &str) -> Result<Value> {
    let loaded = load_config(cli.global.config.as_deref())?;
    info!(
        run_id,
        config_source = %loaded.paths.engine_source,
        "firestorm run started"
    );

    let (command, result) = match &cli.command {
        Commands::Rates(args) => ("rates", run_rates(&loaded, args)?),
        Commands::Window(args) => ("window", run_window(&loaded, args)?),
        Commands::Phases(args) => ("phases", run_phases(&loaded, args)?),
        Commands::Summary(args) => ("summary", run_summary(&loaded, args)?),
    };

    info!(run_id, command, "firestorm run finished");
    Ok(json!({
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
        "config": loaded.snapshot,
        "result": result,
    }))
}

fn read_records(path: &Path, loaded: &LoadedConfig) -> Result<Vec<Record>> {
    let zone = loaded.config.zone()?;
    let text = std::fs::read_to_string(path)?;
    let records = parse_records(&text, &zone)?;
    info!(path = %path.display(), count = records.len(), "records loaded");
    Ok(records)
}

fn load_firestorm(loaded: &LoadedConfig, input: &RecordsArg) -> Result<Firestorm> {
    let records = read_records(&input.records, loaded)?;
    let tracked = TrackedRate::resolve_all(&loaded.config.aggregation.tracked_rates)?;
    Ok(Firestorm::unfiltered(records, tracked).with_zone(loaded.config.zone()?))
}

fn run_rates(loaded: &LoadedConfig, args: &RatesArgs) -> Result<Value> {
    let storm = load_firestorm(loaded, &args.input)?;
    let granularity = Granularity::from(args.granularity);
    let table = storm.table(granularity)?;
    Ok(json!({
        "granularity": granularity,
        "intervals": table.len(),
        "zone": loaded.config.zone()?.to_string(),
        "rows": table.export_rows(),
        "count_trend": table.count_trend().ok(),
    }))
}

fn run_window(loaded: &LoadedConfig, args: &WindowArgs) -> Result<Value> {
    let storm = load_firestorm(loaded, &args.input)?;
    let detector = ActivityWindowDetector::from(loaded.config.window)
        .with_overrides(args.min_threshold, args.factor);
    let window = storm.window(&detector)?;
    Ok(serde_json::to_value(window)?)
}

fn run_phases(loaded: &LoadedConfig, args: &PhasesArgs) -> Result<Value> {
    let storm = load_firestorm(loaded, &args.input)?;
    let mut segmenter = PhaseSegmenter::from_config(&loaded.config.segmentation);
    if let Some(penalty) = args.penalty {
        if penalty.is_nan() || penalty < 0.0 {
            return Err(Error::Config(format!("penalty must be >= 0, got {}", penalty)));
        }
        segmenter = segmenter.with_penalty(penalty);
    }
    let breakpoints = storm.breakpoints(&segmenter)?;
    let at: Vec<_> = breakpoints.iter().map(|b| b.at).collect();
    let phases = firestorm_core::segment(storm.records(), &at)?;
    Ok(json!({
        "penalty": segmenter.penalty(),
        "analysis_columns": segmenter.analysis_columns(),
        "breakpoints": breakpoints,
        "phases": phases.iter().map(|p| p.summary()).collect::<Vec<_>>(),
    }))
}

fn run_summary(loaded: &LoadedConfig, args: &SummaryArgs) -> Result<Value> {
    let catalog = Catalog::from_file(&args.catalog)?;
    let descriptor = catalog.get(&args.key)?;
    let records = read_records(&args.input.records, loaded)?;
    let storm = Firestorm::from_descriptor(records, descriptor, &loaded.config)?;
    let zone = loaded.config.zone()?;
    let mut map = summary(&storm, descriptor, &zone)?;
    map.insert("key".to_string(), Value::String(args.key.clone()));
    Ok(Value::Object(map))
}

fn output_error(run_id: &str, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    let response = json!({
        "run_id": run_id,
        "status": "error",
        "exit_code": exit_code.code_name(),
        "error": err.to_structured(),
    });
    error!(code = err.code(), error = %err, "firestorm run failed");
    match serde_json::to_string_pretty(&response) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("error: {}", err),
    }
    exit_code
}
