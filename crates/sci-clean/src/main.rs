//! CLI entry point for reproducible data cleaning.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use sci_clean::{
    AuditLog, CleaningSession, DataType, ExportMethod, Pipeline, PipelineConfig, ProfileDocument,
    ProfileRun, ReportGenerator, render_summary,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Reproducible CSV profiling and cleaning",
    long_about = "Profiles a comma-delimited file, confirms column types and exports a cleaned \
                  dataset together with a Python script that reproduces it.\n\n\
                  EXAMPLES:\n  \
                  # Profile only\n  \
                  sci-clean -i trial.csv --dry-run\n\n  \
                  # Accept confident detections, settle the rest by hand\n  \
                  sci-clean -i trial.csv --accept-detected --min-confidence 80 -t site=CATEGORICAL\n\n  \
                  # Machine-readable profile\n  \
                  sci-clean -i trial.csv --json"
)]
struct Args {
    /// Path to the file to profile
    #[arg(short, long)]
    input: String,

    /// Output directory for exported artifacts
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// JSON file with a pipeline configuration
    #[arg(long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Print the profile report and detections as JSON and nothing else
    #[arg(long)]
    json: bool,

    /// Profile and show detected types without exporting
    #[arg(long)]
    dry_run: bool,

    /// Confirm every detected type
    #[arg(long)]
    accept_detected: bool,

    /// Only accept detections at or above this confidence
    #[arg(long, requires = "accept_detected", value_parser = clap::value_parser!(u8).range(0..=100))]
    min_confidence: Option<u8>,

    /// Confirm a column type explicitly, e.g. `-t age=NUMERIC` (repeatable)
    #[arg(short = 't', long = "type", value_name = "COLUMN=TYPE", value_parser = parse_type_override)]
    types: Vec<(String, DataType)>,

    /// Export forward-filled rows instead of raw rows
    #[arg(long)]
    forward_fill: bool,
}

/// Parse a `COLUMN=TYPE` override.
fn parse_type_override(value: &str) -> std::result::Result<(String, DataType), String> {
    let (column, data_type) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected COLUMN=TYPE, got '{}'", value))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{}'", value));
    }
    Ok((column.to_string(), data_type.parse()?))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = load_config(&args)?;
    let audit = Arc::new(AuditLog::new());

    let mut builder = Pipeline::builder()
        .config(config.clone())
        .audit_sink(audit.clone());
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    let run = pipeline
        .profile_file(&args.input)
        .map_err(|e| anyhow!("Profiling failed: {}", e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ProfileDocument::from_run(&run))?);
        return Ok(());
    }

    println!("{}", render_summary(&run, config.ambiguity_threshold));

    if args.dry_run {
        print_dry_run_outputs(&args, &run, &config);
        return Ok(());
    }

    let mut session = CleaningSession::with_config(run, audit.clone(), config.export.clone());
    confirm_types(&args, &mut session)?;

    let pending = session.pending_columns();
    if !pending.is_empty() {
        error!("Unconfirmed columns: {}", pending.join(", "));
        println!("Confirm the remaining columns with -t COLUMN=TYPE or --accept-detected:");
        for column in &pending {
            let detected = session
                .run()
                .inference(column)
                .map(|r| format!("{} ({}%)", r.detected_type, r.confidence))
                .unwrap_or_default();
            println!("  - {} detected {}", column, detected);
        }
        return Err(anyhow!(
            "{} column(s) still need a confirmed type; nothing was exported",
            pending.len()
        ));
    }

    export(&args, &session, &audit)
}

/// Read the configuration file if one was given and apply CLI overrides.
fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            PipelineConfig::from_json(&json)?
        }
        None => PipelineConfig::default(),
    };

    if args.forward_fill {
        config.export.forward_fill = true;
    }
    config.validate()?;
    Ok(config)
}

/// Apply explicit overrides, then accept detections for whatever is left.
fn confirm_types(args: &Args, session: &mut CleaningSession) -> Result<()> {
    for (column, data_type) in &args.types {
        session.confirm(column, *data_type)?;
        info!("Confirmed {} as {}", column, data_type);
    }

    if args.accept_detected {
        let threshold = args.min_confidence.unwrap_or(0);
        let accepted = session.accept_all_confirmed_above(threshold)?;
        info!(
            "Accepted {} detected type(s) at confidence >= {}%",
            accepted, threshold
        );
    } else if args.types.is_empty() {
        warn!("No types confirmed; use --accept-detected or -t COLUMN=TYPE");
    }

    Ok(())
}

/// Write the profile, cleaned dataset, script and audit log.
fn export(args: &Args, session: &CleaningSession, audit: &AuditLog) -> Result<()> {
    let dataset = session.export_dataset()?;
    let script = session.export_script(ExportMethod::Download)?;

    let generator = ReportGenerator::new(&args.output);
    let file_name = &session.run().report.file_name;
    let profile_path = generator.write_profile(session.run())?;
    let dataset_path = generator.write_dataset(file_name, &dataset)?;
    let script_path = generator.write_script(&session.config().script_name, &script)?;
    let audit_path = generator.write_audit_log(file_name, audit)?;

    println!("{}", "=".repeat(80));
    println!("EXPORT COMPLETE");
    println!("{}", "=".repeat(80));
    println!(
        "  Cleaned data: {} ({} rows, {} empty cells)",
        dataset_path.display(),
        dataset.row_count(),
        dataset.empty_cells()
    );
    println!("  Script:       {}", script_path.display());
    println!("  Profile:      {}", profile_path.display());
    println!("  Audit log:    {}", audit_path.display());
    println!();
    println!(
        "Replay with: python3 {} {}",
        script_path.display(),
        args.input
    );
    println!("{}", "=".repeat(80));

    Ok(())
}

/// List what a full run would write.
fn print_dry_run_outputs(args: &Args, run: &ProfileRun, config: &PipelineConfig) {
    let file_name = &run.report.file_name;
    let stem = sci_clean::reporting::file_stem(file_name);

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    println!("  - {}/{}", args.output, sci_clean::export::cleaned_file_name(file_name));
    println!("  - {}/{}", args.output, config.export.script_name);
    println!("  - {}/{}_profile.json", args.output, stem);
    println!("  - {}/{}_audit.json", args.output, stem);
    println!();
    println!("To export, run without --dry-run and confirm types with --accept-detected or -t");
}
