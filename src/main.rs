//! Hacktrack - hackathon activity tracker
//!
//! A CLI tool that gathers commit and issue history for the projects of a
//! hackathon and reports per-project and over-time activity.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad catalog, bad config, invalid bucketing, etc.)

use anyhow::{Context, Result};
use chrono::Utc;
use hacktrack::analysis::{collect, new_progress_bar, parse_timestamp, Frequency};
use hacktrack::catalog::ProjectCatalog;
use hacktrack::cli::{Args, OutputFormat, View};
use hacktrack::config::{Config, CONFIG_FILE};
use hacktrack::models::{Project, ProjectId, ReportSection};
use hacktrack::pipeline::{build_report, BucketParams, ReportOptions};
use hacktrack::report;
use hacktrack::source::{FetchMode, FetchStrategy, SourceOptions};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("Hacktrack v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .hacktrack.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the project list, event start and bucket width.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete collection and reporting workflow.
fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    // Bucketing parameters are checked before any data is fetched.
    let since = parse_timestamp(&config.source.since).context("Invalid --since")?;
    let now = match args.now {
        Some(ref now) => parse_timestamp(now).context("Invalid --now")?,
        None => Utc::now(),
    };
    let frequency: Frequency = config
        .buckets
        .frequency
        .parse()
        .context("Invalid --frequency")?;
    let params = BucketParams {
        since,
        now,
        frequency,
    };
    if args.view.uses_buckets() {
        params.validate()?;
    }

    // Step 1: Load the project catalog
    let catalog = ProjectCatalog::load(&config.general.project_list)?;
    info!(
        "Tracking {} projects from {}",
        catalog.len(),
        config.general.project_list.display()
    );

    // Step 2: Choose the source
    let mode = if config.source.update {
        FetchMode::Remote { since }
    } else {
        FetchMode::Cached
    };
    let source = FetchStrategy::from_options(&SourceOptions {
        mode,
        data_dir: config.general.data_dir.clone(),
        api_url: config.source.api_url.clone(),
        timeout: Duration::from_secs(config.source.timeout_seconds),
        per_page: config.source.per_page,
    })?;
    info!("Source: {} ({})", source.mode_name(), config.general.data_dir.display());

    // Step 3: Collect and merge
    let progress = new_progress_bar(catalog.len(), !args.quiet);
    let collected = collect(&catalog, &source, &progress);

    // Step 4: Build the requested view
    let selection: Vec<ProjectId> = args
        .selected_projects()
        .map_err(anyhow::Error::msg)?
        .iter()
        .map(Project::id)
        .collect();

    let options = ReportOptions {
        view: args.view,
        mode: source.mode_name().to_string(),
        projects_tracked: catalog.len(),
        selection,
        params,
    };
    let report = build_report(&collected, &options)?;

    // Step 5: Render
    let output = match (args.format, args.view) {
        (OutputFormat::Json, View::Snapshot) => match report.sections.first() {
            Some(ReportSection::Snapshot(rows)) => report::generate_snapshot_json(rows)?,
            _ => report::generate_json_report(&report)?,
        },
        (OutputFormat::Json, _) => report::generate_json_report(&report)?,
        (OutputFormat::Markdown, _) => report::generate_markdown_report(&report),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    debug!("Finished in {:.1}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
