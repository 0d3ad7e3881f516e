// threatpath-cli/src/main.rs
// ============================================================================
// Module: ThreatPath CLI Entry Point
// Description: Command dispatcher for the batch analytics pipeline.
// Purpose: Drive analyze/forecast/decide stages and governance workflows.
// Dependencies: clap, threatpath-{config,core,intel,store-sqlite}, serde_json
// ============================================================================

//! ## Overview
//! The `threatpath` binary runs the batch pipeline stage by stage (or end
//! to end with `pipeline`) and hosts the governance workflows: genesis
//! initialization, status snapshots, execution-feedback ingestion, and
//! ledger verification. Exit codes: 0 on clean completion, 1 on input
//! errors, 2 on governance integrity or conflict failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use threatpath_config::ThreatPathConfig;
use threatpath_core::DecisionEngine;
use threatpath_core::ExecutionReport;
use threatpath_core::GovernanceError;
use threatpath_core::InMemoryVulnCatalog;
use threatpath_core::LearningEngine;
use threatpath_core::PathAnalyzer;
use threatpath_core::PathReport;
use threatpath_core::PredictionSummary;
use threatpath_core::ResponseDecision;
use threatpath_core::Session;
use threatpath_core::SessionBuilder;
use threatpath_core::Timestamp;
use threatpath_core::TrajectoryForecaster;
use threatpath_core::TrustLedger;
use threatpath_core::VulnCatalog;
use threatpath_core::VulnIntel;
use threatpath_core::load_events;
use threatpath_core::runtime::state_from_report;
use threatpath_intel::SqliteCatalogConfig;
use threatpath_intel::SqliteVulnCatalog;
use threatpath_store_sqlite::SqliteGovernanceStore;
use threatpath_store_sqlite::SqliteStoreConfig;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "threatpath", version, arg_required_else_help = true)]
struct Cli {
    /// Optional config file path (defaults to threatpath.toml when present).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sessionize events and emit per-session path reports.
    Analyze(AnalyzeCommand),
    /// Forecast trajectories from path reports.
    Forecast(ForecastCommand),
    /// Derive response decisions from forecasts.
    Decide(DecideCommand),
    /// Run analyze, forecast, and decide end to end.
    Pipeline(PipelineCommand),
    /// Governance and learning workflows.
    Govern {
        /// Selected governance subcommand.
        #[command(subcommand)]
        command: GovernCommand,
    },
}

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
struct AnalyzeCommand {
    /// Event files (JSON array or JSON lines).
    #[arg(long = "events", value_name = "PATH", required = true, num_args = 1..)]
    events: Vec<PathBuf>,
    /// Output file for path reports.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Arguments for the `forecast` command.
#[derive(Args, Debug)]
struct ForecastCommand {
    /// Path reports produced by `analyze`.
    #[arg(long, value_name = "FILE")]
    reports: PathBuf,
    /// Output file for trajectory forecasts.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Arguments for the `decide` command.
#[derive(Args, Debug)]
struct DecideCommand {
    /// Forecasts produced by `forecast`.
    #[arg(long, value_name = "FILE")]
    forecasts: PathBuf,
    /// Output file for response decisions.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Arguments for the `pipeline` command.
#[derive(Args, Debug)]
struct PipelineCommand {
    /// Event files (JSON array or JSON lines).
    #[arg(long = "events", value_name = "PATH", required = true, num_args = 1..)]
    events: Vec<PathBuf>,
    /// Output directory for all pipeline artifacts.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

/// Governance subcommands.
#[derive(Subcommand, Debug)]
enum GovernCommand {
    /// Initialize the governance store with the genesis configuration.
    Init,
    /// Emit the governance status snapshot.
    Status(StatusCommand),
    /// Ingest an execution report and update the trust model.
    Ingest(IngestCommand),
    /// Verify trust ledger integrity.
    Verify,
}

/// Arguments for `govern status`.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Output file for the status snapshot.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Arguments for `govern ingest`.
#[derive(Args, Debug)]
struct IngestCommand {
    /// Execution (or script-generation) report file.
    #[arg(long, value_name = "FILE")]
    report: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure classification for exit codes.
#[derive(Debug, Error)]
enum CliError {
    /// Unrecoverable input error (exit code 1).
    #[error("{0}")]
    Input(String),
    /// Governance integrity or conflict failure (exit code 2).
    #[error("{0}")]
    Governance(String),
}

impl From<GovernanceError> for CliError {
    fn from(error: GovernanceError) -> Self {
        Self::Governance(error.to_string())
    }
}

impl CliError {
    /// Maps the failure to its process exit code.
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Input(_) => ExitCode::from(1),
            Self::Governance(_) => ExitCode::from(2),
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            err.exit_code()
        }
    }
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze(command) => run_analyze(&config, &command),
        Commands::Forecast(command) => run_forecast(&config, &command),
        Commands::Decide(command) => run_decide(&config, &command),
        Commands::Pipeline(command) => run_pipeline(&config, &command),
        Commands::Govern {
            command,
        } => run_govern(&config, &command),
    }
}

/// Loads the configuration from the explicit path, the default file, or
/// built-in defaults.
fn load_config(path: Option<&Path>) -> Result<ThreatPathConfig, CliError> {
    let default_path = Path::new("threatpath.toml");
    let chosen = match path {
        Some(explicit) => Some(explicit),
        None if default_path.exists() => Some(default_path),
        None => None,
    };
    match chosen {
        Some(path) => ThreatPathConfig::load(path).map_err(|err| CliError::Input(err.to_string())),
        None => Ok(ThreatPathConfig::default()),
    }
}

// ============================================================================
// SECTION: Pipeline Commands
// ============================================================================

/// Runs sessionization and path analysis.
fn run_analyze(config: &ThreatPathConfig, command: &AnalyzeCommand) -> Result<(), CliError> {
    let intel = open_intel(config);
    let sessions = build_sessions(config, &command.events)?;
    let reports = analyze_sessions(&intel, &sessions);
    let output = command
        .output
        .clone()
        .unwrap_or_else(|| config.output.directory.join("path_reports.json"));
    write_artifact(&output, &reports)?;
    emit(&format!("{} path report(s) written to {}", reports.len(), output.display()))
}

/// Runs trajectory forecasting over stored path reports.
fn run_forecast(config: &ThreatPathConfig, command: &ForecastCommand) -> Result<(), CliError> {
    let intel = open_intel(config);
    let reports: Vec<PathReport> = read_artifact(&command.reports)?;
    let forecasts = forecast_reports(config, &intel, &reports);
    let output = command
        .output
        .clone()
        .unwrap_or_else(|| config.output.directory.join("trajectory_forecast.json"));
    write_artifact(&output, &forecasts)?;
    emit(&format!("{} forecast(s) written to {}", forecasts.len(), output.display()))
}

/// Runs decision arbitration over stored forecasts.
fn run_decide(config: &ThreatPathConfig, command: &DecideCommand) -> Result<(), CliError> {
    let intel = open_intel(config);
    let forecasts: Vec<PredictionSummary> = read_artifact(&command.forecasts)?;
    let decisions = decide_forecasts(&intel, &forecasts);
    let output = command
        .output
        .clone()
        .unwrap_or_else(|| config.output.directory.join("response_plan.json"));
    write_artifact(&output, &decisions)?;
    emit(&format!("{} decision(s) written to {}", decisions.len(), output.display()))
}

/// Runs all three stages end to end.
fn run_pipeline(config: &ThreatPathConfig, command: &PipelineCommand) -> Result<(), CliError> {
    let intel = open_intel(config);
    let output_dir =
        command.output_dir.clone().unwrap_or_else(|| config.output.directory.clone());

    let sessions = build_sessions(config, &command.events)?;
    let reports = analyze_sessions(&intel, &sessions);
    write_artifact(&output_dir.join("path_reports.json"), &reports)?;

    let forecasts = forecast_reports(config, &intel, &reports);
    write_artifact(&output_dir.join("trajectory_forecast.json"), &forecasts)?;

    let decisions = decide_forecasts(&intel, &forecasts);
    write_artifact(&output_dir.join("response_plan.json"), &decisions)?;

    emit(&format!(
        "pipeline complete: {} session(s), {} report(s), {} decision(s) in {}",
        sessions.len(),
        reports.len(),
        decisions.len(),
        output_dir.display()
    ))
}

/// Loads events and groups them into sessions.
fn build_sessions(
    config: &ThreatPathConfig,
    event_paths: &[PathBuf],
) -> Result<Vec<Session>, CliError> {
    let events = load_events(event_paths).map_err(|err| CliError::Input(err.to_string()))?;
    let builder = SessionBuilder::new(config.pipeline.window_minutes);
    let sessions = builder.build(events);
    info!(session_count = sessions.len(), "sessionization complete");
    Ok(sessions)
}

/// Analyzes every session, skipping empty ones.
fn analyze_sessions(intel: &VulnIntel, sessions: &[Session]) -> Vec<PathReport> {
    let analyzer = PathAnalyzer::new(intel);
    let now = now_timestamp();
    sessions.iter().filter_map(|session| analyzer.analyze(session, now)).collect()
}

/// Forecasts every report.
fn forecast_reports(
    config: &ThreatPathConfig,
    intel: &VulnIntel,
    reports: &[PathReport],
) -> Vec<PredictionSummary> {
    let forecaster = TrajectoryForecaster::with_depth(intel, config.pipeline.max_forecast_depth);
    reports
        .iter()
        .map(|report| {
            let state = state_from_report(report);
            forecaster.predict(&report.session_id, &state, report.path_anomaly_score)
        })
        .collect()
}

/// Correlates and evaluates every forecast, ordered by priority rank.
fn decide_forecasts(intel: &VulnIntel, forecasts: &[PredictionSummary]) -> Vec<ResponseDecision> {
    let engine = DecisionEngine::new(intel);
    let contexts = engine.analyze_correlations(forecasts);
    let mut decisions: Vec<ResponseDecision> = forecasts
        .iter()
        .filter_map(|forecast| {
            contexts.get(&forecast.session_id).map(|ctx| engine.evaluate(forecast, ctx))
        })
        .collect();
    decisions.sort_by(|left, right| {
        right
            .priority_rank
            .cmp(&left.priority_rank)
            .then_with(|| left.session_id.cmp(&right.session_id))
    });
    decisions
}

// ============================================================================
// SECTION: Governance Commands
// ============================================================================

/// Dispatches a governance subcommand.
fn run_govern(config: &ThreatPathConfig, command: &GovernCommand) -> Result<(), CliError> {
    let store_config = SqliteStoreConfig::new(&config.governance.store_path);
    let store = SqliteGovernanceStore::new(&store_config)
        .map_err(|err| CliError::Governance(err.to_string()))?;
    let now = now_timestamp();

    match command {
        GovernCommand::Init => {
            let engine = LearningEngine::new(store);
            let configuration = engine.active_or_genesis(now)?;
            emit(&format!("active trust configuration: {}", configuration.version_id))
        }
        GovernCommand::Status(status) => {
            let engine = LearningEngine::new(store);
            let snapshot = engine.governance_status(now)?;
            if !snapshot.ledger_integrity {
                warn!("trust ledger verification failed; chain is tampered");
            }
            match &status.output {
                Some(path) => {
                    write_artifact(path, &snapshot)?;
                    emit(&format!("governance status written to {}", path.display()))
                }
                None => {
                    let rendered = serde_json::to_string_pretty(&snapshot)
                        .map_err(|err| CliError::Input(err.to_string()))?;
                    emit(&rendered)
                }
            }
        }
        GovernCommand::Ingest(ingest) => {
            let report: ExecutionReport = read_artifact(&ingest.report)?;
            let ledger = TrustLedger::new(store);
            if !ledger.verify_integrity()? {
                return Err(CliError::Governance(
                    "trust ledger verification failed; writes blocked until resolved".to_string(),
                ));
            }
            let report_id = report
                .report_id
                .clone()
                .or_else(|| report.script_filename.clone())
                .unwrap_or_else(|| "unknown".to_string());
            ledger.log_event(
                "INGEST_REPORT",
                serde_json::json!({"report_id": report_id}),
                "CliUser",
                now,
            )?;
            let engine = LearningEngine::new(ledger.into_store());
            let outcome = engine.process_execution_feedback(&report, now)?;
            emit(&format!(
                "trust model updated: {} ({})",
                outcome.configuration.version_id, outcome.narrative
            ))
        }
        GovernCommand::Verify => {
            let ledger = TrustLedger::new(store);
            if ledger.verify_integrity()? {
                emit("ledger integrity: VERIFIED")
            } else {
                Err(CliError::Governance("ledger integrity: TAMPERED".to_string()))
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens the shared intel cache, degrading to an empty catalog on failure.
fn open_intel(config: &ThreatPathConfig) -> VulnIntel {
    let mut catalog_config = SqliteCatalogConfig::new(&config.catalog.path);
    catalog_config.busy_timeout_ms = config.catalog.busy_timeout_ms;
    let catalog: Arc<dyn VulnCatalog + Send + Sync> =
        match SqliteVulnCatalog::open(&catalog_config) {
            Ok(catalog) => Arc::new(catalog),
            Err(err) => {
                warn!(error = %err, "catalog unavailable; lookups degrade to zero records");
                Arc::new(InMemoryVulnCatalog::new())
            }
        };
    VulnIntel::new(catalog)
}

/// Returns the current wall-clock timestamp.
fn now_timestamp() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
    Timestamp::from_unix_millis(millis)
}

/// Reads a JSON artifact from disk.
fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|err| CliError::Input(format!("failed to read {}: {err}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|err| CliError::Input(format!("failed to parse {}: {err}", path.display())))
}

/// Writes a JSON artifact to disk, creating parent directories.
fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                CliError::Input(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
    }
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| CliError::Input(err.to_string()))?;
    fs::write(path, rendered)
        .map_err(|err| CliError::Input(format!("failed to write {}: {err}", path.display())))
}

/// Writes one line to standard output.
fn emit(line: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(line.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .map_err(|err| CliError::Input(err.to_string()))
}
