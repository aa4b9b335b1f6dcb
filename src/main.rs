// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use contentqa::app_config::{self, Config, SharedConfig};
use contentqa::errors::{ErrorResponse, PipelineError};
use contentqa::pipeline::{EvaluationRequest, PipelineResponse, QualityPipeline, StatusDescriptor};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one request file and print the response
    Evaluate {
        /// Request file: {content, requirements, options?}
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Refine once even when the first revision is approved
        #[arg(short, long)]
        force_refinement: bool,

        /// Maximum number of analyzed revisions
        #[arg(short = 'n', long)]
        max_iterations: Option<u32>,

        /// Pretty-print the JSON response
        #[arg(short, long)]
        pretty: bool,
    },

    /// Evaluate every request file under a directory
    Batch {
        /// Directory containing request files
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Print the status descriptor
    Status,

    /// Generate shell completions for contentqa
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// contentqa - content quality pipeline
///
/// Scores generated content against audience, tone and keyword requirements,
/// refines it automatically and decides whether it can be approved.
#[derive(Parser, Debug)]
#[command(name = "contentqa")]
#[command(version)]
#[command(about = "Multi-stage content quality evaluation")]
#[command(long_about = "contentqa runs intent, E-E-A-T, source, link, variation and error analysis on a piece
of content, aggregates the scores and refines the content until it is approved or the
refinement budget is used up.

EXAMPLES:
    contentqa evaluate request.json               # Evaluate one request
    contentqa evaluate -f -n 2 request.json       # Force one refinement pass
    contentqa batch requests/                     # Evaluate a whole directory
    contentqa status                              # Print thresholds and stages
    contentqa completions bash > contentqa.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in contentqa.json by default. If the file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "contentqa.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            // Responses go to stdout; logs stay on stderr
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with the most verbose level, then narrow it once
    // the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "contentqa", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level.clone())?;

    match cli.command {
        Commands::Evaluate {
            request,
            force_refinement,
            max_iterations,
            pretty,
        } => run_evaluate(&config, &request, force_refinement, max_iterations, pretty).await,
        Commands::Batch { dir } => run_batch(config, &cli.config_path, &dir).await,
        Commands::Status => print_json(&StatusDescriptor::from_config(&config), true),
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load or create the configuration and apply the effective log level
fn load_config(config_path: &str, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = Config::load_or_create(config_path)?;

    if let Some(log_level) = cli_log_level {
        config.log_level = log_level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    debug!("Loaded configuration from {}", config_path);
    Ok(config)
}

fn read_request(path: &Path) -> Result<EvaluationRequest> {
    let file = File::open(path).context(format!("Failed to open request file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).context(format!("Failed to parse request file: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize response")?;
    println!("{}", json);
    Ok(())
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling the run");
            token.cancel();
        }
    });
}

/// Run the pipeline for one request
async fn evaluate_request(
    config: &Config,
    request: &EvaluationRequest,
    force_refinement: bool,
    max_iterations: Option<u32>,
    cancel: CancellationToken,
) -> Result<PipelineResponse, PipelineError> {
    let mut options = request.options.resolve(config);
    if force_refinement {
        options.force_refinement = true;
    }
    if let Some(iterations) = max_iterations {
        options.max_refinement_iterations = iterations;
    }

    let pipeline = QualityPipeline::from_config(config)?;
    let report = pipeline
        .run_with_cancellation(&request.content, &request.requirements, &options, cancel)
        .await?;
    report.to_response()
}

fn error_response(error: &PipelineError) -> ErrorResponse {
    if let PipelineError::Internal(detail) = error {
        error!("Internal pipeline error: {}", detail);
    }
    ErrorResponse::from(error)
}

async fn run_evaluate(
    config: &Config,
    request_path: &Path,
    force_refinement: bool,
    max_iterations: Option<u32>,
    pretty: bool,
) -> Result<()> {
    let request = read_request(request_path)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match evaluate_request(config, &request, force_refinement, max_iterations, cancel).await {
        Ok(response) => {
            info!(
                "Evaluation finished: {} after {} revision(s)",
                response.approval.outcome, response.metadata.total_iterations
            );
            print_json(&response, pretty)
        }
        Err(e) => {
            print_json(&error_response(&e), pretty)?;
            Err(anyhow!("Evaluation failed: {}", e.public_message()))
        }
    }
}

fn is_request_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

async fn run_batch(config: Config, config_path: &str, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(anyhow!("Input directory does not exist: {:?}", dir));
    }

    let config_file = Path::new(config_path).canonicalize().ok();
    let mut request_files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| is_request_file(p))
        .filter(|p| config_file.is_none() || p.canonicalize().ok() != config_file)
        .collect();
    request_files.sort();

    if request_files.is_empty() {
        return Err(anyhow!("No request files found in directory: {:?}", dir));
    }

    let shared = SharedConfig::new(config);
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let progress = ProgressBar::new(request_files.len() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} requests ({percent}%) {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style.progress_chars("█▓▒░"));

    let mut approved_count = 0;
    let mut error_count = 0;

    for path in &request_files {
        if cancel.is_cancelled() {
            break;
        }

        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        progress.set_message(format!("Evaluating: {}", file_name));

        // Pick up config edits between files; keep the previous config on error
        if Path::new(config_path).exists() {
            if let Err(e) = shared.reload_from(config_path) {
                warn!("Keeping previous configuration: {:#}", e);
            }
        }
        let config = shared.snapshot();

        let request = match read_request(path) {
            Ok(request) => request,
            Err(e) => {
                error!("Skipping {}: {:#}", file_name, e);
                error_count += 1;
                progress.inc(1);
                continue;
            }
        };

        match evaluate_request(&config, &request, false, None, cancel.clone()).await {
            Ok(response) => {
                if response.approval.is_approved() {
                    approved_count += 1;
                }
                progress.suspend(|| print_json(&response, false))?;
            }
            Err(PipelineError::Cancelled) => {
                warn!("Batch cancelled at {}", file_name);
                break;
            }
            Err(e) => {
                error_count += 1;
                progress.suspend(|| print_json(&error_response(&e), false))?;
            }
        }
        progress.inc(1);
    }

    progress.finish_with_message("Done");
    info!(
        "Evaluated {} request(s): {} approved, {} failed",
        request_files.len(),
        approved_count,
        error_count
    );
    Ok(())
}
