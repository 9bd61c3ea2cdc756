// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod chapter;
mod epub;
mod errors;
mod language_utils;
mod providers;
mod reporting;
mod translation;

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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for epubtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// epubtrans - EPUB translation with local AI
///
/// Translates the prose of an EPUB book using a local Ollama model while
/// leaving markup, code blocks, and structural content untouched.
#[derive(Parser, Debug)]
#[command(name = "epubtrans")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered EPUB translation tool")]
#[command(
    long_about = "epubtrans translates the prose of an EPUB book, text node by text node,
using a local Ollama model. Markup, code blocks, metadata, and structural
content are never rewritten. Every run produces a JSON report of changed,
failed, and skipped nodes.

EXAMPLES:
    epubtrans --in book.epub --out book.fr.epub -s en -t fr
    epubtrans --in book.epub --out book.fr.epub -s en -t fr -m mistral
    epubtrans --in book.epub --out out.epub -s en -t it --abort-on-error
    epubtrans --in book.epub --out out.epub -s en -t de --report-out run.json
    epubtrans completions bash > epubtrans.bash

EXIT CODES:
    0    run committed (or abort-on-error disabled)
    1    fatal error before or during processing
    2    abort-on-error triggered; report written, EPUB output suppressed

CONFIGURATION:
    When a config file exists at --config-path (default conf.json), it is
    loaded first and command-line options override it."
)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input EPUB file
    #[arg(long = "in", value_name = "INPUT_EPUB")]
    input_path: Option<PathBuf>,

    /// Output EPUB file
    #[arg(long = "out", value_name = "OUTPUT_EPUB")]
    output_path: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Retries per node after the first attempt
    #[arg(long)]
    retries: Option<u32>,

    /// Number of chapters translated concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Report output path (default: <OUTPUT_EPUB>.report.json)
    #[arg(long)]
    report_out: Option<PathBuf>,

    /// Do not write the output EPUB if any node failed
    #[arg(long)]
    abort_on_error: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// Custom logger writing timestamped colored lines to stderr
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
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
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Initialize the logger once with info level by default; the level is
    // updated after the config is loaded.
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "epubtrans", &mut std::io::stdout());
        return;
    }

    match run_translate(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run_translate(options: CommandLineOptions) -> Result<i32> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_level));
    }

    let config = build_config(&options)?;

    // If log level was not set via command line, take it from the config
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let input_path = options
        .input_path
        .ok_or_else(|| anyhow!("--in <INPUT_EPUB> is required"))?;
    let output_path = options
        .output_path
        .ok_or_else(|| anyhow!("--out <OUTPUT_EPUB> is required"))?;

    if !input_path.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", input_path));
    }

    let report_path = options
        .report_out
        .unwrap_or_else(|| default_report_path(&output_path));

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run(&input_path, &output_path, &report_path)
        .await?;

    println!(
        "{}",
        serde_json::json!({
            "output_written": summary.output_written,
            "failures": summary.failures,
            "report": report_path.to_string_lossy(),
        })
    );

    Ok(summary.exit_code)
}

/// Load the optional config file and apply CLI overrides on top
fn build_config(options: &CommandLineOptions) -> Result<Config> {
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        if config_path.as_str() != "conf.json" {
            warn!("Config file not found at '{}', using defaults.", config_path);
        }
        Config::default()
    };

    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(model) = &options.model {
        config.translation.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.translation.endpoint = endpoint.clone();
    }
    if let Some(temperature) = options.temperature {
        config.translation.temperature = temperature;
    }
    if let Some(retries) = options.retries {
        config.translation.retries = retries;
    }
    if let Some(workers) = options.workers {
        config.translation.workers = workers;
    }
    if options.abort_on_error {
        config.abort_on_error = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    Ok(config)
}

/// Default report path: the output path with `.report.json` appended
fn default_report_path(output: &Path) -> PathBuf {
    PathBuf::from(format!("{}.report.json", output.to_string_lossy()))
}
