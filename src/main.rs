// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use gdtrans::app_config::{Config, EndpointDialect};
use gdtrans::app_controller::Controller;

/// CLI wrapper for EndpointDialect to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDialect {
    OpenAI,
    Completion,
}

impl From<CliDialect> for EndpointDialect {
    fn from(cli_dialect: CliDialect) -> Self {
        match cli_dialect {
            CliDialect::OpenAI => EndpointDialect::OpenAI,
            CliDialect::Completion => EndpointDialect::Completion,
        }
    }
}

/// CLI wrapper for log levels to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// gdtrans - game description translation
///
/// Translates HTML game description files through an OpenAI-compatible or
/// self-hosted completion endpoint, preserving markup and skipping documents
/// that are already in the target language.
#[derive(Parser, Debug)]
#[command(name = "gdtrans")]
#[command(version = "0.1.0")]
#[command(about = "HTML description translation through slow LLM endpoints")]
struct CommandLineOptions {
    /// Input HTML file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output directory; defaults to writing next to each source file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Target language code (e.g. 'zh', 'ja', 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Source language code, or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Request body dialect for the endpoint
    #[arg(short, long, value_enum)]
    dialect: Option<CliDialect>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Compact timestamped stderr logger.
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level }))?;
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
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
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
async fn main() -> Result<()> {
    let cli = CommandLineOptions::parse();

    let level = cli
        .log_level
        .clone()
        .map(LevelFilter::from)
        .unwrap_or(LevelFilter::Info);
    CustomLogger::init(level)?;

    let mut config = if Path::new(&cli.config_path).exists() {
        Config::from_file(&cli.config_path)?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            cli.config_path
        );
        let config = Config::default();
        config
            .save_to_file(&cli.config_path)
            .with_context(|| format!("Failed to write default config to: {}", cli.config_path))?;
        config
    };

    if let Some(target_lang) = &cli.target_language {
        config.target_lang = target_lang.clone();
    }
    if let Some(source_lang) = &cli.source_language {
        config.source_lang = source_lang.clone();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect.into();
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::new(config)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after in-flight work");
            interrupt.cancel();
        }
    });

    let summary = controller
        .run(&cli.input_path, cli.output_dir.as_deref(), &cancel)
        .await?;

    if summary.failed > 0 {
        return Err(anyhow!("{} file(s) failed to translate", summary.failed));
    }
    Ok(())
}
