/*!
 * Application controller module
 *
 * Drives a translation run over one file or a directory tree: collects the
 * input documents, runs them through the translation service with bounded
 * document concurrency, and writes each result atomically next to its source
 * (or into the requested output directory).
 */

use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::language_coverage::language_display;
use crate::translation::TranslationService;

/// Counters for one translation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

enum FileOutcome {
    Translated(PathBuf),
    Skipped(f64),
    Failed(String),
    Cancelled,
}

/// Orchestrates a run of the translation service over input documents.
pub struct Controller {
    config: Config,
    service: Arc<TranslationService>,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let service = Arc::new(TranslationService::new(&config)?);
        Ok(Self { config, service })
    }

    /// Translate every HTML document under `input`.
    ///
    /// Documents run concurrently up to `chunk_concurrency`; request
    /// admission stays bounded by the service's shared HTTP gate. A fired
    /// cancellation token stops the run cleanly, keeping every output
    /// already written.
    pub async fn run(
        &self,
        input: &Path,
        output_dir: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, AppError> {
        let files = collect_input_files(input)?;
        if files.is_empty() {
            return Err(AppError::File(format!(
                "No HTML files found under: {}",
                input.display()
            )));
        }
        info!(
            "Translating {} file(s) into {}",
            files.len(),
            language_display(&self.config.target_lang)
        );

        let mut outcomes = stream::iter(files.into_iter().map(|path| {
            let service = Arc::clone(&self.service);
            let target_lang = self.config.target_lang.clone();
            let output_dir = output_dir.map(Path::to_path_buf);
            let cancel = cancel.clone();
            async move {
                let outcome =
                    process_file(&service, &target_lang, &path, output_dir.as_deref(), &cancel)
                        .await;
                (path, outcome)
            }
        }))
        .buffer_unordered(self.config.chunk_concurrency.max(1));

        let mut summary = RunSummary::default();
        while let Some((path, outcome)) = outcomes.next().await {
            match outcome {
                FileOutcome::Translated(output) => {
                    info!("Translated {} -> {}", path.display(), output.display());
                    summary.translated += 1;
                }
                FileOutcome::Skipped(coverage) => {
                    info!(
                        "Skipped {} (already {:.0}% target language)",
                        path.display(),
                        coverage * 100.0
                    );
                    summary.skipped += 1;
                }
                FileOutcome::Failed(message) => {
                    error!("Failed {}: {}", path.display(), message);
                    summary.failed += 1;
                }
                FileOutcome::Cancelled => {
                    summary.cancelled = true;
                }
            }
        }

        if summary.cancelled {
            warn!("Run cancelled; completed outputs were kept");
        }
        info!(
            "Done: {} translated, {} skipped, {} failed",
            summary.translated, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}

async fn process_file(
    service: &TranslationService,
    target_lang: &str,
    path: &Path,
    output_dir: Option<&Path>,
    cancel: &CancellationToken,
) -> FileOutcome {
    let html = match tokio::fs::read_to_string(path).await {
        Ok(html) => html,
        Err(error) => return FileOutcome::Failed(format!("read failed: {}", error)),
    };

    let decision = service.should_skip(&html);
    if decision.skip {
        return FileOutcome::Skipped(decision.coverage);
    }

    match service.translate_html(&html, cancel).await {
        Ok(translated) => {
            let output = output_path_for(path, target_lang, output_dir);
            match write_atomic(&output, &translated) {
                Ok(()) => FileOutcome::Translated(output),
                Err(error) => FileOutcome::Failed(format!("write failed: {}", error)),
            }
        }
        Err(error) if error.is_cancelled() => FileOutcome::Cancelled,
        Err(error) => FileOutcome::Failed(error.to_string()),
    }
}

/// Collect the HTML files a run covers: the file itself, or every `.html`/
/// `.htm` under a directory, in a stable order.
fn collect_input_files(input: &Path) -> Result<Vec<PathBuf>, AppError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(AppError::File(format!(
            "Input path not found: {}",
            input.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Output path: `<stem>.<target_lang>.html`, next to the source unless an
/// output directory was requested.
fn output_path_for(path: &Path, target_lang: &str, output_dir: Option<&Path>) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    let name = format!("{}.{}.html", stem, target_lang);
    match output_dir {
        Some(dir) => dir.join(name),
        None => path.with_file_name(name),
    }
}

/// Write through a temp file in the destination directory so a crash or
/// cancellation never leaves a half-written output.
fn write_atomic(path: &Path, content: &str) -> Result<(), AppError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .map_err(|error| AppError::File(error.to_string()))?;
    Ok(())
}
