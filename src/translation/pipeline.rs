/*!
 * Batched translation with cascading degradation.
 *
 * Units travel in ranges of up to ten lines. A range is first tried as one
 * batch request; if the response cannot be aligned line-for-line, a full
 * range degrades to three sub-batches (3/3/4), and a sub-batch that still
 * fails degrades to per-unit requests. A unit whose per-unit retries are
 * exhausted falls back to its source text, so the cascade never loses
 * content.
 */

use futures::future::join_all;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::core::TranslationService;
use super::hallucination::is_hallucination;
use super::prompts::{batch_system_prompt, single_system_prompt};
use crate::errors::TranslationError;

/// Units per full range.
pub const BATCH_SIZE: usize = 10;
/// Sub-batch sizes a rejected full range degrades to.
const SUB_BATCH_SIZES: [usize; 3] = [3, 3, 4];
/// Extra attempts for a single unit after its first invalid response.
const SINGLE_RETRY_MAX: u32 = 2;
const SINGLE_RETRY_DELAY_MS: u64 = 200;

/// Whitespace-padded line breaks in a batch response collapse to one `\n`
/// before alignment.
static LINE_JOIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\r?\n\s*").unwrap());

impl TranslationService {
    /// Translate an ordered list of unit cores, preserving positions.
    ///
    /// Ranges run concurrently; admission to the endpoint is still bounded by
    /// the service's HTTP gate. The only error this returns is cancellation.
    pub(crate) async fn translate_with_degrade(
        &self,
        cores: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        let ranges: Vec<_> = cores
            .chunks(BATCH_SIZE)
            .map(|range| self.resolve_range(range, cancel))
            .collect();
        let mut outputs = Vec::with_capacity(cores.len());
        for resolved in join_all(ranges).await {
            outputs.extend(resolved?);
        }
        Ok(outputs)
    }

    /// Resolve one range of up to `BATCH_SIZE` units through the cascade.
    async fn resolve_range(
        &self,
        range: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        if let Some(lines) = self.batch_translate(range, "batch", cancel).await? {
            return Ok(lines);
        }

        if range.len() == BATCH_SIZE {
            debug!("Range rejected, splitting into sub-batches");
            let (a, rest) = range.split_at(SUB_BATCH_SIZES[0]);
            let (b, c) = rest.split_at(SUB_BATCH_SIZES[1]);
            let (ra, rb, rc) = tokio::join!(
                self.resolve_sub_batch(a, cancel),
                self.resolve_sub_batch(b, cancel),
                self.resolve_sub_batch(c, cancel),
            );
            let mut outputs = ra?;
            outputs.extend(rb?);
            outputs.extend(rc?);
            return Ok(outputs);
        }

        // Short trailing range: no useful split, go straight to units.
        self.resolve_singles(range, cancel).await
    }

    /// Resolve one sub-batch, degrading to per-unit requests on rejection.
    async fn resolve_sub_batch(
        &self,
        range: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        if let Some(lines) = self.batch_translate(range, "sub-batch", cancel).await? {
            return Ok(lines);
        }
        self.resolve_singles(range, cancel).await
    }

    async fn resolve_singles(
        &self,
        range: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, TranslationError> {
        let mut outputs = Vec::with_capacity(range.len());
        for source in range {
            outputs.push(self.translate_single(source, cancel).await?);
        }
        Ok(outputs)
    }

    /// One batch request over the range.
    ///
    /// `Ok(None)` means the range was rejected (request failure after retries,
    /// line-count mismatch or a hallucinated line) and the caller should
    /// degrade. Only cancellation surfaces as an error.
    async fn batch_translate(
        &self,
        range: &[String],
        tag: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<String>>, TranslationError> {
        let system = batch_system_prompt(&self.config);
        let user = range.join("\n");
        match self.call_model(&system, &user, tag, cancel).await {
            Ok(raw) => Ok(split_batch_response(&raw, range)),
            Err(error) if error.is_cancelled() => Err(error),
            Err(error) => {
                warn!("[{}] request failed, degrading: {}", tag, error);
                Ok(None)
            }
        }
    }

    /// Translate one unit on its own, retrying invalid responses.
    ///
    /// An invalid response (multi-line, empty, hallucinated) or a failed
    /// request costs one attempt; when attempts run out the source text is
    /// returned verbatim so the document still reassembles completely.
    async fn translate_single(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        let system = single_system_prompt(&self.config);
        for attempt in 0..=SINGLE_RETRY_MAX {
            match self.call_model(&system, source, "single", cancel).await {
                Ok(raw) => {
                    let line = raw.trim();
                    if !line.contains('\n') && !is_hallucination(line, source) {
                        return Ok(line.to_string());
                    }
                    warn!("Invalid single-unit response (attempt {})", attempt + 1);
                }
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    warn!("Single-unit request failed (attempt {}): {}", attempt + 1, error);
                }
            }
            if attempt < SINGLE_RETRY_MAX {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(SINGLE_RETRY_DELAY_MS)) => {}
                    _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                }
            }
        }
        warn!("Single-unit attempts exhausted, keeping source text");
        Ok(source.to_string())
    }
}

/// Align a batch response with its source lines.
///
/// Line breaks with surrounding whitespace collapse to single `\n`s and
/// trailing whitespace is dropped before splitting. The result is accepted
/// only when the line count matches the source count exactly and no line
/// trips the hallucination filter; partial acceptance would misalign every
/// unit after the first bad line.
pub(crate) fn split_batch_response(raw: &str, sources: &[String]) -> Option<Vec<String>> {
    let normalized = LINE_JOIN.replace_all(raw, "\n");
    let normalized = normalized.trim_end();
    let lines: Vec<&str> = normalized.split('\n').collect();
    if lines.len() != sources.len() {
        return None;
    }
    for (line, source) in lines.iter().zip(sources) {
        if is_hallucination(line, source) {
            return None;
        }
    }
    Some(lines.into_iter().map(str::to_string).collect())
}
