/*!
 * Unit tests for the batch cascade, retry policy and HTTP gate
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use gdtrans::errors::ProviderError;
use gdtrans::translation::TranslationService;

use crate::common::mock_providers::{MockProvider, echo_provider};
use crate::common::{init_logging, test_config};

/// A document with `n` one-word paragraphs, numbered `word1 ... wordN`.
fn numbered_doc(n: usize) -> String {
    (1..=n)
        .map(|i| format!("<p>word{}</p>", i))
        .collect::<String>()
}

fn line_count(user: &str) -> usize {
    user.split('\n').count()
}

#[tokio::test]
async fn test_translate_html_withAlignedBatchResponse_shouldUseOneRequest() {
    init_logging();
    let mock = echo_provider();
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = numbered_doc(3);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    assert_eq!(out, html);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_translate_html_withMismatchedLineCount_shouldDegradeToSubBatches() {
    init_logging();
    // Full batches answer one line short; smaller requests echo correctly.
    let mock = MockProvider::new(|_system, user| {
        if line_count(user) == 10 {
            let broken: Vec<&str> = user.split('\n').take(9).collect();
            Ok(broken.join("\n"))
        } else {
            Ok(user.to_string())
        }
    });
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = numbered_doc(10);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    // No partial acceptance: every unit still lands in its own slot.
    assert_eq!(out, html);
    // One rejected full batch plus three sub-batches.
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_translate_html_withHallucinatedBatchLine_shouldDegradeToSubBatches() {
    init_logging();
    let mock = MockProvider::new(|_system, user| {
        if line_count(user) == 10 {
            // One injected denylist token poisons the whole batch.
            let mut lines: Vec<String> = user.split('\n').map(str::to_string).collect();
            lines[4] = "千岁".to_string();
            Ok(lines.join("\n"))
        } else {
            Ok(user.to_string())
        }
    });
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = numbered_doc(10);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    assert_eq!(out, html);
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_translate_html_withShortRangeRejected_shouldFallToSingles() {
    init_logging();
    // The trailing 2-unit range has no useful split; it goes straight to
    // per-unit requests (detected here by their single-line prompt).
    let mock = MockProvider::new(|system, user| {
        if system.contains("this line") {
            Ok(user.to_string())
        } else if line_count(user) == 2 {
            Ok("only one line".to_string())
        } else {
            Ok(user.to_string())
        }
    });
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = numbered_doc(12);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    assert_eq!(out, html);
    // One 10-unit batch, one rejected 2-unit batch, two singles.
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_translate_html_withExhaustedSingleRetries_shouldKeepSourceText() {
    init_logging();
    // Every response is empty and therefore invalid.
    let mock = MockProvider::new(|_system, _user| Ok(String::new()));
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = "<p>untranslatable line</p>";
    let out = service.translate_html(html, &cancel).await.unwrap();
    assert_eq!(out, html);
    // One batch attempt, then 1 + 2 single attempts.
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_translate_html_withTransientError_shouldRetryAndSucceed() {
    init_logging();
    let failures = Arc::new(AtomicUsize::new(1));
    let mock = MockProvider::new(move |_system, user| {
        if failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            Err(ProviderError::RateLimitExceeded("429".to_string()))
        } else {
            Ok(user.to_string())
        }
    });
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = numbered_doc(2);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    assert_eq!(out, html);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_translate_html_withNonTransientBatchError_shouldDegradeNotRetry() {
    init_logging();
    let mock = MockProvider::new(|system, user| {
        if system.contains("this line") {
            Ok(user.to_string())
        } else {
            Err(ProviderError::ApiError {
                status_code: 400,
                message: "bad request".to_string(),
            })
        }
    });
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = numbered_doc(3);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    assert_eq!(out, html);
    // One failed batch (no retry on 400), then three singles.
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_translate_html_withManyRanges_shouldRespectHttpGate() {
    init_logging();
    let mut config = test_config();
    config.http_concurrency = 2;
    let mock = MockProvider::with_delay(
        |_system, user| Ok(user.to_string()),
        Duration::from_millis(30),
    );
    let service = TranslationService::with_provider(&config, mock.clone());
    let cancel = CancellationToken::new();

    // Five ranges want to run at once; the gate admits two.
    let html = numbered_doc(50);
    let out = service.translate_html(&html, &cancel).await.unwrap();
    assert_eq!(out, html);
    assert_eq!(mock.call_count(), 5);
    assert!(mock.max_in_flight() <= 2);
}

#[tokio::test]
async fn test_translate_html_withCancelledToken_shouldReturnCancelled() {
    init_logging();
    let mock = MockProvider::with_delay(
        |_system, user| Ok(user.to_string()),
        Duration::from_millis(50),
    );
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let html = numbered_doc(3);
    let error = service.translate_html(&html, &cancel).await.unwrap_err();
    assert!(error.is_cancelled());
}

#[tokio::test]
async fn test_translate_html_withNoUnits_shouldMakeNoRequests() {
    init_logging();
    let mock = MockProvider::new(|_system, _user| {
        Err(ProviderError::RequestFailed("must not be called".to_string()))
    });
    let service = TranslationService::with_provider(&test_config(), mock.clone());
    let cancel = CancellationToken::new();

    let html = "<div><a href=\"x\">only a link</a></div>";
    let out = service.translate_html(html, &cancel).await.unwrap();
    assert_eq!(out, html);
    assert_eq!(mock.call_count(), 0);
}
