/*!
 * Hallucination detection for model output.
 *
 * A purely syntactic plausibility filter: it flags candidate translations
 * that cannot be a reasonable rendering of their source line, without any
 * semantic review. A flagged candidate counts as a failed attempt.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed phrases some models inject regardless of input. A candidate
/// containing one of these while the source does not is rejected.
const SUSPICIOUS_TOKENS: &[&str] = &["千岁", "千景", "张三"];

/// Percent-escaped numeric entity artifact, e.g. `%123;`.
static ESCAPED_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"%\d+;").unwrap());

/// Characters that count as content when comparing lengths: ASCII
/// alphanumerics, Hiragana, Katakana and CJK Unified ideographs.
static NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FFF}]").unwrap()
});

/// Stripped-length ratio bounds; outside `[MIN_RATIO, MAX_RATIO]` the
/// candidate is implausible. Tuned constants.
const MIN_RATIO: f64 = 0.15;
const MAX_RATIO: f64 = 3.5;

/// Decide whether a candidate translation must be rejected.
///
/// Checks are evaluated in order and any one is sufficient:
/// empty or whitespace-only output; literal escape artifacts; a denylisted
/// token absent from the source; a stripped-length ratio outside bounds or
/// an output dominated by non-content characters.
pub fn is_hallucination(candidate: &str, source: &str) -> bool {
    if candidate.trim().is_empty() {
        return true;
    }

    if candidate.contains("\\n") || ESCAPED_ENTITY.is_match(candidate) {
        return true;
    }

    for token in SUSPICIOUS_TOKENS {
        if candidate.contains(token) && !source.contains(token) {
            return true;
        }
    }

    let stripped_candidate = NON_CONTENT.replace_all(candidate, "");
    let stripped_source = NON_CONTENT.replace_all(source, "");
    let ct = stripped_candidate.chars().count();
    let co = stripped_source.chars().count();
    if co == 0 {
        // No comparable content in the source; nothing to measure against.
        return false;
    }

    let ratio = ct as f64 / co as f64;
    if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
        return true;
    }

    // Markup or garbage leakage: most of the output was stripped away.
    let removed = candidate.chars().count().saturating_sub(ct);
    removed > 3 * ct
}
