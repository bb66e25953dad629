/*!
 * Language coverage gate.
 *
 * Cheap pre-check that estimates how much of a document's translatable text
 * already belongs to the target language's script, so documents that were
 * translated in a previous run are skipped without issuing any requests.
 */

use crate::html_processor::HtmlDocument;

/// A document is skipped when at least this fraction of its letters already
/// belongs to the target script. Tuned constant, do not rederive.
pub const SKIP_THRESHOLD: f64 = 0.90;

/// Aggregate letter counts over a document's translatable text.
///
/// Only Unicode letters participate; digits, punctuation and whitespace are
/// excluded from both numerator and denominator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageSample {
    pub target_letters: u64,
    pub total_letters: u64,
}

impl CoverageSample {
    pub fn observe(&mut self, text: &str, lang: &str) {
        for c in text.chars() {
            if !c.is_alphabetic() {
                continue;
            }
            self.total_letters += 1;
            if is_target_letter(c, lang) {
                self.target_letters += 1;
            }
        }
    }

    pub fn coverage(&self) -> f64 {
        if self.total_letters == 0 {
            return 0.0;
        }
        self.target_letters as f64 / self.total_letters as f64
    }
}

/// Decide whether a document is already in the target language.
///
/// Uses the same text-node selection as unit extraction (skip tags and anchors
/// excluded) but ignores attributes. Returns `(skip, coverage)`. Zero letters
/// means insufficient signal and never skips.
pub fn should_skip_by_language(doc: &HtmlDocument, target_lang: &str) -> (bool, f64) {
    let lang = normalize_lang(target_lang);
    let mut sample = CoverageSample::default();
    for text in doc.translatable_text() {
        sample.observe(text, &lang);
    }
    if sample.total_letters == 0 {
        return (false, 0.0);
    }
    let coverage = sample.coverage();
    (coverage >= SKIP_THRESHOLD, coverage)
}

/// Normalize a configured language code to the short form the script table
/// understands. Three-letter ISO 639 codes are mapped through isolang first,
/// then matched by prefix; anything unrecognized passes through as-is (and
/// will count zero target letters, biasing toward not skipping).
pub fn normalize_lang(code: &str) -> String {
    let mut lang = code.trim().to_lowercase();
    if lang.is_empty() {
        return "zh".to_string();
    }
    if lang.len() == 3 {
        if let Some(part1) = isolang::Language::from_639_3(&lang).and_then(|l| l.to_639_1()) {
            lang = part1.to_string();
        }
    }
    for known in ["zh", "ja", "ko", "en", "ru", "es", "fr", "de"] {
        if lang.starts_with(known) {
            return known.to_string();
        }
    }
    lang
}

/// Human-readable language name for log output; falls back to the raw code.
pub fn language_display(code: &str) -> String {
    let normalized = code.trim().to_lowercase();
    let lang = if normalized.len() == 3 {
        isolang::Language::from_639_3(&normalized)
    } else {
        isolang::Language::from_639_1(&normalized)
    };
    lang.map(|l| l.to_name().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Fixed table of Unicode ranges per normalized language code.
fn is_target_letter(c: char, lang: &str) -> bool {
    match lang {
        "zh" => {
            matches!(c,
                '\u{4E00}'..='\u{9FFF}'    // CJK Unified
                | '\u{3400}'..='\u{4DBF}'  // CJK Extension A
                | '\u{F900}'..='\u{FAFF}') // CJK Compatibility
        }
        "ja" => {
            matches!(c,
                '\u{3040}'..='\u{309F}'    // Hiragana
                | '\u{30A0}'..='\u{30FF}'  // Katakana
                | '\u{FF66}'..='\u{FF9D}'  // Halfwidth Katakana
                | '\u{4E00}'..='\u{9FFF}'
                | '\u{3400}'..='\u{4DBF}'
                | '\u{F900}'..='\u{FAFF}')
        }
        "ko" => {
            matches!(c,
                '\u{AC00}'..='\u{D7AF}'    // Hangul syllables
                | '\u{1100}'..='\u{11FF}'  // Jamo
                | '\u{3130}'..='\u{318F}') // Compatibility Jamo
        }
        "en" => c.is_ascii_alphabetic(),
        "ru" => matches!(c, '\u{0400}'..='\u{04FF}'),
        "es" | "fr" | "de" => {
            // Latin letters plus Latin-1 Supplement and Latin Extended.
            c.is_ascii_alphabetic() || matches!(c, '\u{00C0}'..='\u{024F}')
        }
        _ => false,
    }
}
