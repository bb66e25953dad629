/*!
 * Unit tests for the language coverage gate
 */

use gdtrans::html_processor::HtmlDocument;
use gdtrans::language_coverage::{
    language_display, normalize_lang, should_skip_by_language,
};

#[test]
fn test_should_skip_withFullyChineseDocument_shouldSkip() {
    let doc = HtmlDocument::parse("<p>这是一个完全中文的游戏描述。</p>");
    let (skip, coverage) = should_skip_by_language(&doc, "zh");
    assert!(skip);
    assert!((coverage - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_should_skip_withEnglishDocument_shouldNotSkip() {
    let doc = HtmlDocument::parse("<p>An English game description.</p>");
    let (skip, coverage) = should_skip_by_language(&doc, "zh");
    assert!(!skip);
    assert!(coverage < 0.1);
}

#[test]
fn test_should_skip_withNoLetters_shouldNotSkip() {
    // Digits and punctuation carry no signal.
    let doc = HtmlDocument::parse("<p>12345 - 67890!</p>");
    let (skip, coverage) = should_skip_by_language(&doc, "zh");
    assert!(!skip);
    assert_eq!(coverage, 0.0);
}

#[test]
fn test_should_skip_withMixedDocumentBelowThreshold_shouldNotSkip() {
    // Half the letters are Latin, well under the 0.90 threshold.
    let doc = HtmlDocument::parse("<p>中文 latin 中文 latin 中文 latin</p>");
    let (skip, _) = should_skip_by_language(&doc, "zh");
    assert!(!skip);
}

#[test]
fn test_should_skip_withEnglishOnlyInsideSkipTags_shouldIgnoreIt() {
    // Script content and anchor text do not count against coverage.
    let html = "<script>var englishOnly = true;</script><a href=\"x\">English link</a><p>中文内容在这里</p>";
    let doc = HtmlDocument::parse(html);
    let (skip, coverage) = should_skip_by_language(&doc, "zh");
    assert!(skip);
    assert!((coverage - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_should_skip_withJapaneseTargetAndKanaText_shouldSkip() {
    let doc = HtmlDocument::parse("<p>これはゲームのせつめいです</p>");
    let (skip, _) = should_skip_by_language(&doc, "ja");
    assert!(skip);
}

#[test]
fn test_normalize_lang_withVariants_shouldMapToShortCodes() {
    assert_eq!(normalize_lang("zh"), "zh");
    assert_eq!(normalize_lang("zh-CN"), "zh");
    assert_eq!(normalize_lang("ZHO"), "zh");
    assert_eq!(normalize_lang("jpn"), "ja");
    assert_eq!(normalize_lang(""), "zh");
    // Unknown codes pass through.
    assert_eq!(normalize_lang("tlh"), "tlh");
}

#[test]
fn test_language_display_withKnownCode_shouldReturnName() {
    assert_eq!(language_display("ja"), "Japanese");
    // Unknown codes fall back to the raw input.
    assert_eq!(language_display("xx"), "xx");
}
