/*!
 * Unit tests for the hallucination filter
 */

use gdtrans::translation::is_hallucination;

#[test]
fn test_is_hallucination_withPlausibleTranslation_shouldAccept() {
    assert!(!is_hallucination("你好，世界", "Hello, world"));
    assert!(!is_hallucination("一个很棒的游戏", "An awesome game"));
}

#[test]
fn test_is_hallucination_withEmptyOutput_shouldReject() {
    assert!(is_hallucination("", "Hello"));
    assert!(is_hallucination("   \t ", "Hello"));
}

#[test]
fn test_is_hallucination_withLiteralEscapes_shouldReject() {
    assert!(is_hallucination("第一行\\n第二行", "line one line two"));
    assert!(is_hallucination("某物%123;某物", "something"));
}

#[test]
fn test_is_hallucination_withDenylistedToken_shouldReject() {
    assert!(is_hallucination("千岁说了一句话", "The hero spoke"));
}

#[test]
fn test_is_hallucination_withDenylistedTokenAlsoInSource_shouldAccept() {
    // The token came from the input, not from the model.
    assert!(!is_hallucination("千岁很强", "千岁 is strong"));
}

#[test]
fn test_is_hallucination_withRunawayLength_shouldReject() {
    let source = "Hi";
    let candidate = "这是一段远远超过原文长度的重复输出重复输出重复输出";
    assert!(is_hallucination(candidate, source));
}

#[test]
fn test_is_hallucination_withTruncatedOutput_shouldReject() {
    let source = "A fairly long sentence describing the game in detail";
    assert!(is_hallucination("好", source));
}

#[test]
fn test_is_hallucination_withPunctuationOnlySource_shouldAccept() {
    // Nothing to measure against; length checks are skipped.
    assert!(!is_hallucination("...", "---"));
}

#[test]
fn test_is_hallucination_withMostlyNonContentOutput_shouldReject() {
    // Ratio is in range but almost everything is markup garbage.
    assert!(is_hallucination("<<<<<>>>>>好!!!", "ok"));
}
