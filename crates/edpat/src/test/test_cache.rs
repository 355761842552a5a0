// Tests for the per-consumer pattern cache
use crate::*;

fn prepare(slot: &mut PatternSlot, pattern: &str) -> PatternResult<CacheOutcome> {
    prepare_with(slot, pattern, &EngineOptions::default(), &CancelToken::new())
}

fn prepare_with(
    slot: &mut PatternSlot,
    pattern: &str,
    options: &EngineOptions,
    cancel: &CancelToken,
) -> PatternResult<CacheOutcome> {
    let ctx = CompileContext {
        options,
        resolver: &NoDereference,
    };
    slot.prepare(&Parameter::pattern(pattern.as_bytes()), &ctx, cancel)
}

fn matches(slot: &PatternSlot, line: &str) -> Option<Match> {
    let buf = LineBuffer::from_text(line);
    recognize(slot.dfa().unwrap(), &buf, 0, 1, false, Scan::Leftmost)
}

#[test]
fn test_unchanged_pattern_is_reused() {
    let mut slot = PatternSlot::new();
    assert_eq!(prepare(&mut slot, "+a").unwrap(), CacheOutcome::Rebuilt);
    let before = matches(&slot, "12abc34");
    assert_eq!(prepare(&mut slot, "+a").unwrap(), CacheOutcome::Reused);
    assert_eq!(matches(&slot, "12abc34"), before);
}

#[test]
fn test_equivalent_syntax_is_reused() {
    let mut slot = PatternSlot::new();
    prepare(&mut slot, "*'ab'").unwrap();
    assert_eq!(prepare(&mut slot, "[0,] 'AB'").unwrap(), CacheOutcome::Reused);
    assert_eq!(prepare(&mut slot, ",[0,]'ab',").unwrap(), CacheOutcome::Reused);
    assert_eq!(prepare(&mut slot, "+'ab'").unwrap(), CacheOutcome::Rebuilt);
}

#[test]
fn test_text_parameter_shares_literal_definition() {
    let mut slot = PatternSlot::new();
    prepare(&mut slot, "'abc'").unwrap();
    let options = EngineOptions::default();
    let ctx = CompileContext {
        options: &options,
        resolver: &NoDereference,
    };
    let outcome = slot
        .prepare(&Parameter::text(b"ABC", false), &ctx, &CancelToken::new())
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Reused);
    let outcome = slot
        .prepare(&Parameter::text(b"ABC", true), &ctx, &CancelToken::new())
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Rebuilt);
}

#[test]
fn test_syntax_error_keeps_previous_dfa() {
    let mut slot = PatternSlot::new();
    prepare(&mut slot, "'abc'").unwrap();
    assert!(matches!(
        prepare(&mut slot, "(unclosed"),
        Err(PatternError::UnmatchedDelimiter { at: 0 })
    ));
    assert_eq!(slot.definition(), Some(&b",'abc',"[..]));
    assert_eq!(matches(&slot, "xabc").map(|m| m.start), Some(2));
}

#[test]
fn test_interrupt_keeps_previous_dfa() {
    let mut slot = PatternSlot::new();
    prepare(&mut slot, "'abc'").unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let options = EngineOptions::default();
    assert_eq!(
        prepare_with(&mut slot, "+n", &options, &cancel).unwrap_err(),
        PatternError::Interrupted
    );
    assert_eq!(slot.definition(), Some(&b",'abc',"[..]));
    // nothing to convert, so the interrupt is not observed
    assert_eq!(
        prepare_with(&mut slot, "'ABC'", &options, &cancel).unwrap(),
        CacheOutcome::Reused
    );
}

#[test]
fn test_budget_overflow_keeps_previous_dfa() {
    let mut slot = PatternSlot::new();
    prepare(&mut slot, "'a'").unwrap();
    let options = EngineOptions {
        max_dfa_states: 5,
        ..EngineOptions::default()
    };
    assert_eq!(
        prepare_with(&mut slot, "'abcdefgh'", &options, &CancelToken::new()).unwrap_err(),
        PatternError::TooComplex
    );
    assert_eq!(slot.definition(), Some(&b",'a',"[..]));
}

#[test]
fn test_consumers_have_separate_slots() {
    let mut cache = PatternCache::new();
    let options = EngineOptions::default();
    let ctx = CompileContext {
        options: &options,
        resolver: &NoDereference,
    };
    let cancel = CancelToken::new();
    cache
        .prepare(Consumer::Get, &Parameter::pattern(b"+n"), &ctx, &cancel)
        .unwrap();
    cache
        .prepare(Consumer::Replace, &Parameter::pattern(b"'x'"), &ctx, &cancel)
        .unwrap();
    assert!(cache.slot(Consumer::Eqs).dfa().is_none());
    assert_eq!(cache.get.definition(), Some(&b",[1,]n,"[..]));
    assert_eq!(cache.replace.definition(), Some(&b",'x',"[..]));
    cache.slot_mut(Consumer::Get).clear();
    assert!(cache.get.pattern().is_none());
}
