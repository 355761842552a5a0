// Tests for EQS, GET and REPLACE over a buffer
use super::build_dfa;
use crate::*;

fn sample() -> LineBuffer {
    LineBuffer::from_text("alpha\n123\nbeta 42")
}

#[test]
fn test_find_forward_across_lines() {
    let buf = sample();
    let dfa = build_dfa("+n");
    let cancel = CancelToken::new();

    let found = find_forward(&dfa, &buf, 0, 1, false, &cancel).unwrap().unwrap();
    assert_eq!(found.line, 1);
    assert_eq!(found.matched.middle(), 1..4);

    let (col, flag) = found.resume();
    let next = find_forward(&dfa, &buf, found.line, col, flag, &cancel)
        .unwrap()
        .unwrap();
    assert_eq!(next.line, 2);
    assert_eq!(next.matched.middle(), 6..8);

    let (col, flag) = next.resume();
    assert_eq!(find_forward(&dfa, &buf, next.line, col, flag, &cancel).unwrap(), None);
}

#[test]
fn test_find_forward_resumes_after_anchor() {
    let buf = LineBuffer::from_text("a\nb");
    let dfa = build_dfa("<");
    let cancel = CancelToken::new();
    let first = find_forward(&dfa, &buf, 0, 1, false, &cancel).unwrap().unwrap();
    assert_eq!(first.line, 0);
    assert!(first.matched.mark_flag);
    let (col, flag) = first.resume();
    let second = find_forward(&dfa, &buf, 0, col, flag, &cancel).unwrap().unwrap();
    assert_eq!(second.line, 1);
}

#[test]
fn test_find_backward() {
    let buf = sample();
    let dfa = build_dfa("+n");
    let cancel = CancelToken::new();

    let found = find_backward(&dfa, &buf, 2, 1, &cancel).unwrap().unwrap();
    assert_eq!(found.line, 1);
    assert_eq!(found.matched.middle(), 1..4);

    let found = find_backward(&dfa, &buf, 2, 7, &cancel).unwrap().unwrap();
    assert_eq!(found.line, 2);
    assert_eq!(found.matched.middle(), 6..8);

    assert_eq!(find_backward(&dfa, &buf, 1, 1, &cancel).unwrap(), None);
}

#[test]
fn test_search_polls_cancel() {
    let buf = sample();
    let dfa = build_dfa("'zzz'");
    let cancel = CancelToken::new();
    cancel.cancel();
    assert_eq!(
        find_forward(&dfa, &buf, 0, 1, false, &cancel).unwrap_err(),
        PatternError::Interrupted
    );
    assert_eq!(
        find_backward(&dfa, &buf, 2, 1, &cancel).unwrap_err(),
        PatternError::Interrupted
    );
    cancel.reset();
    assert_eq!(find_forward(&dfa, &buf, 0, 1, false, &cancel).unwrap(), None);
}

#[test]
fn test_eqs_at_cursor() {
    let buf = LineBuffer::from_text("  abc");
    let dfa = build_dfa("+a");
    assert_eq!(eqs(&dfa, &buf, 0, 3).map(|m| m.middle()), Some(3..6));
    assert_eq!(eqs(&dfa, &buf, 0, 4).map(|m| m.middle()), Some(4..6));
    assert_eq!(eqs(&dfa, &buf, 0, 1), None);

    let buf = LineBuffer::from_text("xy");
    let dfa = build_dfa("'x','y'");
    assert!(eqs(&dfa, &buf, 0, 2).is_some());
    assert_eq!(eqs(&dfa, &buf, 0, 1), None);
}

#[test]
fn test_substitute_all_numbers() {
    let buf = LineBuffer::from_text("a1b22c");
    let (line, count) = substitute_all(&build_dfa("+n"), &buf, 0, b"#").unwrap();
    assert_eq!(line, b"a#b#c".to_vec());
    assert_eq!(count, 2);
    assert_eq!(substitute_all(&build_dfa("'q'"), &buf, 0, b"#"), None);
}

#[test]
fn test_replace_in_buffer() {
    let mut buf = LineBuffer::from_text("let x = 1;\nlet y = 2;");
    let dfa = build_dfa("'let ',+a,s");
    let cancel = CancelToken::new();
    let found = find_forward(&dfa, &buf, 1, 1, false, &cancel).unwrap().unwrap();
    let replaced = substitute(buf.line(found.line), &found.matched, b"count");
    buf.replace_line(found.line, replaced);
    assert_eq!(buf.line(1), b"let count = 2;");
    assert_eq!(buf.line(0), b"let x = 1;");
}
