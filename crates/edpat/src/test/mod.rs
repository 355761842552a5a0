// Scenario tests
pub mod test_cache;
pub mod test_search;

use crate::*;

pub(crate) fn build_dfa(pattern: &str) -> Dfa {
    let options = EngineOptions::default();
    let ctx = CompileContext {
        options: &options,
        resolver: &NoDereference,
    };
    let compiled = compile(&Parameter::pattern(pattern.as_bytes()), &ctx).unwrap();
    convert(&compiled, &options, &CancelToken::new()).unwrap()
}

/// First match of `pattern` on a one-line buffer, scanning from column 1.
pub(crate) fn first_match(pattern: &str, line: &str, scan: Scan) -> Option<Match> {
    let buf = LineBuffer::from_text(line);
    recognize(&build_dfa(pattern), &buf, 0, 1, false, scan)
}

/// (start, finish) of the middle segment of the first match.
pub(crate) fn middle(pattern: &str, line: &str) -> Option<(usize, usize)> {
    first_match(pattern, line, Scan::Leftmost).map(|m| (m.start, m.finish))
}
