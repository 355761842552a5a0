// EQS, GET and REPLACE helpers on top of the recognizer

use crate::cancel::CancelToken;
use crate::dfa::Dfa;
use crate::error::{PatternError, PatternResult};
use crate::recognize::{Match, Scan, recognize};
use crate::text::{LineId, TextSource};

/// A match together with the line it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    pub line: LineId,
    pub matched: Match,
}

impl Found {
    /// Where a repeated forward search continues: column and mark flag.
    /// An empty match that consumed no anchor steps one column on, so the
    /// same position is not found again.
    pub fn resume(&self) -> (usize, bool) {
        let m = &self.matched;
        if m.is_empty() && !m.mark_flag {
            (m.end + 1, false)
        } else {
            (m.end, m.mark_flag)
        }
    }
}

/// EQS: does a match have its middle segment starting exactly at `col`?
pub fn eqs<T: TextSource + ?Sized>(dfa: &Dfa, text: &T, line: LineId, col: usize) -> Option<Match> {
    // the left context, if any, lies before `col`
    (1..=col.max(1))
        .filter_map(|anchor| recognize(dfa, text, line, anchor, false, Scan::Anchored))
        .find(|m| m.start == col)
}

/// GET forwards from (`line`, `col`), moving on to the following lines.
pub fn find_forward<T: TextSource + ?Sized>(
    dfa: &Dfa,
    text: &T,
    line: LineId,
    col: usize,
    mark_flag: bool,
    cancel: &CancelToken,
) -> PatternResult<Option<Found>> {
    let mut current = line;
    let mut col = col;
    let mut mark_flag = mark_flag;
    loop {
        if cancel.is_cancelled() {
            return Err(PatternError::Interrupted);
        }
        if let Some(matched) = recognize(dfa, text, current, col, mark_flag, Scan::Leftmost) {
            return Ok(Some(Found {
                line: current,
                matched,
            }));
        }
        match text.next_line(current) {
            Some(next) => {
                current = next;
                col = 1;
                mark_flag = false;
            }
            None => return Ok(None),
        }
    }
}

/// Last of the non-overlapping matches on `line` whose anchor lies before `limit`.
fn last_before<T: TextSource + ?Sized>(dfa: &Dfa, text: &T, line: LineId, limit: usize) -> Option<Match> {
    let mut best = None;
    let mut from = 1;
    while from < limit {
        match recognize(dfa, text, line, from, false, Scan::Leftmost) {
            Some(m) if m.anchor < limit => {
                from = if m.is_empty() { m.anchor + 1 } else { m.end };
                best = Some(m);
            }
            _ => break,
        }
    }
    best
}

/// GET backwards: the nearest match starting before (`line`, `col`),
/// moving on to the preceding lines.
pub fn find_backward<T: TextSource + ?Sized>(
    dfa: &Dfa,
    text: &T,
    line: LineId,
    col: usize,
    cancel: &CancelToken,
) -> PatternResult<Option<Found>> {
    let mut current = line;
    let mut limit = col;
    loop {
        if cancel.is_cancelled() {
            return Err(PatternError::Interrupted);
        }
        if let Some(matched) = last_before(dfa, text, current, limit) {
            return Ok(Some(Found {
                line: current,
                matched,
            }));
        }
        match text.prev_line(current) {
            Some(prev) => {
                current = prev;
                limit = text.used(prev) + 2;
            }
            None => return Ok(None),
        }
    }
}

/// REPLACE: `line` with the middle segment of `m` replaced. A line shorter
/// than the match start is padded with spaces first.
pub fn substitute(line: &[u8], m: &Match, replacement: &[u8]) -> Vec<u8> {
    let start = m.start.saturating_sub(1);
    let finish = m.finish.saturating_sub(1).max(start);
    let mut out = Vec::with_capacity(line.len().max(start) + replacement.len());
    out.extend_from_slice(&line[..start.min(line.len())]);
    out.resize(start, b' ');
    out.extend_from_slice(replacement);
    if finish < line.len() {
        out.extend_from_slice(&line[finish..]);
    }
    out
}

/// REPLACE every non-overlapping match on `line`. Returns the new line text
/// and the number of substitutions, or `None` when nothing matched.
pub fn substitute_all<T: TextSource + ?Sized>(
    dfa: &Dfa,
    text: &T,
    line: LineId,
    replacement: &[u8],
) -> Option<(Vec<u8>, usize)> {
    let used = text.used(line);
    let mut matches = Vec::new();
    let mut col = 1;
    let mut mark_flag = false;
    while col <= used + 1 {
        let Some(m) = recognize(dfa, text, line, col, mark_flag, Scan::Leftmost) else {
            break;
        };
        let found = Found { line, matched: m };
        (col, mark_flag) = found.resume();
        matches.push(m);
    }
    if matches.is_empty() {
        return None;
    }

    let mut out: Vec<u8> = (1..=used).map(|c| text.byte_at(line, c)).collect();
    for m in matches.iter().rev() {
        out = substitute(&out, m, replacement);
    }
    Some((out, matches.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(anchor: usize, start: usize, finish: usize, end: usize) -> Match {
        Match {
            anchor,
            start,
            finish,
            end,
            mark_flag: false,
        }
    }

    #[test]
    fn test_substitute_middle() {
        assert_eq!(substitute(b"abc", &at(1, 2, 3, 4), b"XY"), b"aXYc".to_vec());
        assert_eq!(substitute(b"abc", &at(4, 4, 4, 4), b"!"), b"abc!".to_vec());
    }

    #[test]
    fn test_substitute_pads_virtual_space() {
        assert_eq!(substitute(b"ab", &at(5, 5, 6, 6), b"x"), b"ab  x".to_vec());
    }

    #[test]
    fn test_resume_after_empty_match() {
        let found = Found {
            line: 0,
            matched: at(3, 3, 3, 3),
        };
        assert_eq!(found.resume(), (4, false));
        let found = Found {
            line: 0,
            matched: Match {
                mark_flag: true,
                ..at(1, 1, 1, 1)
            },
        };
        assert_eq!(found.resume(), (1, true));
    }
}
