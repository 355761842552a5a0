// DFA-driven recognizer for one text line
//
// An attempt starts in the pattern start state at some anchor column and
// walks the line byte by byte. Before each byte every anchor that applies at
// the current column is offered; anchors are zero-width, so they may fire
// several in a row at one column. The longest final position of the first
// successful attempt wins. When an attempt dies (KILL or FAIL) without having
// matched, a leftmost scan retries one column further right.

use std::ops::Range;

use crate::dfa::{ContextSlices, Dfa, DfaState, DfaStateId, START};
use crate::nfa::{Edge, Nfa, StateId};
use crate::symbol::{ANCHOR_SYMBOLS, Anchor, Symbol};
use crate::text::{FrameInfo, LineId, TextSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Try every anchor column from the start column to the end of the line.
    Leftmost,
    /// Only try the start column.
    Anchored,
}

/// A successful match. Columns are 1-based; `start..finish` is the middle
/// segment, `anchor..end` the whole match including both contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub anchor: usize,
    pub start: usize,
    pub finish: usize,
    pub end: usize,
    /// An anchor was consumed at `end`. Passing this back in when resuming at
    /// `end` keeps the same anchor from matching twice.
    pub mark_flag: bool,
}

impl Match {
    #[inline]
    pub fn middle(&self) -> Range<usize> {
        self.start..self.finish
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchor == self.end
    }
}

/// Columns at which the walk held a context boundary state. Both lists are
/// ascending; which entries are the real boundaries is only known once the
/// match end is.
#[derive(Debug, Default)]
struct Boundaries {
    lefts: Vec<usize>,
    rights: Vec<usize>,
}

impl Boundaries {
    fn enter(&mut self, state: &DfaState, pos: usize) {
        if state.left_transition && self.lefts.last() != Some(&pos) {
            self.lefts.push(pos);
        }
        if state.right_transition && self.rights.last() != Some(&pos) {
            self.rights.push(pos);
        }
    }
}

struct Attempt<'a, T: ?Sized> {
    dfa: &'a Dfa,
    text: &'a T,
    line: LineId,
    used: usize,
    frame: FrameInfo,
}

impl<T: TextSource + ?Sized> Attempt<'_, T> {
    fn applies(&self, anchor: Anchor, pos: usize) -> bool {
        match anchor {
            Anchor::LineStart => pos == 1,
            Anchor::LineEnd => pos == self.used + 1,
            Anchor::LeftMargin => pos == self.frame.left_margin,
            Anchor::RightMargin => pos == self.frame.right_margin,
            Anchor::DotColumn => pos == self.frame.dot_column,
            Anchor::Mark(mark) => self.text.has_mark(self.line, pos, mark),
        }
    }

    /// Fire applicable anchors until none changes the state. Returns whether any fired.
    fn take_anchors(&self, state: &mut DfaStateId, pos: usize, bounds: &mut Boundaries) -> bool {
        let mut taken = false;
        while self.dfa.wants_anchor(*state) {
            let mut fired = false;
            for anchor in (0..ANCHOR_SYMBOLS).filter_map(Anchor::from_offset) {
                if !self.applies(anchor, pos) {
                    continue;
                }
                if let Some(next) = self.dfa.next_anchor(*state, anchor)
                    && next != *state
                {
                    *state = next;
                    bounds.enter(self.dfa.state(next), pos);
                    fired = true;
                }
            }
            if !fired {
                break;
            }
            taken = true;
        }
        taken
    }

    /// Add every NFA state reached through an anchor that applies at `pos`.
    fn nfa_anchors(&self, nfa: &Nfa, mut current: Vec<StateId>, pos: usize) -> Vec<StateId> {
        loop {
            let targets: Vec<StateId> = current
                .iter()
                .filter_map(|&id| match &nfa.state(id).edge {
                    Edge::Accept {
                        set,
                        next: Some(next),
                        fail: false,
                    } if set.has_anchors()
                        && (0..ANCHOR_SYMBOLS)
                            .filter_map(Anchor::from_offset)
                            .any(|a| set.contains(Symbol::anchor(a)) && self.applies(a, pos)) =>
                    {
                        Some(*next)
                    }
                    _ => None,
                })
                .filter(|next| current.binary_search(next).is_err())
                .collect();
            if targets.is_empty() {
                return current;
            }
            current.extend(targets);
            current = nfa.closure(current);
        }
    }

    /// Whether the NFA gets from `from` to `to` consuming exactly `cols`.
    /// No anchor is offered at `quiet`.
    fn spans(&self, nfa: &Nfa, from: StateId, to: StateId, cols: Range<usize>, quiet: Option<usize>) -> bool {
        let mut current = nfa.closure([from]);
        let mut pos = cols.start;
        loop {
            if quiet != Some(pos) {
                current = self.nfa_anchors(nfa, current, pos);
            }
            if pos >= cols.end {
                return current.binary_search(&to).is_ok();
            }
            let b = self.text.byte_at(self.line, pos);
            let targets: Vec<StateId> = current
                .iter()
                .filter_map(|&id| match &nfa.state(id).edge {
                    Edge::Accept {
                        set,
                        next: Some(next),
                        fail: false,
                    } if set.contains_byte(b) => Some(*next),
                    _ => None,
                })
                .collect();
            if targets.is_empty() {
                return false;
            }
            current = nfa.closure(targets);
            pos += 1;
        }
    }

    /// Place the middle segment inside `anchor..end`: the earliest left
    /// boundary after which the rest of the pattern still matches, then the
    /// latest right boundary that leaves a matching right context.
    fn resolve(
        &self,
        ctx: &ContextSlices,
        bounds: &Boundaries,
        anchor: usize,
        end: usize,
        quiet: Option<usize>,
    ) -> (usize, usize) {
        let spans = |from, to, cols| self.spans(&ctx.nfa, from, to, cols, quiet);
        let start = bounds
            .lefts
            .iter()
            .copied()
            .take_while(|&s| s <= end)
            .find(|&s| {
                spans(ctx.start, ctx.left_context_end, anchor..s)
                    && spans(ctx.left_context_end, ctx.final_state, s..end)
            })
            .unwrap_or(anchor);
        let finish = bounds
            .rights
            .iter()
            .rev()
            .copied()
            .filter(|&f| (start..=end).contains(&f))
            .find(|&f| {
                spans(ctx.middle_context_end, ctx.final_state, f..end)
                    && spans(ctx.left_context_end, ctx.middle_context_end, start..f)
            })
            .unwrap_or(end);
        (start, finish)
    }

    fn run(&self, anchor: usize, skip_anchors: bool) -> Option<Match> {
        let dfa = self.dfa;
        let mut state = START;
        let mut pos = anchor;
        let mut bounds = Boundaries::default();
        bounds.enter(dfa.state(START), pos);
        // end column and mark flag of the longest final position so far
        let mut best = None;

        loop {
            let took = !(skip_anchors && pos == anchor) && self.take_anchors(&mut state, pos, &mut bounds);
            if dfa.state(state).final_accept {
                best = Some((pos, took));
                if !dfa.can_continue(state) {
                    break;
                }
            }
            // one synthetic space is fed at used + 1
            if pos > self.used + 1 {
                break;
            }
            let next = dfa.next_byte(state, self.text.byte_at(self.line, pos));
            if !Dfa::is_real(next) {
                break;
            }
            state = next;
            pos += 1;
            bounds.enter(dfa.state(state), pos);
        }

        let (end, mark_flag) = best?;
        let (start, finish) = match &dfa.contexts {
            Some(ctx) => self.resolve(ctx, &bounds, anchor, end, skip_anchors.then_some(anchor)),
            None => (anchor, end),
        };
        Some(Match {
            anchor,
            start,
            finish,
            end,
            mark_flag,
        })
    }
}

/// Match `dfa` against `line`, starting at column `start_col`.
///
/// `mark_flag` says the anchors at `start_col` were already consumed by the
/// previous match and must not be offered again.
pub fn recognize<T: TextSource + ?Sized>(
    dfa: &Dfa,
    text: &T,
    line: LineId,
    start_col: usize,
    mark_flag: bool,
    scan: Scan,
) -> Option<Match> {
    let attempt = Attempt {
        dfa,
        text,
        line,
        used: text.used(line),
        frame: text.frame(),
    };
    let start_col = start_col.max(1);
    let last = attempt.used + 1;
    let mut anchor = start_col;
    loop {
        if let Some(m) = attempt.run(anchor, mark_flag && anchor == start_col) {
            log::trace!("line {}: match {:?}", line, m);
            return Some(m);
        }
        if scan == Scan::Anchored || anchor >= last {
            log::trace!("line {}: no match from column {}", line, start_col);
            return None;
        }
        anchor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::convert::convert;
    use crate::options::EngineOptions;
    use crate::parser::{CompileContext, compile};
    use crate::source::{NoDereference, Parameter};
    use crate::text::LineBuffer;

    fn dfa(pattern: &str) -> Dfa {
        let options = EngineOptions::default();
        let ctx = CompileContext {
            options: &options,
            resolver: &NoDereference,
        };
        let compiled = compile(&Parameter::pattern(pattern.as_bytes()), &ctx).unwrap();
        convert(&compiled, &options, &CancelToken::new()).unwrap()
    }

    fn find(pattern: &str, line: &str, scan: Scan) -> Option<Match> {
        let buf = LineBuffer::from_text(line);
        recognize(&dfa(pattern), &buf, 0, 1, false, scan)
    }

    #[test]
    fn test_leftmost_word() {
        let m = find("+a", "12abc34", Scan::Leftmost).unwrap();
        assert_eq!((m.anchor, m.start, m.finish, m.end), (3, 3, 6, 6));
        assert!(!m.mark_flag);
        assert_eq!(find("+a", "12abc34", Scan::Anchored), None);
    }

    #[test]
    fn test_kill_shifts_anchor() {
        assert_eq!(find("-n", "5a", Scan::Anchored), None);
        assert_eq!(find("-n", "5a", Scan::Leftmost).map(|m| m.start), Some(2));
    }

    #[test]
    fn test_synthetic_trailing_space() {
        let m = find("+a s", "abc", Scan::Anchored).unwrap();
        assert_eq!(m.end, 5);
        assert_eq!(find("'abc'", "ab", Scan::Leftmost), None);
    }

    #[test]
    fn test_mark_flag_suppresses_anchor() {
        let buf = LineBuffer::from_text("abc");
        let d = dfa("<");
        let m = recognize(&d, &buf, 0, 1, false, Scan::Anchored).unwrap();
        assert_eq!((m.start, m.end), (1, 1));
        assert!(m.mark_flag);
        assert_eq!(recognize(&d, &buf, 0, 1, true, Scan::Anchored), None);
    }

    #[test]
    fn test_boundaries_record_each_column_once() {
        let mut b = Boundaries::default();
        let both = DfaState {
            left_transition: true,
            right_transition: true,
            ..DfaState::default()
        };
        let right = DfaState {
            right_transition: true,
            ..DfaState::default()
        };
        b.enter(&both, 1);
        b.enter(&both, 1);
        b.enter(&right, 2);
        b.enter(&DfaState::default(), 3);
        b.enter(&right, 4);
        assert_eq!(b.lefts, vec![1]);
        assert_eq!(b.rights, vec![1, 2, 4]);
    }

    #[test]
    fn test_right_context_overlapping_middle() {
        let m = find("'a',+'b','bc'", "abbbc", Scan::Leftmost).unwrap();
        assert_eq!((m.anchor, m.start, m.finish, m.end), (1, 2, 4, 6));
    }

    #[test]
    fn test_left_context_overlapping_middle() {
        let m = find("+'a','ab'", "aaab", Scan::Leftmost).unwrap();
        assert_eq!((m.anchor, m.start, m.finish, m.end), (1, 3, 5, 5));
    }

    #[test]
    fn test_middle_only_spans_match() {
        let d = dfa("+a");
        assert!(!d.has_contexts());
        let m = find("+a", " ab ", Scan::Leftmost).unwrap();
        assert_eq!(m.middle(), 2..4);
    }
}
