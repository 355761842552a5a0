// NFA → DFA conversion
//
// Subset construction over the compiled NFA. Outgoing accept sets of the
// NFA states in a subset overlap freely, so before building transitions they
// are refined into pairwise disjoint parts, each carrying every NFA target
// reachable on its symbols.
//
// Anchor symbols are zero-width: NFA threads that do not test an anchor stay
// where they are, so the target of an anchor part is the closure of its
// targets joined with the source subset.

use std::collections::HashMap;

use ahash::RandomState;

use crate::cancel::CancelToken;
use crate::dfa::{ContextSlices, Dfa, DfaState, DfaStateId, DfaTransition, FAIL, KILL, START};
use crate::error::{PatternError, PatternResult};
use crate::nfa::{Edge, Nfa, StateId};
use crate::options::EngineOptions;
use crate::parser::CompiledNfa;
use crate::symbol::SymbolSet;

/// A disjoint slice of the alphabet and every NFA state it leads to.
#[derive(Debug, Clone)]
struct Part {
    accept: SymbolSet,
    targets: Vec<StateId>,
}

/// Split the accept sets of `set`'s members into pairwise disjoint parts.
fn refine(nfa: &Nfa, set: &[StateId]) -> Vec<Part> {
    let mut parts: Vec<Part> = Vec::new();
    for &id in set {
        let Edge::Accept {
            set: accept,
            next: Some(next),
            fail: false,
        } = &nfa.state(id).edge
        else {
            continue;
        };
        let next = *next;
        let mut remaining = *accept;
        let mut fresh = Vec::new();
        for part in parts.iter_mut() {
            if remaining.is_empty() {
                break;
            }
            let common = part.accept & remaining;
            if common.is_empty() {
                continue;
            }
            if common == part.accept {
                part.targets.push(next);
            } else {
                part.accept -= common;
                let mut targets = part.targets.clone();
                targets.push(next);
                fresh.push(Part {
                    accept: common,
                    targets,
                });
            }
            remaining -= common;
        }
        parts.extend(fresh);
        if !remaining.is_empty() {
            parts.push(Part {
                accept: remaining,
                targets: vec![next],
            });
        }
    }
    parts
}

/// Sorted union of two sorted id lists.
fn merge_sets(a: &[StateId], b: &[StateId]) -> Vec<StateId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

struct Converter<'a> {
    compiled: &'a CompiledNfa,
    states: Vec<DfaState>,
    index: HashMap<Vec<StateId>, DfaStateId, RandomState>,
    max_states: usize,
}

impl Converter<'_> {
    /// No thread in `set` can ever reach the final state: only fail states remain.
    fn is_dead(&self, set: &[StateId]) -> bool {
        let nfa = &self.compiled.nfa;
        !set.iter().any(|&id| {
            id == self.compiled.final_state
                || matches!(nfa.state(id).edge, Edge::Accept { fail: false, .. })
        })
    }

    fn find_or_allocate(&mut self, set: Vec<StateId>) -> PatternResult<DfaStateId> {
        if let Some(&id) = self.index.get(&set) {
            return Ok(id);
        }
        if self.states.len() >= self.max_states {
            log::debug!("DFA state budget of {} exceeded", self.max_states);
            return Err(PatternError::TooComplex);
        }
        let id = self.states.len() as DfaStateId;
        self.states.push(DfaState::new(set.clone(), false));
        self.index.insert(set, id);
        Ok(id)
    }

    fn expand(&mut self, current: DfaStateId) -> PatternResult<()> {
        let compiled = self.compiled;
        let nfa = &compiled.nfa;
        let set = self.states[current as usize].nfa_set.clone();
        let mut transitions = Vec::new();
        let mut covered = SymbolSet::EMPTY;
        let start_flag = self.states[current as usize].pattern_start;

        for part in refine(nfa, &set) {
            let zero_width = part.accept.has_anchors();
            let mut target_set = nfa.closure(part.targets);
            if zero_width {
                target_set = merge_sets(&target_set, &set);
                if target_set == set {
                    continue;
                }
            }
            let target = if self.is_dead(&target_set) {
                FAIL
            } else {
                self.find_or_allocate(target_set)?
            };
            covered |= part.accept;
            transitions.push(DfaTransition {
                accept: part.accept,
                target,
                start_flag,
            });
        }

        let rest = covered.byte_complement();
        if !rest.is_empty() {
            transitions.push(DfaTransition {
                accept: rest,
                target: if start_flag { KILL } else { FAIL },
                start_flag,
            });
        }

        let state = &mut self.states[current as usize];
        state.transitions = transitions;
        state.marked = true;
        Ok(())
    }

    fn mark_semantics(&mut self) {
        let c = self.compiled;
        for state in self.states.iter_mut().skip(START as usize) {
            state.final_accept = state.contains(c.final_state);
            state.left_transition = state.contains(c.left_context_end);
            state.right_transition = state.contains(c.middle_context_end);
        }

        // A left boundary needs a lookahead check when a forward edge keeps us
        // on a left boundary and an unbounded left-context element is still open.
        let mut checks = Vec::new();
        for (id, state) in self.states.iter().enumerate().skip(START as usize) {
            if !state.left_transition {
                continue;
            }
            let forward = state.transitions.iter().any(|t| {
                Dfa::is_real(t.target) && self.states[t.target as usize].left_transition
            });
            if !forward {
                continue;
            }
            let open_repeat = state
                .nfa_set
                .iter()
                .any(|&n| c.left_context.contains(&n) && c.nfa.state(n).indefinite);
            if open_repeat {
                checks.push(id);
            }
        }
        for id in checks {
            self.states[id].left_context_check = true;
        }

        for state in self.states.iter_mut().skip(START as usize) {
            state.build_byte_table();
        }
    }
}

/// Build the DFA for a compiled pattern.
///
/// The interrupt flag is polled once per state expanded; on interrupt or
/// budget overflow the half-built table is dropped.
pub fn convert(
    compiled: &CompiledNfa,
    options: &EngineOptions,
    cancel: &CancelToken,
) -> PatternResult<Dfa> {
    let nfa = &compiled.nfa;
    let mut conv = Converter {
        compiled,
        states: vec![DfaState::default(), DfaState::default()],
        index: HashMap::with_hasher(RandomState::new()),
        max_states: options.max_dfa_states,
    };
    conv.states.push(DfaState::new(nfa.closure([compiled.start]), true));

    let mut current = START;
    while (current as usize) < conv.states.len() {
        if cancel.is_cancelled() {
            log::debug!("DFA construction interrupted after {} states", conv.states.len());
            return Err(PatternError::Interrupted);
        }
        conv.expand(current)?;
        current += 1;
    }
    conv.mark_semantics();

    let right_nullable = nfa.closure([compiled.middle_context_end]).contains(&compiled.final_state);
    let suffix_nullable = nfa.closure([compiled.left_context_end]).contains(&compiled.final_state);
    // without a right context the middle end leads straight to the final state
    let has_right = !matches!(
        nfa.state(compiled.middle_context_end).edge,
        Edge::Epsilon { first: Some(next), second: None } if next == compiled.final_state
    );
    let contexts = (compiled.start != compiled.left_context_end || has_right).then(|| {
        Box::new(ContextSlices {
            nfa: nfa.clone(),
            start: compiled.start,
            left_context_end: compiled.left_context_end,
            middle_context_end: compiled.middle_context_end,
            final_state: compiled.final_state,
        })
    });
    log::debug!(
        "built DFA with {} states from {} NFA states",
        conv.states.len(),
        nfa.len()
    );

    Ok(Dfa {
        states: conv.states,
        right_nullable,
        suffix_nullable,
        contexts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{CompileContext, compile};
    use crate::source::{NoDereference, Parameter};
    use crate::symbol::{Anchor, Symbol};

    fn build(pattern: &str) -> PatternResult<Dfa> {
        build_with(pattern, &EngineOptions::default(), &CancelToken::new())
    }

    fn build_with(pattern: &str, options: &EngineOptions, cancel: &CancelToken) -> PatternResult<Dfa> {
        let ctx = CompileContext {
            options,
            resolver: &NoDereference,
        };
        let compiled = compile(&Parameter::pattern(pattern.as_bytes()), &ctx)?;
        convert(&compiled, options, cancel)
    }

    /// Feed bytes from START, returning the state reached (or KILL/FAIL).
    fn run(dfa: &Dfa, input: &[u8]) -> DfaStateId {
        let mut state = START;
        for &b in input {
            state = dfa.next_byte(state, b);
            if !Dfa::is_real(state) {
                break;
            }
        }
        state
    }

    #[test]
    fn test_refine_splits_overlaps() {
        let mut nfa = Nfa::new(10);
        let mut ab = SymbolSet::EMPTY;
        ab.insert_range(b'a', b'b');
        let mut bc = SymbolSet::EMPTY;
        bc.insert_range(b'b', b'c');
        let f1 = nfa.accept(ab).unwrap();
        let f2 = nfa.accept(bc).unwrap();
        let t1 = nfa.split().unwrap();
        let t2 = nfa.split().unwrap();
        nfa.patch(&f1.holes, t1);
        nfa.patch(&f2.holes, t2);

        let mut parts = refine(&nfa, &[f1.start, f2.start]);
        parts.sort_by_key(|p| p.accept.byte_ranges()[0].0);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].accept.byte_ranges(), vec![(b'a', b'a')]);
        assert_eq!(parts[0].targets, vec![t1]);
        assert_eq!(parts[1].accept.byte_ranges(), vec![(b'b', b'b')]);
        assert_eq!(parts[1].targets, vec![t1, t2]);
        assert_eq!(parts[2].accept.byte_ranges(), vec![(b'c', b'c')]);
        assert_eq!(parts[2].targets, vec![t2]);
    }

    #[test]
    fn test_transitions_partition_bytes() {
        let dfa = build("*('ab'|'ac')'b'").unwrap();
        for state in dfa.states().iter().skip(START as usize) {
            let mut seen = SymbolSet::EMPTY;
            for t in &state.transitions {
                let bytes = t.accept.bytes_only();
                assert!(seen.is_disjoint(&bytes));
                seen |= bytes;
            }
            assert_eq!(seen, SymbolSet::all_bytes());
        }
    }

    #[test]
    fn test_no_duplicate_subsets() {
        let dfa = build("+a 'x' | *n 'y'").unwrap();
        let real: Vec<&DfaState> = dfa.states().iter().skip(START as usize + 1).collect();
        for (i, a) in real.iter().enumerate() {
            for b in &real[i + 1..] {
                assert_ne!(a.nfa_set, b.nfa_set);
            }
        }
    }

    #[test]
    fn test_kill_from_start_fail_elsewhere() {
        let dfa = build("'ab'").unwrap();
        assert_eq!(run(&dfa, b"x"), KILL);
        assert_eq!(run(&dfa, b"ax"), FAIL);
        assert!(dfa.state(run(&dfa, b"ab")).final_accept);
        assert!(dfa.state(START).pattern_start);
        assert!(dfa.state(START).transitions.iter().all(|t| t.start_flag));
        let after_a = run(&dfa, b"a");
        assert!(dfa.state(after_a).transitions.iter().all(|t| !t.start_flag));
    }

    #[test]
    fn test_start_subset_reentered_gets_twin() {
        // after "ab" the NFA subset equals the start subset, but a mismatch
        // there must not be treated as "nothing consumed"
        let dfa = build("*('ab'),'bc'").unwrap();
        let twin = run(&dfa, b"ab");
        assert!(Dfa::is_real(twin));
        assert_ne!(twin, START);
        assert_eq!(dfa.state(twin).nfa_set, dfa.state(START).nfa_set);
        assert!(!dfa.state(twin).pattern_start);
        assert_eq!(dfa.next_byte(twin, b'c'), FAIL);
        assert_eq!(dfa.next_byte(START, b'c'), KILL);
    }

    #[test]
    fn test_anchor_transitions_are_zero_width() {
        let dfa = build("<'a'|'b'").unwrap();
        let after = dfa.next_anchor(START, Anchor::LineStart).unwrap();
        // the 'b' alternative survives the anchor
        assert!(dfa.state(run_from(&dfa, after, b"b")).final_accept);
        assert!(dfa.state(run_from(&dfa, after, b"a")).final_accept);
        assert_eq!(run(&dfa, b"a"), KILL);
        assert_eq!(dfa.next_anchor(START, Anchor::LineEnd), None);
        assert!(dfa.wants_anchor(START));
        assert!(!dfa.wants_anchor(run_from(&dfa, after, b"b")));
        assert!(!dfa.state(START).transitions.iter().any(|t| t.accept.contains(Symbol::anchor(Anchor::LineEnd))));
    }

    fn run_from(dfa: &Dfa, mut state: DfaStateId, input: &[u8]) -> DfaStateId {
        for &b in input {
            state = dfa.next_byte(state, b);
        }
        state
    }

    #[test]
    fn test_context_flags() {
        let dfa = build("'a','b','c'").unwrap();
        assert!(!dfa.state(START).left_transition);
        let s1 = run(&dfa, b"a");
        assert!(dfa.state(s1).left_transition);
        assert!(!dfa.state(s1).left_context_check);
        let s2 = run(&dfa, b"ab");
        assert!(dfa.state(s2).right_transition);
        assert!(dfa.state(run(&dfa, b"abc")).final_accept);
        assert!(!dfa.right_nullable);
        assert!(!dfa.suffix_nullable);
        assert!(dfa.has_contexts());
        assert!(!build("+a 'x'").unwrap().has_contexts());
        assert!(build("'x',+a").unwrap().has_contexts());

        let dfa = build("*'a','b'").unwrap();
        assert!(dfa.state(START).left_transition);
        assert!(dfa.state(START).left_context_check);
        assert!(dfa.state(run(&dfa, b"aa")).left_context_check);
        assert!(!dfa.state(run(&dfa, b"ab")).left_transition);
    }

    #[test]
    fn test_impossible_element_routes_to_fail() {
        let dfa = build("'a'[3,2]'x'").unwrap();
        assert_eq!(run(&dfa, b"a"), FAIL);
    }

    #[test]
    fn test_budget_and_interrupt() {
        let options = EngineOptions {
            max_dfa_states: 4,
            ..EngineOptions::default()
        };
        assert_eq!(
            build_with("'abcdef'", &options, &CancelToken::new()).unwrap_err(),
            PatternError::TooComplex
        );

        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            build_with("'a'", &EngineOptions::default(), &cancel).unwrap_err(),
            PatternError::Interrupted
        );
    }
}
