// Arena-indexed NFA for compiled patterns
//
// States live in a Vec and refer to each other by index. A fragment under
// construction keeps a list of dangling out-slots ("holes") that are patched
// once the following piece is known. Fragments are always built from a
// contiguous range of states, which is what makes `duplicate` possible.

use std::ops::Range;

use crate::error::{PatternError, PatternResult};
use crate::symbol::SymbolSet;

pub type StateId = u32;

#[derive(Debug, Clone)]
pub enum Edge {
    /// Free transition to up to two successors. A state with neither is the final state.
    Epsilon {
        first: Option<StateId>,
        second: Option<StateId>,
    },
    /// Consume one symbol from `set` and move to `next`.
    /// `fail` marks a state that can never be passed (its set is empty).
    Accept {
        set: SymbolSet,
        next: Option<StateId>,
        fail: bool,
    },
}

#[derive(Debug, Clone)]
pub struct NfaState {
    pub edge: Edge,
    /// Entry state of an unbounded repetition.
    pub indefinite: bool,
}

impl NfaState {
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        matches!(self.edge, Edge::Epsilon { .. })
    }

    #[inline]
    pub fn is_fail(&self) -> bool {
        matches!(self.edge, Edge::Accept { fail: true, .. })
    }
}

/// A dangling out-slot of some state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hole {
    First(StateId),
    Second(StateId),
    Next(StateId),
}

impl Hole {
    fn state(self) -> StateId {
        match self {
            Hole::First(s) | Hole::Second(s) | Hole::Next(s) => s,
        }
    }

    fn shifted(self, offset: StateId) -> Hole {
        match self {
            Hole::First(s) => Hole::First(s + offset),
            Hole::Second(s) => Hole::Second(s + offset),
            Hole::Next(s) => Hole::Next(s + offset),
        }
    }
}

/// Partially built sub-graph: an entry state plus its unpatched exits.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub start: StateId,
    pub holes: Vec<Hole>,
}

#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<NfaState>,
    max_states: usize,
}

impl Nfa {
    pub fn new(max_states: usize) -> Self {
        Self {
            states: Vec::with_capacity(max_states.min(64)),
            max_states,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Id the next allocated state will receive.
    #[inline]
    pub fn next_id(&self) -> StateId {
        self.states.len() as StateId
    }

    #[inline]
    pub fn state(&self, id: StateId) -> &NfaState {
        &self.states[id as usize]
    }

    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    fn push(&mut self, state: NfaState) -> PatternResult<StateId> {
        if self.states.len() >= self.max_states {
            return Err(PatternError::TooComplex);
        }
        let id = self.next_id();
        self.states.push(state);
        Ok(id)
    }

    /// Epsilon split with both exits left open.
    pub fn split(&mut self) -> PatternResult<StateId> {
        self.push(NfaState {
            edge: Edge::Epsilon {
                first: None,
                second: None,
            },
            indefinite: false,
        })
    }

    /// Zero-width fragment: a single epsilon state with one open exit.
    pub fn empty(&mut self) -> PatternResult<Fragment> {
        let id = self.split()?;
        Ok(Fragment {
            start: id,
            holes: vec![Hole::First(id)],
        })
    }

    pub fn accept(&mut self, set: SymbolSet) -> PatternResult<Fragment> {
        let fail = set.is_empty();
        let id = self.push(NfaState {
            edge: Edge::Accept {
                set,
                next: None,
                fail,
            },
            indefinite: false,
        })?;
        Ok(Fragment {
            start: id,
            holes: vec![Hole::Next(id)],
        })
    }

    /// A fragment that can never be passed.
    pub fn fail(&mut self) -> PatternResult<Fragment> {
        self.accept(SymbolSet::EMPTY)
    }

    pub fn patch(&mut self, holes: &[Hole], target: StateId) {
        for hole in holes {
            match (&mut self.states[hole.state() as usize].edge, *hole) {
                (Edge::Epsilon { first, .. }, Hole::First(_)) => *first = Some(target),
                (Edge::Epsilon { second, .. }, Hole::Second(_)) => *second = Some(target),
                (Edge::Accept { next, .. }, Hole::Next(_)) => *next = Some(target),
                _ => unreachable!("hole kind does not match state {}", hole.state()),
            }
        }
    }

    pub fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        self.patch(&a.holes, b.start);
        Fragment {
            start: a.start,
            holes: b.holes,
        }
    }

    /// Binary epsilon split between two alternatives.
    pub fn alternate(&mut self, a: Fragment, b: Fragment) -> PatternResult<Fragment> {
        let id = self.push(NfaState {
            edge: Edge::Epsilon {
                first: Some(a.start),
                second: Some(b.start),
            },
            indefinite: false,
        })?;
        let mut holes = a.holes;
        holes.extend(b.holes);
        Ok(Fragment { start: id, holes })
    }

    /// Drop every state from `len` onwards. Used to discard a unit that is
    /// repeated zero times.
    pub fn truncate(&mut self, len: StateId) {
        self.states.truncate(len as usize);
    }

    /// Deep copy of the states in `span`, appended at the end of the arena.
    /// Internal references are renumbered; references leaving the span are kept.
    pub fn duplicate(&mut self, span: Range<StateId>, template: &Fragment) -> PatternResult<Fragment> {
        let count = (span.end - span.start) as usize;
        if self.states.len() + count > self.max_states {
            return Err(PatternError::TooComplex);
        }
        let offset = self.next_id() - span.start;
        let remap = |id: Option<StateId>| match id {
            Some(id) if span.contains(&id) => Some(id + offset),
            other => other,
        };
        for id in span.clone() {
            let mut state = self.states[id as usize].clone();
            state.edge = match state.edge {
                Edge::Epsilon { first, second } => Edge::Epsilon {
                    first: remap(first),
                    second: remap(second),
                },
                Edge::Accept { set, next, fail } => Edge::Accept {
                    set,
                    next: remap(next),
                    fail,
                },
            };
            self.states.push(state);
        }
        Ok(Fragment {
            start: template.start + offset,
            holes: template.holes.iter().map(|h| h.shifted(offset)).collect(),
        })
    }

    /// Repeat `unit` between `min` and `max` times (`None` = unbounded).
    ///
    /// `unit` must be the most recently built fragment and start at state
    /// `base`, so that `base..len()` covers exactly its states. Every copy is
    /// made before any exit is patched.
    pub fn repeat(
        &mut self,
        unit: Fragment,
        base: StateId,
        min: usize,
        max: Option<usize>,
    ) -> PatternResult<Fragment> {
        if max == Some(0) {
            self.truncate(base);
            return self.empty();
        }
        if min == 1 && max == Some(1) {
            return Ok(unit);
        }

        let span = base..self.next_id();
        let total = match max {
            Some(hi) => hi,
            None => min.max(1),
        };
        let mut extra = Vec::with_capacity(total - 1);
        for _ in 1..total {
            extra.push(self.duplicate(span.clone(), &unit)?);
        }

        let (mandatory, optional, body) = match max {
            // the original unit becomes the loop body, copies cover the minimum
            None => (extra, Vec::new(), Some(unit)),
            Some(_) => {
                let mut all = Vec::with_capacity(total);
                all.push(unit);
                all.extend(extra);
                let optional = all.split_off(min.min(total));
                (all, optional, None)
            }
        };

        let chain = mandatory.into_iter().reduce(|prev, copy| self.concat(prev, copy));

        let tail = match body {
            Some(body) => {
                // loop-entry split: first re-enters the body, second leaves
                let entry = self.split()?;
                self.states[entry as usize].indefinite = true;
                self.patch(&[Hole::First(entry)], body.start);
                self.patch(&body.holes, entry);
                let start = if min == 0 { entry } else { body.start };
                Some(Fragment {
                    start,
                    holes: vec![Hole::Second(entry)],
                })
            }
            None => {
                // optional copies, each behind a bypass edge
                let mut bypass: Vec<Hole> = Vec::new();
                let mut opt_chain: Option<Fragment> = None;
                for copy in optional {
                    let guard = self.split()?;
                    self.patch(&[Hole::First(guard)], copy.start);
                    bypass.push(Hole::Second(guard));
                    let piece = Fragment {
                        start: guard,
                        holes: copy.holes,
                    };
                    opt_chain = Some(match opt_chain {
                        Some(prev) => self.concat(prev, piece),
                        None => piece,
                    });
                }
                opt_chain.map(|mut frag| {
                    frag.holes.extend(bypass);
                    frag
                })
            }
        };

        match (chain, tail) {
            (Some(prev), Some(tail)) => Ok(self.concat(prev, tail)),
            (Some(frag), None) | (None, Some(frag)) => Ok(frag),
            (None, None) => self.empty(),
        }
    }

    /// Epsilon closure of `seeds`, as a sorted id list.
    pub fn closure(&self, seeds: impl IntoIterator<Item = StateId>) -> Vec<StateId> {
        let mut seen = vec![false; self.states.len()];
        let mut stack: Vec<StateId> = seeds.into_iter().collect();
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id as usize], true) {
                continue;
            }
            out.push(id);
            if let Edge::Epsilon { first, second } = self.states[id as usize].edge {
                stack.extend(first);
                stack.extend(second);
            }
        }
        out.sort_unstable();
        out
    }
}
