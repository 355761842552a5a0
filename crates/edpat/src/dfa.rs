// DFA table produced by the converter and walked by the recognizer
//
// Index 0 is KILL ("no match can start here"), index 1 is the FAIL
// pseudo-state ("shift the attempt one column right and retry") and index 2
// is the pattern start state. Real states follow.

use crate::limits::RESERVED_DFA_STATES;
use crate::nfa::{Nfa, StateId};
use crate::symbol::{Anchor, Symbol, SymbolSet};

pub type DfaStateId = u32;

pub const KILL: DfaStateId = 0;
pub const FAIL: DfaStateId = 1;
pub const START: DfaStateId = RESERVED_DFA_STATES as DfaStateId;

#[derive(Debug, Clone)]
pub struct DfaTransition {
    pub accept: SymbolSet,
    pub target: DfaStateId,
    /// Taken out of the pattern start state, before anything was consumed.
    pub start_flag: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DfaState {
    /// Sorted NFA states this DFA state stands for.
    pub nfa_set: Vec<StateId>,
    /// Disjoint over bytes; the last byte entry is the explicit KILL/FAIL complement.
    pub transitions: Vec<DfaTransition>,
    pub marked: bool,
    /// Only the START entry: the attempt has not consumed anything yet.
    pub pattern_start: bool,
    /// Holds the boundary between left context and middle segment.
    pub left_transition: bool,
    /// Holds the boundary between middle segment and right context.
    pub right_transition: bool,
    /// A left boundary here may be followed by another repetition of the left
    /// context.
    pub left_context_check: bool,
    pub final_accept: bool,
    /// Byte → target lookup, filled in once the state's transitions are final.
    pub(crate) byte_next: Vec<DfaStateId>,
}

impl DfaState {
    pub(crate) fn new(nfa_set: Vec<StateId>, pattern_start: bool) -> Self {
        Self {
            nfa_set,
            pattern_start,
            ..Self::default()
        }
    }

    #[inline]
    pub fn contains(&self, id: StateId) -> bool {
        self.nfa_set.binary_search(&id).is_ok()
    }

    pub(crate) fn build_byte_table(&mut self) {
        let mut table = vec![KILL; 256];
        for t in &self.transitions {
            for (lo, hi) in t.accept.byte_ranges() {
                for b in lo..=hi {
                    table[b as usize] = t.target;
                }
            }
        }
        self.byte_next = table;
    }
}

/// The NFA of a pattern with a left or right context, with its boundary
/// states. Subset states merge every way of splitting the input between the
/// segments, so the recognizer replays the segments on it to place `start`
/// and `finish` once the match end is known.
#[derive(Debug, Clone)]
pub struct ContextSlices {
    pub(crate) nfa: Nfa,
    pub(crate) start: StateId,
    pub(crate) left_context_end: StateId,
    pub(crate) middle_context_end: StateId,
    pub(crate) final_state: StateId,
}

#[derive(Debug, Clone)]
pub struct Dfa {
    pub(crate) states: Vec<DfaState>,
    /// The right context can match the empty string.
    pub right_nullable: bool,
    /// Middle segment and right context together can match the empty string.
    pub suffix_nullable: bool,
    /// `None` when the pattern is a middle segment only.
    pub(crate) contexts: Option<Box<ContextSlices>>,
}

impl Dfa {
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn state(&self, id: DfaStateId) -> &DfaState {
        &self.states[id as usize]
    }

    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    #[inline]
    pub fn has_contexts(&self) -> bool {
        self.contexts.is_some()
    }

    #[inline]
    pub fn is_real(id: DfaStateId) -> bool {
        id >= START
    }

    #[inline(always)]
    pub fn next_byte(&self, state: DfaStateId, b: u8) -> DfaStateId {
        self.states[state as usize].byte_next[b as usize]
    }

    /// Target for a zero-width anchor. `None` means the anchor leaves the
    /// state unchanged.
    pub fn next_anchor(&self, state: DfaStateId, anchor: Anchor) -> Option<DfaStateId> {
        let sym = Symbol::anchor(anchor);
        self.states[state as usize]
            .transitions
            .iter()
            .find(|t| t.accept.contains(sym))
            .map(|t| t.target)
    }

    /// Some byte can still move this state to a real state.
    pub fn can_continue(&self, state: DfaStateId) -> bool {
        self.states[state as usize]
            .transitions
            .iter()
            .any(|t| Dfa::is_real(t.target) && !t.accept.bytes_only().is_empty())
    }

    /// Anchors with a transition out of this state.
    pub fn wants_anchor(&self, state: DfaStateId) -> bool {
        self.states[state as usize]
            .transitions
            .iter()
            .any(|t| t.accept.has_anchors())
    }
}
