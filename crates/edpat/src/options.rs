use crate::limits::{
    MAX_DEFINITION_LEN, MAX_DEREF_DEPTH, MAX_DFA_STATES, MAX_NFA_STATES, MAX_PARSE_DEPTH,
    MAX_REPEAT_COUNT,
};

/// Construction budgets for the pattern engine.
///
/// Every field is a hard ceiling enforced inline while compiling; going past
/// one is reported as an ordinary `PatternError`, never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    pub max_nfa_states: usize,
    pub max_dfa_states: usize,
    /// Nesting depth for groups and alternations.
    pub max_parse_depth: usize,
    /// How many `$span$` / `&variable&` hops may be chained.
    pub max_deref_depth: usize,
    pub max_definition_len: usize,
    pub max_repeat_count: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_nfa_states: MAX_NFA_STATES,
            max_dfa_states: MAX_DFA_STATES,
            max_parse_depth: MAX_PARSE_DEPTH,
            max_deref_depth: MAX_DEREF_DEPTH,
            max_definition_len: MAX_DEFINITION_LEN,
            max_repeat_count: MAX_REPEAT_COUNT,
        }
    }
}
