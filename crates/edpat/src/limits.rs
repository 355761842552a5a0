//! Centralized pattern engine limits.
//!
//! All magic numbers that bound compilation are collected here.
//! `EngineOptions::default()` is built from these values; callers that need
//! different ceilings override the option fields instead of editing this file.

// ===== Parser =====

/// Maximum number of NFA states a single compile may allocate.
/// Counted repetitions duplicate their unit, so this is the budget that
/// `[1,200]'abc'` style patterns run into first.
pub const MAX_NFA_STATES: usize = 2000;

/// Maximum nesting of groups, alternations and dereferences while parsing.
/// Prevents stack overflow on pathological input such as `((((((...`.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum chain length of `$span$` / `&variable&` dereferences.
pub const MAX_DEREF_DEPTH: usize = 8;

/// Maximum length of the canonical pattern definition in bytes.
pub const MAX_DEFINITION_LEN: usize = 4096;

/// Largest repetition count accepted in a quantifier.
pub const MAX_REPEAT_COUNT: usize = 1000;

// ===== DFA =====

/// Maximum number of DFA states, including the KILL, FAIL and START entries.
pub const MAX_DFA_STATES: usize = 1000;

/// Number of reserved DFA table entries before the first real state.
pub const RESERVED_DFA_STATES: usize = 2;

// ===== Recognizer =====

/// Number of numbered user marks (`@1` .. `@9`).
pub const MAX_MARK_NUMBER: u8 = 9;
