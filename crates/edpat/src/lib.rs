// Editor Pattern Engine
// Pattern compiler, NFA to DFA converter and line recognizer for EQS, GET and REPLACE

#[cfg(test)]
mod test;

pub mod cache;
pub mod cancel;
pub mod class;
pub mod convert;
pub mod dfa;
pub mod error;
pub mod limits;
pub mod nfa;
pub mod options;
pub mod parser;
pub mod recognize;
pub mod search;
pub mod source;
pub mod symbol;
pub mod text;

pub use cache::{CacheOutcome, CompiledPattern, Consumer, PatternCache, PatternSlot};
pub use cancel::CancelToken;
pub use convert::convert;
pub use dfa::{Dfa, DfaState, DfaStateId};
pub use error::{PatternError, PatternResult};
pub use options::EngineOptions;
pub use parser::{CompileContext, CompiledNfa, compile};
pub use recognize::{Match, Scan, recognize};
pub use search::{Found, eqs, find_backward, find_forward, substitute, substitute_all};
pub use source::{DerefTable, Dereference, NoDereference, ParamKind, Parameter};
pub use symbol::{Anchor, Mark};
pub use text::{FrameInfo, LineBuffer, LineId, TextSource};
