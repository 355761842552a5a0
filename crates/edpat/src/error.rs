use smol_str::SmolStr;

/// Reasons a pattern can fail to compile.
///
/// Offsets are byte positions in the pattern text being parsed when the
/// problem was found. For errors raised inside a dereferenced span or
/// variable the offset is relative to that text, and the error is wrapped in
/// `InDereference`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("no matching delimiter (at {at})")]
    UnmatchedDelimiter { at: usize },

    #[error("illegal symbol '{symbol}' in pattern (at {at})")]
    IllegalSymbol { symbol: char, at: usize },

    #[error("illegal mark number (at {at})")]
    IllegalMarkNumber { at: usize },

    #[error("set not defined (at {at})")]
    SetNotDefined { at: usize },

    #[error("'{name}' is not defined")]
    UndefinedReference { name: SmolStr },

    #[error("pattern too complex")]
    TooComplex,

    #[error("pattern nested too deeply")]
    TooDeep,

    #[error("premature end of pattern")]
    PrematureEnd,

    #[error("null pattern")]
    NullPattern,

    #[error("error in '{name}': {source}")]
    InDereference {
        name: SmolStr,
        #[source]
        source: Box<PatternError>,
    },

    #[error("interrupted")]
    Interrupted,
}

pub type PatternResult<T> = Result<T, PatternError>;
