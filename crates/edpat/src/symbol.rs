// Extended input alphabet for the pattern engine
//
// Byte values 0..=255 are ordinary text characters. Zero-width positional
// anchors and mark anchors are pseudo-symbols numbered contiguously above
// 255, so one fixed-width bitset type covers both.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub, SubAssign};

pub const BYTE_SYMBOLS: usize = 256;
pub const ANCHOR_SYMBOLS: usize = 16;
pub const ALPHABET_SIZE: usize = BYTE_SYMBOLS + ANCHOR_SYMBOLS;

const WORDS: usize = ALPHABET_SIZE.div_ceil(64);

/// An editor mark that a pattern can test for with `@N`, `=` or `%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// User mark 1..=9.
    Numbered(u8),
    /// Position of the last EQS/GET/REPLACE match.
    Equals,
    /// Position of the last modification.
    Modified,
}

/// Zero-width pseudo-symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    LineStart,
    LineEnd,
    LeftMargin,
    RightMargin,
    DotColumn,
    Mark(Mark),
}

impl Anchor {
    /// Offset of this anchor above the byte range. Mark numbers are expected
    /// to be in 1..=9; the parser rejects anything else.
    pub const fn offset(self) -> usize {
        match self {
            Anchor::LineStart => 0,
            Anchor::LineEnd => 1,
            Anchor::LeftMargin => 2,
            Anchor::RightMargin => 3,
            Anchor::DotColumn => 4,
            Anchor::Mark(Mark::Numbered(n)) => 4 + n as usize,
            Anchor::Mark(Mark::Equals) => 14,
            Anchor::Mark(Mark::Modified) => 15,
        }
    }

    pub const fn from_offset(offset: usize) -> Option<Anchor> {
        match offset {
            0 => Some(Anchor::LineStart),
            1 => Some(Anchor::LineEnd),
            2 => Some(Anchor::LeftMargin),
            3 => Some(Anchor::RightMargin),
            4 => Some(Anchor::DotColumn),
            5..=13 => Some(Anchor::Mark(Mark::Numbered((offset - 4) as u8))),
            14 => Some(Anchor::Mark(Mark::Equals)),
            15 => Some(Anchor::Mark(Mark::Modified)),
            _ => None,
        }
    }

    /// Pattern syntax for this anchor, as written back into definitions.
    pub fn write_to(self, out: &mut Vec<u8>) {
        match self {
            Anchor::LineStart => out.push(b'<'),
            Anchor::LineEnd => out.push(b'>'),
            Anchor::LeftMargin => out.push(b'{'),
            Anchor::RightMargin => out.push(b'}'),
            Anchor::DotColumn => out.push(b'^'),
            Anchor::Mark(Mark::Numbered(n)) => {
                out.push(b'@');
                out.push(b'0' + n);
            }
            Anchor::Mark(Mark::Equals) => out.push(b'='),
            Anchor::Mark(Mark::Modified) => out.push(b'%'),
        }
    }
}

/// One symbol of the extended alphabet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u16);

impl Symbol {
    #[inline(always)]
    pub const fn byte(b: u8) -> Self {
        Symbol(b as u16)
    }

    #[inline(always)]
    pub const fn anchor(a: Anchor) -> Self {
        Symbol((BYTE_SYMBOLS + a.offset()) as u16)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < ALPHABET_SIZE {
            Some(Symbol(index as u16))
        } else {
            None
        }
    }

    pub const fn as_byte(self) -> Option<u8> {
        if (self.0 as usize) < BYTE_SYMBOLS {
            Some(self.0 as u8)
        } else {
            None
        }
    }

    pub const fn as_anchor(self) -> Option<Anchor> {
        if (self.0 as usize) < BYTE_SYMBOLS {
            None
        } else {
            Anchor::from_offset(self.0 as usize - BYTE_SYMBOLS)
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.as_byte(), self.as_anchor()) {
            (Some(b), _) if b.is_ascii_graphic() || b == b' ' => write!(f, "{:?}", b as char),
            (Some(b), _) => write!(f, "0x{:02x}", b),
            (None, Some(a)) => write!(f, "{:?}", a),
            (None, None) => write!(f, "#{}", self.0),
        }
    }
}

/// Fixed-width bitset over the extended alphabet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbolSet {
    words: [u64; WORDS],
}

impl SymbolSet {
    pub const EMPTY: SymbolSet = SymbolSet { words: [0; WORDS] };

    /// Every byte value, no anchors.
    pub const fn all_bytes() -> Self {
        let mut words = [0u64; WORDS];
        let mut i = 0;
        while i < BYTE_SYMBOLS / 64 {
            words[i] = u64::MAX;
            i += 1;
        }
        SymbolSet { words }
    }

    /// Every anchor pseudo-symbol, no bytes.
    pub const fn all_anchors() -> Self {
        let mut set = SymbolSet::EMPTY;
        let mut i = 0;
        while i < ANCHOR_SYMBOLS {
            set = set.with_index(BYTE_SYMBOLS + i);
            i += 1;
        }
        set
    }

    pub const fn single(sym: Symbol) -> Self {
        SymbolSet::EMPTY.with_index(sym.index())
    }

    #[inline(always)]
    pub const fn with_byte(self, b: u8) -> Self {
        self.with_index(b as usize)
    }

    #[inline(always)]
    const fn with_index(mut self, index: usize) -> Self {
        self.words[index / 64] |= 1u64 << (index % 64);
        self
    }

    #[inline(always)]
    pub fn insert(&mut self, sym: Symbol) {
        let i = sym.index();
        self.words[i / 64] |= 1u64 << (i % 64);
    }

    /// Insert the inclusive byte range `lo..=hi`. An inverted range inserts nothing.
    pub fn insert_range(&mut self, lo: u8, hi: u8) {
        for b in lo..=hi {
            self.insert(Symbol::byte(b));
        }
    }

    #[inline(always)]
    pub const fn contains(&self, sym: Symbol) -> bool {
        let i = sym.index();
        self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline(always)]
    pub const fn contains_byte(&self, b: u8) -> bool {
        self.contains(Symbol::byte(b))
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_disjoint(&self, other: &SymbolSet) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & b == 0)
    }

    pub fn is_subset(&self, other: &SymbolSet) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    /// Bytes not in this set. Anchors are never part of the result.
    pub fn byte_complement(&self) -> SymbolSet {
        SymbolSet::all_bytes() - *self
    }

    pub fn bytes_only(&self) -> SymbolSet {
        *self & SymbolSet::all_bytes()
    }

    pub fn has_anchors(&self) -> bool {
        !(*self & SymbolSet::all_anchors()).is_empty()
    }

    /// ASCII letters in the set are completed with their other case.
    pub fn fold_case(&self) -> SymbolSet {
        let mut out = *self;
        for b in b'a'..=b'z' {
            let upper = b.to_ascii_uppercase();
            if self.contains_byte(b) || self.contains_byte(upper) {
                out.insert(Symbol::byte(b));
                out.insert(Symbol::byte(upper));
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..ALPHABET_SIZE)
            .filter_map(Symbol::from_index)
            .filter(move |s| self.contains(*s))
    }

    /// Inclusive runs of consecutive byte values, in ascending order.
    pub fn byte_ranges(&self) -> Vec<(u8, u8)> {
        let mut ranges = Vec::new();
        let mut run: Option<(u8, u8)> = None;
        for b in 0..=u8::MAX {
            if self.contains_byte(b) {
                run = match run {
                    Some((lo, _)) => Some((lo, b)),
                    None => Some((b, b)),
                };
            } else if let Some(r) = run.take() {
                ranges.push(r);
            }
        }
        if let Some(r) = run {
            ranges.push(r);
        }
        ranges
    }
}

impl BitOr for SymbolSet {
    type Output = SymbolSet;

    fn bitor(mut self, rhs: SymbolSet) -> SymbolSet {
        self |= rhs;
        self
    }
}

impl BitOrAssign for SymbolSet {
    fn bitor_assign(&mut self, rhs: SymbolSet) {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a |= b;
        }
    }
}

impl BitAnd for SymbolSet {
    type Output = SymbolSet;

    fn bitand(mut self, rhs: SymbolSet) -> SymbolSet {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a &= b;
        }
        self
    }
}

impl Sub for SymbolSet {
    type Output = SymbolSet;

    fn sub(mut self, rhs: SymbolSet) -> SymbolSet {
        self -= rhs;
        self
    }
}

impl SubAssign for SymbolSet {
    fn sub_assign(&mut self, rhs: SymbolSet) {
        for (a, b) in self.words.iter_mut().zip(rhs.words) {
            *a &= !b;
        }
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (lo, hi) in self.byte_ranges() {
            if lo == hi {
                list.entry(&Symbol::byte(lo));
            } else {
                list.entry(&(Symbol::byte(lo)..=Symbol::byte(hi)));
            }
        }
        for offset in 0..ANCHOR_SYMBOLS {
            if let Some(anchor) = Anchor::from_offset(offset)
                && self.contains(Symbol::anchor(anchor))
            {
                list.entry(&anchor);
            }
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_offsets_are_contiguous() {
        for offset in 0..ANCHOR_SYMBOLS {
            let anchor = Anchor::from_offset(offset).unwrap();
            assert_eq!(anchor.offset(), offset);
            let sym = Symbol::anchor(anchor);
            assert_eq!(sym.as_anchor(), Some(anchor));
            assert_eq!(sym.as_byte(), None);
        }
        assert_eq!(Anchor::from_offset(ANCHOR_SYMBOLS), None);
    }

    #[test]
    fn test_set_operations() {
        let mut a = SymbolSet::EMPTY;
        a.insert_range(b'a', b'f');
        let mut b = SymbolSet::EMPTY;
        b.insert_range(b'd', b'k');

        assert_eq!((a & b).byte_ranges(), vec![(b'd', b'f')]);
        assert_eq!((a - b).byte_ranges(), vec![(b'a', b'c')]);
        assert_eq!((a | b).byte_ranges(), vec![(b'a', b'k')]);
        assert!(!a.is_disjoint(&b));
        assert!((a & b).is_subset(&a));
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn test_byte_complement_excludes_anchors() {
        let mut set = SymbolSet::single(Symbol::anchor(Anchor::LineEnd));
        set.insert(Symbol::byte(b'x'));
        let comp = set.byte_complement();
        assert_eq!(comp.len(), 255);
        assert!(!comp.contains_byte(b'x'));
        assert!(!comp.has_anchors());
    }

    #[test]
    fn test_fold_case() {
        let set = SymbolSet::EMPTY.with_byte(b'Q').with_byte(b'1');
        let folded = set.fold_case();
        assert!(folded.contains_byte(b'q'));
        assert!(folded.contains_byte(b'Q'));
        assert!(folded.contains_byte(b'1'));
        assert_eq!(folded.len(), 3);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut set = SymbolSet::EMPTY;
        set.insert_range(b'z', b'a');
        assert!(set.is_empty());
    }
}
