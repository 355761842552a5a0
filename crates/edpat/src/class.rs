// Character class tables for patterns
// Handles the class letters s, a, c, l, u, n, p (either case) and their `-` negations.
// Tables are built at compile time, so lookups never allocate.

use crate::symbol::SymbolSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Space,       // s
    Alpha,       // a
    Printable,   // c
    Lower,       // l
    Upper,       // u
    Numeric,     // n
    Punctuation, // p
}

impl CharClass {
    /// Class for a pattern letter, case-insensitive. `None` for non-class letters.
    pub fn from_letter(letter: u8) -> Option<CharClass> {
        match letter.to_ascii_lowercase() {
            b's' => Some(CharClass::Space),
            b'a' => Some(CharClass::Alpha),
            b'c' => Some(CharClass::Printable),
            b'l' => Some(CharClass::Lower),
            b'u' => Some(CharClass::Upper),
            b'n' => Some(CharClass::Numeric),
            b'p' => Some(CharClass::Punctuation),
            _ => None,
        }
    }

    /// Letter used when writing the class back into a pattern definition.
    pub fn letter(self) -> u8 {
        match self {
            CharClass::Space => b's',
            CharClass::Alpha => b'a',
            CharClass::Printable => b'c',
            CharClass::Lower => b'l',
            CharClass::Upper => b'u',
            CharClass::Numeric => b'n',
            CharClass::Punctuation => b'p',
        }
    }

    #[inline]
    pub fn set(self) -> &'static SymbolSet {
        match self {
            CharClass::Space => &SPACE,
            CharClass::Alpha => &ALPHA,
            CharClass::Printable => &PRINTABLE,
            CharClass::Lower => &LOWER,
            CharClass::Upper => &UPPER,
            CharClass::Numeric => &NUMERIC,
            CharClass::Punctuation => &PUNCTUATION,
        }
    }

    /// Accept set for this class, or for every other byte when `negated`.
    pub fn accept_set(self, negated: bool) -> SymbolSet {
        if negated {
            self.set().byte_complement()
        } else {
            *self.set()
        }
    }
}

const fn in_class(class: CharClass, b: u8) -> bool {
    match class {
        CharClass::Space => b == b' ',
        CharClass::Alpha => b.is_ascii_alphabetic(),
        CharClass::Printable => b >= b' ' && b <= b'~',
        CharClass::Lower => b.is_ascii_lowercase(),
        CharClass::Upper => b.is_ascii_uppercase(),
        CharClass::Numeric => b.is_ascii_digit(),
        CharClass::Punctuation => b.is_ascii_punctuation(),
    }
}

const fn build(class: CharClass) -> SymbolSet {
    let mut set = SymbolSet::EMPTY;
    let mut b: usize = 0;
    while b < 256 {
        if in_class(class, b as u8) {
            set = set.with_byte(b as u8);
        }
        b += 1;
    }
    set
}

static SPACE: SymbolSet = build(CharClass::Space);
static ALPHA: SymbolSet = build(CharClass::Alpha);
static PRINTABLE: SymbolSet = build(CharClass::Printable);
static LOWER: SymbolSet = build(CharClass::Lower);
static UPPER: SymbolSet = build(CharClass::Upper);
static NUMERIC: SymbolSet = build(CharClass::Numeric);
static PUNCTUATION: SymbolSet = build(CharClass::Punctuation);

/// Accept set for one literal character; letters match either case unless `exact`.
pub fn literal_set(b: u8, exact: bool) -> SymbolSet {
    let set = SymbolSet::EMPTY.with_byte(b);
    if exact { set } else { set.fold_case() }
}
