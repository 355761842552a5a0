// Pattern parser
// Recursive-descent compiler from pattern text straight into an NFA.
//
// While parsing, every element is also written back in a canonical form.
// The canonical definition is what the cache compares, so two patterns that
// differ only in surface syntax share one DFA.
//
//   pattern     := segment [',' segment [',' segment]]
//   segment     := alternation
//   alternation := sequence { '|' sequence }
//   sequence    := { [quantifier] atom }
//   quantifier  := '*' | '+' | digits | '[' [digits] [',' [digits]] ']'

use std::ops::Range;

use smol_str::SmolStr;

use crate::class::{CharClass, literal_set};
use crate::error::{PatternError, PatternResult};
use crate::limits::MAX_MARK_NUMBER;
use crate::nfa::{Fragment, Hole, Nfa, StateId};
use crate::options::EngineOptions;
use crate::source::{Dereference, ParamKind, Parameter};
use crate::symbol::{Anchor, Mark, Symbol, SymbolSet};

/// Everything `compile` needs besides the pattern itself.
#[derive(Clone, Copy)]
pub struct CompileContext<'c> {
    pub options: &'c EngineOptions,
    pub resolver: &'c dyn Dereference,
}

/// Result of a successful compile. The NFA is consumed by the DFA converter
/// and dropped afterwards; only patterns with a context keep a copy in the
/// DFA.
pub struct CompiledNfa {
    pub nfa: Nfa,
    pub start: StateId,
    pub final_state: StateId,
    /// Boundary state between the left context and the middle segment.
    pub left_context_end: StateId,
    /// Boundary state between the middle segment and the right context.
    pub middle_context_end: StateId,
    /// States that belong to the left context.
    pub left_context: Range<StateId>,
    /// Canonical pattern text, always in `left,middle,right` form.
    pub definition: Vec<u8>,
}

/// Repetition bounds; `max == None` is unbounded.
type Quantifier = (usize, Option<usize>);

struct Builder<'c> {
    nfa: Nfa,
    def: Vec<u8>,
    options: &'c EngineOptions,
    resolver: &'c dyn Dereference,
    deref_depth: usize,
}

impl Builder<'_> {
    fn check_definition(&self) -> PatternResult<()> {
        if self.def.len() > self.options.max_definition_len {
            return Err(PatternError::TooComplex);
        }
        Ok(())
    }

    fn write_count(&mut self, n: usize) {
        let mut buf = itoa::Buffer::new();
        self.def.extend_from_slice(buf.format(n).as_bytes());
    }

    fn write_quantifier(&mut self, (min, max): Quantifier) {
        if min == 1 && max == Some(1) {
            return;
        }
        self.def.push(b'[');
        self.write_count(min);
        self.def.push(b',');
        if let Some(max) = max {
            self.write_count(max);
        }
        self.def.push(b']');
    }

    /// Literal text, quoted with `quote` and the quote doubled inside.
    fn write_literal(&mut self, text: &[u8], exact: bool) {
        let quote = if exact { b'"' } else { b'\'' };
        self.def.push(quote);
        for &b in text {
            let b = if exact { b } else { b.to_ascii_lowercase() };
            if b == quote {
                self.def.push(quote);
            }
            self.def.push(b);
        }
        self.def.push(quote);
    }

    fn write_set(&mut self, set: &SymbolSet) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        self.def.extend_from_slice(b"D[");
        for (lo, hi) in set.byte_ranges() {
            for b in [lo, hi] {
                self.def.push(HEX[(b >> 4) as usize]);
                self.def.push(HEX[(b & 0xf) as usize]);
            }
            self.def.push(b';');
        }
        self.def.push(b']');
    }

    fn literal(&mut self, text: &[u8], exact: bool) -> PatternResult<Fragment> {
        let mut frag: Option<Fragment> = None;
        for &b in text {
            let next = self.nfa.accept(literal_set(b, exact))?;
            frag = Some(match frag {
                Some(prev) => self.nfa.concat(prev, next),
                None => next,
            });
        }
        match frag {
            Some(frag) => Ok(frag),
            None => self.nfa.empty(),
        }
    }
}

/// One context segment after parsing.
struct Segment {
    frag: Fragment,
    def: Vec<u8>,
    /// First state id past this segment.
    end: StateId,
}

struct Parser<'a, 'c> {
    src: &'a [u8],
    pos: usize,
    b: &'a mut Builder<'c>,
    depth: usize,
}

impl<'a, 'c> Parser<'a, 'c> {
    fn new(src: &'a [u8], b: &'a mut Builder<'c>, depth: usize) -> Self {
        Self { src, pos: 0, b, depth }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn illegal(&self, at: usize) -> PatternError {
        match self.src.get(at) {
            Some(&c) => PatternError::IllegalSymbol {
                symbol: c as char,
                at,
            },
            None => PatternError::PrematureEnd,
        }
    }

    /// Top level: up to three comma separated context segments.
    fn parse_segments(&mut self) -> PatternResult<Vec<Segment>> {
        let mut segments = Vec::with_capacity(3);
        loop {
            let frag = self.parse_alternation()?;
            segments.push(Segment {
                frag,
                def: std::mem::take(&mut self.b.def),
                end: self.b.nfa.next_id(),
            });
            self.skip_spaces();
            match self.peek() {
                None => break,
                Some(b',') if segments.len() < 3 => {
                    self.pos += 1;
                }
                Some(b')') => {
                    return Err(PatternError::IllegalSymbol {
                        symbol: ')',
                        at: self.pos,
                    });
                }
                Some(_) => return Err(self.illegal(self.pos)),
            }
        }
        Ok(segments)
    }

    /// A whole dereferenced text: one alternation, no context separators.
    fn parse_nested(&mut self) -> PatternResult<Fragment> {
        let frag = self.parse_alternation()?;
        self.skip_spaces();
        if self.pos < self.src.len() {
            return Err(self.illegal(self.pos));
        }
        Ok(frag)
    }

    /// sequence { '|' sequence }, folded into right-nested binary splits.
    /// Only groups and dereferences nest deeper; a flat list of branches does not.
    fn parse_alternation(&mut self) -> PatternResult<Fragment> {
        if self.depth > self.b.options.max_parse_depth {
            return Err(PatternError::TooDeep);
        }
        let mut branches = vec![self.parse_sequence()?];
        loop {
            self.skip_spaces();
            if self.peek() != Some(b'|') {
                break;
            }
            self.pos += 1;
            self.b.def.push(b'|');
            branches.push(self.parse_sequence()?);
        }
        let mut branches = branches.into_iter().rev();
        let mut alt = match branches.next() {
            Some(last) => last,
            None => self.b.nfa.empty()?,
        };
        for branch in branches {
            alt = self.b.nfa.alternate(branch, alt)?;
        }
        Ok(alt)
    }

    fn parse_sequence(&mut self) -> PatternResult<Fragment> {
        let mut seq: Option<Fragment> = None;
        loop {
            self.skip_spaces();
            match self.peek() {
                None | Some(b',') | Some(b')') | Some(b'|') => break,
                Some(_) => {}
            }
            let element = self.parse_element()?;
            self.b.check_definition()?;
            seq = Some(match seq {
                Some(prev) => self.b.nfa.concat(prev, element),
                None => element,
            });
        }
        match seq {
            Some(seq) => Ok(seq),
            None => self.b.nfa.empty(),
        }
    }

    /// [quantifier] atom
    fn parse_element(&mut self) -> PatternResult<Fragment> {
        let quantifier = self.parse_quantifier()?;
        if let Some(q) = quantifier {
            self.b.write_quantifier(q);
            self.skip_spaces();
        }
        let base = self.b.nfa.next_id();
        let atom = self.parse_atom()?;
        match quantifier {
            None => Ok(atom),
            Some((min, Some(max))) if max < min => {
                // can never be satisfied
                self.b.nfa.truncate(base);
                self.b.nfa.fail()
            }
            Some((min, max)) => self.b.nfa.repeat(atom, base, min, max),
        }
    }

    fn parse_quantifier(&mut self) -> PatternResult<Option<Quantifier>> {
        match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Ok(Some((0, None)))
            }
            Some(b'+') => {
                self.pos += 1;
                Ok(Some((1, None)))
            }
            Some(c) if c.is_ascii_digit() => {
                let n = self.parse_count()?.unwrap_or(0);
                Ok(Some((n, Some(n))))
            }
            Some(b'[') => {
                let open = self.pos;
                self.pos += 1;
                self.skip_spaces();
                let lo = self.parse_count()?;
                self.skip_spaces();
                let q = match self.bump() {
                    Some(b']') => match lo {
                        Some(n) => (n, Some(n)),
                        None => return Err(self.illegal(self.pos - 1)),
                    },
                    Some(b',') => {
                        self.skip_spaces();
                        let hi = self.parse_count()?;
                        self.skip_spaces();
                        match self.bump() {
                            Some(b']') => (lo.unwrap_or(0), hi),
                            Some(_) => return Err(self.illegal(self.pos - 1)),
                            None => return Err(PatternError::UnmatchedDelimiter { at: open }),
                        }
                    }
                    Some(_) => return Err(self.illegal(self.pos - 1)),
                    None => return Err(PatternError::UnmatchedDelimiter { at: open }),
                };
                Ok(Some(q))
            }
            _ => Ok(None),
        }
    }

    fn parse_count(&mut self) -> PatternResult<Option<usize>> {
        let mut value: Option<usize> = None;
        while let Some(c) = self.peek().filter(u8::is_ascii_digit) {
            self.pos += 1;
            let n = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add((c - b'0') as usize))
                .filter(|&v| v <= self.b.options.max_repeat_count)
                .ok_or(PatternError::TooComplex)?;
            value = Some(n);
        }
        Ok(value)
    }

    fn parse_atom(&mut self) -> PatternResult<Fragment> {
        let at = self.pos;
        let Some(c) = self.bump() else {
            return Err(PatternError::PrematureEnd);
        };
        match c {
            b'\'' | b'"' => self.parse_literal(c, at),
            b'-' => match self.bump() {
                None => Err(PatternError::PrematureEnd),
                Some(b'D' | b'd') => self.parse_set(true, at),
                Some(letter) => match CharClass::from_letter(letter) {
                    Some(class) => self.class(class, true),
                    None => Err(self.illegal(self.pos - 1)),
                },
            },
            b'D' | b'd' => self.parse_set(false, at),
            b'<' => self.anchor(Anchor::LineStart),
            b'>' => self.anchor(Anchor::LineEnd),
            b'{' => self.anchor(Anchor::LeftMargin),
            b'}' => self.anchor(Anchor::RightMargin),
            b'^' => self.anchor(Anchor::DotColumn),
            b'=' => self.anchor(Anchor::Mark(Mark::Equals)),
            b'%' => self.anchor(Anchor::Mark(Mark::Modified)),
            b'@' => match self.bump() {
                None => Err(PatternError::PrematureEnd),
                Some(d) if (b'1'..=b'0' + MAX_MARK_NUMBER).contains(&d) => {
                    self.anchor(Anchor::Mark(Mark::Numbered(d - b'0')))
                }
                Some(_) => Err(PatternError::IllegalMarkNumber { at: self.pos - 1 }),
            },
            b'(' => self.parse_group(at),
            b'$' | b'&' => self.parse_dereference(c, at),
            _ => match CharClass::from_letter(c) {
                Some(class) => self.class(class, false),
                None => Err(PatternError::IllegalSymbol {
                    symbol: c as char,
                    at,
                }),
            },
        }
    }

    /// 'text' or "text"; a doubled quote stands for the quote itself.
    fn parse_literal(&mut self, quote: u8, open: usize) -> PatternResult<Fragment> {
        let mut text = Vec::new();
        loop {
            match self.bump() {
                None => return Err(PatternError::UnmatchedDelimiter { at: open }),
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.pos += 1;
                        text.push(quote);
                    } else {
                        break;
                    }
                }
                Some(c) => text.push(c),
            }
        }
        let exact = quote == b'"';
        self.b.write_literal(&text, exact);
        self.b.literal(&text, exact)
    }

    fn class(&mut self, class: CharClass, negated: bool) -> PatternResult<Fragment> {
        if negated {
            self.b.def.push(b'-');
        }
        self.b.def.push(class.letter());
        self.b.nfa.accept(class.accept_set(negated))
    }

    /// D/items/ where items are bytes or lo-hi ranges between a chosen delimiter.
    fn parse_set(&mut self, negated: bool, at: usize) -> PatternResult<Fragment> {
        let Some(dlm) = self.bump() else {
            return Err(PatternError::PrematureEnd);
        };
        let body_start = self.pos;
        let Some(len) = self.src[body_start..].iter().position(|&c| c == dlm) else {
            return Err(PatternError::UnmatchedDelimiter { at });
        };
        let body = &self.src[body_start..body_start + len];
        self.pos = body_start + len + 1;
        if body.is_empty() {
            return Err(PatternError::SetNotDefined { at });
        }

        let mut set = SymbolSet::EMPTY;
        let mut i = 0;
        while i < body.len() {
            if i + 2 < body.len() && body[i + 1] == b'-' {
                set.insert_range(body[i], body[i + 2]);
                i += 3;
            } else {
                set.insert(Symbol::byte(body[i]));
                i += 1;
            }
        }
        if negated {
            set = set.byte_complement();
        }
        self.b.write_set(&set);
        // an inverted range or a complement of everything leaves nothing to accept
        self.b.nfa.accept(set)
    }

    fn anchor(&mut self, anchor: Anchor) -> PatternResult<Fragment> {
        anchor.write_to(&mut self.b.def);
        self.b.nfa.accept(SymbolSet::single(Symbol::anchor(anchor)))
    }

    /// Whether the group opened at `open` has a closing parenthesis, skipping
    /// over literals, sets and dereference names that may contain one.
    fn has_closing(&self, open: usize) -> bool {
        let src = self.src;
        let skip_to = |from: usize, dlm: u8| {
            src[from..].iter().position(|&c| c == dlm).map(|n| from + n)
        };
        let mut depth = 0usize;
        let mut i = open;
        while i < src.len() {
            match src[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                q @ (b'\'' | b'"') => {
                    // doubled quotes simply restart the scan on the next quote
                    match skip_to(i + 1, q) {
                        Some(end) => i = end,
                        None => return false,
                    }
                }
                b'D' | b'd' if i + 1 < src.len() => match skip_to(i + 2, src[i + 1]) {
                    Some(end) => i = end,
                    None => return false,
                },
                c @ (b'$' | b'&') => match skip_to(i + 1, c) {
                    Some(end) => i = end,
                    None => return false,
                },
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_group(&mut self, open: usize) -> PatternResult<Fragment> {
        if !self.has_closing(open) {
            return Err(PatternError::UnmatchedDelimiter { at: open });
        }
        self.b.def.push(b'(');
        self.depth += 1;
        let inner = self.parse_alternation();
        self.depth -= 1;
        let inner = inner?;
        self.skip_spaces();
        match self.bump() {
            Some(b')') => {
                self.b.def.push(b')');
                Ok(inner)
            }
            Some(b',') => Err(PatternError::IllegalSymbol {
                symbol: ',',
                at: self.pos - 1,
            }),
            _ => Err(PatternError::UnmatchedDelimiter { at: open }),
        }
    }

    /// $span$ or &variable&: the referenced text is parsed as a group.
    fn parse_dereference(&mut self, dlm: u8, open: usize) -> PatternResult<Fragment> {
        let name_start = self.pos;
        let Some(len) = self.src[name_start..].iter().position(|&c| c == dlm) else {
            return Err(PatternError::UnmatchedDelimiter { at: open });
        };
        let name = SmolStr::new(String::from_utf8_lossy(&self.src[name_start..name_start + len]));
        self.pos = name_start + len + 1;

        let content = if dlm == b'$' {
            self.b.resolver.span(&name)
        } else {
            self.b.resolver.variable(&name)
        };
        let Some(content) = content else {
            return Err(PatternError::UndefinedReference { name });
        };
        if self.b.deref_depth >= self.b.options.max_deref_depth {
            return Err(PatternError::TooDeep);
        }
        log::trace!("dereferencing '{}' ({} bytes)", name, content.len());

        self.b.def.push(b'(');
        self.b.deref_depth += 1;
        let result = if content.iter().all(|&c| c == b' ') {
            Err(PatternError::NullPattern)
        } else {
            Parser::new(&content, &mut *self.b, self.depth + 1).parse_nested()
        };
        self.b.deref_depth -= 1;
        let frag = result.map_err(|source| PatternError::InDereference {
            name,
            source: Box::new(source),
        })?;
        self.b.def.push(b')');
        Ok(frag)
    }
}

/// Compile a parameter into an NFA plus its canonical definition.
///
/// All-or-nothing: on error nothing of the partially built graph escapes.
pub fn compile(param: &Parameter, ctx: &CompileContext) -> PatternResult<CompiledNfa> {
    let mut b = Builder {
        nfa: Nfa::new(ctx.options.max_nfa_states),
        def: Vec::with_capacity(param.text.len() + 8),
        options: ctx.options,
        resolver: ctx.resolver,
        deref_depth: 0,
    };
    if param.text.iter().all(|&c| c == b' ') {
        return Err(PatternError::NullPattern);
    }

    let mut segments = match param.kind {
        ParamKind::Pattern => Parser::new(param.text, &mut b, 0).parse_segments()?,
        ParamKind::Text | ParamKind::ExactText => {
            let exact = param.kind == ParamKind::ExactText;
            b.write_literal(param.text, exact);
            let frag = b.literal(param.text, exact)?;
            vec![Segment {
                frag,
                def: std::mem::take(&mut b.def),
                end: b.nfa.next_id(),
            }]
        }
    };

    let right = if segments.len() == 3 { segments.pop() } else { None };
    let middle = segments.pop().ok_or(PatternError::NullPattern)?;
    let left = segments.pop();

    let left_context_end = b.nfa.split()?;
    let middle_context_end = b.nfa.split()?;
    let final_state = b.nfa.split()?;

    let mut definition = Vec::new();
    let start = match &left {
        Some(seg) => {
            b.nfa.patch(&seg.frag.holes, left_context_end);
            definition.extend_from_slice(&seg.def);
            seg.frag.start
        }
        None => left_context_end,
    };
    definition.push(b',');
    b.nfa.patch(&[Hole::First(left_context_end)], middle.frag.start);
    b.nfa.patch(&middle.frag.holes, middle_context_end);
    definition.extend_from_slice(&middle.def);
    definition.push(b',');
    match &right {
        Some(seg) => {
            b.nfa.patch(&[Hole::First(middle_context_end)], seg.frag.start);
            b.nfa.patch(&seg.frag.holes, final_state);
            definition.extend_from_slice(&seg.def);
        }
        None => b.nfa.patch(&[Hole::First(middle_context_end)], final_state),
    }
    if definition.len() > ctx.options.max_definition_len {
        return Err(PatternError::TooComplex);
    }

    log::debug!(
        "compiled pattern {:?}: {} NFA states",
        String::from_utf8_lossy(&definition),
        b.nfa.len()
    );

    Ok(CompiledNfa {
        nfa: b.nfa,
        start,
        final_state,
        left_context_end,
        middle_context_end,
        left_context: 0..left.map_or(0, |seg| seg.end),
        definition,
    })
}
