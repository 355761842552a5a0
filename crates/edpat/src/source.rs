// Pattern parameters as handed over by the command handlers
//
// A command parameter is delimited text whose delimiter decides how it is
// interpreted: a backquote introduces pattern syntax, a single quote plain
// text matched without regard to case, a double quote plain text matched
// exactly. Pattern text may refer to other text through `$span$` and
// `&variable&`; those lookups go through the `Dereference` collaborator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Pattern,
    Text,
    ExactText,
}

impl ParamKind {
    /// Kind selected by a parameter delimiter, if the delimiter is one of the three.
    pub fn from_delimiter(dlm: u8) -> Option<ParamKind> {
        match dlm {
            b'`' => Some(ParamKind::Pattern),
            b'\'' => Some(ParamKind::Text),
            b'"' => Some(ParamKind::ExactText),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub kind: ParamKind,
    pub text: &'a [u8],
}

impl<'a> Parameter<'a> {
    pub fn pattern(text: &'a [u8]) -> Self {
        Self {
            kind: ParamKind::Pattern,
            text,
        }
    }

    pub fn text(text: &'a [u8], exact: bool) -> Self {
        Self {
            kind: if exact {
                ParamKind::ExactText
            } else {
                ParamKind::Text
            },
            text,
        }
    }

    /// Split a delimited parameter such as `` `+a` `` or `'abc'`.
    /// The closing delimiter may be omitted at the end of the input.
    pub fn from_delimited(raw: &'a [u8]) -> Option<Self> {
        let (&dlm, rest) = raw.split_first()?;
        let kind = ParamKind::from_delimiter(dlm)?;
        let text = match rest.iter().position(|&b| b == dlm) {
            Some(end) => &rest[..end],
            None => rest,
        };
        Some(Self { kind, text })
    }
}

/// Indirect text lookups used by `$name$` and `&name&`.
pub trait Dereference {
    /// Contents of the named span.
    fn span(&self, name: &str) -> Option<Vec<u8>>;
    /// Value of the named variable.
    fn variable(&self, name: &str) -> Option<Vec<u8>>;
}

/// Resolver for callers that have no spans or variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDereference;

impl Dereference for NoDereference {
    fn span(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }

    fn variable(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Table-backed resolver.
#[derive(Debug, Clone, Default)]
pub struct DerefTable {
    pub spans: Vec<(String, Vec<u8>)>,
    pub variables: Vec<(String, Vec<u8>)>,
}

impl DerefTable {
    pub fn with_span(mut self, name: &str, text: &[u8]) -> Self {
        self.spans.push((name.to_string(), text.to_vec()));
        self
    }

    pub fn with_variable(mut self, name: &str, text: &[u8]) -> Self {
        self.variables.push((name.to_string(), text.to_vec()));
        self
    }

    pub fn set_span(&mut self, name: &str, text: &[u8]) {
        match self.spans.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, t)) => *t = text.to_vec(),
            None => self.spans.push((name.to_string(), text.to_vec())),
        }
    }
}

impl Dereference for DerefTable {
    fn span(&self, name: &str) -> Option<Vec<u8>> {
        self.spans
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, t)| t.clone())
    }

    fn variable(&self, name: &str) -> Option<Vec<u8>> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
    }
}
