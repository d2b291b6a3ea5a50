//! CQL terms and their lexical typing

use chrono::DateTime;

/// The lexical shape of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Integer literal
    Long,
    /// Floating point literal
    Float,
    /// ISO-8601 date-time literal
    Date,
    /// Bare word
    Identifier,
    /// Double-quoted string (quotes retained in the value)
    String,
}

/// A typed literal term
///
/// The parser determines the kind from the lexical shape of the raw text;
/// `Term::new` reproduces that classification for trees built directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    value: String,
    kind: TermKind,
}

impl Term {
    /// Create a term, deriving its kind from the lexical shape of `value`
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = classify(&value);
        Self { value, kind }
    }

    /// Create a term with an explicit kind
    pub fn with_kind(value: impl Into<String>, kind: TermKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// The raw term text (quoted strings keep their quotes)
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The lexical kind
    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn is_long(&self) -> bool {
        self.kind == TermKind::Long
    }

    pub fn is_float(&self) -> bool {
        self.kind == TermKind::Float
    }

    pub fn is_date(&self) -> bool {
        self.kind == TermKind::Date
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TermKind::Identifier
    }

    pub fn is_string(&self) -> bool {
        self.kind == TermKind::String
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

fn classify(value: &str) -> TermKind {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return TermKind::String;
    }
    if value.parse::<i64>().is_ok() {
        return TermKind::Long;
    }
    if value.parse::<f64>().is_ok() && value.contains('.') {
        return TermKind::Float;
    }
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return TermKind::Date;
    }
    TermKind::Identifier
}
