//! CQL abstract syntax tree definitions
//!
//! This crate defines the parsed form of a CQL (contextual query language)
//! query as consumed by the query compiler. The tree is produced by an
//! external parser and is immutable during translation; node kinds are
//! closed sum types so translation can match exhaustively instead of
//! relying on visitor double dispatch.

mod operator;
mod query;
mod term;

pub use operator::*;
pub use query::*;
pub use term::*;

/// A quoted or bare identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The identifier text
    pub value: String,
    /// Whether the identifier was quoted in the source
    pub quoted: bool,
}

impl Identifier {
    /// Create a bare identifier
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    /// Create a quoted identifier
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }
}

/// A simple unqualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleName {
    /// The name text
    pub name: String,
}

impl SimpleName {
    /// Create a new simple name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for SimpleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
