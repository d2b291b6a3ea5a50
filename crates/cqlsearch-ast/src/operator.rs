//! CQL boolean operators and relation comparators

use serde::{Deserialize, Serialize};

/// Boolean operators connecting scoped clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOperator {
    /// Conjunction
    And,
    /// Disjunction
    Or,
    /// Conjunction with negated right operand
    Not,
    /// Proximity
    Prox,
}

impl BooleanOperator {
    /// Parse from a CQL token
    pub fn from_token(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "prox" => Some(Self::Prox),
            _ => None,
        }
    }

    /// Get the CQL token
    pub const fn token(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Prox => "prox",
        }
    }
}

impl std::fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Comparators usable in a relation between an index and a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Equals,
    NotEquals,
    Greater,
    GreaterEquals,
    Less,
    LessEquals,
    Within,
    /// Adjacency (phrase search)
    Adj,
    /// All terms must match
    All,
    /// Any term may match
    Any,
}

impl Comparator {
    /// Parse from a CQL token
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Self::Equals),
            "<>" => Some(Self::NotEquals),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterEquals),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessEquals),
            "within" => Some(Self::Within),
            "adj" => Some(Self::Adj),
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Get the CQL token
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::Greater => ">",
            Self::GreaterEquals => ">=",
            Self::Less => "<",
            Self::LessEquals => "<=",
            Self::Within => "within",
            Self::Adj => "adj",
            Self::All => "all",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
