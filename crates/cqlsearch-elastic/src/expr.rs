//! Target expression tree
//!
//! Translation produces trees of [`Node`]s: typed literal tokens, field
//! names, modifiers, and operator expressions. Renderers walk these trees
//! to emit document parts. Tokens classify themselves once at
//! construction (quoted, wildcard, boundary, match-all); renderers only
//! read the flags.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal types carried by tokens and field-name type hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    Bool,
    Int,
    Float,
    DateTime,
    String,
}

/// Operators of the target expression tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equals,
    NotEquals,
    All,
    Any,
    Phrase,
    RangeGreaterThan,
    RangeGreaterOrEqual,
    RangeLessThan,
    RangeLessOrEquals,
    RangeWithin,
    And,
    Or,
    AndNot,
    Prox,
    MatchAll,
    TermFilter,
    QueryFilter,
    AndFilter,
    OrFilter,
    TermsFacet,
    Sort,
}

impl Operator {
    /// Fixed operand count of the operator. Binary operators become
    /// n-ary through expression folding.
    pub const fn arity(&self) -> usize {
        match self {
            Self::MatchAll => 0,
            Self::QueryFilter => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::All => "ALL",
            Self::Any => "ANY",
            Self::Phrase => "PHRASE",
            Self::RangeGreaterThan => "RANGE_GREATER_THAN",
            Self::RangeGreaterOrEqual => "RANGE_GREATER_OR_EQUAL",
            Self::RangeLessThan => "RANGE_LESS_THAN",
            Self::RangeLessOrEquals => "RANGE_LESS_OR_EQUALS",
            Self::RangeWithin => "RANGE_WITHIN",
            Self::And => "AND",
            Self::Or => "OR",
            Self::AndNot => "ANDNOT",
            Self::Prox => "PROX",
            Self::MatchAll => "MATCH_ALL",
            Self::TermFilter => "TERM_FILTER",
            Self::QueryFilter => "QUERY_FILTER",
            Self::AndFilter => "AND_FILTER",
            Self::OrFilter => "OR_FILTER",
            Self::TermsFacet => "TERMS_FACET",
            Self::Sort => "SORT",
        };
        f.write_str(s)
    }
}

/// The typed value of a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A date-time plus its year; ranges and filters render the year only
    DateTime { datetime: DateTime<Utc>, year: i64 },
    Str(String),
}

/// A typed literal token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    value: TokenValue,
    /// Original text including quotes, when constructed from a quoted string
    raw: Option<String>,
    /// Whitespace-separated terms of a quoted phrase
    phrase: Vec<String>,
    quoted: bool,
    wildcard: bool,
    all: bool,
    boundary: bool,
}

impl Token {
    /// Create a string token, classifying it once.
    ///
    /// `true`/`yes`/`on` and `false`/`no`/`off` coerce to bool tokens.
    /// Surrounding double quotes are stripped and the phrase is split
    /// into terms; a leading `^` marks a boundary match and is removed.
    pub fn from_str(value: &str) -> Self {
        match value {
            "true" | "yes" | "on" => return Self::from_bool(true),
            "false" | "no" | "off" => return Self::from_bool(false),
            _ => {}
        }
        let mut raw = None;
        let mut phrase = Vec::new();
        let mut quoted = false;
        let mut text = value.to_string();
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            raw = Some(text.clone());
            text = text[1..text.len() - 1].replace("\\\"", "\"");
            phrase = phrase_terms(&text);
            quoted = true;
        }
        let wildcard = text.contains('*') || text.contains('?');
        let all = wildcard && text.chars().count() == 1;
        let boundary = text.starts_with('^');
        if boundary {
            text = text[1..].to_string();
        }
        Self {
            value: TokenValue::Str(text),
            raw,
            phrase,
            quoted,
            wildcard,
            all,
            boundary,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self::plain(TokenValue::Bool(value))
    }

    pub fn from_int(value: i64) -> Self {
        Self::plain(TokenValue::Int(value))
    }

    pub fn from_float(value: f64) -> Self {
        Self::plain(TokenValue::Float(value))
    }

    /// Create a date-time token. The year is recorded alongside so that
    /// date ranges keep rendering as plain year values.
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self::plain(TokenValue::DateTime {
            year: i64::from(value.year()),
            datetime: value,
        })
    }

    fn plain(value: TokenValue) -> Self {
        Self {
            value,
            raw: None,
            phrase: Vec::new(),
            quoted: false,
            wildcard: false,
            all: false,
            boundary: false,
        }
    }

    /// The literal type of this token
    pub fn kind(&self) -> TokenType {
        match self.value {
            TokenValue::Bool(_) => TokenType::Bool,
            TokenValue::Int(_) => TokenType::Int,
            TokenValue::Float(_) => TokenType::Float,
            TokenValue::DateTime { .. } => TokenType::DateTime,
            TokenValue::Str(_) => TokenType::String,
        }
    }

    /// The token text without surrounding quotes
    pub fn lexeme(&self) -> String {
        match &self.value {
            TokenValue::Bool(b) => b.to_string(),
            TokenValue::Int(i) => i.to_string(),
            TokenValue::Float(f) => f.to_string(),
            TokenValue::DateTime { year, .. } => year.to_string(),
            TokenValue::Str(s) => s.clone(),
        }
    }

    /// The typed value
    pub fn value(&self) -> &TokenValue {
        &self.value
    }

    /// Terms of a quoted phrase, split at construction
    pub fn phrase(&self) -> &[String] {
        &self.phrase
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// A single-character wildcard matching everything
    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn is_boundary(&self) -> bool {
        self.boundary
    }
}

impl fmt::Display for Token {
    /// Like [`Token::lexeme`], but quoted strings keep their quotes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&self.lexeme()),
        }
    }
}

/// A field name reference with a type hint and a visibility flag.
///
/// Names created from reserved index contexts are invisible: the clause
/// still participates in translation (so filters and facets accumulate)
/// but renders nothing into the main query.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    name: String,
    kind: TokenType,
    visible: bool,
}

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TokenType::String,
            visible: true,
        }
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_kind(mut self, kind: TokenType) -> Self {
        self.kind = kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TokenType {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named modifier with an optional term, attached to sort keys
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    name: String,
    term: Option<String>,
}

impl Modifier {
    pub fn new(name: impl Into<String>, term: Option<String>) -> Self {
        Self {
            name: name.into(),
            term,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An operator expression over an ordered argument list.
///
/// Binary operators grow n-ary through [`Expression::fold`]: appending
/// an argument to a same-operator expression concatenates argument lists
/// instead of nesting, so `a and b and c` stays one flat AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    op: Operator,
    args: Vec<Node>,
    visible: bool,
}

impl Expression {
    /// Create an expression. It is visible iff at least one name or
    /// sub-expression argument is visible; an argument-less expression
    /// is always visible.
    pub fn new(op: Operator, args: Vec<Node>) -> Self {
        let visible = Self::visibility(&args);
        Self { op, args, visible }
    }

    /// Append an argument, flattening same-operator expressions.
    /// Expressions carrying a different operator stay nested.
    pub fn fold(mut self, arg: Node) -> Self {
        match arg {
            Node::Expression(expr) if expr.op == self.op => self.args.extend(expr.args),
            other => self.args.push(other),
        }
        self.visible = Self::visibility(&self.args);
        self
    }

    fn visibility(args: &[Node]) -> bool {
        if args.is_empty() {
            return true;
        }
        args.iter().any(|arg| match arg {
            Node::Name(name) => name.is_visible(),
            Node::Expression(expr) => expr.is_visible(),
            _ => false,
        })
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn args(&self) -> &[Node] {
        &self.args
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.visible {
            return Ok(());
        }
        write!(f, "{}(", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// A node of the target expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Token(Token),
    Name(Name),
    Modifier(Modifier),
    Expression(Expression),
}

impl Node {
    /// Convenience constructor for string tokens
    pub fn token(value: &str) -> Self {
        Self::Token(Token::from_str(value))
    }

    /// Convenience constructor for field names
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(Name::new(name))
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Self::Token(_) | Self::Modifier(_) => true,
            Self::Name(name) => name.is_visible(),
            Self::Expression(expr) => expr.is_visible(),
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::Expression(expr) => Some(expr),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => write!(f, "{token}"),
            Self::Name(name) => write!(f, "{name}"),
            Self::Modifier(modifier) => write!(f, "{modifier}"),
            Self::Expression(expr) => write!(f, "{expr}"),
        }
    }
}

/// Split a phrase into whitespace-separated terms, dropping lone
/// punctuation
fn phrase_terms(s: &str) -> Vec<String> {
    s.split_whitespace()
        .filter(|t| {
            let mut chars = t.chars();
            !(matches!(chars.next(), Some(c) if !c.is_alphanumeric() && c != '_')
                && chars.next().is_none())
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_coercion() {
        assert_eq!(Token::from_str("yes").kind(), TokenType::Bool);
        assert_eq!(Token::from_str("off").lexeme(), "false");
    }

    #[test]
    fn test_quoted_token() {
        let token = Token::from_str("\"two words\"");
        assert!(token.is_quoted());
        assert_eq!(token.lexeme(), "two words");
        assert_eq!(token.to_string(), "\"two words\"");
        assert_eq!(token.phrase(), ["two", "words"]);
    }

    #[test]
    fn test_wildcard_classification() {
        let token = Token::from_str("book*");
        assert!(token.is_wildcard());
        assert!(!token.is_all());
        assert!(Token::from_str("*").is_all());
    }

    #[test]
    fn test_boundary_stripped() {
        let token = Token::from_str("^prefix");
        assert!(token.is_boundary());
        assert_eq!(token.lexeme(), "prefix");
    }

    #[test]
    fn test_datetime_renders_year() {
        let dt = "2013-12-05T10:00:00Z".parse().unwrap();
        let token = Token::from_datetime(dt);
        assert_eq!(token.kind(), TokenType::DateTime);
        assert_eq!(token.lexeme(), "2013");
    }

    #[test]
    fn test_expression_visibility() {
        let hidden = Expression::new(
            Operator::Equals,
            vec![
                Node::Name(Name::new("filter.type").with_visibility(false)),
                Node::token("electronic"),
            ],
        );
        assert!(!hidden.is_visible());

        let shown = Expression::new(
            Operator::Equals,
            vec![Node::name("dc.type"), Node::token("electronic")],
        );
        assert!(shown.is_visible());
    }

    #[test]
    fn test_fold_flattens_same_operator() {
        let ab = Expression::new(Operator::And, vec![Node::name("a"), Node::name("b")]);
        let folded = ab.fold(Node::name("c"));
        assert_eq!(folded.args().len(), 3);
        assert_eq!(folded.to_string(), "AND(a,b,c)");
    }

    #[test]
    fn test_fold_concatenates_expression_args() {
        let ab = Expression::new(Operator::And, vec![Node::name("a"), Node::name("b")]);
        let cd = Expression::new(Operator::And, vec![Node::name("c"), Node::name("d")]);
        let folded = ab.fold(Node::Expression(cd));
        assert_eq!(folded.args().len(), 4);
    }

    #[test]
    fn test_fold_keeps_other_operator_nested() {
        let ab = Expression::new(Operator::And, vec![Node::name("a"), Node::name("b")]);
        let cd = Expression::new(Operator::Or, vec![Node::name("c"), Node::name("d")]);
        let folded = ab.fold(Node::Expression(cd));
        assert_eq!(folded.args().len(), 3);
        assert_eq!(folded.to_string(), "AND(a,b,OR(c,d))");
    }

    #[test]
    fn test_operator_arity() {
        assert_eq!(Operator::MatchAll.arity(), 0);
        assert_eq!(Operator::QueryFilter.arity(), 1);
        assert_eq!(Operator::And.arity(), 2);
        assert_eq!(Operator::Equals.arity(), 2);
    }

    #[test]
    fn test_match_all_is_visible() {
        assert!(Expression::new(Operator::MatchAll, Vec::new()).is_visible());
    }
}
