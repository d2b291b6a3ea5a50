//! Renderers turning expression trees into document parts
//!
//! Each renderer builds [`serde_json::Value`] trees, so the output is
//! well-formed by construction and nesting depth follows the expression
//! tree instead of manual brace bookkeeping.

pub mod facet;
pub mod filter;
pub mod query;
pub mod sort;
pub mod source;

pub use facet::FacetRenderer;
pub use filter::FilterRenderer;
pub use query::{KEYWORD_SUFFIX, QueryRenderer};
pub use sort::SortRenderer;
pub use source::assemble;

use serde_json::{Map, Value};

use crate::expr::{Node, Token, TokenValue};
use cqlsearch_diagnostics::{CqlError, Result};

/// A one-entry JSON object, for keys only known at runtime
pub(crate) fn single(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

/// The field name operand of a binary expression
pub(crate) fn field_of(args: &[Node]) -> Result<String> {
    args.first()
        .map(ToString::to_string)
        .ok_or_else(|| CqlError::translate("expression without a field operand"))
}

/// The unquoted text of a value operand
pub(crate) fn value_of(node: &Node) -> String {
    match node.as_token() {
        Some(token) => token.lexeme(),
        None => node.to_string(),
    }
}

/// A token as a JSON scalar, keeping numeric and boolean types
pub(crate) fn scalar(token: &Token) -> Value {
    match token.value() {
        TokenValue::Bool(b) => Value::Bool(*b),
        TokenValue::Int(i) => Value::from(*i),
        TokenValue::Float(f) => Value::from(*f),
        TokenValue::DateTime { .. } | TokenValue::Str(_) => Value::String(token.lexeme()),
    }
}
