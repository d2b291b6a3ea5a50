//! Main query renderer
//!
//! Renders the root expression into the `query` part of the search
//! source. Invisible sub-expressions render nothing, so queries made
//! entirely of filter clauses collapse to an empty object.

use serde_json::{Map, Value, json};

use super::{field_of, scalar, single, value_of};
use crate::expr::{Expression, Node, Operator, Token};
use cqlsearch_diagnostics::{CqlError, Result};

/// Field names with this suffix hold unanalyzed values and get exact
/// term queries instead of full-text matching
pub const KEYWORD_SUFFIX: &str = ".keyword";

/// Single-use renderer for the main query expression
#[derive(Debug, Default)]
pub struct QueryRenderer;

impl QueryRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the query document part. An invisible root expression
    /// renders as an empty object.
    pub fn render(self, expr: &Expression) -> Result<Value> {
        Ok(self
            .expression(expr)?
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    fn expression(&self, expr: &Expression) -> Result<Option<Value>> {
        if !expr.is_visible() {
            return Ok(None);
        }
        let args = expr.args();
        match expr.op() {
            Operator::MatchAll => Ok(Some(json!({"match_all": {}}))),
            Operator::Equals => self.equality(args, "and", false),
            Operator::NotEquals => Ok(self
                .equality(args, "and", false)?
                .map(|clause| json!({"bool": {"must_not": clause}}))),
            Operator::All => self.equality(args, "and", true),
            Operator::Any => self.equality(args, "or", true),
            Operator::Phrase => self.phrase(args),
            Operator::RangeGreaterThan => {
                self.range(args, |v| json!({"from": v, "include_lower": false}))
            }
            Operator::RangeGreaterOrEqual => {
                self.range(args, |v| json!({"from": v, "include_lower": true}))
            }
            Operator::RangeLessThan => {
                self.range(args, |v| json!({"to": v, "include_upper": false}))
            }
            Operator::RangeLessOrEquals => {
                self.range(args, |v| json!({"to": v, "include_upper": true}))
            }
            Operator::RangeWithin => self.within(args),
            Operator::And => self.boolean(args, "must"),
            Operator::Or => self.boolean(args, "should"),
            Operator::AndNot => self.boolean(args, "must_not"),
            Operator::Prox => self.proximity(args),
            op => Err(CqlError::render("elasticsearch query", op)),
        }
    }

    /// Equality-style matching. Keyword fields get an exact term query;
    /// everything else goes through `simple_query_string`, and quoted
    /// phrases additionally boost exact phrase hits.
    fn equality(
        &self,
        args: &[Node],
        default_operator: &str,
        unquote: bool,
    ) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let token = args.get(1).and_then(Node::as_token);
        let value = match token {
            Some(t) if unquote => t.lexeme(),
            _ => args.get(1).map(ToString::to_string).unwrap_or_default(),
        };
        if field.ends_with(KEYWORD_SUFFIX) {
            let exact = token.map(Token::lexeme).unwrap_or(value);
            return Ok(Some(json!({"term": single(&field, json!(exact))})));
        }
        let query = json!({
            "simple_query_string": {
                "query": value,
                "fields": [field.clone()],
                "analyze_wildcard": true,
                "default_operator": default_operator,
            }
        });
        match token {
            Some(t) if t.is_quoted() => {
                let exact = json!({
                    "match_phrase": single(&field, json!({"query": t.lexeme(), "boost": 2.0}))
                });
                Ok(Some(json!({"dis_max": {"queries": [query, exact]}})))
            }
            _ => Ok(Some(query)),
        }
    }

    fn phrase(&self, args: &[Node]) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let Some(token) = args.get(1).and_then(Node::as_token) else {
            return Ok(None);
        };
        let value = token.lexeme();
        let clause = if token.is_all() {
            json!({"match_all": {}})
        } else if token.is_wildcard() {
            json!({"wildcard": single(&field, json!(value))})
        } else if token.is_boundary() {
            json!({"prefix": single(&field, json!(value))})
        } else {
            json!({"match_phrase": single(&field, json!({"query": value, "slop": 0}))})
        };
        Ok(Some(clause))
    }

    fn range(&self, args: &[Node], bounds: impl FnOnce(String) -> Value) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let value = args.get(1).map(value_of).unwrap_or_default();
        Ok(Some(json!({"range": single(&field, bounds(value))})))
    }

    /// An inclusive range from a quoted two-term phrase
    fn within(&self, args: &[Node]) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let token = args
            .get(1)
            .and_then(Node::as_token)
            .ok_or_else(|| CqlError::translate("within relation without a term"))?;
        let bounds = token.phrase();
        if !token.is_quoted() || bounds.len() != 2 {
            return Err(CqlError::InvalidRange {
                value: token.to_string(),
            });
        }
        Ok(Some(json!({
            "range": single(&field, json!({
                "from": bounds[0],
                "to": bounds[1],
                "include_lower": true,
                "include_upper": true,
            }))
        })))
    }

    fn boolean(&self, args: &[Node], key: &str) -> Result<Option<Value>> {
        let mut rendered = Vec::new();
        for arg in args {
            if !arg.is_visible() {
                continue;
            }
            if let Some(clause) = self.node(arg)? {
                rendered.push(clause);
            }
        }
        let body = match rendered.len() {
            0 => Value::Object(Map::new()),
            1 => single(key, rendered.remove(0)),
            _ => single(key, Value::Array(rendered)),
        };
        Ok(Some(json!({"bool": body})))
    }

    fn proximity(&self, args: &[Node]) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let value = args
            .get(1)
            .map(|arg| format!("{}~10", value_of(arg)))
            .unwrap_or_default();
        Ok(Some(json!({"field": single(&field, json!(value))})))
    }

    fn node(&self, node: &Node) -> Result<Option<Value>> {
        match node {
            Node::Expression(expr) => self.expression(expr),
            Node::Token(token) => Ok(Some(scalar(token))),
            Node::Name(name) => Ok(Some(Value::String(name.name().to_string()))),
            Node::Modifier(_) => Ok(None),
        }
    }
}
