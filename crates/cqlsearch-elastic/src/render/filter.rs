//! Filter renderer
//!
//! Renders filter expressions, both the filters accumulated in the
//! query model and auxiliary filter documents. Filters match verbatim
//! values, so text goes out unanalyzed as term and prefix filters.

use serde_json::{Map, Value, json};

use super::{field_of, single, value_of};
use crate::expr::{Expression, Node, Operator, Token};
use cqlsearch_diagnostics::{CqlError, Result};

/// Single-use renderer for filter expressions
#[derive(Debug, Default)]
pub struct FilterRenderer;

impl FilterRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a filter document part. An invisible expression renders
    /// as an empty object.
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
            Operator::Equals | Operator::TermFilter => self.term(args).map(Some),
            Operator::NotEquals => Ok(Some(json!({"not": self.term(args)?}))),
            Operator::All => self.collection(args, "and"),
            Operator::Any => self.collection(args, "or"),
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
            Operator::AndFilter => self.pairs(args, "must"),
            Operator::OrFilter => self.pairs(args, "should"),
            Operator::QueryFilter => self.query(args),
            Operator::Prox => self.proximity(args),
            op => Err(CqlError::render("elasticsearch filter", op)),
        }
    }

    /// A term filter, or a prefix filter for boundary-marked values
    fn term(&self, args: &[Node]) -> Result<Value> {
        let field = field_of(args)?;
        let token = args.get(1).and_then(Node::as_token);
        let value = args.get(1).map(value_of).unwrap_or_default();
        let key = if token.is_some_and(Token::is_boundary) {
            "prefix"
        } else {
            "term"
        };
        Ok(single(key, single(&field, json!(value))))
    }

    /// Quoted phrases expand into one term filter per word, connected
    /// with `and` or `or`; plain values fall back to a single term.
    fn collection(&self, args: &[Node], connector: &str) -> Result<Option<Value>> {
        if let Some(token) = args.get(1).and_then(Node::as_token) {
            if token.is_quoted() {
                let field = field_of(args)?;
                let terms: Vec<Value> = token
                    .phrase()
                    .iter()
                    .map(|word| json!({"term": single(&field, json!(word))}))
                    .collect();
                return Ok(Some(single(connector, Value::Array(terms))));
            }
        }
        self.term(args).map(Some)
    }

    fn range(&self, args: &[Node], bounds: impl FnOnce(String) -> Value) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let value = args.get(1).map(value_of).unwrap_or_default();
        Ok(Some(json!({"range": single(&field, bounds(value))})))
    }

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
        if args.len() == 1 {
            // a single filter clause needs no boolean wrapper
            return match &args[0] {
                Node::Expression(expr) => self.expression(expr),
                other => Ok(Some(json!(value_of(other)))),
            };
        }
        let mut rendered = Vec::new();
        for arg in args {
            if !arg.is_visible() {
                continue;
            }
            if let Node::Expression(expr) = arg {
                if let Some(clause) = self.expression(expr)? {
                    rendered.push(clause);
                }
            }
        }
        Ok(Some(json!({"bool": single(key, Value::Array(rendered))})))
    }

    /// Interleaved name/value pairs, one term filter per pair
    fn pairs(&self, args: &[Node], key: &str) -> Result<Option<Value>> {
        let mut rendered = Vec::new();
        for pair in args.chunks(2) {
            let [name, value] = pair else {
                continue;
            };
            if !name.is_visible() {
                continue;
            }
            rendered.push(json!({"term": single(name.to_string(), json!(value_of(value)))}));
        }
        Ok(Some(json!({"bool": single(key, Value::Array(rendered))})))
    }

    /// A full query embedded as a filter
    fn query(&self, args: &[Node]) -> Result<Option<Value>> {
        let inner = args
            .first()
            .and_then(Node::as_expression)
            .ok_or_else(|| CqlError::translate("query filter without an inner expression"))?;
        Ok(self.expression(inner)?.map(|v| json!({"query": v})))
    }

    fn proximity(&self, args: &[Node]) -> Result<Option<Value>> {
        let field = field_of(args)?;
        let value = args
            .get(1)
            .map(|arg| format!("{}~10", value_of(arg)))
            .unwrap_or_default();
        Ok(Some(json!({"field": single(&field, json!(value))})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eq(field: &str, value: &str) -> Expression {
        Expression::new(
            Operator::Equals,
            vec![Node::name(field), Node::token(value)],
        )
    }

    #[test]
    fn test_term_filter() {
        let doc = FilterRenderer::new()
            .render(&eq("dc.type", "electronic"))
            .unwrap();
        assert_eq!(doc, json!({"term": {"dc.type": "electronic"}}));
    }

    #[test]
    fn test_boundary_renders_prefix() {
        let doc = FilterRenderer::new()
            .render(&eq("dc.title", "^abc"))
            .unwrap();
        assert_eq!(doc, json!({"prefix": {"dc.title": "abc"}}));
    }

    #[test]
    fn test_not_equals_wraps_not() {
        let expr = Expression::new(
            Operator::NotEquals,
            vec![Node::name("dc.type"), Node::token("electronic")],
        );
        let doc = FilterRenderer::new().render(&expr).unwrap();
        assert_eq!(doc, json!({"not": {"term": {"dc.type": "electronic"}}}));
    }

    #[test]
    fn test_quoted_all_expands_phrase() {
        let expr = Expression::new(
            Operator::All,
            vec![Node::name("dc.subject"), Node::token("\"red green\"")],
        );
        let doc = FilterRenderer::new().render(&expr).unwrap();
        assert_eq!(
            doc,
            json!({
                "and": [
                    {"term": {"dc.subject": "red"}},
                    {"term": {"dc.subject": "green"}},
                ]
            })
        );
    }

    #[test]
    fn test_single_clause_skips_bool() {
        let expr = Expression::new(
            Operator::And,
            vec![Node::Expression(eq("dc.type", "electronic"))],
        );
        let doc = FilterRenderer::new().render(&expr).unwrap();
        assert_eq!(doc, json!({"term": {"dc.type": "electronic"}}));
    }

    #[test]
    fn test_flat_and_renders_must_array() {
        let expr = Expression::new(
            Operator::And,
            vec![
                Node::Expression(eq("a", "1")),
                Node::Expression(eq("b", "2")),
                Node::Expression(eq("c", "3")),
            ],
        );
        let doc = FilterRenderer::new().render(&expr).unwrap();
        assert_eq!(doc["bool"]["must"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_pair_stepping_filter() {
        let expr = Expression::new(
            Operator::OrFilter,
            vec![
                Node::name("taxonomy"),
                Node::token("a"),
                Node::name("taxonomy"),
                Node::token("b"),
            ],
        );
        let doc = FilterRenderer::new().render(&expr).unwrap();
        assert_eq!(
            doc,
            json!({
                "bool": {
                    "should": [
                        {"term": {"taxonomy": "a"}},
                        {"term": {"taxonomy": "b"}},
                    ]
                }
            })
        );
    }

    #[test]
    fn test_query_filter_embeds_expression() {
        let expr = Expression::new(
            Operator::QueryFilter,
            vec![Node::Expression(eq("dc.type", "electronic"))],
        );
        let doc = FilterRenderer::new().render(&expr).unwrap();
        assert_eq!(doc, json!({"query": {"term": {"dc.type": "electronic"}}}));
    }
}
