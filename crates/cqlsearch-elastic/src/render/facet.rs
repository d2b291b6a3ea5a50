//! Facet renderer
//!
//! Renders facet expressions into terms aggregations. Bucket sizes and
//! ordering come from textual specs:
//! - limit spec: comma-separated `field:size` entries; a bare number or
//!   a `*` entry sets the default size for unlisted fields
//! - sort spec: comma-separated keywords `recordCount`, `alphanumeric`,
//!   `ascending`, `descending`
//!
//! Fields named only in the limit spec still get an aggregation, so
//! clients can force facets without a facet clause in the query.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use super::single;
use crate::expr::{Expression, Node, Operator};
use cqlsearch_diagnostics::{CqlError, Result};

const DEFAULT_FACET_SIZE: u64 = 10;

/// Single-use renderer for facet aggregations
#[derive(Debug)]
pub struct FacetRenderer {
    limits: IndexMap<String, u64>,
    default_size: u64,
    order: String,
    direction: String,
}

impl FacetRenderer {
    pub fn new(limit_spec: Option<&str>, sort_spec: Option<&str>) -> Self {
        let mut limits = IndexMap::new();
        let mut default_size = DEFAULT_FACET_SIZE;
        for entry in limit_spec.unwrap_or_default().split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            match entry.split_once(':') {
                Some(("*", size)) => {
                    default_size = size.parse().unwrap_or(DEFAULT_FACET_SIZE);
                }
                Some((field, size)) => {
                    limits.insert(
                        field.to_string(),
                        size.parse().unwrap_or(DEFAULT_FACET_SIZE),
                    );
                }
                None => default_size = entry.parse().unwrap_or(default_size),
            }
        }
        let mut order = "_count";
        let mut direction = "desc";
        for entry in sort_spec.unwrap_or_default().split(',') {
            match entry.trim() {
                "recordCount" => order = "_count",
                "alphanumeric" => order = "_term",
                "ascending" => direction = "asc",
                "descending" => direction = "desc",
                _ => {}
            }
        }
        Self {
            limits,
            default_size,
            order: order.to_string(),
            direction: direction.to_string(),
        }
    }

    /// Render the aggregations document part
    pub fn render(self, facets: Option<&Expression>) -> Result<Value> {
        let mut aggs = Map::new();
        if let Some(expr) = facets {
            if expr.op() != Operator::TermsFacet {
                return Err(CqlError::render("facet", expr.op()));
            }
            for arg in expr.args() {
                let Some(facet) = arg.as_expression() else {
                    continue;
                };
                if let Some(Node::Name(name)) = facet.args().first() {
                    aggs.insert(name.name().to_string(), self.terms(name.name()));
                }
            }
        }
        for field in self.limits.keys() {
            if !aggs.contains_key(field) {
                aggs.insert(field.clone(), self.terms(field));
            }
        }
        Ok(Value::Object(aggs))
    }

    fn terms(&self, field: &str) -> Value {
        let size = self.limits.get(field).copied().unwrap_or(self.default_size);
        let size = if size > 0 { size } else { DEFAULT_FACET_SIZE };
        json!({
            "terms": {
                "field": field,
                "size": size,
                "order": single(self.order.clone(), json!(self.direction)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn facet(name: &str) -> Node {
        Node::Expression(Expression::new(
            Operator::TermsFacet,
            vec![Node::name(name)],
        ))
    }

    #[test]
    fn test_default_terms_aggregation() {
        let expr = Expression::new(Operator::TermsFacet, vec![facet("dc.subject")]);
        let doc = FacetRenderer::new(None, None).render(Some(&expr)).unwrap();
        assert_eq!(
            doc,
            json!({
                "dc.subject": {
                    "terms": {
                        "field": "dc.subject",
                        "size": 10,
                        "order": {"_count": "desc"},
                    }
                }
            })
        );
    }

    #[rstest]
    #[case("dc.subject:20", "dc.subject", 20)]
    #[case("other:5,dc.subject:20", "dc.subject", 20)]
    #[case("*:15", "dc.subject", 15)]
    #[case("15", "dc.subject", 15)]
    #[case("dc.subject:0", "dc.subject", 10)]
    fn test_limit_spec(#[case] spec: &str, #[case] field: &str, #[case] size: u64) {
        let expr = Expression::new(Operator::TermsFacet, vec![facet(field)]);
        let doc = FacetRenderer::new(Some(spec), None)
            .render(Some(&expr))
            .unwrap();
        assert_eq!(doc[field]["terms"]["size"], json!(size));
    }

    #[test]
    fn test_sort_spec() {
        let expr = Expression::new(Operator::TermsFacet, vec![facet("dc.subject")]);
        let doc = FacetRenderer::new(None, Some("alphanumeric,ascending"))
            .render(Some(&expr))
            .unwrap();
        assert_eq!(
            doc["dc.subject"]["terms"]["order"],
            json!({"_term": "asc"})
        );
    }

    #[test]
    fn test_limit_only_field_gets_aggregation() {
        let doc = FacetRenderer::new(Some("dc.format:5"), None)
            .render(None)
            .unwrap();
        assert_eq!(doc["dc.format"]["terms"]["size"], json!(5));
    }
}
