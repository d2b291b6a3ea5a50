//! Sort renderer
//!
//! Renders the sort expression into the `sort` array of the search
//! source. Arguments arrive in source order with each key's modifiers
//! directly ahead of it; a key consumes the pending modifiers.

use serde_json::{Map, Value, json};

use super::single;
use crate::expr::{Expression, Modifier, Name, Node, Operator};
use cqlsearch_diagnostics::{CqlError, Result};

/// Single-use renderer for the sort expression
#[derive(Debug, Default)]
pub struct SortRenderer;

impl SortRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(self, expr: &Expression) -> Result<Value> {
        if expr.op() != Operator::Sort {
            return Err(CqlError::render("sort", expr.op()));
        }
        let mut keys = Vec::new();
        let mut pending: Vec<&Modifier> = Vec::new();
        for arg in expr.args() {
            match arg {
                Node::Modifier(modifier) => pending.push(modifier),
                Node::Name(name) => keys.push(sort_key(name, &mut pending)),
                _ => {}
            }
        }
        Ok(Value::Array(keys))
    }
}

fn sort_key(name: &Name, modifiers: &mut Vec<&Modifier>) -> Value {
    let mut options = Map::new();
    for modifier in modifiers.drain(..).rev() {
        match modifier.name() {
            "ascending" | "sort.ascending" => {
                options.insert("order".into(), json!("asc"));
            }
            "descending" | "sort.descending" => {
                options.insert("order".into(), json!("desc"));
            }
            other => {
                options.insert(other.to_string(), json!(modifier.term().unwrap_or("")));
            }
        }
    }
    // sorting must not fail on documents missing the key
    options.insert("unmapped_type".into(), json!("string"));
    options.insert("missing".into(), json!("_last"));
    single(name.name(), Value::Object(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descending_key() {
        let expr = Expression::new(
            Operator::Sort,
            vec![
                Node::Modifier(Modifier::new("descending", None)),
                Node::name("dc.date"),
            ],
        );
        let doc = SortRenderer::new().render(&expr).unwrap();
        assert_eq!(
            doc,
            json!([{
                "dc.date": {
                    "order": "desc",
                    "unmapped_type": "string",
                    "missing": "_last",
                }
            }])
        );
    }

    #[test]
    fn test_key_without_modifiers() {
        let expr = Expression::new(Operator::Sort, vec![Node::name("dc.title")]);
        let doc = SortRenderer::new().render(&expr).unwrap();
        assert_eq!(
            doc,
            json!([{
                "dc.title": {
                    "unmapped_type": "string",
                    "missing": "_last",
                }
            }])
        );
    }

    #[test]
    fn test_keys_keep_source_order() {
        let expr = Expression::new(
            Operator::Sort,
            vec![
                Node::Modifier(Modifier::new("ascending", None)),
                Node::name("dc.date"),
                Node::Modifier(Modifier::new("descending", None)),
                Node::name("dc.title"),
            ],
        );
        let doc = SortRenderer::new().render(&expr).unwrap();
        let keys = doc.as_array().unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].get("dc.date").is_some());
        assert!(keys[1].get("dc.title").is_some());
    }

    #[test]
    fn test_rejects_other_operators() {
        let expr = Expression::new(Operator::And, vec![Node::name("a")]);
        assert!(SortRenderer::new().render(&expr).is_err());
    }
}
