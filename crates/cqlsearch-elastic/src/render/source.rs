//! Search source assembly

use serde_json::{Map, Value, json};

/// Merge the rendered parts into the final search source document.
/// Empty sort arrays and empty aggregation objects are left out.
pub fn assemble(
    query: Value,
    from: u64,
    size: u64,
    sort: Option<Value>,
    aggregations: Option<Value>,
) -> Value {
    let mut doc = Map::new();
    doc.insert("from".into(), json!(from));
    doc.insert("size".into(), json!(size));
    doc.insert("query".into(), query);
    if let Some(sort) = sort {
        if sort.as_array().is_some_and(|keys| !keys.is_empty()) {
            doc.insert("sort".into(), sort);
        }
    }
    if let Some(aggregations) = aggregations {
        if aggregations.as_object().is_some_and(|aggs| !aggs.is_empty()) {
            doc.insert("aggregations".into(), aggregations);
        }
    }
    Value::Object(doc)
}
