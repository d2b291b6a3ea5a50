//! One-shot query compiler
//!
//! [`QueryCompiler`] is configured with builder methods and consumed by
//! [`QueryCompiler::compile`], which runs translation and rendering and
//! assembles the search source document. Consuming the compiler makes
//! reuse across queries a type error, so model state from one
//! compilation can never leak into the next.

use serde_json::{Value, json};

use cqlsearch_ast as ast;
use cqlsearch_diagnostics::{CqlError, Result};

use crate::expr::{Expression, Node, Operator, Token};
use crate::model::QueryModel;
use crate::render::{self, FacetRenderer, FilterRenderer, QueryRenderer, SortRenderer};
use crate::translate::{FilterTranslator, QueryTranslator};

/// Field-value-factor boost wrapped around the main query
#[derive(Debug, Clone)]
pub struct Boost {
    field: String,
    modifier: Option<String>,
    factor: Option<f64>,
    mode: Option<String>,
}

impl Boost {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            modifier: None,
            factor: None,
            mode: None,
        }
    }

    /// The score modifier function, `log1p` when unset
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }

    /// The factor the field value is multiplied with, `1.0` when unset
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    /// How the boost combines with the query score, `multiply` when unset
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

/// Compiles one CQL query into an Elasticsearch search source document
#[derive(Debug)]
pub struct QueryCompiler {
    global_field: String,
    from: u64,
    size: u64,
    boost: Option<Boost>,
    facet_limit: Option<String>,
    facet_sort: Option<String>,
    filters: Vec<ast::SortedQuery>,
    model: QueryModel,
}

impl QueryCompiler {
    /// Create a compiler searching `global_field` for bare terms
    pub fn new(global_field: impl Into<String>) -> Result<Self> {
        let global_field = global_field.into();
        if global_field.trim().is_empty() {
            return Err(CqlError::config("global field must not be empty"));
        }
        Ok(Self {
            global_field,
            from: 0,
            size: 10,
            boost: None,
            facet_limit: None,
            facet_sort: None,
            filters: Vec::new(),
            model: QueryModel::new(),
        })
    }

    /// Set the result window
    pub fn with_window(mut self, from: u64, size: u64) -> Self {
        self.from = from;
        self.size = size;
        self
    }

    /// Wrap the compiled query in a field-value-factor boost
    pub fn with_boost(mut self, boost: Boost) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Set facet bucket limits and ordering, see [`FacetRenderer`]
    pub fn with_facet_settings(
        mut self,
        limit: Option<String>,
        sort: Option<String>,
    ) -> Self {
        self.facet_limit = limit;
        self.facet_sort = sort;
        self
    }

    /// Add an auxiliary CQL filter query. Auxiliary filters take the
    /// place of filters accumulated from the query itself; the rendered
    /// filter document subsumes those.
    pub fn with_filter(mut self, filter: ast::SortedQuery) -> Self {
        self.filters.push(filter);
        self
    }

    /// Require all of `values` to match on `field`
    pub fn with_and_filter<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.literal_filter(field, values, Operator::AndFilter)
    }

    /// Require any of `values` to match on `field`
    pub fn with_or_filter<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.literal_filter(field, values, Operator::OrFilter)
    }

    fn literal_filter<I, V>(mut self, field: &str, values: I, op: Operator) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            let pair = Expression::new(
                op,
                vec![
                    Node::name(field),
                    Node::Token(Token::from_str(&value.into())),
                ],
            );
            match op {
                Operator::OrFilter => {
                    self.model
                        .add_disjunctive_filter(field, Node::Expression(pair), op)
                }
                _ => self
                    .model
                    .add_conjunctive_filter(field, Node::Expression(pair), op),
            }
        }
        self
    }

    /// Compile the query into a search source document, consuming the
    /// compiler.
    pub fn compile(mut self, query: &ast::SortedQuery) -> Result<Value> {
        if self.size == 0 {
            return Err(CqlError::config("result window size must be positive"));
        }
        let expr = QueryTranslator::new(&self.global_field, &mut self.model).translate(query)?;
        log::debug!("translated query expression: {expr}");
        let mut doc = QueryRenderer::new().render(&expr)?;

        let mut aux = Vec::new();
        for filter in &self.filters {
            aux.push(FilterTranslator::new(&self.global_field, &self.model).translate(filter)?);
        }
        let filter = match aux.len() {
            0 => self.model_filter()?,
            1 => Some(aux.remove(0)),
            _ => Some(json!({"bool": {"must": aux}})),
        };
        if let Some(filter) = filter {
            log::debug!("wrapping query in filter: {filter}");
            doc = json!({"filtered": {"query": doc, "filter": filter}});
        }

        if let Some(boost) = &self.boost {
            doc = json!({
                "function_score": {
                    "field_value_factor": {
                        "field": boost.field,
                        "modifier": boost.modifier.as_deref().unwrap_or("log1p"),
                        "factor": boost.factor.unwrap_or(1.0),
                    },
                    "boost_mode": boost.mode.as_deref().unwrap_or("multiply"),
                    "query": doc,
                }
            });
        }

        let sort = self
            .model
            .sort()
            .map(|expr| SortRenderer::new().render(expr))
            .transpose()?;
        let aggregations = if self.model.has_facets() || self.facet_limit.is_some() {
            let facets = self.model.has_facets().then(|| self.model.facet_expression());
            Some(
                FacetRenderer::new(self.facet_limit.as_deref(), self.facet_sort.as_deref())
                    .render(facets.as_ref())?,
            )
        } else {
            None
        };
        Ok(render::assemble(doc, self.from, self.size, sort, aggregations))
    }

    fn model_filter(&self) -> Result<Option<Value>> {
        let Some(expr) = self.model.filter_expression() else {
            return Ok(None);
        };
        let rendered = FilterRenderer::new().render(&expr)?;
        if rendered.as_object().is_some_and(|map| map.is_empty()) {
            return Ok(None);
        }
        Ok(Some(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_global_field_is_rejected() {
        let err = QueryCompiler::new("  ").unwrap_err();
        assert!(matches!(err, CqlError::InvalidConfig { .. }));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        use cqlsearch_ast::{Query, ScopedClause, SearchClause, SortedQuery, Term};
        let query = SortedQuery::new(Query::new(ScopedClause::new(SearchClause::term(
            Term::new("cat"),
        ))));
        let err = QueryCompiler::new("cql.allIndexes")
            .unwrap()
            .with_window(0, 0)
            .compile(&query)
            .unwrap_err();
        assert!(matches!(err, CqlError::InvalidConfig { .. }));
    }
}
