//! Context classification and the per-query accumulation model

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::expr::{Expression, Name, Node, Operator, TokenType};

/// Reserved index context routing clauses into facet accumulation
pub const FACET_CONTEXT: &str = "facet";
/// Reserved index context routing clauses into filter accumulation
pub const FILTER_CONTEXT: &str = "filter";
/// Reserved index context routing clauses into option accumulation
pub const OPTION_CONTEXT: &str = "option";

/// Where a search clause contributes, derived from its index context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextClass {
    /// Ordinary clause, part of the main query
    Main,
    Facet,
    Filter,
    Option,
}

/// Classify an index context string. Exact matches against the three
/// reserved names; anything else belongs to the main query.
pub fn classify(context: &str) -> ContextClass {
    match context {
        FACET_CONTEXT => ContextClass::Facet,
        FILTER_CONTEXT => ContextClass::Filter,
        OPTION_CONTEXT => ContextClass::Option,
        _ => ContextClass::Main,
    }
}

/// Whether clauses of this context render into the main query
pub fn visibility(context: &str) -> bool {
    classify(context) == ContextClass::Main
}

static FIELD_TYPES: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    HashMap::from([
        ("datetime", TokenType::DateTime),
        ("int", TokenType::Int),
        ("long", TokenType::Int),
        ("float", TokenType::Float),
    ])
});

/// Literal type hint for a field name. Defaults to string.
pub fn field_type(name: &str) -> TokenType {
    FIELD_TYPES
        .get(name)
        .copied()
        .unwrap_or(TokenType::String)
}

/// Accumulates filters, facets and the sort specification while a query
/// is translated. One instance lives per compilation and is discarded
/// with it.
#[derive(Debug, Default)]
pub struct QueryModel {
    conjunctive_filters: IndexMap<String, Expression>,
    disjunctive_filters: IndexMap<String, Expression>,
    facets: IndexMap<String, Expression>,
    sort: Option<Expression>,
}

impl QueryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter value combined conjunctively with other filters
    pub fn add_conjunctive_filter(&mut self, name: &str, value: Node, op: Operator) {
        add_filter(&mut self.conjunctive_filters, name, value, op);
    }

    /// Add a filter value combined disjunctively with other filters
    pub fn add_disjunctive_filter(&mut self, name: &str, value: Node, op: Operator) {
        add_filter(&mut self.disjunctive_filters, name, value, op);
    }

    pub fn has_filter(&self) -> bool {
        !self.conjunctive_filters.is_empty() || !self.disjunctive_filters.is_empty()
    }

    /// The single filter expression for this query, or `None` when no
    /// filter terms accumulated.
    ///
    /// Conjunctive terms join with AND, disjunctive terms with OR, and
    /// when both exist the two halves join with OR. This combination is
    /// fixed; callers cannot choose a different boolean shape.
    pub fn filter_expression(&self) -> Option<Expression> {
        let conjunctive = joined(&self.conjunctive_filters, Operator::And);
        let disjunctive = joined(&self.disjunctive_filters, Operator::Or);
        match (conjunctive, disjunctive) {
            (Some(c), Some(d)) => Some(Expression::new(
                Operator::Or,
                vec![Node::Expression(c), Node::Expression(d)],
            )),
            (Some(c), None) => Some(c),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        }
    }

    pub fn has_facets(&self) -> bool {
        !self.facets.is_empty()
    }

    /// Record a terms facet on a field
    pub fn add_facet(&mut self, name: &str, _term: &str) {
        let facet = Expression::new(Operator::TermsFacet, vec![Node::name(name)]);
        self.facets.insert(name.to_string(), facet);
    }

    /// All recorded facets as one aggregate expression
    pub fn facet_expression(&self) -> Expression {
        let args = self
            .facets
            .values()
            .cloned()
            .map(Node::Expression)
            .collect();
        Expression::new(Operator::TermsFacet, args)
    }

    /// Set the sort expression from arguments in traversal order, which
    /// is the reverse of the desired left-to-right sort key order.
    pub fn set_sort(&mut self, mut nodes: Vec<Node>) {
        nodes.reverse();
        self.sort = Some(Expression::new(Operator::Sort, nodes));
    }

    pub fn sort(&self) -> Option<&Expression> {
        self.sort.as_ref()
    }
}

/// Wrap a bare value as `op(name, value)` and fold it into the filter
/// accumulated for this field, if any.
fn add_filter(filters: &mut IndexMap<String, Expression>, name: &str, value: Node, op: Operator) {
    let expression = match value {
        Node::Expression(expr) => expr,
        other => {
            let field = Name::new(name).with_kind(field_type(name));
            Expression::new(op, vec![Node::Name(field), other])
        }
    };
    match filters.shift_remove(name) {
        Some(existing) => {
            filters.insert(name.to_string(), existing.fold(Node::Expression(expression)));
        }
        None => {
            filters.insert(name.to_string(), expression);
        }
    }
}

fn joined(filters: &IndexMap<String, Expression>, op: Operator) -> Option<Expression> {
    if filters.is_empty() {
        return None;
    }
    let args = filters.values().cloned().map(Node::Expression).collect();
    Some(Expression::new(op, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Token;

    #[test]
    fn test_classify_reserved_contexts() {
        assert_eq!(classify("facet"), ContextClass::Facet);
        assert_eq!(classify("filter"), ContextClass::Filter);
        assert_eq!(classify("option"), ContextClass::Option);
        assert_eq!(classify("dc"), ContextClass::Main);
        assert_eq!(classify(""), ContextClass::Main);
    }

    #[test]
    fn test_field_types() {
        assert_eq!(field_type("datetime"), TokenType::DateTime);
        assert_eq!(field_type("long"), TokenType::Int);
        assert_eq!(field_type("title"), TokenType::String);
    }

    #[test]
    fn test_no_filter_expression_when_empty() {
        let model = QueryModel::new();
        assert!(!model.has_filter());
        assert!(model.filter_expression().is_none());
    }

    #[test]
    fn test_conjunctive_only_joins_with_and() {
        let mut model = QueryModel::new();
        model.add_conjunctive_filter("type", Node::Token(Token::from_str("a")), Operator::Equals);
        model.add_conjunctive_filter("date", Node::Token(Token::from_str("b")), Operator::Equals);
        let expr = model.filter_expression().unwrap();
        assert_eq!(expr.op(), Operator::And);
        assert_eq!(expr.args().len(), 2);
    }

    #[test]
    fn test_mixed_filters_join_with_or() {
        let mut model = QueryModel::new();
        model.add_conjunctive_filter("type", Node::Token(Token::from_str("a")), Operator::Equals);
        model.add_disjunctive_filter("date", Node::Token(Token::from_str("b")), Operator::Equals);
        let expr = model.filter_expression().unwrap();
        assert_eq!(expr.op(), Operator::Or);
        assert_eq!(expr.args().len(), 2);
    }

    #[test]
    fn test_same_field_folds() {
        let mut model = QueryModel::new();
        model.add_conjunctive_filter("type", Node::Token(Token::from_str("a")), Operator::Equals);
        model.add_conjunctive_filter("type", Node::Token(Token::from_str("b")), Operator::Equals);
        let expr = model.filter_expression().unwrap();
        // one field entry holding the folded argument list
        assert_eq!(expr.args().len(), 1);
        let inner = expr.args()[0].as_expression().unwrap();
        assert_eq!(inner.args().len(), 4);
    }

    #[test]
    fn test_sort_reverses_traversal_order() {
        let mut model = QueryModel::new();
        model.set_sort(vec![
            Node::name("date"),
            Node::Modifier(crate::expr::Modifier::new("descending", None)),
        ]);
        let sort = model.sort().unwrap();
        assert_eq!(sort.op(), Operator::Sort);
        assert!(matches!(sort.args()[0], Node::Modifier(_)));
        assert!(matches!(sort.args()[1], Node::Name(_)));
    }
}
