//! Expression translation engine
//!
//! Walks the CQL tree depth-first (left clause chain before search
//! clause before connector) and builds the target expression tree. The
//! original stack machine is expressed as recursive return values: each
//! function returns the node it produces and the binary fold is plain
//! function composition, so stack underflow cannot occur. The only
//! arity failure left is a boolean connector without a left operand.

use chrono::{DateTime, Utc};
use cqlsearch_ast as ast;
use cqlsearch_diagnostics::{CqlError, Result};
use serde_json::{Value, json};

use crate::expr::{Expression, Modifier, Name, Node, Operator, Token, TokenType};
use crate::model::{self, ContextClass, QueryModel};
use crate::render::FilterRenderer;

/// Translate a CQL boolean operator into a target operator
pub(crate) fn boolean_operator(op: ast::BooleanOperator) -> Operator {
    match op {
        ast::BooleanOperator::And => Operator::And,
        ast::BooleanOperator::Or => Operator::Or,
        ast::BooleanOperator::Not => Operator::AndNot,
        ast::BooleanOperator::Prox => Operator::Prox,
    }
}

/// Translate a CQL comparator into a target operator
pub(crate) fn comparator_operator(op: ast::Comparator) -> Operator {
    match op {
        ast::Comparator::Equals => Operator::Equals,
        ast::Comparator::NotEquals => Operator::NotEquals,
        ast::Comparator::Greater => Operator::RangeGreaterThan,
        ast::Comparator::GreaterEquals => Operator::RangeGreaterOrEqual,
        ast::Comparator::Less => Operator::RangeLessThan,
        ast::Comparator::LessEquals => Operator::RangeLessOrEquals,
        ast::Comparator::Within => Operator::RangeWithin,
        ast::Comparator::Adj => Operator::Phrase,
        ast::Comparator::All => Operator::All,
        ast::Comparator::Any => Operator::Any,
    }
}

/// Convert a term literal into a typed token
fn term_token(term: &ast::Term) -> Result<Token> {
    let value = term.value();
    if term.is_long() {
        let n = value
            .parse::<i64>()
            .map_err(|_| CqlError::translate(format!("invalid integer term: {value}")))?;
        return Ok(Token::from_int(n));
    }
    if term.is_float() {
        let f = value
            .parse::<f64>()
            .map_err(|_| CqlError::translate(format!("invalid float term: {value}")))?;
        return Ok(Token::from_float(f));
    }
    if term.is_date() {
        let dt = DateTime::parse_from_rfc3339(value)
            .map_err(|_| CqlError::translate(format!("invalid date term: {value}")))?;
        return Ok(Token::from_datetime(dt.with_timezone(&Utc)));
    }
    Ok(Token::from_str(value))
}

/// Like [`term_token`], but strips wildcards from textual terms; filter
/// values are matched verbatim.
fn term_without_wildcard(term: &ast::Term) -> Result<Token> {
    if term.is_string() || term.is_identifier() {
        Ok(Token::from_str(&term.value().replace('*', "")))
    } else {
        term_token(term)
    }
}

/// Build a field name node from an index, deriving visibility and the
/// literal type hint from the qualified name
fn index_name(index: &ast::Index) -> Name {
    let qualified = index.to_string();
    let kind = model::field_type(&qualified);
    Name::new(qualified)
        .with_visibility(model::visibility(&index.context))
        .with_kind(kind)
}

/// Shared traversal core. When a model is attached, reserved-context
/// clauses update it as a side effect of translation.
struct Walker<'a> {
    global_field: &'a str,
    model: Option<&'a mut QueryModel>,
}

impl Walker<'_> {
    fn query(&mut self, node: &ast::Query) -> Result<Node> {
        // prefix assignments carry no searchable content
        let clause = node
            .clause
            .as_ref()
            .ok_or_else(|| CqlError::translate("empty query"))?;
        self.scoped(clause)
    }

    fn scoped(&mut self, node: &ast::ScopedClause) -> Result<Node> {
        let left = match &node.clause {
            Some(inner) => Some(self.scoped(inner)?),
            None => None,
        };
        let right = self.search(&node.search)?;
        self.accumulate_filter(node)?;
        match (&node.group, left) {
            (Some(group), Some(left)) => {
                Ok(self.combine_boolean(boolean_operator(group.operator), left, right))
            }
            (Some(group), None) => Err(CqlError::UnaryExpression {
                operator: group.operator.to_string(),
                operand: right.to_string(),
            }),
            (None, Some(_)) => Err(CqlError::translate("clause chain without boolean operator")),
            (None, None) => Ok(right),
        }
    }

    fn search(&mut self, node: &ast::SearchClause) -> Result<Node> {
        if let Some(query) = &node.query {
            // CQL query in parentheses
            return self.query(query);
        }
        let term = node.term.as_ref().map(term_token).transpose()?;
        let mut name = None;
        if let Some(index) = &node.index {
            if model::classify(&index.context) == ContextClass::Facet {
                if let (Some(model), Some(t)) = (self.model.as_deref_mut(), &node.term) {
                    model.add_facet(&index.name, t.value());
                }
            }
            name = Some(index_name(index));
        }
        if let Some(relation) = &node.relation {
            let op = comparator_operator(relation.comparator);
            if !relation.modifiers.is_empty() && name.is_some() {
                // relation modifiers replace the field with a dot-joined
                // modifier chain, most recent first
                let joined = relation
                    .modifiers
                    .iter()
                    .rev()
                    .map(|m| m.name.name.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                name = Some(Name::new(joined));
            }
            let name = name.ok_or_else(|| CqlError::translate("relation without an index"))?;
            let term = term.ok_or_else(|| CqlError::translate("relation without a term"))?;
            return Ok(Node::Expression(Expression::new(
                op,
                vec![Node::Name(name), Node::Token(term)],
            )));
        }
        if let Some(term) = term {
            return Ok(Node::Token(term));
        }
        if let Some(name) = name {
            return Ok(Node::Name(name));
        }
        Err(CqlError::translate("empty search clause"))
    }

    /// Filter-context clauses accumulate into the model instead of the
    /// main query. An operator-less filter clause is conjunctive.
    fn accumulate_filter(&mut self, node: &ast::ScopedClause) -> Result<()> {
        let search = &node.search;
        let (Some(index), Some(relation), Some(term)) =
            (&search.index, &search.relation, &search.term)
        else {
            return Ok(());
        };
        if model::classify(&index.context) != ContextClass::Filter {
            return Ok(());
        }
        let Some(model) = self.model.as_deref_mut() else {
            return Ok(());
        };
        let op = node
            .group
            .as_ref()
            .map(|g| g.operator)
            .unwrap_or(ast::BooleanOperator::And);
        let filter_op = comparator_operator(relation.comparator);
        let value = Node::Token(term_without_wildcard(term)?);
        match op {
            ast::BooleanOperator::And => model.add_conjunctive_filter(&index.name, value, filter_op),
            ast::BooleanOperator::Or => model.add_disjunctive_filter(&index.name, value, filter_op),
            _ => {}
        }
        Ok(())
    }

    /// Combine a boolean connector with its two operands, folding into
    /// an existing same-operator expression on the left. Bare string
    /// literals get the default field injected first.
    fn combine_boolean(&self, op: Operator, left: Node, right: Node) -> Node {
        let left = self.inject_default_field(left);
        let right = self.inject_default_field(right);
        match left {
            Node::Expression(expr)
                if expr.op() == op && expr.is_visible() && right.is_visible() =>
            {
                Node::Expression(expr.fold(right))
            }
            left => Node::Expression(Expression::new(op, vec![left, right])),
        }
    }

    /// Literal terms outside an explicit field comparison search the
    /// configured global field
    fn inject_default_field(&self, node: Node) -> Node {
        match node {
            Node::Token(token) if token.kind() == TokenType::String => Node::Expression(
                Expression::new(
                    Operator::All,
                    vec![Node::name(self.global_field), Node::Token(token)],
                ),
            ),
            other => other,
        }
    }
}

/// Translates one CQL query into the main query expression, updating
/// the query model with filters, facets and the sort specification.
/// Single-use: `translate` consumes the translator.
pub struct QueryTranslator<'a> {
    walker: Walker<'a>,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(global_field: &'a str, model: &'a mut QueryModel) -> Self {
        Self {
            walker: Walker {
                global_field,
                model: Some(model),
            },
        }
    }

    /// Translate a sorted query into the root query expression
    pub fn translate(mut self, node: &ast::SortedQuery) -> Result<Expression> {
        if let Some(spec) = &node.sort_spec {
            self.sort_spec(spec);
        }
        let root = self.walker.query(&node.query)?;
        match root {
            Node::Token(token) if token.lexeme() == "." => {
                Ok(Expression::new(Operator::MatchAll, Vec::new()))
            }
            Node::Token(token) => Ok(Expression::new(
                Operator::All,
                vec![Node::name(self.walker.global_field), Node::Token(token)],
            )),
            Node::Expression(expr) => Ok(expr),
            other => Err(CqlError::translate(format!(
                "unexpected root node: {other}"
            ))),
        }
    }

    fn sort_spec(&mut self, spec: &ast::SortSpec) {
        let mut nodes = Vec::new();
        // keys are pushed right-to-left; the model reverses them back
        // into source order with modifiers ahead of their key
        for single in spec.specs.iter().rev() {
            nodes.push(Node::Name(index_name(&single.index)));
            for modifier in &single.modifiers {
                nodes.push(Node::Modifier(Modifier::new(
                    modifier.name.name.clone(),
                    modifier.term.as_ref().map(|t| t.value().to_string()),
                )));
            }
        }
        if nodes.is_empty() {
            return;
        }
        if let Some(model) = self.walker.model.as_deref_mut() {
            model.set_sort(nodes);
        }
    }
}

/// Translates an auxiliary CQL filter query into a filter document.
/// A bare literal becomes a term filter on the global field; a full
/// expression is embedded as a query filter. Filters already present in
/// the model are merged in, so the result subsumes the model filter.
pub struct FilterTranslator<'a> {
    global_field: &'a str,
    model: &'a QueryModel,
}

impl<'a> FilterTranslator<'a> {
    pub fn new(global_field: &'a str, model: &'a QueryModel) -> Self {
        Self {
            global_field,
            model,
        }
    }

    /// Translate and render the filter document
    pub fn translate(self, node: &ast::SortedQuery) -> Result<Value> {
        let mut walker = Walker {
            global_field: self.global_field,
            model: None,
        };
        let root = walker.query(&node.query)?;
        let wrapped = match root {
            Node::Token(token) => Expression::new(
                Operator::TermFilter,
                vec![Node::name(self.global_field), Node::Token(token)],
            ),
            Node::Expression(expr) => {
                Expression::new(Operator::QueryFilter, vec![Node::Expression(expr)])
            }
            other => {
                return Err(CqlError::translate(format!(
                    "unexpected filter root node: {other}"
                )));
            }
        };
        let mut doc = match FilterRenderer::new().render(&wrapped)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        if let Some(expr) = self.model.filter_expression() {
            if let Value::Object(map) = FilterRenderer::new().render(&expr)? {
                if map.keys().any(|key| doc.contains_key(key)) {
                    // same clause kind on both sides, a flat merge would
                    // drop one of them
                    return Ok(json!({"and": [Value::Object(doc), Value::Object(map)]}));
                }
                doc.extend(map);
            }
        }
        Ok(Value::Object(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqlsearch_ast::{
        BooleanOperator, Comparator, Index, Query, Relation, ScopedClause, SearchClause,
        SortedQuery, Term,
    };

    fn sorted(clause: ScopedClause) -> SortedQuery {
        SortedQuery::new(Query::new(clause))
    }

    fn fielded(raw: &str, comparator: Comparator, term: &str) -> SearchClause {
        SearchClause::fielded(Index::new(raw), Relation::new(comparator), Term::new(term))
    }

    fn translate(query: &SortedQuery) -> Expression {
        let mut model = QueryModel::new();
        QueryTranslator::new("cql.allIndexes", &mut model)
            .translate(query)
            .unwrap()
    }

    #[test]
    fn test_bare_literal_wraps_in_all() {
        let query = sorted(ScopedClause::new(SearchClause::term(Term::new("cat"))));
        let expr = translate(&query);
        assert_eq!(expr.op(), Operator::All);
        assert_eq!(expr.args()[0].to_string(), "cql.allIndexes");
    }

    #[test]
    fn test_dot_becomes_match_all() {
        let query = sorted(ScopedClause::new(SearchClause::term(Term::new("."))));
        let expr = translate(&query);
        assert_eq!(expr.op(), Operator::MatchAll);
    }

    #[test]
    fn test_boolean_chain_flattens() {
        let query = sorted(
            ScopedClause::new(SearchClause::term(Term::new("a")))
                .connect(BooleanOperator::And, SearchClause::term(Term::new("b")))
                .connect(BooleanOperator::And, SearchClause::term(Term::new("c"))),
        );
        let expr = translate(&query);
        assert_eq!(expr.op(), Operator::And);
        assert_eq!(expr.args().len(), 3);
    }

    #[test]
    fn test_mixed_operators_nest() {
        let query = sorted(
            ScopedClause::new(SearchClause::term(Term::new("a")))
                .connect(BooleanOperator::And, SearchClause::term(Term::new("b")))
                .connect(BooleanOperator::Or, SearchClause::term(Term::new("c"))),
        );
        let expr = translate(&query);
        assert_eq!(expr.op(), Operator::Or);
        assert_eq!(expr.args().len(), 2);
    }

    #[test]
    fn test_filter_context_accumulates_and_hides() {
        let query = sorted(
            ScopedClause::new(fielded("filter.type", Comparator::Equals, "electronic*"))
                .connect(BooleanOperator::And, SearchClause::term(Term::new("cat"))),
        );
        let mut model = QueryModel::new();
        let expr = QueryTranslator::new("cql.allIndexes", &mut model)
            .translate(&query)
            .unwrap();
        assert!(model.has_filter());
        let filter = model.filter_expression().unwrap();
        // wildcard stripped from the filter value
        assert!(filter.to_string().contains("electronic"));
        assert!(!filter.to_string().contains('*'));
        // the filter clause itself is invisible in the main expression
        let hidden = expr.args()[0].as_expression().unwrap();
        assert!(!hidden.is_visible());
    }

    #[test]
    fn test_facet_context_accumulates() {
        let query = sorted(
            ScopedClause::new(fielded("facet.dc.subject", Comparator::Equals, "on"))
                .connect(BooleanOperator::And, SearchClause::term(Term::new("cat"))),
        );
        let mut model = QueryModel::new();
        QueryTranslator::new("cql.allIndexes", &mut model)
            .translate(&query)
            .unwrap();
        assert!(model.has_facets());
    }

    #[test]
    fn test_relation_modifier_chain() {
        let clause = SearchClause::fielded(
            Index::new("dc.title"),
            Relation::new(Comparator::Equals)
                .with_modifier(cqlsearch_ast::Modifier::new("phonetic"))
                .with_modifier(cqlsearch_ast::Modifier::new("fuzzy")),
            Term::new("smith"),
        );
        let expr = translate(&sorted(ScopedClause::new(clause)));
        assert_eq!(expr.args()[0].to_string(), "fuzzy.phonetic");
    }

    #[test]
    fn test_unary_boolean_is_rejected() {
        let query = sorted(ScopedClause {
            clause: None,
            search: SearchClause::term(Term::new("a")),
            group: Some(cqlsearch_ast::BooleanGroup::new(BooleanOperator::And)),
        });
        let mut model = QueryModel::new();
        let err = QueryTranslator::new("cql.allIndexes", &mut model)
            .translate(&query)
            .unwrap_err();
        assert!(matches!(err, CqlError::UnaryExpression { .. }));
    }

    #[test]
    fn test_date_term_records_year() {
        let query = sorted(ScopedClause::new(fielded(
            "dc.date",
            Comparator::Greater,
            "2013-06-01T00:00:00Z",
        )));
        let expr = translate(&query);
        let token = expr.args()[1].as_token().unwrap();
        assert_eq!(token.lexeme(), "2013");
    }
}
