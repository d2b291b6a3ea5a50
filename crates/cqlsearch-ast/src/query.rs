//! CQL query structure nodes

use crate::{BooleanOperator, Comparator, SimpleName, Term};

/// A complete query with an optional sort specification
#[derive(Debug, Clone, PartialEq)]
pub struct SortedQuery {
    pub query: Query,
    pub sort_spec: Option<SortSpec>,
}

impl SortedQuery {
    /// Create a sorted query without sort keys
    pub fn new(query: Query) -> Self {
        Self {
            query,
            sort_spec: None,
        }
    }

    /// Attach a sort specification
    pub fn with_sort(mut self, sort_spec: SortSpec) -> Self {
        self.sort_spec = Some(sort_spec);
        self
    }
}

/// Sort specification: one or more sort keys in source order
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub specs: Vec<SingleSpec>,
}

/// A single sort key with its modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSpec {
    pub index: Index,
    pub modifiers: ModifierList,
}

impl SingleSpec {
    /// Create a sort key without modifiers
    pub fn new(index: Index) -> Self {
        Self {
            index,
            modifiers: Vec::new(),
        }
    }

    /// Add a sort modifier
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

/// A query body: prefix assignments plus the clause chain
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub prefixes: Vec<PrefixAssignment>,
    pub clause: Option<ScopedClause>,
}

impl Query {
    /// Create a query from a clause chain
    pub fn new(clause: ScopedClause) -> Self {
        Self {
            prefixes: Vec::new(),
            clause: Some(clause),
        }
    }
}

/// A prefix-to-URI assignment preceding the query body
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixAssignment {
    pub prefix: String,
    pub uri: String,
}

/// A left-recursive chain of boolean-connected clauses.
///
/// `a and b and c` parses as
/// `ScopedClause(ScopedClause(ScopedClause(a), b, and), c, and)`:
/// the nested clause is the left operand, the search clause the right one.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedClause {
    pub clause: Option<Box<ScopedClause>>,
    pub search: SearchClause,
    pub group: Option<BooleanGroup>,
}

impl ScopedClause {
    /// Create a chain of one search clause
    pub fn new(search: SearchClause) -> Self {
        Self {
            clause: None,
            search,
            group: None,
        }
    }

    /// Extend the chain with a connected search clause
    pub fn connect(self, operator: BooleanOperator, search: SearchClause) -> Self {
        Self {
            clause: Some(Box::new(self)),
            search,
            group: Some(BooleanGroup::new(operator)),
        }
    }
}

/// A single search clause: either a parenthesized sub-query or an
/// index/relation/term triple (with index and relation optional for
/// bare terms searching the global field)
#[derive(Debug, Clone, PartialEq)]
pub struct SearchClause {
    pub query: Option<Box<Query>>,
    pub term: Option<Term>,
    pub index: Option<Index>,
    pub relation: Option<Relation>,
}

impl SearchClause {
    /// A bare term clause
    pub fn term(term: Term) -> Self {
        Self {
            query: None,
            term: Some(term),
            index: None,
            relation: None,
        }
    }

    /// A fielded clause: `index relation term`
    pub fn fielded(index: Index, relation: Relation, term: Term) -> Self {
        Self {
            query: None,
            term: Some(term),
            index: Some(index),
            relation: Some(relation),
        }
    }

    /// A parenthesized sub-query clause
    pub fn subquery(query: Query) -> Self {
        Self {
            query: Some(Box::new(query)),
            term: None,
            index: None,
            relation: None,
        }
    }
}

/// The boolean connector between a clause chain and its search clause
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanGroup {
    pub operator: BooleanOperator,
    pub modifiers: ModifierList,
}

impl BooleanGroup {
    /// Create a boolean group without modifiers
    pub fn new(operator: BooleanOperator) -> Self {
        Self {
            operator,
            modifiers: Vec::new(),
        }
    }
}

/// The relation between an index and a term
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub comparator: Comparator,
    pub modifiers: ModifierList,
}

impl Relation {
    /// Create a relation without modifiers
    pub fn new(comparator: Comparator) -> Self {
        Self {
            comparator,
            modifiers: Vec::new(),
        }
    }

    /// Add a relation modifier
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

/// An ordered list of modifiers
pub type ModifierList = Vec<Modifier>;

/// A modifier attached to a relation, boolean group, or sort key
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub name: SimpleName,
    pub term: Option<Term>,
}

impl Modifier {
    /// Create a modifier without a term
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: SimpleName::new(name),
            term: None,
        }
    }

    /// Create a modifier carrying a term
    pub fn with_term(name: impl Into<String>, term: Term) -> Self {
        Self {
            name: SimpleName::new(name),
            term: Some(term),
        }
    }
}

/// An index reference consisting of a context and a name.
///
/// The context works like a namespace and is derived by splitting the raw
/// name at the first `.`; it defaults to the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub context: String,
    pub name: String,
}

impl Index {
    /// Create an index, splitting the context off the raw name
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.find('.') {
            Some(pos) if pos > 0 => Self {
                context: raw[..pos].to_string(),
                name: raw[pos + 1..].to_string(),
            },
            _ => Self {
                context: String::new(),
                name: raw,
            },
        }
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.context.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.context, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_context_split() {
        let index = Index::new("dc.date");
        assert_eq!(index.context, "dc");
        assert_eq!(index.name, "date");
        assert_eq!(index.to_string(), "dc.date");
    }

    #[test]
    fn test_index_without_context() {
        let index = Index::new("title");
        assert_eq!(index.context, "");
        assert_eq!(index.name, "title");
    }

    #[test]
    fn test_index_leading_dot() {
        let index = Index::new(".odd");
        assert_eq!(index.context, "");
        assert_eq!(index.name, ".odd");
    }

    #[test]
    fn test_clause_chain() {
        let chain = ScopedClause::new(SearchClause::term(Term::new("a")))
            .connect(BooleanOperator::And, SearchClause::term(Term::new("b")));
        assert!(chain.clause.is_some());
        assert_eq!(
            chain.group.as_ref().map(|g| g.operator),
            Some(BooleanOperator::And)
        );
    }
}
