//! CQL query compilation for Elasticsearch
//!
//! Umbrella crate re-exporting the workspace members:
//! - [`ast`]: the CQL query tree
//! - [`diagnostics`]: the shared error type
//! - [`elastic`]: translation, rendering and the query compiler
//!
//! ```
//! use cqlsearch::ast::{Query, ScopedClause, SearchClause, SortedQuery, Term};
//! use cqlsearch::elastic::QueryCompiler;
//!
//! let query = SortedQuery::new(Query::new(ScopedClause::new(SearchClause::term(
//!     Term::new("sunflower"),
//! ))));
//! let doc = QueryCompiler::new("cql.allIndexes")
//!     .unwrap()
//!     .compile(&query)
//!     .unwrap();
//! assert_eq!(doc["from"], 0);
//! ```

pub use cqlsearch_ast as ast;
pub use cqlsearch_diagnostics as diagnostics;
pub use cqlsearch_elastic as elastic;

pub use cqlsearch_diagnostics::{CqlError, Result};
pub use cqlsearch_elastic::{Boost, QueryCompiler};
