//! CQL to Elasticsearch query translation
//!
//! This crate compiles a parsed CQL query into an Elasticsearch search
//! source document. Translation happens in three stages:
//! - the translation engine walks the CQL tree and produces a target
//!   expression tree (operators, field names, typed literals), guided by
//!   a query model that reroutes reserved index contexts into filters,
//!   facets and options;
//! - four renderers turn expression trees into the main query, filter,
//!   sort and aggregation document parts;
//! - the source assembler merges the parts with pagination into the
//!   final document.
//!
//! A [`QueryCompiler`] is single-use: `compile` consumes it, so engine
//! and renderer state can never leak between queries.

pub mod compiler;
pub mod expr;
pub mod model;
pub mod render;
pub mod translate;

pub use compiler::{Boost, QueryCompiler};
pub use expr::{Expression, Modifier, Name, Node, Operator, Token, TokenType};
pub use model::{ContextClass, QueryModel};
pub use render::{FacetRenderer, FilterRenderer, QueryRenderer, SortRenderer};
pub use translate::{FilterTranslator, QueryTranslator};
