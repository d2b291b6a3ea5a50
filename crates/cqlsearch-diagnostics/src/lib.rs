//! Error handling for the CQL query compiler

mod error;

pub use error::{CqlError, Result};
