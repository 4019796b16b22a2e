//! Query pipeline (C10): parses user search strings into an AST and lowers
//! them to wire syntax.

pub mod parser;

pub use crate::models::QueryNode;
pub use parser::{compile, parse, to_redis};
