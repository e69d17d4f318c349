//! Query engine
//!
//! Turns one natural-language question into one analytic call

pub mod orchestrator;
pub mod result;

pub use orchestrator::QueryEngine;
pub use result::{ParsedQuery, QueryResponse, QueryResult};
