//! Module for reading reconciliation inputs
pub mod json;

pub use json::{read_json, JsonError};
