// src/core/path.rs

//! The path-query capability boundary.
//!
//! The resolver never evaluates paths itself; it is handed a
//! `PathEvaluator` at construction so tests can substitute a stub returning
//! canned matches.

use crate::core::errors::BatchError;
use serde_json::Value;

/// Evaluates a path expression against a context value, returning zero, one,
/// or many matches. Implementations must be stateless and reentrant.
pub trait PathEvaluator: Send + Sync {
    fn evaluate(&self, context: &Value, path: &str) -> Result<Vec<Value>, BatchError>;
}

/// The default evaluator, backed by `jsonpath_lib`. Supports the full
/// JSONPath dialect of that crate: filters, indices, wildcards, slices.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathEvaluator;

impl PathEvaluator for JsonPathEvaluator {
    fn evaluate(&self, context: &Value, path: &str) -> Result<Vec<Value>, BatchError> {
        // Normalize a bare "." or a leading "." to the "$" root form.
        let normalized = if path == "." {
            "$".to_string()
        } else if path.starts_with('.') {
            format!("${path}")
        } else {
            path.to_string()
        };

        jsonpath_lib::select(context, &normalized)
            .map(|matches| matches.into_iter().cloned().collect())
            .map_err(|e| BatchError::PathSyntax {
                path: path.to_string(),
                message: e.to_string().replace('\n', " "),
            })
    }
}
