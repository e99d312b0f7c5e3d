// src/core/errors.rs

//! Defines the primary error type for the entire crate.

use thiserror::Error;

/// The main error enum, representing all possible failures while parsing,
/// resolving, or executing a batch template.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error("Invalid batch template: {0}")]
    TemplateSyntax(String),

    #[error("Request template {index} references response {referenced}, which is not available yet")]
    ForwardReference { index: usize, referenced: usize },

    #[error("Invalid path expression \"{path}\": {message}")]
    PathSyntax { path: String, message: String },

    #[error("Cannot coerce {value} to {target}")]
    TypeCoercion { target: &'static str, value: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Path \"{path}\" matched {count} values where exactly one was expected")]
    MultipleMatch { path: String, count: usize },

    #[error("Type tag \"obj\" is not allowed in an inline expression")]
    UnsupportedInlineType,

    #[error("Aggregate function \"{0}\" is undefined over an empty input")]
    EmptyAggregate(&'static str),

    #[error("Unknown aggregate function \"{0}\"")]
    UnknownFunction(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request dispatch failed: {0}")]
    Dispatch(String),

    #[error("JSON error: {0}")]
    Json(String),
}

// --- From trait implementations for easy error conversion ---

impl From<serde_json::Error> for BatchError {
    fn from(e: serde_json::Error) -> Self {
        BatchError::Json(e.to_string())
    }
}

impl From<reqwest::Error> for BatchError {
    fn from(e: reqwest::Error) -> Self {
        BatchError::Dispatch(e.to_string())
    }
}
