// src/core/model.rs

//! Wire-format data structures: batch templates, concrete requests and
//! responses, and the execution context that path expressions query.

use crate::core::errors::BatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fully-resolved HTTP request, ready to hand to a `RequestDispatcher`.
///
/// The original request that triggered the batch is also represented with
/// this type; in that case `http_method` and `url` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// A response as returned by a `RequestDispatcher`, or the final composite
/// response synthesized from the batch's response template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// One templated request in a batch. The method and URL are templated
/// strings; headers and body are arbitrary templated JSON trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTemplate {
    pub http_method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// The template for the final composite response, resolved once against the
/// complete execution context. A missing `status` defaults to 200.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseTemplate {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// A parsed batch template: an ordered list of request templates plus the
/// response template. Immutable once parsed; one template may be shared by
/// any number of concurrent batch executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTemplate {
    pub requests: Vec<RequestTemplate>,
    #[serde(default)]
    pub response: Option<ResponseTemplate>,
}

impl BatchTemplate {
    /// Parses a batch template from its JSON wire format.
    pub fn from_json(text: &str) -> Result<Self, BatchError> {
        serde_json::from_str(text).map_err(|e| BatchError::TemplateSyntax(e.to_string()))
    }
}

/// The growing record of one batch execution: the original request plus
/// every resolved request and collected response so far, in order.
///
/// Path expressions query its serialized form, so `$.responses[i]` always
/// refers to the i-th already-completed request's response.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub request: Request,
    pub requests: Vec<Request>,
    pub responses: Vec<Response>,
}

impl ExecutionContext {
    pub fn new(original: Request) -> Self {
        Self {
            request: original,
            requests: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Records one completed step. Append-only; earlier entries never move.
    pub fn push(&mut self, request: Request, response: Response) {
        self.requests.push(request);
        self.responses.push(response);
    }

    /// Produces the JSON value that path expressions are evaluated against.
    pub fn to_value(&self) -> Result<Value, BatchError> {
        Ok(serde_json::to_value(self)?)
    }
}
