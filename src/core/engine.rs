// src/core/engine.rs

//! The batch executor.
//!
//! `BatchEngine::execute` walks the request templates strictly in order:
//! resolve against the current context, dispatch, append the resolved
//! request and its response to the context, repeat. After the last request
//! it resolves the response template against the complete context. Any
//! resolution or dispatch error aborts the batch immediately; the caller
//! gets exactly one error or one complete response, never partial output.
//!
//! Because a template at index `i` can only see responses `0..i`, forward
//! references with a literal index are rejected up front instead of
//! silently resolving to Null.

use crate::core::builder::JsonBuilder;
use crate::core::coerce;
use crate::core::dispatch::RequestDispatcher;
use crate::core::errors::BatchError;
use crate::core::expression::{self, Classified, Segment, TypeTag};
use crate::core::model::{
    BatchTemplate, ExecutionContext, Request, RequestTemplate, Response, ResponseTemplate,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

lazy_static! {
    /// Literal response indices in a path, e.g. `$.responses[2]`.
    static ref RESPONSE_INDEX: Regex = Regex::new(r"\$\.responses\[(\d+)\]").unwrap();
}

/// Drives one batch: a template resolver plus an injected dispatcher.
///
/// The engine holds no per-batch state, so a single instance may execute
/// any number of batches concurrently from separate tasks.
pub struct BatchEngine<D> {
    builder: JsonBuilder,
    dispatcher: D,
}

impl<D: RequestDispatcher> BatchEngine<D> {
    pub fn new(builder: JsonBuilder, dispatcher: D) -> Self {
        Self {
            builder,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Executes a batch template against an original request, returning the
    /// final composite response.
    pub async fn execute(
        &self,
        original: Request,
        template: &BatchTemplate,
    ) -> Result<Response, BatchError> {
        info!(requests = template.requests.len(), "executing batch");
        validate_reference_order(template)?;

        let mut context = ExecutionContext::new(original);
        for (index, request_template) in template.requests.iter().enumerate() {
            let context_value = context.to_value()?;
            let request = self.build_request(request_template, &context_value)?;
            debug!(index, method = %request.http_method, url = %request.url, "dispatching request");
            let response = self.dispatcher.dispatch(&request).await?;
            debug!(index, status = ?response.status, "request complete");
            context.push(request, response);
        }

        let context_value = context.to_value()?;
        let response = match &template.response {
            Some(response_template) => self.build_response(response_template, &context_value)?,
            // Without a response template the whole context is returned,
            // so the caller still sees every request and response.
            None => Response {
                status: Some(200),
                headers: None,
                body: Some(context_value),
            },
        };
        info!("batch complete");
        Ok(response)
    }

    fn build_request(
        &self,
        template: &RequestTemplate,
        context: &Value,
    ) -> Result<Request, BatchError> {
        let http_method = expect_string(
            self.builder
                .resolve(&Value::String(template.http_method.clone()), context)?,
            "http_method",
        )?;
        let url = expect_string(
            self.builder
                .resolve(&Value::String(template.url.clone()), context)?,
            "url",
        )?;
        let headers = template
            .headers
            .as_ref()
            .map(|h| self.builder.resolve(h, context))
            .transpose()?;
        let body = template
            .body
            .as_ref()
            .map(|b| self.builder.resolve(b, context))
            .transpose()?;
        Ok(Request {
            http_method,
            url,
            headers,
            body,
        })
    }

    fn build_response(
        &self,
        template: &ResponseTemplate,
        context: &Value,
    ) -> Result<Response, BatchError> {
        let status = match &template.status {
            Some(status_template) => {
                let resolved = self.builder.resolve(status_template, context)?;
                let number = coerce::coerce_value(&resolved, TypeTag::Int)?;
                match number.as_i64() {
                    Some(n) if (100..=599).contains(&n) => Some(n as u16),
                    _ => {
                        return Err(BatchError::TemplateSyntax(format!(
                            "response status must resolve to an HTTP status code, got {resolved}"
                        )));
                    }
                }
            }
            None => Some(200),
        };
        let headers = template
            .headers
            .as_ref()
            .map(|h| self.builder.resolve(h, context))
            .transpose()?;
        let body = template
            .body
            .as_ref()
            .map(|b| self.builder.resolve(b, context))
            .transpose()?;
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn expect_string(value: Value, field: &str) -> Result<String, BatchError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(coerce::format_json_number(&n)),
        other => Err(BatchError::TemplateSyntax(format!(
            "\"{field}\" must resolve to a string, got {other}"
        ))),
    }
}

/// Rejects request templates whose expressions reference their own response
/// or a later one by literal index. Wildcards and filters cannot be checked
/// statically and pass through.
fn validate_reference_order(template: &BatchTemplate) -> Result<(), BatchError> {
    for (index, request_template) in template.requests.iter().enumerate() {
        let mut paths = Vec::new();
        collect_paths(&Value::String(request_template.http_method.clone()), &mut paths)?;
        collect_paths(&Value::String(request_template.url.clone()), &mut paths)?;
        if let Some(headers) = &request_template.headers {
            collect_paths(headers, &mut paths)?;
        }
        if let Some(body) = &request_template.body {
            collect_paths(body, &mut paths)?;
        }
        for path in &paths {
            for capture in RESPONSE_INDEX.captures_iter(path) {
                let referenced: usize = capture[1]
                    .parse()
                    .map_err(|_| BatchError::TemplateSyntax(format!("bad index in \"{path}\"")))?;
                if referenced >= index {
                    return Err(BatchError::ForwardReference { index, referenced });
                }
            }
        }
    }
    Ok(())
}

/// Collects every expression path in a template tree.
fn collect_paths(value: &Value, paths: &mut Vec<String>) -> Result<(), BatchError> {
    match value {
        Value::String(leaf) => match expression::classify(leaf)? {
            Classified::WholeValue(expr) => paths.push(expr.path),
            Classified::Inline(segments) => {
                for segment in segments {
                    if let Segment::Expression(expr) = segment {
                        paths.push(expr.path);
                    }
                }
            }
            Classified::TypedLiteral { tag: TypeTag::Str, raw } => {
                if let Some(segments) = expression::scan_inline(&raw)? {
                    for segment in segments {
                        if let Segment::Expression(expr) = segment {
                            paths.push(expr.path);
                        }
                    }
                }
            }
            _ => {}
        },
        Value::Object(map) => {
            for child in map.values() {
                collect_paths(child, paths)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_paths(item, paths)?;
            }
        }
        _ => {}
    }
    Ok(())
}
