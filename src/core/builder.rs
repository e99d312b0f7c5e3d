// src/core/builder.rs

//! The template resolver.
//!
//! `JsonBuilder::resolve` recursively walks a template value tree and
//! resolves every string leaf through the expression pipeline: classify,
//! evaluate the path against the context, optionally aggregate, coerce.
//! Non-string leaves and expression-free strings pass through unchanged, so
//! resolving a template with no expressions is the identity transform.
//!
//! Resolution is pure and fail-fast: the first error at any leaf aborts the
//! whole call with no partial output.

use crate::core::coerce;
use crate::core::errors::BatchError;
use crate::core::expression::{self, Classified, Expression, Segment, TypeTag};
use crate::core::functions::FunctionRegistry;
use crate::core::path::{JsonPathEvaluator, PathEvaluator};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

/// Resolves templated JSON trees against an execution context.
///
/// Holds the aggregate function registry and the path evaluator, both
/// injected at construction. Stateless after construction, so one builder
/// may serve any number of concurrent batch executions.
pub struct JsonBuilder {
    functions: FunctionRegistry,
    evaluator: Arc<dyn PathEvaluator>,
}

impl JsonBuilder {
    pub fn new(functions: FunctionRegistry, evaluator: Arc<dyn PathEvaluator>) -> Self {
        Self {
            functions,
            evaluator,
        }
    }

    /// A builder with the standard aggregates and the `jsonpath_lib`-backed
    /// evaluator.
    pub fn standard() -> Self {
        Self::new(FunctionRegistry::standard(), Arc::new(JsonPathEvaluator))
    }

    /// Resolves a template value against a context value.
    pub fn resolve(&self, template: &Value, context: &Value) -> Result<Value, BatchError> {
        match template {
            Value::Object(map) => {
                let mut resolved = Map::with_capacity(map.len());
                for (key, child) in map {
                    resolved.insert(key.clone(), self.resolve(child, context)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item, context))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::String(leaf) => self.resolve_string(leaf, context),
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&self, leaf: &str, context: &Value) -> Result<Value, BatchError> {
        trace!(leaf, "resolving string leaf");
        match expression::classify(leaf)? {
            Classified::WholeValue(expr) => self.resolve_expression(&expr, context),
            Classified::TypedLiteral { tag, raw } => self.resolve_typed_literal(tag, &raw, context),
            Classified::Inline(segments) => self
                .splice_segments(&segments, context)
                .map(Value::String),
            Classified::Literal => Ok(Value::String(leaf.to_string())),
        }
    }

    /// Resolves one `<tag> <path>` expression to a typed value.
    fn resolve_expression(&self, expr: &Expression, context: &Value) -> Result<Value, BatchError> {
        if let Some(name) = &expr.aggregate {
            let function = self.functions.get(name)?;
            if !expr.tag.is_numeric() {
                return Err(BatchError::TypeMismatch(format!(
                    "aggregate \"{name}\" requires a numeric type tag, got \"{}\"",
                    expr.tag.name()
                )));
            }
            let matches = self.evaluator.evaluate(context, &expr.path)?;
            let numbers = coerce::numeric_matches(&matches)?;
            let reduced = function.apply(&numbers)?;
            return coerce::number_from_f64(reduced, expr.tag);
        }

        let matches = self.evaluator.evaluate(context, &expr.path)?;

        // `obj` passes matches through uncoerced at any cardinality.
        if expr.tag == TypeTag::Obj {
            let mut matches = matches;
            return Ok(match matches.len() {
                0 => Value::Null,
                1 => matches.remove(0),
                _ => Value::Array(matches),
            });
        }

        match matches.len() {
            // No match is not an error by itself; the leaf becomes Null.
            0 => Ok(Value::Null),
            1 => coerce::coerce_value(&matches[0], expr.tag),
            count => Err(BatchError::MultipleMatch {
                path: expr.path.clone(),
                count,
            }),
        }
    }

    /// Resolves a `<tag> <raw>` typed literal, where the raw text is coerced
    /// directly instead of being evaluated as a path.
    fn resolve_typed_literal(
        &self,
        tag: TypeTag,
        raw: &str,
        context: &Value,
    ) -> Result<Value, BatchError> {
        match tag {
            TypeTag::Str => self.resolve_raw_text(raw, context).map(Value::String),
            TypeTag::Int | TypeTag::Long | TypeTag::Double | TypeTag::Bool => {
                coerce::coerce_value(&Value::String(raw.to_string()), tag)
            }
            TypeTag::Obj => {
                serde_json::from_str(raw).map_err(|_| BatchError::TypeCoercion {
                    target: tag.name(),
                    value: raw.to_string(),
                })
            }
        }
    }

    /// Resolves inline expressions embedded in literal text, if any.
    fn resolve_raw_text(&self, text: &str, context: &Value) -> Result<String, BatchError> {
        match expression::scan_inline(text)? {
            Some(segments) => self.splice_segments(&segments, context),
            None => Ok(text.to_string()),
        }
    }

    fn splice_segments(
        &self,
        segments: &[Segment],
        context: &Value,
    ) -> Result<String, BatchError> {
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expression(expr) => {
                    // Inline results must be string-representable.
                    if expr.tag == TypeTag::Obj {
                        return Err(BatchError::UnsupportedInlineType);
                    }
                    let value = self.resolve_expression(expr, context)?;
                    out.push_str(&coerce::value_to_text(&value)?);
                }
            }
        }
        Ok(out)
    }
}
