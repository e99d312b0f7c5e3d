use jsonbatch::core::builder::JsonBuilder;
use jsonbatch::core::errors::BatchError;
use jsonbatch::core::functions::{AggregateFunction, FunctionRegistry};
use jsonbatch::core::path::PathEvaluator;
use serde_json::{Value, json};
use std::sync::Arc;

fn builder() -> JsonBuilder {
    JsonBuilder::standard()
}

#[test]
fn test_resolve_is_identity_without_expressions() {
    let template = json!({
        "zebra": 1,
        "alpha": {"nested": [true, null, 2.5, "plain text"]},
        "mike": ["a", {"k": "v"}]
    });
    let resolved = builder().resolve(&template, &json!({})).unwrap();
    assert_eq!(resolved, template);
    // Key order from the template survives resolution.
    assert_eq!(
        serde_json::to_string(&resolved).unwrap(),
        serde_json::to_string(&template).unwrap()
    );
}

#[test]
fn test_type_fidelity() {
    let context = json!({"responses": [{"body": [{"id": 7}]}]});
    let resolved = builder()
        .resolve(&json!("int $.responses[0].body[0].id"), &context)
        .unwrap();
    assert_eq!(resolved, json!(7));
    assert!(resolved.is_i64());
}

#[test]
fn test_no_match_yields_null() {
    let resolved = builder()
        .resolve(&json!("str $.missing.deep"), &json!({"responses": []}))
        .unwrap();
    assert_eq!(resolved, Value::Null);
}

#[test]
fn test_multiple_matches_with_scalar_tag_fail() {
    let context = json!({"ids": [1, 2, 3]});
    let err = builder()
        .resolve(&json!("int $.ids[*]"), &context)
        .unwrap_err();
    assert!(matches!(err, BatchError::MultipleMatch { count: 3, .. }));
}

#[test]
fn test_obj_tag_cardinality() {
    let context = json!({"items": [{"a": 1}, {"a": 2}]});
    let b = builder();

    // One match passes through verbatim.
    assert_eq!(
        b.resolve(&json!("obj $.items[0]"), &context).unwrap(),
        json!({"a": 1})
    );
    // Many matches become a sequence.
    assert_eq!(
        b.resolve(&json!("obj $.items[*].a"), &context).unwrap(),
        json!([1, 2])
    );
    // No match becomes Null.
    assert_eq!(b.resolve(&json!("obj $.nothing"), &context).unwrap(), Value::Null);
}

#[test]
fn test_inline_splicing() {
    let context = json!({"responses": [{"body": [{"id": 1}]}]});
    let resolved = builder()
        .resolve(
            &json!("https://example.com/posts/@{int $.responses[0].body[0].id}@"),
            &context,
        )
        .unwrap();
    assert_eq!(resolved, json!("https://example.com/posts/1"));
}

#[test]
fn test_inline_obj_is_unsupported() {
    let err = builder()
        .resolve(&json!("x=@{obj $.a}@"), &json!({"a": {}}))
        .unwrap_err();
    assert_eq!(err, BatchError::UnsupportedInlineType);
}

#[test]
fn test_inline_no_match_splices_null_text() {
    let resolved = builder()
        .resolve(&json!("value=@{str $.missing}@"), &json!({}))
        .unwrap();
    assert_eq!(resolved, json!("value=null"));
}

#[test]
fn test_escaped_marker_renders_literal_open() {
    let resolved = builder()
        .resolve(&json!("docs: use @@{tag path}@ syntax"), &json!({}))
        .unwrap();
    assert_eq!(resolved, json!("docs: use @{tag path}@ syntax"));
}

#[test]
fn test_unterminated_marker_is_a_template_error() {
    let err = builder().resolve(&json!("oops @{int $.a"), &json!({})).unwrap_err();
    assert!(matches!(err, BatchError::TemplateSyntax(_)));
}

#[test]
fn test_typed_literals() {
    let b = builder();
    let ctx = json!({"name": "world"});
    assert_eq!(
        b.resolve(&json!("str application/json, */*"), &ctx).unwrap(),
        json!("application/json, */*")
    );
    assert_eq!(
        b.resolve(&json!("str Hello @{str $.name}@!"), &ctx).unwrap(),
        json!("Hello world!")
    );
    assert_eq!(b.resolve(&json!("int 42"), &ctx).unwrap(), json!(42));
    assert_eq!(b.resolve(&json!("bool TRUE"), &ctx).unwrap(), json!(true));
    assert_eq!(
        b.resolve(&json!("obj {\"a\": [1]}"), &ctx).unwrap(),
        json!({"a": [1]})
    );
    assert!(matches!(
        b.resolve(&json!("obj not json"), &ctx).unwrap_err(),
        BatchError::TypeCoercion { .. }
    ));
}

#[test]
fn test_aggregates_over_wildcard_matches() {
    let context = json!({"responses": [
        {"body": {"price": 1}},
        {"body": {"price": 2}},
        {"body": {"price": 3}}
    ]});
    let b = builder();
    assert_eq!(
        b.resolve(&json!("int $.responses[*].body.price.sum()"), &context)
            .unwrap(),
        json!(6)
    );
    assert_eq!(
        b.resolve(&json!("double $.responses[*].body.price.avg()"), &context)
            .unwrap(),
        json!(2.0)
    );
}

#[test]
fn test_aggregate_over_definite_array_match() {
    // A definite path matching one array flattens into the aggregate input.
    let context = json!({"nums": [2, 4]});
    assert_eq!(
        builder()
            .resolve(&json!("double $.nums.avg()"), &context)
            .unwrap(),
        json!(3.0)
    );
}

#[test]
fn test_aggregate_empty_input() {
    let context = json!({"nums": []});
    let b = builder();
    assert_eq!(b.resolve(&json!("int $.nums.sum()"), &context).unwrap(), json!(0));
    assert_eq!(
        b.resolve(&json!("int $.nums.min()"), &context).unwrap_err(),
        BatchError::EmptyAggregate("min")
    );
    assert_eq!(
        b.resolve(&json!("int $.nums.max()"), &context).unwrap_err(),
        BatchError::EmptyAggregate("max")
    );
}

#[test]
fn test_aggregate_requires_numeric_tag() {
    let err = builder()
        .resolve(&json!("str $.nums.sum()"), &json!({"nums": [1]}))
        .unwrap_err();
    assert!(matches!(err, BatchError::TypeMismatch(_)));
}

#[test]
fn test_aggregate_rejects_non_numeric_matches() {
    let err = builder()
        .resolve(&json!("int $.words.sum()"), &json!({"words": ["a"]}))
        .unwrap_err();
    assert!(matches!(err, BatchError::TypeMismatch(_)));
}

#[test]
fn test_unknown_aggregate_function() {
    let err = builder()
        .resolve(&json!("int $.nums.median()"), &json!({"nums": [1]}))
        .unwrap_err();
    assert_eq!(err, BatchError::UnknownFunction("median".to_string()));
}

#[test]
fn test_bad_path_surfaces_path_syntax_error() {
    let err = builder()
        .resolve(&json!("int $.responses[?("), &json!({}))
        .unwrap_err();
    assert!(matches!(err, BatchError::PathSyntax { .. }));
}

#[test]
fn test_nested_error_aborts_whole_resolve() {
    let template = json!({
        "good": "int $.a",
        "bad": {"deep": ["int $.ids[*]"]}
    });
    let err = builder()
        .resolve(&template, &json!({"a": 1, "ids": [1, 2]}))
        .unwrap_err();
    assert!(matches!(err, BatchError::MultipleMatch { .. }));
}

#[test]
fn test_injected_evaluator_and_functions() {
    // A stub evaluator returning canned matches, plus a custom aggregate.
    struct Canned;
    impl PathEvaluator for Canned {
        fn evaluate(&self, _context: &Value, path: &str) -> Result<Vec<Value>, BatchError> {
            assert_eq!(path, "$.anything");
            Ok(vec![json!(10), json!(20)])
        }
    }
    #[derive(Debug)]
    struct Spread;
    impl AggregateFunction for Spread {
        fn name(&self) -> &'static str {
            "spread"
        }
        fn apply(&self, values: &[f64]) -> Result<f64, BatchError> {
            Ok(values.iter().copied().fold(f64::MIN, f64::max)
                - values.iter().copied().fold(f64::MAX, f64::min))
        }
    }

    let b = JsonBuilder::new(
        FunctionRegistry::new(vec![Arc::new(Spread)]),
        Arc::new(Canned),
    );
    assert_eq!(
        b.resolve(&json!("int $.anything.spread()"), &json!({})).unwrap(),
        json!(10)
    );
}
