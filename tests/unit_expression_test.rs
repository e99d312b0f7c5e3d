use jsonbatch::BatchError;
use jsonbatch::core::expression::{Classified, Expression, Segment, TypeTag, classify, scan_inline};

#[test]
fn test_classify_whole_value() {
    let classified = classify("int $.responses[0].body[0].id").unwrap();
    assert_eq!(
        classified,
        Classified::WholeValue(Expression {
            tag: TypeTag::Int,
            path: "$.responses[0].body[0].id".to_string(),
            aggregate: None,
        })
    );
}

#[test]
fn test_classify_whole_value_with_aggregate_suffix() {
    let classified = classify("double $.responses[*].body.price.sum()").unwrap();
    assert_eq!(
        classified,
        Classified::WholeValue(Expression {
            tag: TypeTag::Double,
            path: "$.responses[*].body.price".to_string(),
            aggregate: Some("sum".to_string()),
        })
    );
}

#[test]
fn test_classify_typed_literal() {
    let classified = classify("str application/json, */*").unwrap();
    assert_eq!(
        classified,
        Classified::TypedLiteral {
            tag: TypeTag::Str,
            raw: "application/json, */*".to_string(),
        }
    );
}

#[test]
fn test_classify_unknown_tag_is_literal() {
    assert_eq!(classify("integer $.a").unwrap(), Classified::Literal);
    assert_eq!(classify("hello world").unwrap(), Classified::Literal);
}

#[test]
fn test_classify_tag_without_space_is_literal() {
    assert_eq!(classify("int").unwrap(), Classified::Literal);
    assert_eq!(classify("intx$.a").unwrap(), Classified::Literal);
}

#[test]
fn test_classify_inline_segments() {
    let classified = classify("posts/@{int $.responses[0].body[0].id}@/comments").unwrap();
    assert_eq!(
        classified,
        Classified::Inline(vec![
            Segment::Text("posts/".to_string()),
            Segment::Expression(Expression {
                tag: TypeTag::Int,
                path: "$.responses[0].body[0].id".to_string(),
                aggregate: None,
            }),
            Segment::Text("/comments".to_string()),
        ])
    );
}

#[test]
fn test_scan_inline_no_markers() {
    assert_eq!(scan_inline("plain text").unwrap(), None);
}

#[test]
fn test_scan_inline_escaped_open_marker() {
    let segments = scan_inline("literal @@{not an expression}@ text").unwrap().unwrap();
    // The escape collapses to a literal "@{" and the trailing "}@" is plain text.
    assert_eq!(
        segments,
        vec![Segment::Text(
            "literal @{not an expression}@ text".to_string()
        )]
    );
}

#[test]
fn test_escape_binds_before_a_span_opener() {
    // "@@{" is always an escape, so a literal "@" cannot sit directly
    // against a span opener; the whole run parses as escaped text.
    let segments = scan_inline("x@@{int $.a}@").unwrap().unwrap();
    assert_eq!(segments, vec![Segment::Text("x@{int $.a}@".to_string())]);
}

#[test]
fn test_scan_inline_unterminated_marker() {
    let err = scan_inline("broken @{int $.a").unwrap_err();
    assert!(matches!(err, BatchError::TemplateSyntax(_)));
}

#[test]
fn test_scan_inline_nested_marker() {
    let err = scan_inline("bad @{int @{str $.a}@}@").unwrap_err();
    assert!(matches!(err, BatchError::TemplateSyntax(_)));
}

#[test]
fn test_inline_unknown_tag_is_an_error() {
    let err = scan_inline("@{integer $.a}@").unwrap_err();
    assert!(matches!(err, BatchError::TemplateSyntax(_)));
}

#[test]
fn test_inline_requires_rooted_path() {
    let err = scan_inline("@{int some literal}@").unwrap_err();
    assert!(matches!(err, BatchError::TemplateSyntax(_)));
}

#[test]
fn test_inline_aggregate_suffix() {
    let segments = scan_inline("total: @{long $.items[*].n.sum()}@").unwrap().unwrap();
    assert_eq!(
        segments[1],
        Segment::Expression(Expression {
            tag: TypeTag::Long,
            path: "$.items[*].n".to_string(),
            aggregate: Some("sum".to_string()),
        })
    );
}

#[test]
fn test_aggregate_suffix_not_split_when_malformed() {
    // A dangling "(" is not a call suffix; the path is passed through whole.
    let classified = classify("int $.a.sum(").unwrap();
    assert_eq!(
        classified,
        Classified::WholeValue(Expression {
            tag: TypeTag::Int,
            path: "$.a.sum(".to_string(),
            aggregate: None,
        })
    );
}
