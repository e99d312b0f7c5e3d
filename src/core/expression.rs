// src/core/expression.rs

//! The expression grammar embedded in template string leaves.
//!
//! A string leaf is classified into one of four forms:
//!
//! 1. **Whole-value expression**: the entire string is `<tag> <path>` where
//!    `<path>` starts with `$`. The leaf is replaced wholesale by the typed
//!    result, which may be of any JSON type.
//! 2. **Typed literal**: `<tag> <raw>` where `<raw>` does not start with
//!    `$`. The raw text is coerced directly to the tag.
//! 3. **Inline expressions**: literal text containing `@{<tag> <path>}@`
//!    spans, each resolved and string-spliced in place. The sequence `@@{`
//!    escapes a literal `@{` and does not open a span. The escape binds
//!    greedily: `@@{` is always an escape, so a literal `@` directly
//!    followed by a span cannot be written adjacently and must be separated
//!    from the `@{` opener.
//! 4. **Literal**: anything else, passed through unchanged.
//!
//! An optional aggregate is written as a trailing call suffix on the path,
//! e.g. `$.responses[*].body.price.sum()`. The suffix is stripped here and
//! resolved against the function registry; it is never handed to the path
//! evaluator.

use crate::core::errors::BatchError;

/// The declared target type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Str,
    Int,
    Long,
    Double,
    Bool,
    Obj,
}

impl TypeTag {
    /// Maps a leading keyword to its tag. Returns `None` for anything else,
    /// in which case the string is not a tagged expression.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "str" => Some(TypeTag::Str),
            "int" => Some(TypeTag::Int),
            "long" => Some(TypeTag::Long),
            "double" => Some(TypeTag::Double),
            "bool" => Some(TypeTag::Bool),
            "obj" => Some(TypeTag::Obj),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Str => "str",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Double => "double",
            TypeTag::Bool => "bool",
            TypeTag::Obj => "obj",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Long | TypeTag::Double)
    }
}

/// A parsed path expression: type tag, path text for the evaluator, and an
/// optional aggregate function name. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub tag: TypeTag,
    pub path: String,
    pub aggregate: Option<String>,
}

/// One piece of an inline-expression string: verbatim text or a span to be
/// resolved and spliced.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Expression(Expression),
}

/// The classification of a template string leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    WholeValue(Expression),
    TypedLiteral { tag: TypeTag, raw: String },
    Inline(Vec<Segment>),
    Literal,
}

/// Classifies a string leaf. The whole-value form is checked first since it
/// is cheap and unambiguous; only then is the string scanned for inline
/// markers.
pub fn classify(leaf: &str) -> Result<Classified, BatchError> {
    if let Some((word, rest)) = leaf.split_once(' ')
        && let Some(tag) = TypeTag::from_keyword(word)
    {
        let rest = rest.trim();
        if rest.starts_with('$') {
            let (path, aggregate) = split_aggregate(rest);
            return Ok(Classified::WholeValue(Expression {
                tag,
                path,
                aggregate,
            }));
        }
        return Ok(Classified::TypedLiteral {
            tag,
            raw: rest.to_string(),
        });
    }

    match scan_inline(leaf)? {
        Some(segments) => Ok(Classified::Inline(segments)),
        None => Ok(Classified::Literal),
    }
}

/// Splits a trailing `.name()` call suffix off a path. The suffix position
/// is reserved for aggregate function names; whether the name is actually
/// registered is checked at resolve time.
fn split_aggregate(path: &str) -> (String, Option<String>) {
    if let Some(stripped) = path.strip_suffix("()")
        && let Some(dot) = stripped.rfind('.')
    {
        let name = &stripped[dot + 1..];
        if !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return (stripped[..dot].to_string(), Some(name.to_string()));
        }
    }
    (path.to_string(), None)
}

/// Scans a literal for `@{ ... }@` spans. Returns `None` when the text
/// contains neither a span nor an escape, meaning the leaf passes through
/// untouched.
pub fn scan_inline(text: &str) -> Result<Option<Vec<Segment>>, BatchError> {
    if !text.contains("@{") {
        return Ok(None);
    }

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < text.len() {
        if text[i..].starts_with("@@{") {
            literal.push_str("@{");
            i += 3;
        } else if text[i..].starts_with("@{") {
            let body_start = i + 2;
            let Some(rel_end) = text[body_start..].find("}@") else {
                return Err(BatchError::TemplateSyntax(format!(
                    "unterminated inline expression in \"{text}\""
                )));
            };
            let body = &text[body_start..body_start + rel_end];
            if body.contains("@{") {
                return Err(BatchError::TemplateSyntax(format!(
                    "nested inline marker in \"{text}\""
                )));
            }
            if !literal.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Expression(parse_inline_body(body, text)?));
            i = body_start + rel_end + 2;
        } else {
            let ch = text[i..].chars().next().unwrap();
            literal.push(ch);
            i += ch.len_utf8();
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Text(literal));
    }
    Ok(Some(segments))
}

/// Parses the body of one inline span: `<tag> <path>`.
fn parse_inline_body(body: &str, leaf: &str) -> Result<Expression, BatchError> {
    let body = body.trim();
    let Some((word, rest)) = body.split_once(' ') else {
        return Err(BatchError::TemplateSyntax(format!(
            "malformed inline expression \"{body}\" in \"{leaf}\""
        )));
    };
    let Some(tag) = TypeTag::from_keyword(word) else {
        return Err(BatchError::TemplateSyntax(format!(
            "unknown type tag \"{word}\" in \"{leaf}\""
        )));
    };
    let rest = rest.trim();
    if !rest.starts_with('$') {
        return Err(BatchError::TemplateSyntax(format!(
            "inline expression must use a path starting with '$', got \"{rest}\""
        )));
    }
    let (path, aggregate) = split_aggregate(rest);
    Ok(Expression {
        tag,
        path,
        aggregate,
    })
}
