//! Query-string filter grammar
//!
//! Listing endpoints accept `?where=` expressions such as
//! `(category=electronics&status=active)||limit=10&page=1`:
//!
//! - `||` separates alternatives (OR)
//! - `&` separates terms inside an alternative (AND)
//! - a term is `field=value` or a parenthesized sub-expression
//!
//! Parentheses nest one level deep. Groups with a single child collapse to
//! that child, so `a=1` parses to a bare equality rather than `AND[OR[a=1]]`.

use std::borrow::Cow;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::FilterParseError;

const MAX_GROUP_DEPTH: usize = 1;

/// A parsed filter tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field=value`; `field` may be a dotted path into nested objects
    Eq { field: String, value: String },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction, collapsing a single child
    pub fn and(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::And(filters)
        }
    }

    /// Disjunction, collapsing a single child
    pub fn or(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::Or(filters)
        }
    }

    /// Evaluate the filter against a JSON document.
    ///
    /// Values compare against the textual form of the stored field: strings
    /// verbatim, numbers and booleans via their JSON text. Missing fields,
    /// nulls, arrays and objects never match.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::Eq { field, value } => lookup(document, field)
                .and_then(scalar_text)
                .is_some_and(|text| text == value.as_str()),
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document)),
        }
    }
}

/// Serializes to the nested `{"OR": [...]}` / `{"AND": [...]}` / `{"field": "value"}` form
impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Filter::Eq { field, value } => map.serialize_entry(field, value)?,
            Filter::And(filters) => map.serialize_entry("AND", filters)?,
            Filter::Or(filters) => map.serialize_entry("OR", filters)?,
        }
        map.end()
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |value, segment| value.get(segment))
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Parse a filter expression
pub fn parse_filter(input: &str) -> Result<Filter, FilterParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FilterParseError::Empty);
    }
    parse_alternatives(input, 0)
}

fn parse_alternatives(input: &str, depth: usize) -> Result<Filter, FilterParseError> {
    let alternatives = split_top_level(input, "||")?
        .into_iter()
        .map(|part| parse_conjunction(part, depth))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Filter::or(alternatives))
}

fn parse_conjunction(input: &str, depth: usize) -> Result<Filter, FilterParseError> {
    let terms = split_top_level(input, "&")?
        .into_iter()
        .map(|term| parse_term(term, depth))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Filter::and(terms))
}

fn parse_term(term: &str, depth: usize) -> Result<Filter, FilterParseError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(FilterParseError::EmptyTerm);
    }

    if let Some(rest) = term.strip_prefix('(') {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| FilterParseError::MalformedGroup(term.to_string()))?;
        if depth >= MAX_GROUP_DEPTH {
            return Err(FilterParseError::NestedGroup);
        }
        if inner.trim().is_empty() {
            return Err(FilterParseError::EmptyTerm);
        }
        return parse_alternatives(inner, depth + 1);
    }

    let (field, value) = term
        .split_once('=')
        .ok_or_else(|| FilterParseError::MissingEquals(term.to_string()))?;
    let field = field.trim();
    if !is_valid_field(field) {
        return Err(FilterParseError::InvalidField(field.to_string()));
    }

    Ok(Filter::eq(field, value.trim()))
}

fn is_valid_field(field: &str) -> bool {
    !field.is_empty()
        && field.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

/// Split on `separator` wherever it occurs outside parentheses
fn split_top_level<'a>(input: &'a str, separator: &str) -> Result<Vec<&'a str>, FilterParseError> {
    let bytes = input.as_bytes();
    let sep = separator.as_bytes();
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(FilterParseError::UnbalancedParentheses)?;
            }
            _ if depth == 0 && bytes[i..].starts_with(sep) => {
                parts.push(&input[start..i]);
                i += sep.len();
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    if depth != 0 {
        return Err(FilterParseError::UnbalancedParentheses);
    }
    parts.push(&input[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_documented_example() {
        let filter = parse_filter("(category=electronics&status=active)||limit=10&page=1").unwrap();

        assert_eq!(
            filter,
            Filter::Or(vec![
                Filter::And(vec![
                    Filter::eq("category", "electronics"),
                    Filter::eq("status", "active"),
                ]),
                Filter::And(vec![Filter::eq("limit", "10"), Filter::eq("page", "1")]),
            ])
        );
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "OR": [
                    {"AND": [{"category": "electronics"}, {"status": "active"}]},
                    {"AND": [{"limit": "10"}, {"page": "1"}]}
                ]
            })
        );
    }

    #[test]
    fn single_term_collapses() {
        assert_eq!(
            parse_filter("status=active").unwrap(),
            Filter::eq("status", "active")
        );
        assert_eq!(
            parse_filter("(status=active)").unwrap(),
            Filter::eq("status", "active")
        );
    }

    #[test]
    fn plain_conjunction_and_disjunction() {
        assert_eq!(
            parse_filter("a=1&b=2").unwrap(),
            Filter::And(vec![Filter::eq("a", "1"), Filter::eq("b", "2")])
        );
        assert_eq!(
            parse_filter("a=1||b=2").unwrap(),
            Filter::Or(vec![Filter::eq("a", "1"), Filter::eq("b", "2")])
        );
    }

    #[test]
    fn group_can_hold_a_disjunction() {
        assert_eq!(
            parse_filter("(status=PENDING||status=PROCESSING)&paymentMethod=cod").unwrap(),
            Filter::And(vec![
                Filter::Or(vec![
                    Filter::eq("status", "PENDING"),
                    Filter::eq("status", "PROCESSING"),
                ]),
                Filter::eq("paymentMethod", "cod"),
            ])
        );
    }

    #[test]
    fn trims_whitespace_and_keeps_empty_values() {
        assert_eq!(
            parse_filter("  name = Shirt  &  note= ").unwrap(),
            Filter::And(vec![Filter::eq("name", "Shirt"), Filter::eq("note", "")])
        );
    }

    #[test]
    fn value_may_contain_equals() {
        assert_eq!(
            parse_filter("link=/shop?page=2").unwrap(),
            Filter::eq("link", "/shop?page=2")
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_filter(""), Err(FilterParseError::Empty));
        assert_eq!(parse_filter("   "), Err(FilterParseError::Empty));
        assert_eq!(parse_filter("a=1&&b=2"), Err(FilterParseError::EmptyTerm));
        assert_eq!(parse_filter("a=1||"), Err(FilterParseError::EmptyTerm));
        assert_eq!(parse_filter("()"), Err(FilterParseError::EmptyTerm));
        assert!(matches!(
            parse_filter("category"),
            Err(FilterParseError::MissingEquals(_))
        ));
        assert!(matches!(
            parse_filter("=x"),
            Err(FilterParseError::InvalidField(_))
        ));
        assert!(matches!(
            parse_filter("a b=x"),
            Err(FilterParseError::InvalidField(_))
        ));
        assert_eq!(
            parse_filter("(a=1&b=2"),
            Err(FilterParseError::UnbalancedParentheses)
        );
        assert_eq!(
            parse_filter("a=1)"),
            Err(FilterParseError::UnbalancedParentheses)
        );
        assert!(matches!(
            parse_filter("(a=1)b=2"),
            Err(FilterParseError::MalformedGroup(_))
        ));
        assert_eq!(
            parse_filter("((a=1)&b=2)"),
            Err(FilterParseError::NestedGroup)
        );
    }

    #[test]
    fn matches_documents_by_text() {
        let doc = json!({
            "status": "active",
            "stock": 10,
            "featured": true,
            "customer": {"phone": "01711111111"},
            "tags": ["summer"],
            "discountPrice": null
        });

        assert!(parse_filter("status=active").unwrap().matches(&doc));
        assert!(parse_filter("stock=10").unwrap().matches(&doc));
        assert!(parse_filter("featured=true").unwrap().matches(&doc));
        assert!(parse_filter("customer.phone=01711111111")
            .unwrap()
            .matches(&doc));
        assert!(!parse_filter("tags=summer").unwrap().matches(&doc));
        assert!(!parse_filter("discountPrice=null").unwrap().matches(&doc));
        assert!(!parse_filter("missing=1").unwrap().matches(&doc));
    }

    #[test]
    fn matches_boolean_structure() {
        let doc = json!({"category": "shoes", "status": "active"});

        assert!(parse_filter("category=bags||status=active")
            .unwrap()
            .matches(&doc));
        assert!(!parse_filter("category=bags&status=active")
            .unwrap()
            .matches(&doc));
        assert!(parse_filter("(category=bags||category=shoes)&status=active")
            .unwrap()
            .matches(&doc));
    }
}
