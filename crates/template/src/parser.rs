//! Record parsing and JSON value access shared by the context builder and
//! helpers

use serde_json::Value;

use crate::{Estimate, ProposalTemplate, Result, TemplateError};

/// Parse a proposal template from JSON
pub fn parse_template(json: &str) -> Result<ProposalTemplate> {
    serde_json::from_str(json)
        .map_err(|e| TemplateError::ParseError(format!("template: {e}")))
}

/// Parse an estimate record from JSON
pub fn parse_estimate(json: &str) -> Result<Estimate> {
    serde_json::from_str(json)
        .map_err(|e| TemplateError::ParseError(format!("estimate: {e}")))
}

/// Look up a dotted path such as `customer.name` or `lineItems.labor[0].name`
///
/// A leading `$.` is accepted and ignored. Returns `None` as soon as a
/// segment is missing or an index is out of range.
pub fn resolve_binding<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return None;
    }

    path.split('.').try_fold(data, |current, segment| {
        let Some((field, rest)) = segment.split_once('[') else {
            return current.get(segment);
        };

        let current = if field.is_empty() {
            current
        } else {
            current.get(field)?
        };
        let index: usize = rest.strip_suffix(']')?.parse().ok()?;
        current.get(index)
    })
}

/// Display text of a value; `null` is empty
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Read a number from a JSON number or a numeric-looking string
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => money_text::parse_amount(s).ok(),
        _ => None,
    }
}

/// Truthiness used by field aliasing and the `default` helper
///
/// Empty strings, empty collections, zero, `false` and `null` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
