//! Handlebars helpers available to proposal templates
//!
//! | Helper | Example |
//! |---|---|
//! | `formatCurrency` | `{{formatCurrency aggregations.grandTotal}}` |
//! | `formatDate` | `{{formatDate estimateDate}}` |
//! | `formatNumber` | `{{formatNumber quantity}}` |
//! | `groupBy` | `{{#each (groupBy lineItems.material "category")}}` |
//! | `eq` / `neq` | `{{#if (eq status "approved")}}` |
//! | `default` | `{{default notes "None"}}` |
//!
//! Formatting helpers never fail on bad input: `null` renders as an empty
//! string and unparsable text passes through unchanged.

use handlebars::{handlebars_helper, Handlebars};
use serde_json::{Map, Value};

use crate::parser::{is_truthy, resolve_binding, value_to_string};

/// Group key for items missing the grouped property
pub const UNGROUPED_KEY: &str = "Uncategorized";

handlebars_helper!(format_currency_helper: |value: Json| format_with(value, money_text::format_currency_text));
handlebars_helper!(format_date_helper: |value: Json| format_with(value, money_text::format_date_text));
handlebars_helper!(format_number_helper: |value: Json| format_with(value, money_text::format_number_text));
handlebars_helper!(group_by_helper: |items: Json, property: Json| group_by(items, property));
handlebars_helper!(eq_helper: |left: Json, right: Json| values_equal(left, right));
handlebars_helper!(neq_helper: |left: Json, right: Json| !values_equal(left, right));
handlebars_helper!(default_helper: |value: Json, fallback: Json| {
    if is_truthy(value) { value.clone() } else { fallback.clone() }
});

/// Register every proposal helper on a registry
pub fn register_helpers(registry: &mut Handlebars<'static>) {
    registry.register_helper("formatCurrency", Box::new(format_currency_helper));
    registry.register_helper("formatDate", Box::new(format_date_helper));
    registry.register_helper("formatNumber", Box::new(format_number_helper));
    registry.register_helper("groupBy", Box::new(group_by_helper));
    registry.register_helper("eq", Box::new(eq_helper));
    registry.register_helper("neq", Box::new(neq_helper));
    registry.register_helper("default", Box::new(default_helper));
}

/// Apply a text formatter to a JSON value; `null` becomes empty
fn format_with(value: &Value, format: fn(&str) -> String) -> String {
    match value {
        Value::Null => String::new(),
        other => format(&value_to_string(other)),
    }
}

/// Group an array of objects by a (possibly dotted) property
pub fn group_by(items: &Value, property: &Value) -> Value {
    let mut groups = Map::new();

    let (Some(items), Some(property)) = (items.as_array(), property.as_str()) else {
        return Value::Object(groups);
    };

    for item in items {
        let key = resolve_binding(property, item)
            .map(value_to_string)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNGROUPED_KEY.to_string());

        if let Value::Array(members) = groups
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            members.push(item.clone());
        }
    }

    Value::Object(groups)
}

/// Equality used by `eq`/`neq`; numbers compare by value
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}
