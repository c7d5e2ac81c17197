//! Context builder: flattens an estimate for the template compiler
//!
//! The context exposes:
//! - every scalar field of the estimate
//! - aliased fields resolved through fallback chains (canonical name first)
//! - `lineItems.{category}` with each item's computed `total` and `label`
//! - `aggregations` with currency-formatted category sums, subtotal and
//!   grand total

use log::warn;
use money_text::format_currency;
use serde_json::{Map, Value};

use crate::parser::{is_truthy, number_from_value, resolve_binding};
use crate::tokens::{is_protected, LineItemCategory};
use crate::{CostLineItem, Estimate};

/// Context keys computed by the builder; estimate fields never override them
const RESERVED_KEYS: [&str; 3] = ["lineItems", "aggregations", "customVariables"];

/// Aliased fields and their fallback chains
pub const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("customerName", &["customerName", "clientName", "customer.name"]),
    ("clientName", &["clientName", "customerName", "customer.name"]),
    ("projectName", &["projectName", "jobName", "title"]),
    ("projectAddress", &["projectAddress", "jobAddress", "address"]),
    ("estimateNumber", &["estimateNumber", "number", "id"]),
    ("estimateDate", &["estimateDate", "date", "createdAt"]),
    ("validUntil", &["validUntil", "expirationDate"]),
    ("grandTotal", &["grandTotal", "total"]),
];

/// Build the compiler context for an estimate
pub fn build_context(estimate: &Estimate) -> Value {
    let raw = Value::Object(estimate.fields.clone());
    let mut context = Map::new();

    for (key, value) in &estimate.fields {
        if is_protected(key) || RESERVED_KEYS.contains(&key.as_str()) {
            warn!("Dropping estimate field '{key}': name is reserved by the template engine");
            continue;
        }
        context.insert(key.clone(), value.clone());
    }

    for (alias, chain) in FIELD_ALIASES {
        let resolved = chain
            .iter()
            .filter_map(|path| resolve_binding(path, &raw))
            .find(|value| is_truthy(value));

        if let Some(value) = resolved {
            context.insert((*alias).to_string(), value.clone());
        }
    }

    context.insert("lineItems".to_string(), line_items_context(estimate));
    context.insert("aggregations".to_string(), aggregations(estimate, &raw));

    Value::Object(context)
}

/// Group the eight collections under their stable names
fn line_items_context(estimate: &Estimate) -> Value {
    let groups: Map<String, Value> = LineItemCategory::ALL
        .into_iter()
        .map(|category| {
            let items = estimate.items(category).iter().map(item_context).collect();
            (category.key().to_string(), Value::Array(items))
        })
        .collect();

    Value::Object(groups)
}

/// Serialize one item with its computed total and display label
fn item_context(item: &CostLineItem) -> Value {
    let mut value = serde_json::to_value(item).unwrap_or_default();

    if let Value::Object(fields) = &mut value {
        fields.insert("total".to_string(), Value::from(item.computed_total()));
        fields.insert("label".to_string(), Value::from(item.display_label()));
    }

    value
}

fn aggregations(estimate: &Estimate, raw: &Value) -> Value {
    let mut sums = Map::new();
    let mut subtotal = 0.0;

    for category in LineItemCategory::ALL {
        let total = estimate.line_items.category_total(category);
        subtotal += total;
        sums.insert(
            format!("{}Total", category.key()),
            Value::from(format_currency(total)),
        );
    }

    // An explicit grand total on the record wins over the computed subtotal
    let grand_total = ["grandTotal", "total"]
        .iter()
        .filter_map(|path| resolve_binding(path, raw))
        .find_map(number_from_value)
        .unwrap_or(subtotal);

    sums.insert("subtotal".to_string(), Value::from(format_currency(subtotal)));
    sums.insert(
        "grandTotal".to_string(),
        Value::from(format_currency(grand_total)),
    );

    Value::Object(sums)
}
