//! Proposal template and estimate record types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::parser::{number_from_value, value_to_string};
use crate::tokens::LineItemCategory;

/// Deserialize `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a number that may arrive as a numeric-looking string
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Rendering variant
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Interactive controls seeded from saved values
    Edit,
    /// Frozen snapshot of saved values
    #[default]
    View,
}

impl std::str::FromStr for RenderMode {
    type Err = crate::TemplateError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edit" => Ok(RenderMode::Edit),
            "view" => Ok(RenderMode::View),
            other => Err(crate::TemplateError::ParseError(format!(
                "Unknown render mode: {other}"
            ))),
        }
    }
}

/// Root proposal template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalTemplate {
    /// Template identifier in the record store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ordered pages
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<Page>,

    /// Legacy single-body content, used when `pages` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ProposalTemplate {
    /// Create a template from page contents
    pub fn with_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Page::new).collect(),
            ..Default::default()
        }
    }

    /// Create a legacy template with a single flat content body
    pub fn legacy(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Page sources in render order
    ///
    /// Falls back to the legacy `content` field when there are no pages.
    pub fn page_sources(&self) -> Vec<&str> {
        if !self.pages.is_empty() {
            return self.pages.iter().map(|p| p.content.as_str()).collect();
        }

        match self.content.as_deref() {
            Some(content) => vec![content],
            None => Vec::new(),
        }
    }
}

/// One page of template content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Page title shown in the authoring editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Rich content (HTML) with tokens
    #[serde(default, alias = "html", deserialize_with = "null_as_default")]
    pub content: String,
}

impl Page {
    /// Create a page from content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: content.into(),
        }
    }
}

/// A single cost line on an estimate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostLineItem {
    /// Record identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Item type (role for labor, make/model for equipment, ...)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(
        default,
        alias = "cost",
        alias = "rate",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_cost: Option<f64>,

    #[serde(
        default,
        alias = "qty",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<f64>,

    /// Stored total; computed from unit cost and quantity when absent
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<f64>,

    /// Any other fields the record store keeps on the item
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Generic label for items without any descriptive field
pub const FALLBACK_ITEM_LABEL: &str = "Item";

impl CostLineItem {
    /// Create an item with a name, unit cost and quantity
    pub fn new(name: impl Into<String>, unit_cost: f64, quantity: f64) -> Self {
        Self {
            name: Some(name.into()),
            unit_cost: Some(unit_cost),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    /// Set the record identifier
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Total cost of the line
    pub fn computed_total(&self) -> f64 {
        self.total
            .unwrap_or_else(|| self.unit_cost.unwrap_or(0.0) * self.quantity.unwrap_or(0.0))
    }

    /// Label shown in line-item selectors
    ///
    /// First non-blank of name, description, type and category, else "Item".
    pub fn display_label(&self) -> String {
        [
            &self.name,
            &self.description,
            &self.item_type,
            &self.category,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(FALLBACK_ITEM_LABEL)
        .to_string()
    }

    /// Value used for the selector option
    ///
    /// The record id when present, else `{category}-{position}`.
    pub fn option_value(&self, category: LineItemCategory, position: usize) -> String {
        match self.id.as_ref().map(value_to_string) {
            Some(id) if !id.is_empty() => id,
            _ => format!("{}-{}", category.key(), position),
        }
    }
}

/// The eight cost-line collections of an estimate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LineItems {
    #[serde(default, deserialize_with = "null_as_default")]
    pub labor: Vec<CostLineItem>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub equipment: Vec<CostLineItem>,

    #[serde(default, alias = "materials", deserialize_with = "null_as_default")]
    pub material: Vec<CostLineItem>,

    #[serde(default, alias = "tool", deserialize_with = "null_as_default")]
    pub tools: Vec<CostLineItem>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub overhead: Vec<CostLineItem>,

    #[serde(default, alias = "subcontractors", deserialize_with = "null_as_default")]
    pub subcontractor: Vec<CostLineItem>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub disposal: Vec<CostLineItem>,

    #[serde(default, alias = "misc", deserialize_with = "null_as_default")]
    pub miscellaneous: Vec<CostLineItem>,
}

impl LineItems {
    /// Items of one category
    pub fn get(&self, category: LineItemCategory) -> &[CostLineItem] {
        match category {
            LineItemCategory::Labor => &self.labor,
            LineItemCategory::Equipment => &self.equipment,
            LineItemCategory::Material => &self.material,
            LineItemCategory::Tools => &self.tools,
            LineItemCategory::Overhead => &self.overhead,
            LineItemCategory::Subcontractor => &self.subcontractor,
            LineItemCategory::Disposal => &self.disposal,
            LineItemCategory::Miscellaneous => &self.miscellaneous,
        }
    }

    /// Mutable items of one category
    pub fn get_mut(&mut self, category: LineItemCategory) -> &mut Vec<CostLineItem> {
        match category {
            LineItemCategory::Labor => &mut self.labor,
            LineItemCategory::Equipment => &mut self.equipment,
            LineItemCategory::Material => &mut self.material,
            LineItemCategory::Tools => &mut self.tools,
            LineItemCategory::Overhead => &mut self.overhead,
            LineItemCategory::Subcontractor => &mut self.subcontractor,
            LineItemCategory::Disposal => &mut self.disposal,
            LineItemCategory::Miscellaneous => &mut self.miscellaneous,
        }
    }

    /// Sum of item totals in one category
    pub fn category_total(&self, category: LineItemCategory) -> f64 {
        self.get(category).iter().map(CostLineItem::computed_total).sum()
    }
}

/// Saved custom-variable and line-item values, keyed `{kind}_{index}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct VariableMap(BTreeMap<String, Value>);

impl VariableMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the storage key for a slot (e.g. `customText_0`, `lineItem_3`)
    pub fn key(prefix: &str, index: usize) -> String {
        format!("{prefix}_{index}")
    }

    /// Raw saved value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Saved value as display text; `None` for missing, null or empty values
    pub fn display(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(value_to_string)
            .filter(|s| !s.is_empty())
    }

    /// Store a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Estimate record as handed over by the record store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Cost line collections
    #[serde(default, deserialize_with = "null_as_default")]
    pub line_items: LineItems,

    /// Values saved from edit mode
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_variables: VariableMap,

    /// Scalar fields (customer, project, dates, aggregates, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Estimate {
    /// Create an empty estimate
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an estimate from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        crate::parser::parse_estimate(json)
    }

    /// Set a scalar field
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Replace the items of one category
    pub fn with_items(mut self, category: LineItemCategory, items: Vec<CostLineItem>) -> Self {
        *self.line_items.get_mut(category) = items;
        self
    }

    /// Store a saved variable value
    pub fn with_variable(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.custom_variables.insert(key, value);
        self
    }

    /// Scalar field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Items of one category
    pub fn items(&self, category: LineItemCategory) -> &[CostLineItem] {
        self.line_items.get(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_estimate_from_json() {
        let estimate: Estimate = serde_json::from_value(json!({
            "customerName": "Acme Co",
            "grandTotal": 10000,
            "lineItems": {
                "labor": [{ "id": 7, "name": "Foreman", "rate": "45.50", "quantity": 8 }],
                "disposal": null
            },
            "customVariables": { "customText_0": "Net 30" }
        }))
        .unwrap();

        assert_eq!(estimate.field("customerName"), Some(&json!("Acme Co")));
        assert_eq!(estimate.items(LineItemCategory::Labor).len(), 1);
        assert!(estimate.items(LineItemCategory::Disposal).is_empty());
        assert!(estimate.items(LineItemCategory::Tools).is_empty());
        assert_eq!(
            estimate.custom_variables.display("customText_0"),
            Some("Net 30".to_string())
        );

        let labor = &estimate.items(LineItemCategory::Labor)[0];
        assert_eq!(labor.unit_cost, Some(45.5));
        assert_eq!(labor.computed_total(), 364.0);
    }

    #[test]
    fn test_null_collections() {
        let estimate: Estimate =
            serde_json::from_value(json!({ "lineItems": null, "customVariables": null })).unwrap();
        assert_eq!(estimate.line_items, LineItems::default());
        assert!(estimate.custom_variables.is_empty());
    }

    #[test]
    fn test_display_label_fallback() {
        let mut item = CostLineItem::default();
        assert_eq!(item.display_label(), "Item");

        item.category = Some("Hauling".to_string());
        assert_eq!(item.display_label(), "Hauling");

        item.description = Some("  ".to_string());
        assert_eq!(item.display_label(), "Hauling");

        item.name = Some("Dump truck".to_string());
        assert_eq!(item.display_label(), "Dump truck");
    }

    #[test]
    fn test_option_value() {
        let item = CostLineItem::new("Crane", 500.0, 1.0);
        assert_eq!(item.option_value(LineItemCategory::Equipment, 2), "equipment-2");
        assert_eq!(item.with_id("eq-9").option_value(LineItemCategory::Equipment, 2), "eq-9");
    }

    #[test]
    fn test_variable_map_display() {
        let map: VariableMap = [
            ("customText_0", json!("Net 30")),
            ("customInteger_0", json!(12)),
            ("customText_1", json!("")),
            ("customText_2", json!(null)),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.display("customText_0"), Some("Net 30".to_string()));
        assert_eq!(map.display("customInteger_0"), Some("12".to_string()));
        assert_eq!(map.display("customText_1"), None);
        assert_eq!(map.display("customText_2"), None);
        assert_eq!(map.display("customText_3"), None);
        assert_eq!(VariableMap::key("lineItem", 4), "lineItem_4");
    }

    #[test]
    fn test_page_sources_legacy_fallback() {
        let template = ProposalTemplate::legacy("<p>Hi</p>");
        assert_eq!(template.page_sources(), vec!["<p>Hi</p>"]);

        let template = ProposalTemplate::with_pages(["a", "b"]);
        assert_eq!(template.page_sources(), vec!["a", "b"]);

        assert!(ProposalTemplate::default().page_sources().is_empty());
    }

    #[test]
    fn test_render_mode_from_str() {
        assert_eq!("edit".parse::<RenderMode>().unwrap(), RenderMode::Edit);
        assert_eq!(" View ".parse::<RenderMode>().unwrap(), RenderMode::View);
        assert!("print".parse::<RenderMode>().is_err());
    }
}
