//! Line-item binding pass
//!
//! Replaces the eight `{{lineItem<Category>}}` tokens. All categories share a
//! single counter, so the slot key `lineItem_{index}` follows document order
//! regardless of category. The saved value is the selected item's label.

use log::debug;
use regex::Regex;

use crate::binding::{self, BoundToken};
use crate::config::RenderLimits;
use crate::markup::{blank_placeholder, diagnostic, escape_untrusted, static_value};
use crate::tokens::{BindingSlot, LineItemCategory, SlotCounters, SlotKind, LINE_ITEM_KEY_PREFIX};
use crate::{CostLineItem, Estimate, RenderMode, Result, VariableMap};

const VALUE_CLASS: &str = "line-item-value";
const SELECT_CLASS: &str = "line-item-select";

/// Reserved width of an unbound line item in view mode
const MIN_WIDTH: usize = 16;

/// Binds line-item tokens to selectors or saved labels
pub struct LineItemProcessor {
    pattern: Regex,
}

impl LineItemProcessor {
    pub fn new() -> Result<Self> {
        let names = LineItemCategory::ALL
            .into_iter()
            .map(|category| regex::escape(category.token_name()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            pattern: Regex::new(&format!(r"\{{\{{({names})\}}\}}"))?,
        })
    }

    /// Replace every line-item token in `html`
    pub fn process(
        &self,
        html: &str,
        estimate: &Estimate,
        mode: RenderMode,
        variables: &VariableMap,
        counters: &mut SlotCounters,
        limits: &RenderLimits,
    ) -> String {
        let tokens = self.scan(html, counters, limits);

        binding::splice(html, &tokens, |token| {
            let Some(index) = token.index else {
                return diagnostic("too many bound tokens in document");
            };

            let category = token.kind;
            let key = VariableMap::key(LINE_ITEM_KEY_PREFIX, index);
            let saved = variables.display(&key);

            match mode {
                RenderMode::Edit => {
                    selector(category, estimate.items(category), &key, saved.as_deref())
                }
                RenderMode::View => match saved {
                    Some(label) => static_value(VALUE_CLASS, &key, &label),
                    None => blank_placeholder(VALUE_CLASS, &key, MIN_WIDTH),
                },
            }
        })
    }

    /// List slots in `html` without rendering, advancing `counters` the
    /// same way [`process`](Self::process) does
    pub fn slots(
        &self,
        html: &str,
        page: usize,
        counters: &mut SlotCounters,
        limits: &RenderLimits,
    ) -> Vec<(usize, BindingSlot)> {
        self.scan(html, counters, limits)
            .into_iter()
            .filter_map(|token| {
                let index = token.index?;
                Some((
                    token.range.start,
                    BindingSlot {
                        key: VariableMap::key(LINE_ITEM_KEY_PREFIX, index),
                        kind: SlotKind::LineItem(token.kind),
                        page,
                    },
                ))
            })
            .collect()
    }

    fn scan(
        &self,
        html: &str,
        counters: &mut SlotCounters,
        limits: &RenderLimits,
    ) -> Vec<BoundToken<LineItemCategory>> {
        binding::scan(
            &self.pattern,
            html,
            counters,
            limits,
            LineItemCategory::from_token_name,
            |counters, _| counters.next_line_item(),
        )
    }
}

/// Dropdown over a category's items
fn selector(
    category: LineItemCategory,
    items: &[CostLineItem],
    key: &str,
    saved: Option<&str>,
) -> String {
    let name = category.display_name();

    if items.is_empty() {
        return format!(
            r#"<select class="{SELECT_CLASS}" data-variable-key="{key}" data-category="{cat}" disabled><option value="">No {name} Items</option></select>"#,
            cat = category.key(),
        );
    }

    let labels: Vec<String> = items.iter().map(CostLineItem::display_label).collect();
    let selected = saved.and_then(|label| labels.iter().position(|l| l == label));
    if let (Some(label), None) = (saved, selected) {
        debug!("Saved label '{label}' for {key} matches no {} item", category.key());
    }

    let mut html = format!(
        r#"<select class="{SELECT_CLASS}" data-variable-key="{key}" data-category="{cat}"><option value="">Select {name} Item</option>"#,
        cat = category.key(),
    );

    for (position, (item, label)) in items.iter().zip(&labels).enumerate() {
        let selected_attr = if selected == Some(position) {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(
            r#"<option value="{value}"{selected_attr}>{label}</option>"#,
            value = escape_untrusted(&item.option_value(category, position)),
            label = escape_untrusted(label),
        ));
    }

    html.push_str("</select>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate() -> Estimate {
        Estimate::new()
            .with_items(
                LineItemCategory::Labor,
                vec![
                    CostLineItem::new("Foreman", 50.0, 10.0).with_id(11),
                    CostLineItem::new("Laborer", 25.0, 20.0),
                    CostLineItem::new("Foreman", 60.0, 5.0).with_id(13),
                ],
            )
            .with_items(
                LineItemCategory::Equipment,
                vec![CostLineItem::new("Excavator", 900.0, 1.0).with_id("eq-1")],
            )
    }

    fn process(html: &str, mode: RenderMode, variables: &VariableMap) -> String {
        let processor = LineItemProcessor::new().unwrap();
        let mut counters = SlotCounters::new();
        processor.process(
            html,
            &estimate(),
            mode,
            variables,
            &mut counters,
            &RenderLimits::default(),
        )
    }

    #[test]
    fn test_shared_counter_across_categories() {
        let html = process(
            "{{lineItemLabor}}{{lineItemEquipment}}{{lineItemLabor}}",
            RenderMode::Edit,
            &VariableMap::new(),
        );

        let first = html.find(r#"data-variable-key="lineItem_0" data-category="labor""#);
        let second = html.find(r#"data-variable-key="lineItem_1" data-category="equipment""#);
        let third = html.find(r#"data-variable-key="lineItem_2" data-category="labor""#);
        assert!(first.unwrap() < second.unwrap());
        assert!(second.unwrap() < third.unwrap());
    }

    #[test]
    fn test_selector_options() {
        let html = process("{{lineItemLabor}}", RenderMode::Edit, &VariableMap::new());

        assert!(html.contains(r#"<option value="">Select Labor Item</option>"#));
        assert!(html.contains(r#"<option value="11">Foreman</option>"#));
        assert!(html.contains(r#"<option value="labor-1">Laborer</option>"#));
        assert!(!html.contains("selected"));
    }

    #[test]
    fn test_first_matching_label_selected() {
        let variables: VariableMap = [("lineItem_0", "Foreman")].into_iter().collect();
        let html = process("{{lineItemLabor}}", RenderMode::Edit, &variables);

        assert!(html.contains(r#"<option value="11" selected>Foreman</option>"#));
        assert!(html.contains(r#"<option value="13">Foreman</option>"#));
    }

    #[test]
    fn test_empty_category_disabled() {
        let html = process("{{lineItemDisposal}}", RenderMode::Edit, &VariableMap::new());
        assert!(html.contains("disabled"));
        assert!(html.contains("No Disposal Items"));
    }

    #[test]
    fn test_stale_label() {
        let variables: VariableMap = [("lineItem_0", "Retired crew")].into_iter().collect();

        let edit = process("{{lineItemLabor}}", RenderMode::Edit, &variables);
        assert!(!edit.contains("selected"));

        let view = process("{{lineItemLabor}}", RenderMode::View, &variables);
        assert_eq!(
            view,
            r#"<span class="line-item-value" data-variable-key="lineItem_0">Retired crew</span>"#
        );
    }

    #[test]
    fn test_view_blank_placeholder() {
        let html = process("{{lineItemTools}}", RenderMode::View, &VariableMap::new());
        assert!(html.contains("binding-empty"));
        assert!(html.contains("min-width: 16ch"));
    }

    #[test]
    fn test_slots() {
        let processor = LineItemProcessor::new().unwrap();
        let mut counters = SlotCounters::new();
        counters.next_line_item();

        let slots = processor.slots(
            "{{lineItemMaterial}} {{lineItemLabor}}",
            1,
            &mut counters,
            &RenderLimits::default(),
        );
        let keys: Vec<&str> = slots.iter().map(|(_, s)| s.key.as_str()).collect();
        assert_eq!(keys, vec!["lineItem_1", "lineItem_2"]);
        assert_eq!(slots[1].1.kind, SlotKind::LineItem(LineItemCategory::Labor));
    }
}
