//! Integration tests for proposal rendering

use pretty_assertions::assert_eq;
use proposal_template::{
    parse_estimate, parse_template, EngineConfig, Estimate, LineItemCategory, ProposalRenderer,
    ProposalTemplate, RenderMode, SlotKind, TemplateCompiler, VariableKind, DEFAULT_PAGE_BREAK,
};
use serde_json::json;

fn estimate_from(value: serde_json::Value) -> Estimate {
    parse_estimate(&value.to_string()).unwrap()
}

fn render(pages: &[&str], estimate: &Estimate, mode: RenderMode) -> String {
    let template = ProposalTemplate::with_pages(pages.iter().copied());
    let renderer = ProposalRenderer::new(&template).unwrap();
    renderer.render(estimate, mode)
}

fn sample_estimate() -> Estimate {
    estimate_from(json!({
        "customerName": "Acme Co",
        "projectName": "Warehouse roof",
        "estimateDate": "2025-03-09",
        "grandTotal": 10000,
        "lineItems": {
            "labor": [
                { "id": "lab-1", "name": "Roofer", "rate": 55, "quantity": 40 },
                { "id": "lab-2", "name": "Helper", "rate": 30, "quantity": 40 }
            ],
            "equipment": [
                { "id": "eq-1", "description": "Boom lift", "cost": 450, "qty": 2 }
            ],
            "material": [
                { "name": "Shingles", "category": "Roofing", "unitCost": 95, "quantity": 30 },
                { "name": "Nails", "category": "Fasteners", "unitCost": 40, "quantity": 2 }
            ]
        },
        "customVariables": {
            "customText_0": "Net 30",
            "customText_1": "Rev A",
            "lineItem_0": "Roofer"
        }
    }))
}

#[test]
fn test_customer_and_grand_total() {
    let estimate = estimate_from(json!({ "customerName": "Acme Co", "grandTotal": 10000 }));
    let html = render(
        &["Customer: {{customerName}}, Total: {{formatCurrency aggregations.grandTotal}}"],
        &estimate,
        RenderMode::View,
    );
    assert_eq!(html, "Customer: Acme Co, Total: $10,000.00");
}

#[test]
fn test_saved_text_values_in_order() {
    let html = render(
        &["<p>Terms: {{customText}}</p><p>Revision: {{customText}}</p>"],
        &sample_estimate(),
        RenderMode::View,
    );

    let net = html.find("Net 30").unwrap();
    let rev = html.find("Rev A").unwrap();
    assert!(net < rev);
    assert!(!html.contains("{{customText}}"));
}

#[test]
fn test_line_item_indices_shared_across_categories() {
    let html = render(
        &["{{lineItemLabor}} {{lineItemEquipment}} {{lineItemLabor}}"],
        &sample_estimate(),
        RenderMode::Edit,
    );

    let positions: Vec<usize> = (0..3)
        .map(|i| html.find(&format!(r#"data-variable-key="lineItem_{i}""#)).unwrap())
        .collect();
    assert!(positions[0] < positions[1] && positions[1] < positions[2]);
    assert!(html.contains(r#"<option value="lab-1" selected>Roofer</option>"#));
    assert!(html.contains(r#"<option value="eq-1">Boom lift</option>"#));
}

#[test]
fn test_context_values_are_not_reinterpreted() {
    let estimate = Estimate::new()
        .with_field("notes", "{{customText}} and {{lineItemLabor}}")
        .with_variable("customText_0", "Saved");
    let html = render(&["{{notes}}|{{customText}}"], &estimate, RenderMode::View);

    assert!(!html.contains("{{"));
    assert_eq!(html.matches("data-variable-key").count(), 1);
    assert!(html.contains(r#"data-variable-key="customText_0">Saved</span>"#));
}

#[test]
fn test_saved_values_are_not_reinterpreted() {
    let estimate = Estimate::new()
        .with_variable("customText_0", "{{lineItemLabor}}")
        .with_variable("lineItem_0", "{{customCurrency}}");
    let html = render(&["{{customText}} {{lineItemLabor}}"], &estimate, RenderMode::View);

    assert_eq!(html.matches("data-variable-key").count(), 2);
    assert!(html.contains(r#"data-variable-key="lineItem_0">"#));
    assert!(!html.contains("lineItem_1"));
    assert!(!html.contains("customCurrency_0"));
}

#[test]
fn test_empty_disposal_category() {
    let mut estimate = sample_estimate();
    estimate.custom_variables = Default::default();

    let edit = render(&["{{lineItemDisposal}}"], &estimate, RenderMode::Edit);
    assert!(edit.contains(" disabled>"));
    assert!(edit.contains("No Disposal Items"));

    let view = render(&["{{lineItemDisposal}}"], &estimate, RenderMode::View);
    assert!(view.contains("binding-empty"));
    assert!(!view.contains("<select"));
}

#[test]
fn test_empty_category_keeps_saved_label_in_view() {
    let estimate = sample_estimate();

    let view = render(&["{{lineItemDisposal}}"], &estimate, RenderMode::View);
    assert_eq!(
        view,
        r#"<span class="line-item-value" data-variable-key="lineItem_0">Roofer</span>"#
    );

    let edit = render(&["{{lineItemDisposal}}"], &estimate, RenderMode::Edit);
    assert!(edit.contains("No Disposal Items"));
    assert!(!edit.contains("selected"));
}

#[test]
fn test_triple_stash_data_cannot_shift_slots() {
    let template = ProposalTemplate::with_pages(["{{{notes}}}|{{customText}}"]);
    let estimate = Estimate::new()
        .with_field("notes", "<b>{{customText}}</b>")
        .with_variable("customText_0", "Saved");
    let renderer = ProposalRenderer::new(&template).unwrap();

    let html = renderer.render(&estimate, RenderMode::View);
    assert_eq!(
        html,
        r#"<b>&#123;&#123;customText&#125;&#125;</b>|<span class="custom-variable-value" data-variable-key="customText_0">Saved</span>"#
    );

    let keys: Vec<String> = renderer
        .binding_slots(&estimate)
        .into_iter()
        .map(|slot| slot.key)
        .collect();
    assert_eq!(keys, vec!["customText_0"]);
}

#[test]
fn test_pure_substitution_without_bound_tokens() {
    let source = concat!(
        "<h1>{{projectName}}</h1>",
        "<p>{{formatDate estimateDate}}</p>",
        "{{#each (groupBy lineItems.material \"category\")}}",
        "<h2>{{@key}}</h2>{{#each this}}<p>{{name}} {{formatCurrency total}}</p>{{/each}}",
        "{{/each}}",
        "<p>{{aggregations.laborTotal}}</p>"
    );
    let estimate = sample_estimate();
    let context = proposal_template::build_context(&estimate);

    let rendered = render(&[source], &estimate, RenderMode::Edit);
    let substituted = TemplateCompiler::new().compile(source, &context);

    assert_eq!(rendered, substituted);
    assert!(rendered.contains("<h1>Warehouse roof</h1>"));
    assert!(rendered.contains("<p>03/09/2025</p>"));
    assert!(rendered.contains("<p>Shingles $2,850.00</p>"));
    assert!(rendered.contains("<p>$3,400.00</p>"));
}

#[test]
fn test_view_mode_is_idempotent() {
    let template = ProposalTemplate::with_pages([
        "<p>{{customerName}} {{customText}} {{lineItemLabor}}</p>",
        "<p>{{customText}} {{customInteger}} {{lineItemMaterial}}</p>",
    ]);
    let renderer = ProposalRenderer::new(&template).unwrap();
    let estimate = sample_estimate();

    let first = renderer.render(&estimate, RenderMode::View);
    let second = renderer.render(&estimate, RenderMode::View);
    assert_eq!(first, second);
}

#[test]
fn test_counters_continue_across_pages() {
    let html = render(
        &["<p>{{customText}}</p>", "<p>{{customText}}</p>"],
        &sample_estimate(),
        RenderMode::View,
    );

    let pages: Vec<&str> = html.split(DEFAULT_PAGE_BREAK).collect();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("Net 30"));
    assert!(pages[1].contains("Rev A"));
}

#[test]
fn test_broken_block_isolated_to_its_page() {
    let html = render(
        &[
            "<p>{{customerName}}</p>{{#each lineItems.labor}}<p>{{customText}}</p>",
            "<p>{{projectName}}</p><p>{{customText}}</p>",
        ],
        &sample_estimate(),
        RenderMode::View,
    );

    let pages: Vec<&str> = html.split(DEFAULT_PAGE_BREAK).collect();
    assert!(pages[0].starts_with("<p>Acme Co</p>"));
    assert!(pages[0].contains("template-error"));
    assert!(pages[1].contains("<p>Warehouse roof</p>"));
    assert!(pages[1].contains("customText_0"));
}

#[test]
fn test_legacy_content_template() {
    let template = parse_template(r#"{ "content": "<p>{{customerName}}: {{customText}}</p>" }"#)
        .unwrap();
    let renderer = ProposalRenderer::new(&template).unwrap();

    let html = renderer.render(&sample_estimate(), RenderMode::View);
    assert!(html.starts_with("<p>Acme Co: <span"));
    assert!(html.contains("Net 30"));
    assert!(!html.contains("page-break"));
}

#[test]
fn test_template_pages_from_json() {
    let template = parse_template(
        r#"{
            "id": 42,
            "name": "Roofing proposal",
            "pages": [
                { "title": "Cover", "content": "<h1>{{projectName}}</h1>" },
                { "html": "<p>{{clientName}}</p>" }
            ]
        }"#,
    )
    .unwrap();
    let renderer = ProposalRenderer::new(&template).unwrap();

    let html = renderer.render(&sample_estimate(), RenderMode::View);
    assert_eq!(
        html,
        format!("<h1>Warehouse roof</h1>{DEFAULT_PAGE_BREAK}<p>Acme Co</p>")
    );
}

#[test]
fn test_custom_page_break_and_limits() {
    let template = ProposalTemplate::with_pages(["{{customText}}", "{{customText}}"]);
    let config = EngineConfig::from_json(
        r#"{ "pageBreak": "<hr/>", "limits": { "maxBoundTokens": 1 } }"#,
    )
    .unwrap();
    let renderer = ProposalRenderer::with_config(&template, config).unwrap();

    let html = renderer.render(&sample_estimate(), RenderMode::View);
    let pages: Vec<&str> = html.split("<hr/>").collect();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("Net 30"));
    assert!(pages[1].contains("template-error"));

    assert_eq!(renderer.binding_slots(&sample_estimate()).len(), 1);
}

#[test]
fn test_slot_manifest_matches_edit_controls() {
    let template = ProposalTemplate::with_pages([
        "{{customCurrency}} {{lineItemLabor}} {{customText}}",
        "{{lineItemMaterial}} {{customInteger}} {{customText}}",
    ]);
    let renderer = ProposalRenderer::new(&template).unwrap();
    let estimate = sample_estimate();

    let slots = renderer.binding_slots(&estimate);
    let html = renderer.render(&estimate, RenderMode::Edit);

    let rendered_keys: Vec<String> = html
        .split(r#"data-variable-key=""#)
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect();
    let manifest_keys: Vec<String> = slots.iter().map(|s| s.key.clone()).collect();

    assert_eq!(manifest_keys, rendered_keys);
    assert_eq!(
        manifest_keys,
        vec![
            "customCurrency_0",
            "lineItem_0",
            "customText_0",
            "lineItem_1",
            "customInteger_0",
            "customText_1",
        ]
    );
    assert_eq!(slots[0].kind, SlotKind::Variable(VariableKind::Currency));
    assert_eq!(slots[3].kind, SlotKind::LineItem(LineItemCategory::Material));
    assert_eq!(slots[3].page, 1);
}

#[test]
fn test_edit_mode_controls() {
    let html = render(
        &["{{customText}} {{customCurrency}} {{customInteger}}"],
        &sample_estimate(),
        RenderMode::Edit,
    );

    assert!(html.contains(r#"value="Net 30""#));
    assert!(html.contains(r#"inputmode="decimal""#));
    assert!(html.contains(r#"type="number""#));
    assert_eq!(html.matches("<input ").count(), 3);
}
