//! WASM bindings for the proposal template engine
//!
//! This crate provides JavaScript-friendly API for:
//! - Loading proposal templates
//! - Rendering proposals in edit and view mode
//! - Listing binding slots for harvesting edited values
//! - Currency, number and date formatting
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { ProposalDocument, MoneyFormatter } from 'proposal-wasm';
//!
//! await init();
//!
//! const doc = ProposalDocument.fromJson(templateJson);
//!
//! // Interactive controls seeded from estimate.customVariables
//! const editHtml = doc.renderEdit(estimate);
//!
//! // Keys of the rendered controls, in document order
//! const slots = doc.bindingSlots(estimate);
//!
//! // Frozen snapshot for sharing or printing
//! const viewHtml = doc.renderView(estimate);
//!
//! MoneyFormatter.formatCurrency(1234.5); // "$1,234.50"
//! ```

use log::{Level, LevelFilter, Log, Metadata, Record};
use proposal_template::{
    EngineConfig, Estimate, ProposalRenderer, ProposalTemplate, RenderMode, VariableMap,
};
use wasm_bindgen::prelude::*;

static LOGGER: ConsoleLogger = ConsoleLogger;

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}

/// Set the engine log level ("off", "error", "warn", "info", "debug", "trace")
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| JsValue::from_str(&format!("Unknown log level: {level}")))?;
    log::set_max_level(filter);
    Ok(())
}

/// Forwards `log` records to the browser console
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            Level::Info => web_sys::console::info_1(&message),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

/// Currency, number and date formatting utilities
#[wasm_bindgen]
pub struct MoneyFormatter;

#[wasm_bindgen]
impl MoneyFormatter {
    /// Format an amount as US currency
    ///
    /// @param amount - Amount in dollars
    /// @returns Currency text (e.g., "$1,234.50")
    #[wasm_bindgen(js_name = formatCurrency)]
    pub fn format_currency(amount: f64) -> String {
        money_text::MoneyFormatter::currency(amount)
    }

    /// Format free text as US currency
    ///
    /// @param text - Amount text (e.g., "1234.5")
    /// @returns Currency text, or the input unchanged when it is not a number
    #[wasm_bindgen(js_name = formatCurrencyText)]
    pub fn format_currency_text(text: &str) -> String {
        money_text::MoneyFormatter::currency_text(text)
    }

    /// Format a date as MM/DD/YYYY
    ///
    /// @param text - ISO-like date (e.g., "2025-03-09")
    /// @returns US date, or the input unchanged when it is not a date
    #[wasm_bindgen(js_name = formatDate)]
    pub fn format_date(text: &str) -> String {
        money_text::format_date_text(text)
    }

    /// Format a number with thousands separators and two decimals
    ///
    /// @param text - Number text
    /// @returns Formatted number, or the input unchanged when it is not a number
    #[wasm_bindgen(js_name = formatNumber)]
    pub fn format_number(text: &str) -> String {
        money_text::MoneyFormatter::number_text(text)
    }

    /// Render a float with formatting pattern
    ///
    /// @param format - Format pattern (e.g., "#,###.##")
    /// @param n - Number to format
    /// @returns Formatted string
    #[wasm_bindgen(js_name = renderFloat)]
    pub fn render_float(format: &str, n: f64) -> String {
        money_text::render_float(format, n)
    }
}

/// Proposal template renderer
#[wasm_bindgen]
pub struct ProposalDocument {
    template: ProposalTemplate,
    config: EngineConfig,
}

#[wasm_bindgen]
impl ProposalDocument {
    /// Create a document from template JSON
    ///
    /// @param json - Template JSON string (`pages` or legacy `content`)
    /// @returns ProposalDocument instance
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<ProposalDocument, JsValue> {
        let template = proposal_template::parse_template(json).map_err(to_js_error)?;
        Ok(ProposalDocument {
            template,
            config: EngineConfig::default(),
        })
    }

    /// Replace the engine configuration
    ///
    /// @param json - Config JSON (e.g., `{ "pageBreak": "<hr/>", "limits": { "maxPages": 50 } }`)
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, json: &str) -> Result<(), JsValue> {
        self.config = EngineConfig::from_json(json).map_err(to_js_error)?;
        Ok(())
    }

    /// Number of pages the template renders
    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.template.page_sources().len()
    }

    /// Render with interactive controls
    ///
    /// @param estimate - Estimate object
    /// @returns HTML string
    #[wasm_bindgen(js_name = renderEdit)]
    pub fn render_edit(&self, estimate: JsValue) -> Result<String, JsValue> {
        self.render(estimate, "edit")
    }

    /// Render a static snapshot
    ///
    /// @param estimate - Estimate object
    /// @returns HTML string
    #[wasm_bindgen(js_name = renderView)]
    pub fn render_view(&self, estimate: JsValue) -> Result<String, JsValue> {
        self.render(estimate, "view")
    }

    /// Render in the given mode
    ///
    /// @param estimate - Estimate object
    /// @param mode - "edit" or "view"
    /// @returns HTML string
    pub fn render(&self, estimate: JsValue, mode: &str) -> Result<String, JsValue> {
        let estimate = estimate_from_js(estimate)?;
        let mode: RenderMode = mode.parse().map_err(to_js_error)?;

        Ok(self.renderer()?.render(&estimate, mode))
    }

    /// Render against unsaved values (e.g., while the user is editing)
    ///
    /// @param estimate - Estimate object
    /// @param mode - "edit" or "view"
    /// @param variables - Map of `customText_0`, `lineItem_3`, ... to values
    /// @returns HTML string
    #[wasm_bindgen(js_name = renderWithVariables)]
    pub fn render_with_variables(
        &self,
        estimate: JsValue,
        mode: &str,
        variables: JsValue,
    ) -> Result<String, JsValue> {
        let estimate = estimate_from_js(estimate)?;
        let mode: RenderMode = mode.parse().map_err(to_js_error)?;
        let variables: VariableMap = serde_wasm_bindgen::from_value(variables)?;

        Ok(self
            .renderer()?
            .render_with_variables(&estimate, mode, &variables))
    }

    /// Render from estimate JSON text
    ///
    /// @param estimateJson - Estimate JSON string
    /// @param mode - "edit" or "view"
    /// @returns HTML string
    #[wasm_bindgen(js_name = renderJson)]
    pub fn render_json(&self, estimate_json: &str, mode: &str) -> Result<String, JsValue> {
        let estimate = Estimate::from_json(estimate_json).map_err(to_js_error)?;
        let mode: RenderMode = mode.parse().map_err(to_js_error)?;

        Ok(self.renderer()?.render(&estimate, mode))
    }

    /// Bound slots in document order
    ///
    /// @param estimate - Estimate object
    /// @returns Array of `{ key, kind, page }`
    #[wasm_bindgen(js_name = bindingSlots)]
    pub fn binding_slots(&self, estimate: JsValue) -> Result<JsValue, JsValue> {
        let estimate = estimate_from_js(estimate)?;
        let slots = self.renderer()?.binding_slots(&estimate);
        Ok(serde_wasm_bindgen::to_value(&slots)?)
    }

    /// Bound slot keys in document order, from estimate JSON text
    ///
    /// @param estimateJson - Estimate JSON string
    /// @returns Array of keys
    #[wasm_bindgen(js_name = slotKeysJson)]
    pub fn slot_keys_json(&self, estimate_json: &str) -> Result<Vec<String>, JsValue> {
        let estimate = Estimate::from_json(estimate_json).map_err(to_js_error)?;
        Ok(self
            .renderer()?
            .binding_slots(&estimate)
            .into_iter()
            .map(|slot| slot.key)
            .collect())
    }

    fn renderer(&self) -> Result<ProposalRenderer<'_>, JsValue> {
        ProposalRenderer::with_config(&self.template, self.config.clone()).map_err(to_js_error)
    }
}

fn estimate_from_js(estimate: JsValue) -> Result<Estimate, JsValue> {
    let value: serde_json::Value = serde_wasm_bindgen::from_value(estimate)?;
    serde_json::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js_error(e: proposal_template::TemplateError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
