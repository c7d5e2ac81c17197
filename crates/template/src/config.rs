//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::{Result, TemplateError};

/// Marker placed between rendered pages
pub const DEFAULT_PAGE_BREAK: &str =
    r#"<div class="page-break" style="page-break-after: always;"></div>"#;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// HTML inserted between pages
    #[serde(default = "default_page_break")]
    pub page_break: String,

    /// Resource limits for one render
    #[serde(default)]
    pub limits: RenderLimits,
}

fn default_page_break() -> String {
    DEFAULT_PAGE_BREAK.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_break: default_page_break(),
            limits: RenderLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TemplateError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every limit is usable
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("maxPageBytes", self.limits.max_page_bytes),
            ("maxPages", self.limits.max_pages),
            ("maxBoundTokens", self.limits.max_bound_tokens),
            ("maxOutputBytes", self.limits.max_output_bytes),
        ];

        for (name, value) in limits {
            if value == 0 {
                return Err(TemplateError::ConfigError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}

/// Upper bounds for a single document render
///
/// Anything over a limit renders as an inline diagnostic instead of being
/// processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenderLimits {
    /// Largest page source that is compiled
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,

    /// Pages rendered per document
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Custom-variable and line-item slots bound per document
    #[serde(default = "default_max_bound_tokens")]
    pub max_bound_tokens: usize,

    /// Largest compiled page
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_max_page_bytes() -> usize {
    1024 * 1024
}

fn default_max_pages() -> usize {
    500
}

fn default_max_bound_tokens() -> usize {
    10_000
}

fn default_max_output_bytes() -> usize {
    8 * 1024 * 1024
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_page_bytes: default_max_page_bytes(),
            max_pages: default_max_pages(),
            max_bound_tokens: default_max_bound_tokens(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}
