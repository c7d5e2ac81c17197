//! Proposal Template Engine - resolves proposal templates against estimates
//!
//! This crate provides:
//! - Proposal template and estimate schema types
//! - Context building with field aliases and line-item aggregations
//! - Handlebars compilation with failure isolation per top-level segment
//! - Positional binding of custom variables and line items (edit and view)
//! - Multi-page assembly with a binding slot manifest
//!
//! # Example
//!
//! ```
//! use proposal_template::{Estimate, ProposalRenderer, ProposalTemplate, RenderMode};
//!
//! let template = ProposalTemplate::with_pages([
//!     "<p>Customer: {{customerName}}</p><p>Terms: {{customText}}</p>",
//! ]);
//! let estimate = Estimate::new()
//!     .with_field("customerName", "Acme Co")
//!     .with_variable("customText_0", "Net 30");
//!
//! let renderer = ProposalRenderer::new(&template)?;
//! let html = renderer.render(&estimate, RenderMode::View);
//! assert!(html.contains("Customer: Acme Co"));
//! assert!(html.contains("Net 30"));
//! # Ok::<(), proposal_template::TemplateError>(())
//! ```

mod binding;
pub mod compiler;
pub mod config;
pub mod context;
mod custom_vars;
pub mod guard;
pub mod helpers;
mod line_items;
pub mod markup;
pub mod parser;
mod renderer;
mod schema;
pub mod tokens;

pub use compiler::TemplateCompiler;
pub use config::{EngineConfig, RenderLimits, DEFAULT_PAGE_BREAK};
pub use context::build_context;
pub use custom_vars::CustomVariableProcessor;
pub use guard::EscapeGuard;
pub use line_items::LineItemProcessor;
pub use parser::{parse_estimate, parse_template};
pub use renderer::{AssemblyState, DocumentAssembly, ProposalRenderer};
pub use schema::*;
pub use tokens::{BindingSlot, LineItemCategory, SlotCounters, SlotKind, VariableKind};

use thiserror::Error;

/// Errors that can occur during template processing
///
/// Rendering itself never fails on template content; these cover malformed
/// input records and engine setup.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    ParseError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
