//! Template compiler
//!
//! Wraps a Handlebars registry with the proposal helpers. Compilation never
//! aborts a document: when a page fails as a whole it is split into
//! top-level segments (text runs, single tags, balanced blocks) and each
//! segment is compiled on its own, so only the broken segment turns into an
//! inline diagnostic.

use handlebars::Handlebars;
use log::warn;
use serde_json::Value;

use crate::helpers::register_helpers;
use crate::markup::{diagnostic, escape_untrusted};
use crate::tokens::{scan_tokens, Token};
use crate::{Result, TemplateError};

/// Handlebars-backed compiler for page sources
pub struct TemplateCompiler {
    registry: Handlebars<'static>,
}

impl TemplateCompiler {
    /// Create a compiler with every proposal helper registered
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(escape_untrusted);
        register_helpers(&mut registry);

        Self { registry }
    }

    /// Compile a source, replacing failures with inline diagnostics
    pub fn compile(&self, source: &str, context: &Value) -> String {
        match self.try_compile(source, context) {
            Ok(html) => html,
            Err(e) => {
                warn!("Template compilation failed, isolating segments: {e}");
                self.compile_isolated(source, context)
            }
        }
    }

    /// Compile a source, returning the first failure
    pub fn try_compile(&self, source: &str, context: &Value) -> Result<String> {
        self.registry
            .render_template(source, context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }

    fn compile_isolated(&self, source: &str, context: &Value) -> String {
        let mut html = String::with_capacity(source.len());

        for segment in split_segments(source) {
            match self.try_compile(segment, context) {
                Ok(compiled) => html.push_str(&compiled),
                Err(e) => html.push_str(&diagnostic(&e.to_string())),
            }
        }

        html
    }
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a source into independently compilable top-level segments
///
/// Concatenating the segments yields the source again.
pub fn split_segments(source: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut depth = 0usize;
    let mut block_start = 0;

    for scanned in scan_tokens(source) {
        match scanned.token {
            Token::BlockOpen { .. } => {
                if depth == 0 {
                    push_text(&mut segments, source, cursor, scanned.start);
                    block_start = scanned.start;
                }
                depth += 1;
            }
            Token::BlockClose { .. } if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    segments.push(&source[block_start..scanned.end]);
                    cursor = scanned.end;
                }
            }
            Token::Unterminated => break,
            _ if depth == 0 => {
                push_text(&mut segments, source, cursor, scanned.start);
                segments.push(&source[scanned.start..scanned.end]);
                cursor = scanned.end;
            }
            _ => {}
        }
    }

    // Whatever is left (text, an unclosed block or an unterminated tag)
    let rest_start = if depth > 0 { block_start } else { cursor };
    if rest_start < source.len() {
        segments.push(&source[rest_start..]);
    }

    segments
}

fn push_text<'a>(segments: &mut Vec<&'a str>, source: &'a str, from: usize, to: usize) {
    if from < to {
        segments.push(&source[from..to]);
    }
}
