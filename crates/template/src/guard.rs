//! Escape/restore guard for tokens the general compiler must not see
//!
//! Each literal `{{name}}` of a protected name is swapped for a marker made
//! of Unicode private-use delimiters around a per-render nonce and the name.
//! Handlebars copies such text verbatim, so the marker survives compilation
//! and is swapped back afterwards. The nonce never occurs in the page
//! sources or the context, so compiled data cannot forge a marker.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use serde_json::Value;

use crate::tokens::protected_names;
use crate::{Result, TemplateError};

/// Opening delimiter of a protected-token marker
pub const MARKER_OPEN: char = '\u{E000}';

/// Closing delimiter of a protected-token marker
pub const MARKER_CLOSE: char = '\u{E001}';

/// Swaps protected tokens for compiler-opaque markers and back
#[derive(Debug, Clone)]
pub struct EscapeGuard {
    names: Vec<String>,
}

impl EscapeGuard {
    /// Guard over the custom-variable and line-item vocabulary
    pub fn new() -> Self {
        Self {
            names: protected_names().map(str::to_string).collect(),
        }
    }

    /// Guard over an explicit set of names
    pub fn with_names<'n>(names: impl IntoIterator<Item = &'n str>) -> Result<Self> {
        let mut guarded: Vec<String> = Vec::new();

        for name in names {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(TemplateError::ConfigError(format!(
                    "Invalid protected token name: {name:?}"
                )));
            }
            if guarded.iter().any(|n| n == name) {
                return Err(TemplateError::ConfigError(format!(
                    "Duplicate protected token name: {name}"
                )));
            }
            guarded.push(name.to_string());
        }

        Ok(Self { names: guarded })
    }

    /// Pick a marker nonce that occurs in none of `haystacks`
    pub fn nonce(haystacks: &[&str]) -> String {
        let state = RandomState::new();

        (0u64..)
            .map(|attempt| format!("{:x}", state.hash_one(attempt)))
            .find(|candidate| haystacks.iter().all(|h| !h.contains(candidate.as_str())))
            .unwrap_or_default()
    }

    /// Strip marker delimiters from every string and key of a context
    pub fn sanitize(value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(Self::strip_markers(&s)),
            Value::Array(items) => Value::Array(items.into_iter().map(Self::sanitize).collect()),
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (Self::strip_markers(&key), Self::sanitize(value)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Replace every protected token with its marker
    ///
    /// A backslash-escaped `\{{name}}` is literal text and left alone.
    pub fn escape(&self, source: &str, nonce: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(pos) = rest.find("{{") {
            let (before, tail) = rest.split_at(pos);
            out.push_str(before);

            match self.protected_at(tail) {
                Some(name) if !out.ends_with('\\') => {
                    out.push_str(&marker(nonce, name));
                    rest = &tail[name.len() + 4..];
                }
                _ => {
                    out.push_str("{{");
                    rest = &tail[2..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Entity-encode protected tokens that reached compiled output as text
    ///
    /// Authored tokens are markers at this point, so any literal token came
    /// from data or an escaped tag and must not bind.
    pub fn neutralize(&self, html: &str) -> String {
        if !html.contains("{{") {
            return html.to_string();
        }

        self.names.iter().fold(html.to_string(), |text, name| {
            text.replace(
                &token(name),
                &format!("&#123;&#123;{name}&#125;&#125;"),
            )
        })
    }

    /// Replace every marker carrying `nonce` with its original token
    pub fn restore(&self, html: &str, nonce: &str) -> String {
        if !html.contains(MARKER_OPEN) {
            return html.to_string();
        }

        self.names.iter().fold(html.to_string(), |text, name| {
            text.replace(&marker(nonce, name), &token(name))
        })
    }

    /// Remove marker delimiters from untrusted text
    pub fn strip_markers(text: &str) -> String {
        text.chars()
            .filter(|c| *c != MARKER_OPEN && *c != MARKER_CLOSE)
            .collect()
    }

    /// Protected name of a `{{name}}` tag at the start of `text`
    fn protected_at(&self, text: &str) -> Option<&str> {
        let inner = text.strip_prefix("{{")?;
        self.names
            .iter()
            .find(|name| {
                inner
                    .strip_prefix(name.as_str())
                    .is_some_and(|r| r.starts_with("}}"))
            })
            .map(String::as_str)
    }
}

impl Default for EscapeGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn token(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

fn marker(nonce: &str, name: &str) -> String {
    format!("{MARKER_OPEN}{nonce}:{name}{MARKER_CLOSE}")
}
