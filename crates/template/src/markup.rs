//! HTML fragments shared by the binding passes

use crate::guard::EscapeGuard;

/// Escape text for HTML content and attribute values
pub fn escape_html(text: &str) -> String {
    handlebars::html_escape(text)
}

/// Escape text that must never read as token syntax
///
/// HTML-escapes the text, drops guard markers and entity-encodes braces.
/// Used for every data value the compiler writes and for diagnostics, which
/// may quote template source.
pub fn escape_untrusted(text: &str) -> String {
    escape_html(&EscapeGuard::strip_markers(text))
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

/// Inline diagnostic shown where a token or page failed
///
/// Only the first line of the message is kept.
pub fn diagnostic(message: &str) -> String {
    let summary = message.lines().next().unwrap_or_default().trim();
    format!(
        r#"<span class="template-error" style="color: #b00020;">[Template error: {}]</span>"#,
        escape_untrusted(summary)
    )
}

/// Static, non-interactive value
pub fn static_value(class: &str, key: &str, text: &str) -> String {
    format!(
        r#"<span class="{class}" data-variable-key="{key}">{}</span>"#,
        escape_untrusted(text)
    )
}

/// Blank placeholder reserving `min_width` characters
pub fn blank_placeholder(class: &str, key: &str, min_width: usize) -> String {
    format!(
        r#"<span class="{class} binding-empty" data-variable-key="{key}" style="display: inline-block; min-width: {min_width}ch;">&nbsp;</span>"#
    )
}
