//! Custom variable binding pass
//!
//! Replaces `{{customText}}`, `{{customCurrency}}` and `{{customInteger}}`
//! in compiled HTML. Each kind has its own counter; the slot key is
//! `{kind}_{index}` where the index is the ordinal occurrence of that kind in
//! document order.

use regex::Regex;

use crate::binding::{self, BoundToken};
use crate::config::RenderLimits;
use crate::markup::{blank_placeholder, diagnostic, escape_untrusted, static_value};
use crate::tokens::{BindingSlot, SlotCounters, SlotKind, VariableKind};
use crate::{RenderMode, Result, VariableMap};

const VALUE_CLASS: &str = "custom-variable-value";

/// Binds custom-variable tokens to saved values
pub struct CustomVariableProcessor {
    pattern: Regex,
}

impl CustomVariableProcessor {
    pub fn new() -> Result<Self> {
        let names = VariableKind::ALL
            .into_iter()
            .map(|kind| regex::escape(kind.token_name()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            pattern: Regex::new(&format!(r"\{{\{{({names})\}}\}}"))?,
        })
    }

    /// Replace every custom-variable token in `html`
    pub fn process(
        &self,
        html: &str,
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

            let key = VariableMap::key(token.kind.token_name(), index);
            let saved = variables.display(&key);

            match mode {
                RenderMode::Edit => edit_control(token.kind, &key, saved.as_deref()),
                RenderMode::View => view_value(token.kind, &key, saved.as_deref()),
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
                        key: VariableMap::key(token.kind.token_name(), index),
                        kind: SlotKind::Variable(token.kind),
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
    ) -> Vec<BoundToken<VariableKind>> {
        binding::scan(
            &self.pattern,
            html,
            counters,
            limits,
            VariableKind::from_token_name,
            SlotCounters::next_variable,
        )
    }
}

/// Inline input seeded with the saved value
fn edit_control(kind: VariableKind, key: &str, saved: Option<&str>) -> String {
    let value = saved.unwrap_or_default();
    let width = (value.chars().count() + 1).max(kind.min_width());
    let input_attrs = match kind {
        VariableKind::Text => r#"type="text""#,
        VariableKind::Currency => r#"type="text" inputmode="decimal""#,
        VariableKind::Integer => r#"type="number" step="1" inputmode="numeric""#,
    };

    format!(
        r#"<input {input_attrs} class="custom-variable custom-variable-{kind}" data-variable-key="{key}" data-variable-kind="{kind}" value="{value}" style="width: {width}ch; min-width: {min}ch;" />"#,
        kind = kind.as_str(),
        value = escape_untrusted(value),
        min = kind.min_width(),
    )
}

/// Static saved value, or a blank placeholder of the kind's minimum width
fn view_value(kind: VariableKind, key: &str, saved: Option<&str>) -> String {
    match saved {
        Some(text) => static_value(VALUE_CLASS, key, text),
        None => blank_placeholder(VALUE_CLASS, key, kind.min_width()),
    }
}
