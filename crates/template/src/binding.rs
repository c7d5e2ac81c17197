//! Token scan shared by the binding passes
//!
//! Rendering and the slot manifest both walk the same scan, so the order,
//! the indices and the limit cut-off cannot diverge between them.

use std::ops::Range;

use log::warn;
use regex::Regex;

use crate::config::RenderLimits;
use crate::tokens::SlotCounters;

/// A bindable token found in compiled HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundToken<K> {
    /// Byte range of the `{{name}}` text
    pub range: Range<usize>,
    pub kind: K,
    /// Slot index, or `None` once the bound-token limit is reached
    pub index: Option<usize>,
}

/// Scan `html` left to right, taking an index for every token of a known
/// kind until the document reaches the bound-token limit
pub fn scan<K: Copy>(
    pattern: &Regex,
    html: &str,
    counters: &mut SlotCounters,
    limits: &RenderLimits,
    classify: impl Fn(&str) -> Option<K>,
    next_index: impl Fn(&mut SlotCounters, K) -> usize,
) -> Vec<BoundToken<K>> {
    let mut tokens = Vec::new();

    for caps in pattern.captures_iter(html) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(kind) = classify(name.as_str()) else {
            continue;
        };

        let index = if counters.bound() < limits.max_bound_tokens {
            Some(next_index(counters, kind))
        } else {
            warn!("Bound token limit of {} reached", limits.max_bound_tokens);
            None
        };

        tokens.push(BoundToken {
            range: whole.range(),
            kind,
            index,
        });
    }

    tokens
}

/// Rebuild `html` with every scanned token replaced by `render`'s output
pub fn splice<K>(
    html: &str,
    tokens: &[BoundToken<K>],
    mut render: impl FnMut(&BoundToken<K>) -> String,
) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for token in tokens {
        out.push_str(&html[last..token.range.start]);
        out.push_str(&render(token));
        last = token.range.end;
    }

    out.push_str(&html[last..]);
    out
}
