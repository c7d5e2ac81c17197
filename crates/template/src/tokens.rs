//! Token vocabulary, tag scanning and document-wide slot counters

use serde::{Deserialize, Serialize};

/// Prefix of persisted line-item keys (`lineItem_{index}`)
pub const LINE_ITEM_KEY_PREFIX: &str = "lineItem";

/// Custom variable kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Text,
    Currency,
    Integer,
}

impl VariableKind {
    pub const ALL: [VariableKind; 3] = [
        VariableKind::Text,
        VariableKind::Currency,
        VariableKind::Integer,
    ];

    /// Token name, also the persisted key prefix
    pub fn token_name(self) -> &'static str {
        match self {
            VariableKind::Text => "customText",
            VariableKind::Currency => "customCurrency",
            VariableKind::Integer => "customInteger",
        }
    }

    pub fn from_token_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.token_name() == name)
    }

    /// Minimum control width in `ch`
    pub fn min_width(self) -> usize {
        match self {
            VariableKind::Text => 12,
            VariableKind::Currency => 8,
            VariableKind::Integer => 4,
        }
    }

    /// Lowercase name used in CSS classes and data attributes
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Text => "text",
            VariableKind::Currency => "currency",
            VariableKind::Integer => "integer",
        }
    }
}

/// The eight cost categories of an estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LineItemCategory {
    Labor,
    Equipment,
    Material,
    Tools,
    Overhead,
    Subcontractor,
    Disposal,
    Miscellaneous,
}

impl LineItemCategory {
    pub const ALL: [LineItemCategory; 8] = [
        LineItemCategory::Labor,
        LineItemCategory::Equipment,
        LineItemCategory::Material,
        LineItemCategory::Tools,
        LineItemCategory::Overhead,
        LineItemCategory::Subcontractor,
        LineItemCategory::Disposal,
        LineItemCategory::Miscellaneous,
    ];

    /// Collection name under `lineItems`
    pub fn key(self) -> &'static str {
        match self {
            LineItemCategory::Labor => "labor",
            LineItemCategory::Equipment => "equipment",
            LineItemCategory::Material => "material",
            LineItemCategory::Tools => "tools",
            LineItemCategory::Overhead => "overhead",
            LineItemCategory::Subcontractor => "subcontractor",
            LineItemCategory::Disposal => "disposal",
            LineItemCategory::Miscellaneous => "miscellaneous",
        }
    }

    /// Template token name (e.g. `lineItemLabor`)
    pub fn token_name(self) -> &'static str {
        match self {
            LineItemCategory::Labor => "lineItemLabor",
            LineItemCategory::Equipment => "lineItemEquipment",
            LineItemCategory::Material => "lineItemMaterial",
            LineItemCategory::Tools => "lineItemTools",
            LineItemCategory::Overhead => "lineItemOverhead",
            LineItemCategory::Subcontractor => "lineItemSubcontractor",
            LineItemCategory::Disposal => "lineItemDisposal",
            LineItemCategory::Miscellaneous => "lineItemMiscellaneous",
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            LineItemCategory::Labor => "Labor",
            LineItemCategory::Equipment => "Equipment",
            LineItemCategory::Material => "Material",
            LineItemCategory::Tools => "Tools",
            LineItemCategory::Overhead => "Overhead",
            LineItemCategory::Subcontractor => "Subcontractor",
            LineItemCategory::Disposal => "Disposal",
            LineItemCategory::Miscellaneous => "Miscellaneous",
        }
    }

    pub fn from_token_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token_name() == name)
    }
}

/// Every token name the general compiler must not interpret
pub fn protected_names() -> impl Iterator<Item = &'static str> {
    VariableKind::ALL
        .into_iter()
        .map(VariableKind::token_name)
        .chain(LineItemCategory::ALL.into_iter().map(LineItemCategory::token_name))
}

/// Check whether a name belongs to the protected vocabulary
pub fn is_protected(name: &str) -> bool {
    protected_names().any(|n| n == name)
}

/// What a bound slot holds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SlotKind {
    Variable(VariableKind),
    LineItem(LineItemCategory),
}

/// A bound slot in document order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindingSlot {
    /// Persisted key (`customText_0`, `lineItem_2`, ...)
    pub key: String,

    pub kind: SlotKind,

    /// Zero-based page index
    pub page: usize,
}

/// Positional counters for one document render
///
/// One counter per custom variable kind and a single counter shared by all
/// line-item categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCounters {
    text: usize,
    currency: usize,
    integer: usize,
    line_item: usize,
}

impl SlotCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next index for a custom variable kind
    pub fn next_variable(&mut self, kind: VariableKind) -> usize {
        let counter = match kind {
            VariableKind::Text => &mut self.text,
            VariableKind::Currency => &mut self.currency,
            VariableKind::Integer => &mut self.integer,
        };
        let index = *counter;
        *counter += 1;
        index
    }

    /// Take the next shared line-item index
    pub fn next_line_item(&mut self) -> usize {
        let index = self.line_item;
        self.line_item += 1;
        index
    }

    /// Number of slots bound so far
    pub fn bound(&self) -> usize {
        self.text + self.currency + self.integer + self.line_item
    }
}

/// A classified `{{...}}` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Path into the context (`{{customerName}}`)
    Data { path: &'a str },
    /// Helper call with arguments (`{{formatCurrency total}}`)
    Helper { name: &'a str, args: &'a str },
    CustomVariable(VariableKind),
    LineItem(LineItemCategory),
    BlockOpen { name: &'a str },
    BlockClose { name: &'a str },
    Else,
    Comment,
    /// `{{` without a closing delimiter
    Unterminated,
}

impl<'a> Token<'a> {
    /// Classify the text between the braces of a tag
    pub fn classify(inner: &'a str) -> Self {
        let inner = inner.trim_matches('~').trim();

        if inner.starts_with('!') {
            return Token::Comment;
        }
        if let Some(rest) = inner.strip_prefix('#') {
            return Token::BlockOpen {
                name: first_word(rest.trim_start_matches(|c: char| c == '>' || c == '*')),
            };
        }
        if let Some(rest) = inner.strip_prefix('^') {
            let rest = rest.trim();
            return if rest.is_empty() {
                Token::Else
            } else {
                Token::BlockOpen {
                    name: first_word(rest),
                }
            };
        }
        if let Some(rest) = inner.strip_prefix('/') {
            return Token::BlockClose {
                name: first_word(rest),
            };
        }

        let name = first_word(inner);
        let args = inner[name.len()..].trim();

        if name == "else" {
            return Token::Else;
        }
        if args.is_empty() {
            if let Some(kind) = VariableKind::from_token_name(name) {
                return Token::CustomVariable(kind);
            }
            if let Some(category) = LineItemCategory::from_token_name(name) {
                return Token::LineItem(category);
            }
            return Token::Data { path: name };
        }

        Token::Helper { name, args }
    }
}

fn first_word(text: &str) -> &str {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    &text[..end]
}

/// A tag located in template source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedToken<'a> {
    /// Byte offset of the opening `{{`
    pub start: usize,
    /// Byte offset just past the closing delimiter
    pub end: usize,
    pub token: Token<'a>,
}

/// Scan template source for tags, left to right
///
/// Backslash-escaped `\{{` is literal text and skipped. Scanning stops at
/// the first unterminated tag.
pub fn scan_tokens(source: &str) -> Vec<ScannedToken<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(offset) = source[pos..].find("{{") {
        let start = pos + offset;

        if start > 0 && source.as_bytes()[start - 1] == b'\\' {
            pos = start + 2;
            continue;
        }

        let rest = &source[start..];
        let (open_len, close) = if rest.starts_with("{{!--") {
            (5, "--}}")
        } else if rest.starts_with("{{{") {
            (3, "}}}")
        } else {
            (2, "}}")
        };

        let Some(close_offset) = source[start + open_len..].find(close) else {
            tokens.push(ScannedToken {
                start,
                end: source.len(),
                token: Token::Unterminated,
            });
            break;
        };

        let inner_end = start + open_len + close_offset;
        let end = inner_end + close.len();
        let token = if open_len == 5 {
            Token::Comment
        } else {
            Token::classify(&source[start + open_len..inner_end])
        };

        tokens.push(ScannedToken { start, end, token });
        pos = end;
    }

    tokens
}
