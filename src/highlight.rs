//! Highlight configuration for Sindarin sources.

use anyhow::{Context, Result};
use tree_sitter::Language;
use tree_sitter_highlight::HighlightConfiguration;

/// Capture names recognised by [`highlight_config`], in highlight-index order.
///
/// Captures in the query are matched by prefix, so `@type.builtin` resolves to
/// `type` and `@string.escape` to `string`.
pub const HIGHLIGHT_CAPTURES: &[&str] = &[
    "attribute",
    "comment",
    "constant",
    "function",
    "keyword",
    "number",
    "operator",
    "property",
    "string",
    "type",
    "variable",
];

/// Highlight category names used by hosts to pick a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightCategory {
    Attribute,
    Comment,
    Constant,
    Function,
    Keyword,
    Number,
    Operator,
    Property,
    String,
    Type,
    Variable,
}

impl HighlightCategory {
    /// Map a highlight index (a position in [`HIGHLIGHT_CAPTURES`]) to a category
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Attribute),
            1 => Some(Self::Comment),
            2 => Some(Self::Constant),
            3 => Some(Self::Function),
            4 => Some(Self::Keyword),
            5 => Some(Self::Number),
            6 => Some(Self::Operator),
            7 => Some(Self::Property),
            8 => Some(Self::String),
            9 => Some(Self::Type),
            10 => Some(Self::Variable),
            _ => None,
        }
    }

    pub fn capture_name(&self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Comment => "comment",
            Self::Constant => "constant",
            Self::Function => "function",
            Self::Keyword => "keyword",
            Self::Number => "number",
            Self::Operator => "operator",
            Self::Property => "property",
            Self::String => "string",
            Self::Type => "type",
            Self::Variable => "variable",
        }
    }
}

/// Build a highlight configuration for `language` from the bundled highlights query.
pub fn highlight_config(language: Language) -> Result<HighlightConfiguration> {
    let mut config =
        HighlightConfiguration::new(language, crate::NAME, crate::HIGHLIGHTS_QUERY, "", "")
            .context("Failed to create Sindarin highlight config")?;
    config.configure(HIGHLIGHT_CAPTURES);
    tracing::debug!(
        "Configured Sindarin highlighting with {} captures",
        config.names().len()
    );
    Ok(config)
}
