//! Recovering CSS tokenizer.
//!
//! The parser does not validate CSS. It splits stylesheet text into rulesets,
//! `@media` blocks and declarations while remembering where each record
//! starts and ends, so that edits addressed by line/column can be spliced
//! back into the original text. Commented-out declarations (the way devtools
//! clients disable a property) are recovered as disabled declarations.
//!
//! - [`parse_stylesheet`]: full stylesheet text
//! - [`parse_declaration_list`]: the body of an inline `style` attribute

mod parser;

use thiserror::Error;

pub use parser::{parse_declaration_list, parse_stylesheet};

/// Declaration list parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CssError {
    /// The text closes a block that was never opened, so it is not a bare
    /// declaration list.
    #[error("unexpected block at offset {offset} in declaration list")]
    NotADeclarationList { offset: usize },
}

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssDeclaration {
    pub original_offset: usize,
    /// One past the last character, including the `;` when present.
    pub end_offset: usize,
    pub property: String,
    pub value: String,
    pub missing_semicolon: bool,
    /// The declaration was recovered from a comment.
    pub disabled: bool,
    /// The whole comment text for disabled declarations.
    pub disabled_full_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRuleset {
    pub original_offset: usize,
    /// One past the closing brace.
    pub end_offset: usize,
    /// Raw selector text up to the opening brace.
    pub selector: String,
    pub declarations: Vec<CssDeclaration>,
}

impl CssRuleset {
    /// Offset of the first character after the opening brace.
    ///
    /// Only meaningful for rulesets read from a stylesheet; a declaration
    /// list has no braces and its body is the whole text.
    #[must_use]
    pub fn body_start(&self) -> usize {
        self.original_offset + self.selector.chars().count() + 1
    }

    /// Offset of the closing brace.
    #[must_use]
    pub fn body_end(&self) -> usize {
        self.end_offset.saturating_sub(1).max(self.body_start())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssMediaQuery {
    pub original_offset: usize,
    pub end_offset: usize,
    /// Text from `@media` up to the opening brace.
    pub query: String,
    pub rulesets: Vec<CssRuleset>,
}

/// Unclosed trailing text that could not be attributed to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRawText {
    pub original_offset: usize,
    pub end_offset: usize,
    pub text: String,
}

/// Top-level stylesheet record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssNode {
    Ruleset(CssRuleset),
    MediaQuery(CssMediaQuery),
    Raw(CssRawText),
}

impl CssNode {
    #[must_use]
    pub fn original_offset(&self) -> usize {
        match self {
            CssNode::Ruleset(rule) => rule.original_offset,
            CssNode::MediaQuery(media) => media.original_offset,
            CssNode::Raw(raw) => raw.original_offset,
        }
    }

    #[must_use]
    pub fn end_offset(&self) -> usize {
        match self {
            CssNode::Ruleset(rule) => rule.end_offset,
            CssNode::MediaQuery(media) => media.end_offset,
            CssNode::Raw(raw) => raw.end_offset,
        }
    }

    /// Style rules held by this node in document order.
    pub fn rulesets(&self) -> impl Iterator<Item = &CssRuleset> {
        let (single, nested): (Option<&CssRuleset>, &[CssRuleset]) = match self {
            CssNode::Ruleset(rule) => (Some(rule), &[]),
            CssNode::MediaQuery(media) => (None, media.rulesets.as_slice()),
            CssNode::Raw(_) => (None, &[]),
        };
        single.into_iter().chain(nested.iter())
    }
}

/// Every style rule of a parsed stylesheet, media children inlined.
pub fn style_rulesets(nodes: &[CssNode]) -> impl Iterator<Item = &CssRuleset> {
    nodes.iter().flat_map(CssNode::rulesets)
}
