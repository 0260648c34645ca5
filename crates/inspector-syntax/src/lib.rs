//! `inspector-syntax` - text addressing and CSS recovery for the inspector bridge.
//!
//! The host engine addresses script and stylesheet text by flat character
//! offsets while the debugging client speaks zero-based line/column pairs.
//! This crate holds the pure text code that sits between the two:
//!
//! - **Position**: offset ⇄ line/column conversion, either by scanning the
//!   text or through a precomputed [`LineIndex`]
//! - **CSS**: a forgiving tokenizer that recovers rulesets, media blocks and
//!   declarations (including commented-out ones) with their exact offsets
//!
//! Offsets everywhere are zero-based indices of Unicode scalar values, not
//! bytes.
//!
//! # Example
//!
//! ```
//! use inspector_syntax::css::{parse_stylesheet, CssNode};
//! use inspector_syntax::position::LineIndex;
//!
//! let text = "a {\n  color: red;\n}";
//! let nodes = parse_stylesheet(text);
//! let CssNode::Ruleset(rule) = &nodes[0] else { panic!("expected a ruleset") };
//! let decl = &rule.declarations[0];
//!
//! let index = LineIndex::new(text);
//! assert_eq!(index.offset_to_line_column(decl.original_offset), Ok((1, 2)));
//! ```

pub mod css;
pub mod position;

pub use css::{
    parse_declaration_list, parse_stylesheet, style_rulesets, CssDeclaration, CssError,
    CssMediaQuery, CssNode, CssRawText, CssRuleset,
};
pub use position::{line_column_to_offset, offset_to_line_column, LineIndex, PositionError};
