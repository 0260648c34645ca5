//! Character-level state machine behind the CSS entry points.
//!
//! Each character is offered to the handlers in a fixed order; the first one
//! that claims it wins:
//! - handle_quote: string runs and escapes
//! - handle_comment: comments and disabled declarations
//! - handle_leading_whitespace: advance the checkpoint over blanks
//! - handle_media_start / handle_media_open / handle_media_close
//! - handle_statement_end: top-level `@import ...;` style statements
//! - handle_selector_open: `selector {`
//! - handle_property_colon: `property:`
//! - handle_value_semicolon_or_close: `value;` and the `}` ending a ruleset

use super::{CssDeclaration, CssError, CssMediaQuery, CssNode, CssRawText, CssRuleset};

const MEDIA_KEYWORD: &str = "@media ";

type Handler = fn(&mut CssParser) -> bool;

const HANDLERS: [Handler; 10] = [
    CssParser::handle_quote,
    CssParser::handle_comment,
    CssParser::handle_leading_whitespace,
    CssParser::handle_media_start,
    CssParser::handle_media_open,
    CssParser::handle_media_close,
    CssParser::handle_statement_end,
    CssParser::handle_selector_open,
    CssParser::handle_property_colon,
    CssParser::handle_value_semicolon_or_close,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenState {
    Selector,
    Media,
    Property,
    Value,
}

/// Declaration whose property has been read but whose value is still open.
#[derive(Debug)]
struct PendingDeclaration {
    original_offset: usize,
    property: String,
}

struct CssParser {
    text: Vec<char>,
    index: usize,
    checkpoint: usize,
    state: TokenState,
    quote: Option<char>,
    escaped: bool,
    roots: Vec<CssNode>,
    media: Option<CssMediaQuery>,
    ruleset: Option<CssRuleset>,
    declaration: Option<PendingDeclaration>,
}

/// Split stylesheet text into top-level records.
///
/// Never fails: text that never closes its block is returned as a trailing
/// [`CssNode::Raw`] record.
#[must_use]
pub fn parse_stylesheet(text: &str) -> Vec<CssNode> {
    let mut parser = CssParser::new(text, TokenState::Selector);
    parser.run();
    parser.finish_stylesheet()
}

/// Parse the declarations of an inline style attribute.
///
/// The result is a ruleset with an empty selector spanning the whole text.
pub fn parse_declaration_list(text: &str) -> Result<CssRuleset, CssError> {
    let mut parser = CssParser::new(text, TokenState::Property);
    parser.ruleset = Some(CssRuleset {
        original_offset: 0,
        end_offset: 0,
        selector: String::new(),
        declarations: Vec::new(),
    });
    parser.run();
    parser.finish_declaration_list()
}

impl CssParser {
    fn new(text: &str, state: TokenState) -> Self {
        Self {
            text: text.chars().collect(),
            index: 0,
            checkpoint: 0,
            state,
            quote: None,
            escaped: false,
            roots: Vec::new(),
            media: None,
            ruleset: None,
            declaration: None,
        }
    }

    fn run(&mut self) {
        while self.index < self.text.len() {
            for handler in HANDLERS {
                if handler(self) {
                    break;
                }
            }
            self.index += 1;
        }
    }

    fn current(&self) -> char {
        self.text[self.index]
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.text[start..end].iter().collect()
    }

    fn is_blank(&self, start: usize, end: usize) -> bool {
        start >= end
            || self.text[start..end].iter().all(|ch| ch.is_whitespace())
    }

    fn trim_end(&self, start: usize, end: usize) -> usize {
        let mut end = end;
        while end > start && self.text[end - 1].is_whitespace() {
            end -= 1;
        }
        end
    }

    fn starts_with_at(&self, at: usize, pattern: &str) -> bool {
        let mut position = at;
        for expected in pattern.chars() {
            match self.text.get(position) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => position += 1,
                _ => return false,
            }
        }
        true
    }

    fn find_from(&self, from: usize, pattern: &str) -> Option<usize> {
        (from..self.text.len()).find(|&at| self.starts_with_at(at, pattern))
    }

    fn find_char(&self, from: usize, to: usize, target: char) -> Option<usize> {
        (from..to).find(|&at| self.text[at] == target)
    }

    fn handle_quote(&mut self) -> bool {
        let ch = self.current();
        if let Some(mark) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == mark {
                self.quote = None;
            }
            return true;
        }
        if ch == '"' || ch == '\'' {
            self.quote = Some(ch);
            return true;
        }
        false
    }

    fn handle_comment(&mut self) -> bool {
        if !self.starts_with_at(self.index, "/*") {
            return false;
        }
        let start = self.index;
        let body_start = start + 2;
        let (body_end, end) = match self.find_from(body_start, "*/") {
            Some(close) => (close, close + 2),
            None => (self.text.len(), self.text.len()),
        };
        let at_checkpoint = self.is_blank(self.checkpoint, start);

        if at_checkpoint && self.state == TokenState::Property {
            if let Some(colon) = self.find_char(body_start, body_end, ':') {
                let value_end = self
                    .find_char(colon + 1, body_end, ';')
                    .unwrap_or(body_end);
                let declaration = CssDeclaration {
                    original_offset: start,
                    end_offset: end,
                    property: self.slice(body_start, colon).trim_start().to_string(),
                    value: self.slice(colon + 1, value_end),
                    missing_semicolon: false,
                    disabled: true,
                    disabled_full_text: Some(self.slice(start, end)),
                };
                if let Some(ruleset) = self.ruleset.as_mut() {
                    ruleset.declarations.push(declaration);
                }
            }
        }
        if at_checkpoint && self.state != TokenState::Value {
            self.checkpoint = end;
        }
        self.index = end - 1;
        true
    }

    fn handle_leading_whitespace(&mut self) -> bool {
        if self.state != TokenState::Value
            && self.checkpoint == self.index
            && self.current().is_whitespace()
        {
            self.checkpoint += 1;
            return true;
        }
        false
    }

    fn handle_media_start(&mut self) -> bool {
        if self.state == TokenState::Selector
            && self.media.is_none()
            && self.checkpoint == self.index
            && self.starts_with_at(self.index, MEDIA_KEYWORD)
        {
            self.state = TokenState::Media;
            return true;
        }
        false
    }

    fn handle_media_open(&mut self) -> bool {
        if self.state != TokenState::Media || self.current() != '{' {
            return false;
        }
        self.media = Some(CssMediaQuery {
            original_offset: self.checkpoint,
            end_offset: self.checkpoint,
            query: self.slice(self.checkpoint, self.index),
            rulesets: Vec::new(),
        });
        self.checkpoint = self.index + 1;
        self.state = TokenState::Selector;
        true
    }

    fn handle_media_close(&mut self) -> bool {
        if self.state != TokenState::Selector || self.current() != '}' {
            return false;
        }
        let Some(mut media) = self.media.take() else {
            return false;
        };
        media.end_offset = self.index + 1;
        self.roots.push(CssNode::MediaQuery(media));
        self.checkpoint = self.index + 1;
        true
    }

    /// A top-level `;` ends a statement at-rule; it is kept as raw text.
    fn handle_statement_end(&mut self) -> bool {
        if self.state != TokenState::Selector || self.media.is_some() || self.current() != ';' {
            return false;
        }
        let end = self.index + 1;
        self.roots.push(CssNode::Raw(CssRawText {
            original_offset: self.checkpoint,
            end_offset: end,
            text: self.slice(self.checkpoint, end),
        }));
        self.checkpoint = end;
        true
    }

    fn handle_selector_open(&mut self) -> bool {
        if self.state != TokenState::Selector || self.current() != '{' {
            return false;
        }
        self.ruleset = Some(CssRuleset {
            original_offset: self.checkpoint,
            end_offset: self.checkpoint,
            selector: self.slice(self.checkpoint, self.index),
            declarations: Vec::new(),
        });
        self.checkpoint = self.index + 1;
        self.state = TokenState::Property;
        true
    }

    fn handle_property_colon(&mut self) -> bool {
        if self.state != TokenState::Property || self.current() != ':' {
            return false;
        }
        self.declaration = Some(PendingDeclaration {
            original_offset: self.checkpoint,
            property: self.slice(self.checkpoint, self.index),
        });
        self.checkpoint = self.index + 1;
        self.state = TokenState::Value;
        true
    }

    fn handle_value_semicolon_or_close(&mut self) -> bool {
        match (self.state, self.current()) {
            (TokenState::Value, ';') => {
                self.close_declaration(self.index, self.index + 1, false);
                self.checkpoint = self.index + 1;
                self.state = TokenState::Property;
                true
            }
            (TokenState::Value, '}') => {
                let end = self.trim_end(self.checkpoint, self.index);
                self.close_declaration(end, end, true);
                self.close_ruleset();
                true
            }
            (TokenState::Property, '}') => {
                self.close_incomplete_property(self.index);
                self.close_ruleset();
                true
            }
            _ => false,
        }
    }

    /// Close the pending declaration with a value ending at `value_end`.
    fn close_declaration(&mut self, value_end: usize, end_offset: usize, missing_semicolon: bool) {
        let Some(pending) = self.declaration.take() else {
            return;
        };
        let declaration = CssDeclaration {
            original_offset: pending.original_offset,
            end_offset,
            property: pending.property,
            value: self.slice(self.checkpoint, value_end),
            missing_semicolon,
            disabled: false,
            disabled_full_text: None,
        };
        if let Some(ruleset) = self.ruleset.as_mut() {
            ruleset.declarations.push(declaration);
        }
    }

    /// Text in Property state without a colon becomes a declaration with an
    /// empty value.
    fn close_incomplete_property(&mut self, end: usize) {
        if self.is_blank(self.checkpoint, end) {
            return;
        }
        let end = self.trim_end(self.checkpoint, end);
        let declaration = CssDeclaration {
            original_offset: self.checkpoint,
            end_offset: end,
            property: self.slice(self.checkpoint, end),
            value: String::new(),
            missing_semicolon: true,
            disabled: false,
            disabled_full_text: None,
        };
        if let Some(ruleset) = self.ruleset.as_mut() {
            ruleset.declarations.push(declaration);
        }
    }

    fn close_ruleset(&mut self) {
        if let Some(mut ruleset) = self.ruleset.take() {
            ruleset.end_offset = self.index + 1;
            match self.media.as_mut() {
                Some(media) => media.rulesets.push(ruleset),
                None => self.roots.push(CssNode::Ruleset(ruleset)),
            }
        }
        self.checkpoint = self.index + 1;
        self.state = TokenState::Selector;
    }

    fn finish_stylesheet(mut self) -> Vec<CssNode> {
        let start = if let Some(media) = &self.media {
            media.original_offset
        } else if let Some(ruleset) = &self.ruleset {
            ruleset.original_offset
        } else {
            self.checkpoint
        };
        let len = self.text.len();
        if start < len && !self.is_blank(start, len) {
            let raw = CssRawText {
                original_offset: start,
                end_offset: len,
                text: self.slice(start, len),
            };
            self.roots.push(CssNode::Raw(raw));
        }
        self.roots
    }

    fn finish_declaration_list(mut self) -> Result<CssRuleset, CssError> {
        if let Some(node) = self.roots.first() {
            return Err(CssError::NotADeclarationList {
                offset: node.original_offset(),
            });
        }
        let len = self.text.len();
        match self.state {
            TokenState::Value => {
                let end = self.trim_end(self.checkpoint, len);
                self.close_declaration(end, end, true);
            }
            TokenState::Property => self.close_incomplete_property(len),
            TokenState::Selector | TokenState::Media => {}
        }
        let mut ruleset = self.ruleset.take().ok_or(CssError::NotADeclarationList {
            offset: self.checkpoint,
        })?;
        ruleset.end_offset = len;
        Ok(ruleset)
    }
}
