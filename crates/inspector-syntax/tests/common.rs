//! Shared helpers for CSS parser tests.
#![allow(dead_code)]

use inspector_syntax::css::{CssDeclaration, CssNode, CssRuleset};

/// Render parsed records one per line with their offset ranges.
pub fn render_nodes(nodes: &[CssNode]) -> String {
    let mut output = String::new();
    for node in nodes {
        match node {
            CssNode::Ruleset(rule) => render_ruleset(rule, &mut output, 0),
            CssNode::MediaQuery(media) => {
                output.push_str(&format!(
                    "media {}..{} {:?}\n",
                    media.original_offset, media.end_offset, media.query
                ));
                for rule in &media.rulesets {
                    render_ruleset(rule, &mut output, 1);
                }
            }
            CssNode::Raw(raw) => {
                output.push_str(&format!(
                    "raw {}..{} {:?}\n",
                    raw.original_offset, raw.end_offset, raw.text
                ));
            }
        }
    }
    output
}

pub fn render_ruleset(rule: &CssRuleset, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!(
        "{indent}ruleset {}..{} {:?}\n",
        rule.original_offset, rule.end_offset, rule.selector
    ));
    for declaration in &rule.declarations {
        out.push_str(&format!("{indent}  {}\n", render_declaration(declaration)));
    }
}

pub fn render_declaration(declaration: &CssDeclaration) -> String {
    let mut line = format!(
        "decl {}..{} {:?}: {:?}",
        declaration.original_offset,
        declaration.end_offset,
        declaration.property,
        declaration.value
    );
    if declaration.missing_semicolon {
        line.push_str(" missing-semicolon");
    }
    if declaration.disabled {
        line.push_str(" disabled");
    }
    if let Some(full) = &declaration.disabled_full_text {
        line.push_str(&format!(" {full:?}"));
    }
    line
}

/// Remove every `/* ... */` run, including an unterminated trailing one.
pub fn strip_comments(text: &str) -> String {
    let mut output = String::new();
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        output.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(close) => rest = &rest[start + 2 + close + 2..],
            None => rest = "",
        }
    }
    output.push_str(rest);
    output
}
