mod common;
use common::*;

use expect_test::expect;
use inspector_syntax::css::{
    parse_declaration_list, parse_stylesheet, style_rulesets, CssError, CssNode,
};

#[test]
fn test_simple_ruleset() {
    let nodes = parse_stylesheet("a { color: red; }");
    assert_eq!(nodes.len(), 1);
    let CssNode::Ruleset(rule) = &nodes[0] else {
        panic!("expected ruleset, got {nodes:?}");
    };
    assert_eq!(rule.selector, "a ");
    assert_eq!(rule.declarations.len(), 1);
    let declaration = &rule.declarations[0];
    assert_eq!(declaration.property, "color");
    assert_eq!(declaration.value, " red");
    assert!(!declaration.missing_semicolon);
    assert!(!declaration.disabled);

    expect![[r#"
        ruleset 0..17 "a "
          decl 4..15 "color": " red"
    "#]]
    .assert_eq(&render_nodes(&nodes));
}

#[test]
fn test_missing_semicolon_before_brace() {
    let nodes = parse_stylesheet("a { color: red }");
    let CssNode::Ruleset(rule) = &nodes[0] else {
        panic!("expected ruleset");
    };
    let declaration = &rule.declarations[0];
    assert_eq!(declaration.property, "color");
    assert_eq!(declaration.value, " red");
    assert!(declaration.missing_semicolon);
    assert_eq!(declaration.end_offset, 14);
    assert_eq!(rule.end_offset, 16);
}

#[test]
fn test_commented_declaration_is_disabled() {
    let nodes = parse_stylesheet("a { /*color:red;*/ }");
    expect![[r#"
        ruleset 0..20 "a "
          decl 4..18 "color": "red" disabled "/*color:red;*/"
    "#]]
    .assert_eq(&render_nodes(&nodes));
}

#[test]
fn test_plain_comment_is_skipped() {
    let nodes = parse_stylesheet("/* header */\na { /* note */ top: 0; }");
    let CssNode::Ruleset(rule) = &nodes[0] else {
        panic!("expected ruleset");
    };
    assert_eq!(rule.selector, "a ");
    assert_eq!(rule.declarations.len(), 1);
    assert_eq!(rule.declarations[0].property, "top");
    assert!(!rule.declarations[0].disabled);
}

#[test]
fn test_media_block() {
    let nodes = parse_stylesheet("@media screen { p { margin: 0 } }\nq {}");
    expect![[r#"
        media 0..33 "@media screen "
          ruleset 16..31 "p "
            decl 20..29 "margin": " 0" missing-semicolon
        ruleset 34..38 "q "
    "#]]
    .assert_eq(&render_nodes(&nodes));

    let selectors: Vec<_> = style_rulesets(&nodes)
        .map(|rule| rule.selector.as_str())
        .collect();
    assert_eq!(selectors, vec!["p ", "q "]);
}

#[test]
fn test_quotes_suppress_delimiters() {
    let nodes = parse_stylesheet(r#"a[title="x{y}"] { content: "a;b"; }"#);
    expect![[r#"
        ruleset 0..35 "a[title=\"x{y}\"] "
          decl 18..33 "content": " \"a;b\""
    "#]]
    .assert_eq(&render_nodes(&nodes));
}

#[test]
fn test_statement_at_rules_stay_out_of_selectors() {
    let nodes = parse_stylesheet("@charset \"utf-8\";\n@import url(x.css);\nbody { }");
    expect![[r#"
        raw 0..17 "@charset \"utf-8\";"
        raw 18..37 "@import url(x.css);"
        ruleset 38..46 "body "
    "#]]
    .assert_eq(&render_nodes(&nodes));
}

#[test]
fn test_unclosed_ruleset_becomes_raw_text() {
    let nodes = parse_stylesheet("a { color: red; }\nb { color");
    expect![[r#"
        ruleset 0..17 "a "
          decl 4..15 "color": " red"
        raw 18..27 "b { color"
    "#]]
    .assert_eq(&render_nodes(&nodes));
}

#[test]
fn test_unclosed_media_is_raw_from_media_start() {
    let text = "@media print { a { top: 0; }";
    let nodes = parse_stylesheet(text);
    assert_eq!(nodes.len(), 1);
    let CssNode::Raw(raw) = &nodes[0] else {
        panic!("expected raw text, got {nodes:?}");
    };
    assert_eq!(raw.original_offset, 0);
    assert_eq!(raw.text, text);
}

#[test]
fn test_trailing_whitespace_is_not_raw_text() {
    let nodes = parse_stylesheet("a {}\n\n   ");
    assert_eq!(nodes.len(), 1);
    assert!(matches!(nodes[0], CssNode::Ruleset(_)));
}

#[test]
fn test_property_without_colon_closes_with_empty_value() {
    let nodes = parse_stylesheet("a { color: red; bogus }");
    let CssNode::Ruleset(rule) = &nodes[0] else {
        panic!("expected ruleset");
    };
    let last = &rule.declarations[1];
    assert_eq!(last.property, "bogus");
    assert_eq!(last.value, "");
    assert_eq!((last.original_offset, last.end_offset), (16, 21));
}

#[test]
fn test_records_cover_input_without_overlap() {
    let text = "/* top */ a { color: red; }\n@media (max-width: 10px) {\n  b { x: y }\n}\nc {\n  /* d: e; */\n  f: g\n}\n";
    let nodes = parse_stylesheet(text);
    let chars: Vec<char> = text.chars().collect();

    let mut previous_end = 0;
    for node in &nodes {
        assert!(node.original_offset() >= previous_end, "overlap at {node:?}");
        let gap: String = chars[previous_end..node.original_offset()].iter().collect();
        assert!(
            strip_comments(&gap).trim().is_empty(),
            "uncovered text {gap:?}"
        );
        previous_end = node.end_offset();
    }
    let tail: String = chars[previous_end..].iter().collect();
    assert!(strip_comments(&tail).trim().is_empty());

    for rule in style_rulesets(&nodes) {
        let mut previous = rule.body_start();
        for declaration in &rule.declarations {
            assert!(declaration.original_offset >= previous);
            assert!(declaration.end_offset <= rule.body_end());
            previous = declaration.end_offset;
        }
    }
}

#[test]
fn test_declaration_list() {
    let rule = parse_declaration_list("color: red; background: blue").unwrap();
    assert_eq!(rule.selector, "");
    assert_eq!(rule.original_offset, 0);
    assert_eq!(rule.end_offset, 28);
    let rendered: Vec<_> = rule.declarations.iter().map(render_declaration).collect();
    assert_eq!(
        rendered,
        vec![
            r#"decl 0..11 "color": " red""#.to_string(),
            r#"decl 12..28 "background": " blue" missing-semicolon"#.to_string(),
        ]
    );
}

#[test]
fn test_declaration_list_with_disabled_entry() {
    let rule = parse_declaration_list("/* top: 1px; */ left: 0;").unwrap();
    assert_eq!(rule.declarations.len(), 2);
    assert!(rule.declarations[0].disabled);
    assert_eq!(rule.declarations[0].property, "top");
    assert_eq!(rule.declarations[0].value, " 1px");
    assert_eq!(rule.declarations[1].property, "left");
}

#[test]
fn test_declaration_list_rejects_stray_brace() {
    assert_eq!(
        parse_declaration_list("color: red; } x"),
        Err(CssError::NotADeclarationList { offset: 0 })
    );
}
