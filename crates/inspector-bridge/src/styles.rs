//! CSS domain state: stylesheet ids, text snapshots and style queries.
//!
//! Every stylesheet and every inline `style` attribute the client sees gets
//! a string id backed by [`IdentityRegistry`]. The text is captured when the
//! id is minted and that snapshot stays authoritative: client ranges always
//! refer to text the bridge sent, even after the host re-serializes a sheet
//! following an edit.

use inspector_syntax::css::{
    parse_declaration_list, parse_stylesheet, style_rulesets, CssMediaQuery, CssNode, CssRuleset,
};
use inspector_syntax::position::LineIndex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, warn};

use crate::dom::{DocumentObserver, DomAgent, MAIN_FRAME_ID};
use crate::error::{BridgeError, IdKind};
use crate::host::{HostRuleRef, NodeHandle, PageHost, SheetHandle};
use crate::protocol::{
    ComputedProperty, CssMedia, CssProperty, CssRule, CssStyle, InheritedStyleEntry,
    MatchedStylesResult, Notification, RuleMatch, SelectorList, SelectorValue,
    SetPropertyTextParams, SourceRange, StyleSheetAddedParams, StyleSheetHeader,
    StyleSheetIdParams, StyleSheetOrigin,
};
use crate::registry::IdentityRegistry;

const IMPORTANT: &str = "!important";

/// What a stylesheet id stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleSource {
    Sheet(SheetHandle),
    Inline(NodeHandle),
}

/// Parsed view of one text snapshot.
struct SheetView {
    chars: Vec<char>,
    nodes: Vec<CssNode>,
    lines: LineIndex,
}

impl SheetView {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            nodes: parse_stylesheet(text),
            lines: LineIndex::new(text),
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start.min(end)..end.min(self.chars.len())]
            .iter()
            .collect()
    }

    /// The `ordinal`-th style rule and its enclosing media block.
    fn rule(&self, ordinal: usize) -> Option<(&CssRuleset, Option<&CssMediaQuery>)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                let media = match node {
                    CssNode::MediaQuery(media) => Some(media),
                    _ => None,
                };
                node.rulesets().map(move |rule| (rule, media))
            })
            .nth(ordinal)
    }
}

#[derive(Debug, Default)]
pub struct StyleAgent {
    sources: IdentityRegistry<StyleSource>,
    snapshots: FxHashMap<u32, String>,
    /// Frame id per document whose sheets were announced.
    frames: FxHashMap<NodeHandle, String>,
}

impl DocumentObserver for StyleAgent {
    fn document_discovered(
        &mut self,
        host: &dyn PageHost,
        document: NodeHandle,
        frame_id: &str,
        events: &mut Vec<Notification>,
    ) {
        self.announce_document(host, document, frame_id, events);
    }
}

impl StyleAgent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce the sheets of the top document and every embedded document
    /// the DOM agent has materialized.
    pub fn enable(&mut self, host: &dyn PageHost, dom: &DomAgent, events: &mut Vec<Notification>) {
        self.announce_document(host, host.document(), MAIN_FRAME_ID, events);
        for (document, frame_id) in dom.embedded_documents() {
            self.announce_document(host, *document, frame_id, events);
        }
    }

    /// Mint ids (and emit `CSS.styleSheetAdded`) for the sheets of `document`.
    pub fn announce_document(
        &mut self,
        host: &dyn PageHost,
        document: NodeHandle,
        frame_id: &str,
        events: &mut Vec<Notification>,
    ) {
        self.frames.insert(document, frame_id.to_string());
        let sheets = match host.style_sheets(document) {
            Ok(sheets) => sheets,
            Err(err) => {
                warn!(%err, ?document, "style sheets unavailable");
                return;
            }
        };
        for sheet in sheets {
            if let Err(err) = self.sheet_id(host, sheet, events) {
                warn!(%err, ?sheet, "style sheet skipped");
            }
        }
    }

    /// Drop every id after navigation, telling the client about each sheet.
    pub fn reset(&mut self, events: &mut Vec<Notification>) {
        for (id, source) in self.sources.entries() {
            if matches!(source, StyleSource::Sheet(_)) {
                events.push(Notification::new(
                    "CSS.styleSheetRemoved",
                    StyleSheetIdParams {
                        style_sheet_id: id.to_string(),
                    },
                ));
            }
        }
        self.sources.reset();
        self.snapshots.clear();
        self.frames.clear();
    }

    /// Ids of every announced stylesheet.
    #[must_use]
    pub fn sheet_ids(&self) -> Vec<u32> {
        self.sources
            .entries()
            .into_iter()
            .filter(|(_, source)| matches!(source, StyleSource::Sheet(_)))
            .map(|(id, _)| id)
            .collect()
    }

    fn sheet_id(
        &mut self,
        host: &dyn PageHost,
        sheet: SheetHandle,
        events: &mut Vec<Notification>,
    ) -> Result<u32, BridgeError> {
        let source = StyleSource::Sheet(sheet);
        if let Some(id) = self.sources.get(source) {
            return Ok(id);
        }
        let info = host.style_sheet(sheet)?;
        let id = self
            .sources
            .id_for(Some(source))
            .map_err(|_| BridgeError::InvalidReference)?;
        let frame_id = self
            .frames
            .get(&info.owner_document)
            .cloned()
            .unwrap_or_else(|| MAIN_FRAME_ID.to_string());
        debug!(id, ?sheet, "style sheet added");
        events.push(Notification::new(
            "CSS.styleSheetAdded",
            StyleSheetAddedParams {
                header: StyleSheetHeader {
                    style_sheet_id: id.to_string(),
                    frame_id,
                    source_url: info.href.unwrap_or_default(),
                    origin: StyleSheetOrigin::Regular,
                    title: String::new(),
                    disabled: false,
                    is_inline: false,
                    start_line: 0,
                    start_column: 0,
                    length: info.text.chars().count(),
                },
            },
        ));
        self.snapshots.insert(id, info.text);
        Ok(id)
    }

    fn parse_id(&self, style_sheet_id: &str) -> Result<(u32, StyleSource), BridgeError> {
        let id: u32 = style_sheet_id
            .parse()
            .map_err(|_| BridgeError::unknown_id(IdKind::StyleSheet, style_sheet_id))?;
        let source = self
            .sources
            .resolve(id)
            .map_err(|_| BridgeError::unknown_id(IdKind::StyleSheet, style_sheet_id))?;
        Ok((id, source))
    }

    fn check_attached(
        host: &dyn PageHost,
        id: u32,
        source: StyleSource,
    ) -> Result<(), BridgeError> {
        let attached = match source {
            StyleSource::Sheet(sheet) => host.style_sheet(sheet).is_ok(),
            StyleSource::Inline(element) => host.is_attached(element),
        };
        if attached {
            Ok(())
        } else {
            Err(BridgeError::stale(IdKind::StyleSheet, id))
        }
    }

    fn snapshot(&self, id: u32) -> Result<&str, BridgeError> {
        self.snapshots
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| BridgeError::invariant(format!("style sheet {id} has no text snapshot")))
    }

    /// `CSS.getStyleSheetText`.
    pub fn style_sheet_text(
        &self,
        host: &dyn PageHost,
        style_sheet_id: &str,
    ) -> Result<String, BridgeError> {
        let (id, source) = self.parse_id(style_sheet_id)?;
        Self::check_attached(host, id, source)?;
        Ok(self.snapshot(id)?.to_string())
    }

    /// `CSS.getMatchedStylesForNode`.
    pub fn matched_styles(
        &mut self,
        host: &dyn PageHost,
        dom: &DomAgent,
        node_id: u32,
        events: &mut Vec<Notification>,
    ) -> Result<MatchedStylesResult, BridgeError> {
        let element = dom.resolve(host, node_id)?;
        let mut views = FxHashMap::default();

        let mut matched_css_rules = Vec::new();
        for rule in host.matched_rules(element)? {
            matched_css_rules.push(self.rule_match(host, rule, &mut views, events)?);
        }

        let mut inherited = Vec::new();
        for entry in host.inherited_rules(element)? {
            let mut rules = Vec::with_capacity(entry.rules.len());
            for rule in entry.rules {
                rules.push(self.rule_match(host, rule, &mut views, events)?);
            }
            inherited.push(InheritedStyleEntry {
                inline_style: self.inline_style(host, entry.ancestor)?,
                matched_css_rules: rules,
            });
        }

        Ok(MatchedStylesResult {
            inline_style: self.inline_style(host, element)?,
            matched_css_rules,
            inherited,
        })
    }

    /// `CSS.getInlineStylesForNode`.
    pub fn inline_styles_for_node(
        &mut self,
        host: &dyn PageHost,
        dom: &DomAgent,
        node_id: u32,
    ) -> Result<Option<CssStyle>, BridgeError> {
        let element = dom.resolve(host, node_id)?;
        self.inline_style(host, element)
    }

    /// `CSS.getComputedStyleForNode`.
    pub fn computed_style(
        host: &dyn PageHost,
        dom: &DomAgent,
        node_id: u32,
    ) -> Result<Vec<ComputedProperty>, BridgeError> {
        let element = dom.resolve(host, node_id)?;
        Ok(host
            .computed_style(element)?
            .into_iter()
            .map(|(name, value)| ComputedProperty { name, value })
            .collect())
    }

    fn rule_match(
        &mut self,
        host: &dyn PageHost,
        rule: HostRuleRef,
        views: &mut FxHashMap<u32, SheetView>,
        events: &mut Vec<Notification>,
    ) -> Result<RuleMatch, BridgeError> {
        let id = self.sheet_id(host, rule.sheet, events)?;
        if !views.contains_key(&id) {
            let view = SheetView::new(self.snapshot(id)?);
            views.insert(id, view);
        }
        let view = views
            .get(&id)
            .ok_or_else(|| BridgeError::invariant("style sheet view missing"))?;
        let Some((ruleset, media)) = view.rule(rule.ordinal) else {
            error!(id, ordinal = rule.ordinal, "host rule has no parsed counterpart");
            return Err(BridgeError::invariant(format!(
                "style sheet {id} has no rule #{}",
                rule.ordinal
            )));
        };

        let style_sheet_id = id.to_string();
        let selector = ruleset.selector.trim();
        let selectors: Vec<SelectorValue> = selector
            .split(',')
            .map(|text| SelectorValue {
                text: text.trim().to_string(),
            })
            .collect();
        let matching_selectors = (0..selectors.len()).collect();
        let style = build_style(
            &style_sheet_id,
            view,
            ruleset,
            ruleset.body_start(),
            ruleset.body_end(),
        )?;
        Ok(RuleMatch {
            rule: CssRule {
                style_sheet_id: Some(style_sheet_id.clone()),
                selector_list: SelectorList {
                    selectors,
                    text: selector.to_string(),
                },
                origin: StyleSheetOrigin::Regular,
                style,
                media: media
                    .map(|media| CssMedia {
                        text: media
                            .query
                            .trim()
                            .trim_start_matches("@media")
                            .trim()
                            .to_string(),
                        source: "mediaRule".to_string(),
                        style_sheet_id: Some(style_sheet_id),
                    })
                    .into_iter()
                    .collect(),
            },
            matching_selectors,
        })
    }

    fn inline_style(
        &mut self,
        host: &dyn PageHost,
        element: NodeHandle,
    ) -> Result<Option<CssStyle>, BridgeError> {
        let source = StyleSource::Inline(element);
        let id = match self.sources.get(source) {
            Some(id) => id,
            None => {
                let Some(text) = host.inline_style(element)? else {
                    return Ok(None);
                };
                let id = self
                    .sources
                    .id_for(Some(source))
                    .map_err(|_| BridgeError::InvalidReference)?;
                self.snapshots.insert(id, text);
                id
            }
        };
        let text = self.snapshot(id)?;
        let ruleset = parse_declaration_list(text)?;
        let view = SheetView {
            chars: text.chars().collect(),
            nodes: Vec::new(),
            lines: LineIndex::new(text),
        };
        build_style(&id.to_string(), &view, &ruleset, 0, view.chars.len()).map(Some)
    }

    /// `CSS.setPropertyText`: splice `text` over `range` of the snapshot.
    pub fn set_property_text(
        &mut self,
        host: &mut dyn PageHost,
        params: &SetPropertyTextParams,
        events: &mut Vec<Notification>,
    ) -> Result<CssStyle, BridgeError> {
        let (id, source) = self.parse_id(&params.style_sheet_id)?;
        Self::check_attached(host, id, source)?;
        let text = self.snapshot(id)?.to_string();
        let lines = LineIndex::new(&text);
        let range = params.range;
        let start = lines.line_column_to_offset(range.start_line, range.start_column)?;
        let end = lines.line_column_to_offset(range.end_line, range.end_column)?;
        if start > end {
            return Err(BridgeError::invalid_params("range ends before it starts"));
        }

        let bodies = rule_bodies(&text, source)?;
        let Some((ruleset, _, _)) = bodies
            .iter()
            .find(|(_, body_start, body_end)| *body_start <= start && end <= *body_end)
        else {
            error!(id, start, end, "edit range outside every rule body");
            return Err(BridgeError::invariant("edit range is outside every rule body"));
        };
        for declaration in &ruleset.declarations {
            let overlaps = declaration.original_offset < end && start < declaration.end_offset;
            let covers = start <= declaration.original_offset && declaration.end_offset <= end;
            let within = declaration.original_offset <= start && end <= declaration.end_offset;
            if overlaps && !covers && !within {
                error!(id, start, end, "edit range splits a declaration");
                return Err(BridgeError::invariant("edit range splits a declaration"));
            }
        }

        let mut chars: Vec<char> = text.chars().collect();
        chars.splice(start..end, params.text.chars());
        let updated: String = chars.into_iter().collect();
        match source {
            StyleSource::Sheet(sheet) => host.set_style_sheet_text(sheet, &updated)?,
            StyleSource::Inline(element) => host.set_inline_style(element, &updated)?,
        }
        info!(id, start, end, "style text edited");
        self.snapshots.insert(id, updated.clone());
        events.push(Notification::new(
            "CSS.styleSheetChanged",
            StyleSheetIdParams {
                style_sheet_id: id.to_string(),
            },
        ));

        let view = SheetView::new(&updated);
        let bodies = rule_bodies(&updated, source)?;
        let (ruleset, body_start, body_end) = bodies
            .iter()
            .find(|(_, body_start, body_end)| *body_start <= start && start <= *body_end)
            .ok_or_else(|| BridgeError::invariant("edited rule vanished after reparse"))?;
        build_style(&id.to_string(), &view, ruleset, *body_start, *body_end)
    }
}

/// Rulesets of a snapshot with their body ranges.
fn rule_bodies(
    text: &str,
    source: StyleSource,
) -> Result<Vec<(CssRuleset, usize, usize)>, BridgeError> {
    match source {
        StyleSource::Sheet(_) => Ok(style_rulesets(&parse_stylesheet(text))
            .map(|rule| (rule.clone(), rule.body_start(), rule.body_end()))
            .collect()),
        StyleSource::Inline(_) => {
            let rule = parse_declaration_list(text)?;
            Ok(vec![(rule, 0, text.chars().count())])
        }
    }
}

fn source_range(lines: &LineIndex, start: usize, end: usize) -> Result<SourceRange, BridgeError> {
    let (start_line, start_column) = lines.offset_to_line_column(start)?;
    let (end_line, end_column) = lines.offset_to_line_column(end)?;
    Ok(SourceRange {
        start_line,
        start_column,
        end_line,
        end_column,
    })
}

fn build_style(
    style_sheet_id: &str,
    view: &SheetView,
    ruleset: &CssRuleset,
    body_start: usize,
    body_end: usize,
) -> Result<CssStyle, BridgeError> {
    let mut css_properties = Vec::with_capacity(ruleset.declarations.len());
    for declaration in &ruleset.declarations {
        let mut value = declaration.value.trim();
        let mut important = false;
        if value.len() >= IMPORTANT.len()
            && value.is_char_boundary(value.len() - IMPORTANT.len())
            && value[value.len() - IMPORTANT.len()..].eq_ignore_ascii_case(IMPORTANT)
        {
            important = true;
            value = value[..value.len() - IMPORTANT.len()].trim_end();
        }
        css_properties.push(CssProperty {
            name: declaration.property.trim().to_string(),
            value: value.to_string(),
            important,
            implicit: false,
            text: view.slice(declaration.original_offset, declaration.end_offset),
            parsed_ok: true,
            disabled: declaration.disabled,
            range: Some(source_range(
                &view.lines,
                declaration.original_offset,
                declaration.end_offset,
            )?),
        });
    }
    Ok(CssStyle {
        style_sheet_id: Some(style_sheet_id.to_string()),
        css_properties,
        shorthand_entries: Vec::new(),
        css_text: Some(view.slice(body_start, body_end)),
        range: Some(source_range(&view.lines, body_start, body_end)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{PageSnapshot, SnapshotPage};

    const STYLED: &str = r#"{
        "url": "http://example.test/",
        "document": {
            "styleSheets": [
                {"href": "http://example.test/site.css",
                 "text": "body { margin: 0; }\n@media print {\n  p { color: black !important; }\n}\n"}
            ],
            "children": [
                {"name": "HTML", "children": [
                    {"name": "BODY", "matched": [{"sheet": 0, "rule": 0}], "children": [
                        {"name": "P", "attributes": {"style": "top: 1px; left: 2px"},
                         "matched": [{"sheet": 0, "rule": 1}],
                         "computed": {"display": "block"}}
                    ]}
                ]}
            ]
        }
    }"#;

    fn setup() -> (SnapshotPage, DomAgent, StyleAgent, Vec<Notification>) {
        let snapshot: PageSnapshot = serde_json::from_str(STYLED).unwrap();
        let host = SnapshotPage::new(snapshot, None);
        let dom = DomAgent::new(host.document(), 1);
        (host, dom, StyleAgent::new(), Vec::new())
    }

    #[test]
    fn enable_announces_document_sheets_once() {
        let (host, dom, mut styles, mut events) = setup();
        styles.enable(&host, &dom, &mut events);
        styles.enable(&host, &dom, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].method, "CSS.styleSheetAdded");
        assert_eq!(styles.sheet_ids(), vec![1]);
    }

    #[test]
    fn matched_rule_inside_media_carries_media_and_importance() {
        let (host, mut dom, mut styles, mut events) = setup();
        let p = host.find_by_name("P").unwrap();
        let node_id = dom.id_for(p).unwrap();
        let result = styles.matched_styles(&host, &dom, node_id, &mut events).unwrap();

        let rule = &result.matched_css_rules[0].rule;
        assert_eq!(rule.selector_list.text, "p");
        assert_eq!(rule.media[0].text, "print");
        let property = &rule.style.css_properties[0];
        assert_eq!(property.name, "color");
        assert_eq!(property.value, "black");
        assert!(property.important);
        assert_eq!(
            property.range,
            Some(SourceRange {
                start_line: 2,
                start_column: 6,
                end_line: 2,
                end_column: 30,
            })
        );

        let inline = result.inline_style.unwrap();
        assert_eq!(inline.css_properties.len(), 2);
        assert_eq!(inline.css_properties[1].name, "left");
        assert_eq!(inline.css_text.as_deref(), Some("top: 1px; left: 2px"));
    }

    #[test]
    fn set_property_text_splices_snapshot_and_notifies() {
        let (mut host, mut dom, mut styles, mut events) = setup();
        let body = host.find_by_name("BODY").unwrap();
        let node_id = dom.id_for(body).unwrap();
        styles.matched_styles(&host, &dom, node_id, &mut events).unwrap();
        events.clear();

        let params = SetPropertyTextParams {
            style_sheet_id: "1".into(),
            range: SourceRange {
                start_line: 0,
                start_column: 7,
                end_line: 0,
                end_column: 17,
            },
            text: "margin: 4px;".into(),
        };
        let style = styles.set_property_text(&mut host, &params, &mut events).unwrap();
        assert_eq!(style.css_properties[0].value, "4px");
        assert_eq!(events[0].method, "CSS.styleSheetChanged");
        let text = styles.style_sheet_text(&host, "1").unwrap();
        assert!(text.starts_with("body { margin: 4px; }"));
    }

    #[test]
    fn edit_outside_rule_body_is_rejected() {
        let (mut host, mut dom, mut styles, mut events) = setup();
        let body = host.find_by_name("BODY").unwrap();
        let node_id = dom.id_for(body).unwrap();
        styles.matched_styles(&host, &dom, node_id, &mut events).unwrap();
        let params = SetPropertyTextParams {
            style_sheet_id: "1".into(),
            range: SourceRange {
                start_line: 0,
                start_column: 0,
                end_line: 0,
                end_column: 4,
            },
            text: "div".into(),
        };
        assert!(matches!(
            styles.set_property_text(&mut host, &params, &mut events),
            Err(BridgeError::Invariant(_))
        ));
    }

    #[test]
    fn unknown_style_sheet_id() {
        let (host, _dom, styles, _events) = setup();
        assert!(matches!(
            styles.style_sheet_text(&host, "77"),
            Err(BridgeError::UnknownId {
                kind: IdKind::StyleSheet,
                ..
            })
        ));
    }
}
