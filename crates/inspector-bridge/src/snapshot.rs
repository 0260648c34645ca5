//! Serde-loadable page snapshot acting as both host collaborators.
//!
//! The binary serves a snapshot file when no live engine is attached and the
//! tests drive whole protocol flows through it. Asynchronous host behaviour
//! (navigation completion, debugger enable, breaks) is modelled by pushing
//! [`HostEvent`]s into the bridge inbox when a sender is supplied.

use std::cell::RefCell;
use std::rc::Rc;

use crossbeam_channel::Sender;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::adapter::BridgeInput;
use crate::host::{
    BreakReason, DocumentId, HighlightColors, HostBreakInfo, HostBreakpoint, HostCookie,
    HostError, HostEvent, HostInheritedRules, HostNode, HostProperty, HostRuleRef,
    HostScriptDocument, HostSourceLocation, HostStackFrame, HostStyleSheet, HostValue, NodeHandle,
    NodeKind, PageHost, ResumeAction, ScriptDebugHost, SheetHandle,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub document: SnapshotDocument,
    #[serde(default)]
    pub scripts: Vec<SnapshotScript>,
    #[serde(default)]
    pub cookies: Vec<SnapshotCookie>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    /// Defaults to the page URL for the main document.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub style_sheets: Vec<SnapshotStyleSheet>,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotStyleSheet {
    #[serde(default)]
    pub href: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    #[default]
    Element,
    Text,
    Comment,
    Doctype,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    #[serde(default)]
    pub kind: SnapshotKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// `style` doubles as the inline style text.
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
    /// Embedded document of a frame element.
    #[serde(default)]
    pub content: Option<SnapshotDocument>,
    /// Access to `content` fails as it would for a cross-origin frame.
    #[serde(default)]
    pub cross_origin: bool,
    #[serde(default)]
    pub matched: Vec<SnapshotRuleRef>,
    #[serde(default)]
    pub computed: IndexMap<String, String>,
}

/// Rule ordinal within a stylesheet of the node's own document.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SnapshotRuleRef {
    pub sheet: usize,
    pub rule: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotScript {
    pub url: String,
    pub source: String,
    #[serde(default)]
    pub source_map_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn root_path() -> String {
    "/".to_string()
}

impl PageSnapshot {
    /// Both collaborators over one snapshot, sharing the event sender.
    #[must_use]
    pub fn into_hosts(self, events: Option<Sender<BridgeInput>>) -> (SnapshotPage, SnapshotDebugger) {
        let debugger = SnapshotDebugger::new(&self.scripts, events.clone());
        (SnapshotPage::new(self, events), debugger)
    }
}

fn send(events: Option<&Sender<BridgeInput>>, event: HostEvent) {
    if let Some(sender) = events {
        if sender.send(BridgeInput::Host(event)).is_err() {
            debug!("bridge inbox closed; host event dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

struct ArenaNode {
    kind: NodeKind,
    name: String,
    value: String,
    attributes: IndexMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Owning document (self for documents).
    document: usize,
    content: Option<usize>,
    cross_origin: bool,
    document_url: Option<String>,
    sheets: Vec<usize>,
    matched: Vec<(usize, usize)>,
    computed: IndexMap<String, String>,
}

struct ArenaSheet {
    href: Option<String>,
    owner: usize,
    text: String,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<ArenaNode>,
    sheets: Vec<ArenaSheet>,
}

impl Arena {
    fn build(document: &SnapshotDocument, url: &str) -> Self {
        let mut arena = Arena::default();
        arena.add_document(document, url.to_string());
        arena
    }

    /// Lays out one document in pre-order; embedded documents follow their
    /// frame's subtree.
    fn add_document(&mut self, document: &SnapshotDocument, url: String) -> usize {
        let doc = self.nodes.len();
        let sheets = document
            .style_sheets
            .iter()
            .map(|sheet| {
                self.sheets.push(ArenaSheet {
                    href: sheet.href.clone(),
                    owner: doc,
                    text: sheet.text.clone(),
                });
                self.sheets.len() - 1
            })
            .collect::<Vec<_>>();
        self.nodes.push(ArenaNode {
            kind: NodeKind::Document,
            name: "#document".to_string(),
            value: String::new(),
            attributes: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            document: doc,
            content: None,
            cross_origin: false,
            document_url: Some(url),
            sheets: sheets.clone(),
            matched: Vec::new(),
            computed: IndexMap::new(),
        });

        let mut frames = Vec::new();
        let mut stack: Vec<(&SnapshotNode, usize)> =
            document.children.iter().rev().map(|node| (node, doc)).collect();
        while let Some((node, parent)) = stack.pop() {
            let index = self.nodes.len();
            let (kind, name) = match node.kind {
                SnapshotKind::Element => (NodeKind::Element, node.name.clone()),
                SnapshotKind::Text => (NodeKind::Text, "#text".to_string()),
                SnapshotKind::Comment => (NodeKind::Comment, "#comment".to_string()),
                SnapshotKind::Doctype => (NodeKind::DocumentType, node.name.clone()),
            };
            let matched = node
                .matched
                .iter()
                .filter_map(|rule| sheets.get(rule.sheet).map(|sheet| (*sheet, rule.rule)))
                .collect();
            self.nodes.push(ArenaNode {
                kind,
                name,
                value: node.value.clone(),
                attributes: node.attributes.clone(),
                parent: Some(parent),
                children: Vec::new(),
                document: doc,
                content: None,
                cross_origin: node.cross_origin,
                document_url: None,
                sheets: Vec::new(),
                matched,
                computed: node.computed.clone(),
            });
            self.nodes[parent].children.push(index);
            if let Some(content) = &node.content {
                frames.push((index, content));
            }
            stack.extend(node.children.iter().rev().map(|child| (child, index)));
        }

        for (frame, content) in frames {
            let url = content
                .url
                .clone()
                .unwrap_or_else(|| "about:blank".to_string());
            let embedded = self.add_document(content, url);
            self.nodes[frame].content = Some(embedded);
        }
        doc
    }
}

/// Highlight and inspect-mode state of a [`SnapshotPage`], shared with
/// whoever renders the page.
#[derive(Debug, Clone, Default)]
pub struct Overlay(Rc<RefCell<OverlayState>>);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayState {
    pub highlighted: Option<NodeHandle>,
    pub colors: Option<HighlightColors>,
    pub inspect_mode: bool,
}

impl Overlay {
    #[must_use]
    pub fn state(&self) -> OverlayState {
        self.0.borrow().clone()
    }
}

/// [`PageHost`] over a [`PageSnapshot`]. Navigation rebuilds the arena
/// under a new generation so earlier handles read as detached.
pub struct SnapshotPage {
    snapshot: PageSnapshot,
    url: String,
    generation: u64,
    arena: Arena,
    cookies: Vec<SnapshotCookie>,
    overlay: Overlay,
    events: Option<Sender<BridgeInput>>,
}

impl SnapshotPage {
    #[must_use]
    pub fn new(snapshot: PageSnapshot, events: Option<Sender<BridgeInput>>) -> Self {
        let url = snapshot
            .document
            .url
            .clone()
            .unwrap_or_else(|| snapshot.url.clone());
        let arena = Arena::build(&snapshot.document, &url);
        let cookies = snapshot.cookies.clone();
        Self {
            snapshot,
            url,
            generation: 1,
            arena,
            cookies,
            overlay: Overlay::default(),
            events,
        }
    }

    /// First element named `name` (ASCII case-insensitive), any document.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.arena
            .nodes
            .iter()
            .position(|node| node.kind == NodeKind::Element && node.name.eq_ignore_ascii_case(name))
            .map(|index| self.handle(index))
    }

    /// Handle that keeps observing the overlay after the page is handed off.
    #[must_use]
    pub fn overlay(&self) -> Overlay {
        self.overlay.clone()
    }

    /// Backend id the host would report for `node` (inspect-element flows).
    #[must_use]
    pub fn backend_id(&self, node: NodeHandle) -> Option<u64> {
        self.index(node).ok().map(|index| index as u64 + 1)
    }

    fn handle(&self, index: usize) -> NodeHandle {
        NodeHandle((self.generation << 32) | index as u64)
    }

    fn sheet_handle(&self, index: usize) -> SheetHandle {
        SheetHandle((self.generation << 32) | index as u64)
    }

    fn decode(&self, raw: u64, len: usize) -> Result<usize, HostError> {
        let index = usize::try_from(raw & 0xffff_ffff).map_err(|_| HostError::Detached)?;
        if raw >> 32 == self.generation && index < len {
            Ok(index)
        } else {
            Err(HostError::Detached)
        }
    }

    fn index(&self, node: NodeHandle) -> Result<usize, HostError> {
        self.decode(node.0, self.arena.nodes.len())
    }

    fn sheet_index(&self, sheet: SheetHandle) -> Result<usize, HostError> {
        self.decode(sheet.0, self.arena.sheets.len())
    }

    fn element(&self, node: NodeHandle) -> Result<&ArenaNode, HostError> {
        let node = &self.arena.nodes[self.index(node)?];
        if node.kind == NodeKind::Element {
            Ok(node)
        } else {
            Err(HostError::Failed(format!("{} is not an element", node.name)))
        }
    }

    fn rule_refs(&self, node: &ArenaNode) -> Vec<HostRuleRef> {
        node.matched
            .iter()
            .map(|&(sheet, ordinal)| HostRuleRef {
                sheet: self.sheet_handle(sheet),
                ordinal,
            })
            .collect()
    }
}

impl PageHost for SnapshotPage {
    fn document(&self) -> NodeHandle {
        self.handle(0)
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn node(&self, node: NodeHandle) -> Result<HostNode, HostError> {
        let node = &self.arena.nodes[self.index(node)?];
        let local_name = if node.kind == NodeKind::Element {
            node.name.to_ascii_lowercase()
        } else {
            String::new()
        };
        Ok(HostNode {
            kind: node.kind,
            name: node.name.clone(),
            local_name,
            value: node.value.clone(),
            attributes: node
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            document_url: node.document_url.clone(),
        })
    }

    fn children(&self, node: NodeHandle) -> Result<Vec<NodeHandle>, HostError> {
        let node = &self.arena.nodes[self.index(node)?];
        Ok(node.children.iter().map(|&child| self.handle(child)).collect())
    }

    fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        let index = self.index(node).ok()?;
        self.arena.nodes[index].parent.map(|parent| self.handle(parent))
    }

    fn frame_elements(&self, document: NodeHandle) -> Result<Vec<NodeHandle>, HostError> {
        let document = self.index(document)?;
        Ok(self
            .arena
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.document == document
                    && node.kind == NodeKind::Element
                    && (node.name.eq_ignore_ascii_case("iframe")
                        || node.name.eq_ignore_ascii_case("frame"))
            })
            .map(|(index, _)| self.handle(index))
            .collect())
    }

    fn content_document(&self, frame: NodeHandle) -> Result<Option<NodeHandle>, HostError> {
        let node = &self.arena.nodes[self.index(frame)?];
        if node.cross_origin {
            return Err(HostError::AccessDenied(format!(
                "{} content is cross-origin",
                node.name
            )));
        }
        Ok(node.content.map(|document| self.handle(document)))
    }

    fn is_attached(&self, node: NodeHandle) -> bool {
        self.index(node).is_ok()
    }

    fn node_for_backend_id(&self, backend_id: u64) -> Option<NodeHandle> {
        let index = usize::try_from(backend_id.checked_sub(1)?).ok()?;
        (index < self.arena.nodes.len()).then(|| self.handle(index))
    }

    fn style_sheets(&self, document: NodeHandle) -> Result<Vec<SheetHandle>, HostError> {
        let node = &self.arena.nodes[self.index(document)?];
        Ok(node
            .sheets
            .iter()
            .map(|&sheet| self.sheet_handle(sheet))
            .collect())
    }

    fn style_sheet(&self, sheet: SheetHandle) -> Result<HostStyleSheet, HostError> {
        let sheet = &self.arena.sheets[self.sheet_index(sheet)?];
        Ok(HostStyleSheet {
            href: sheet.href.clone(),
            owner_document: self.handle(sheet.owner),
            text: sheet.text.clone(),
        })
    }

    fn set_style_sheet_text(&mut self, sheet: SheetHandle, text: &str) -> Result<(), HostError> {
        let index = self.sheet_index(sheet)?;
        self.arena.sheets[index].text = text.to_string();
        Ok(())
    }

    fn matched_rules(&self, element: NodeHandle) -> Result<Vec<HostRuleRef>, HostError> {
        let node = self.element(element)?;
        Ok(self.rule_refs(node))
    }

    fn inherited_rules(&self, element: NodeHandle) -> Result<Vec<HostInheritedRules>, HostError> {
        let mut inherited = Vec::new();
        let mut current = self.element(element)?.parent;
        while let Some(index) = current {
            let node = &self.arena.nodes[index];
            if node.kind != NodeKind::Element {
                break;
            }
            if !node.matched.is_empty() {
                inherited.push(HostInheritedRules {
                    ancestor: self.handle(index),
                    rules: self.rule_refs(node),
                });
            }
            current = node.parent;
        }
        Ok(inherited)
    }

    fn computed_style(&self, element: NodeHandle) -> Result<Vec<(String, String)>, HostError> {
        Ok(self
            .element(element)?
            .computed
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    fn inline_style(&self, element: NodeHandle) -> Result<Option<String>, HostError> {
        Ok(self.element(element)?.attributes.get("style").cloned())
    }

    fn set_inline_style(&mut self, element: NodeHandle, text: &str) -> Result<(), HostError> {
        self.element(element)?;
        let index = self.index(element)?;
        self.arena.nodes[index]
            .attributes
            .insert("style".to_string(), text.to_string());
        Ok(())
    }

    fn highlight(
        &mut self,
        element: Option<NodeHandle>,
        colors: &HighlightColors,
    ) -> Result<(), HostError> {
        if let Some(element) = element {
            self.element(element)?;
        }
        let mut overlay = self.overlay.0.borrow_mut();
        overlay.highlighted = element;
        overlay.colors = element.map(|_| colors.clone());
        Ok(())
    }

    fn set_inspect_mode(&mut self, enabled: bool) -> Result<(), HostError> {
        self.overlay.0.borrow_mut().inspect_mode = enabled;
        Ok(())
    }

    fn execute_script(&mut self, expression: &str) -> Result<HostValue, HostError> {
        let expression = expression.trim();
        if matches!(
            expression,
            "document.URL" | "location.href" | "window.location.href"
        ) {
            return Ok(HostValue::String(self.url.clone()));
        }
        Ok(literal(expression).unwrap_or_else(|| {
            HostValue::Thrown(format!("EvalError: cannot evaluate '{expression}'"))
        }))
    }

    fn navigate(&mut self, url: &str) -> Result<(), HostError> {
        self.generation += 1;
        self.url = url.to_string();
        self.arena = Arena::build(&self.snapshot.document, url);
        {
            let mut overlay = self.overlay.0.borrow_mut();
            overlay.highlighted = None;
            overlay.colors = None;
        }
        debug!(url, generation = self.generation, "snapshot navigated");
        send(
            self.events.as_ref(),
            HostEvent::Navigated {
                url: url.to_string(),
            },
        );
        Ok(())
    }

    fn reload(&mut self) -> Result<(), HostError> {
        let url = self.url.clone();
        self.navigate(&url)
    }

    fn cookies(&self) -> Result<Vec<HostCookie>, HostError> {
        Ok(self
            .cookies
            .iter()
            .map(|cookie| HostCookie {
                name: cookie.name.clone(),
                value: cookie.value.clone(),
                domain: cookie.domain.clone(),
                path: cookie.path.clone(),
                expires: cookie.expires,
                http_only: cookie.http_only,
                secure: cookie.secure,
            })
            .collect())
    }

    fn delete_cookie(&mut self, name: &str, url: &str) -> Result<(), HostError> {
        self.cookies.retain(|cookie| {
            cookie.name != name || !url.contains(cookie.domain.trim_start_matches('.'))
        });
        Ok(())
    }
}

/// Literal expressions: numbers, quoted strings, booleans, `null`, `undefined`.
fn literal(expression: &str) -> Option<HostValue> {
    match expression {
        "undefined" => return Some(HostValue::Undefined),
        "null" => return Some(HostValue::Null),
        "true" => return Some(HostValue::Bool(true)),
        "false" => return Some(HostValue::Bool(false)),
        _ => {}
    }
    if let Ok(number) = expression.parse::<f64>() {
        return Some(HostValue::Number(number));
    }
    let quoted = expression.len() >= 2
        && ((expression.starts_with('"') && expression.ends_with('"'))
            || (expression.starts_with('\'') && expression.ends_with('\'')));
    quoted.then(|| HostValue::String(expression[1..expression.len() - 1].to_string()))
}

// ---------------------------------------------------------------------------
// Debugger
// ---------------------------------------------------------------------------

const GLOBAL_FRAME: u32 = 1;
const LOCALS_OBJECT: u32 = 1000;

/// [`ScriptDebugHost`] over the snapshot's scripts. Document ids are the
/// script index plus one.
pub struct SnapshotDebugger {
    scripts: Vec<SnapshotScript>,
    events: Option<Sender<BridgeInput>>,
    connected: bool,
    paused_at: Option<HostSourceLocation>,
    breakpoints: Vec<HostBreakpoint>,
    next_breakpoint: u32,
}

impl SnapshotDebugger {
    #[must_use]
    pub fn new(scripts: &[SnapshotScript], events: Option<Sender<BridgeInput>>) -> Self {
        Self {
            scripts: scripts.to_vec(),
            events,
            connected: false,
            paused_at: None,
            breakpoints: Vec::new(),
            next_breakpoint: 0,
        }
    }

    fn script(&self, document: DocumentId) -> Result<&SnapshotScript, HostError> {
        usize::try_from(document.0)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.scripts.get(index))
            .ok_or_else(|| HostError::Failed(format!("no document {}", document.0)))
    }

    fn documents(&self) -> Vec<HostScriptDocument> {
        self.scripts
            .iter()
            .enumerate()
            .map(|(index, script)| HostScriptDocument {
                id: DocumentId(index as u64 + 1),
                url: script.url.clone(),
                length: script.source.chars().count(),
                source_map_url: script.source_map_url.clone(),
            })
            .collect()
    }
}

impl ScriptDebugHost for SnapshotDebugger {
    fn enable(&mut self) -> Result<(), HostError> {
        send(
            self.events.as_ref(),
            HostEvent::DebuggingEnabled { succeeded: true },
        );
        Ok(())
    }

    fn connect(&mut self) -> Result<(), HostError> {
        self.connected = true;
        send(
            self.events.as_ref(),
            HostEvent::DocumentsAdded(self.documents()),
        );
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), HostError> {
        self.connected = false;
        self.paused_at = None;
        self.breakpoints.clear();
        Ok(())
    }

    fn resume(&mut self, action: ResumeAction) -> Result<(), HostError> {
        if self.paused_at.take().is_none() {
            return Err(HostError::Failed("not paused".to_string()));
        }
        debug!(?action, "snapshot debugger resumed");
        Ok(())
    }

    /// Breaks at the first bound breakpoint, else at the start of the
    /// first script.
    fn cause_break(&mut self) -> Result<(), HostError> {
        if !self.connected {
            return Err(HostError::Failed("debugger not connected".to_string()));
        }
        let hit = self.breakpoints.iter().find(|breakpoint| breakpoint.bound);
        let (location, reason, breakpoints) = match hit {
            Some(breakpoint) => (breakpoint.location, BreakReason::Breakpoint, vec![breakpoint.id]),
            None if !self.scripts.is_empty() => (
                HostSourceLocation {
                    document: DocumentId(1),
                    offset: 0,
                },
                BreakReason::DebuggerHalt,
                Vec::new(),
            ),
            None => return Err(HostError::Unsupported),
        };
        self.paused_at = Some(location);
        send(
            self.events.as_ref(),
            HostEvent::Break(HostBreakInfo {
                reason,
                description: String::new(),
                breakpoints,
            }),
        );
        Ok(())
    }

    fn add_code_breakpoint(
        &mut self,
        location: HostSourceLocation,
        _condition: Option<&str>,
        _is_tracepoint: bool,
    ) -> Result<HostBreakpoint, HostError> {
        let length = self.script(location.document)?.source.chars().count();
        self.next_breakpoint += 1;
        let breakpoint = HostBreakpoint {
            id: self.next_breakpoint,
            location: HostSourceLocation {
                document: location.document,
                offset: location.offset.min(length),
            },
            bound: true,
        };
        self.breakpoints.push(breakpoint);
        Ok(breakpoint)
    }

    fn remove_breakpoint(&mut self, id: u32) -> Result<(), HostError> {
        let before = self.breakpoints.len();
        self.breakpoints.retain(|breakpoint| breakpoint.id != id);
        if self.breakpoints.len() == before {
            return Err(HostError::Failed(format!("no breakpoint {id}")));
        }
        Ok(())
    }

    fn frames(&self) -> Result<Vec<HostStackFrame>, HostError> {
        Ok(self
            .paused_at
            .map(|location| HostStackFrame {
                id: GLOBAL_FRAME,
                function_name: String::new(),
                location,
                locals: Some(LOCALS_OBJECT),
            })
            .into_iter()
            .collect())
    }

    fn source_text(&self, document: DocumentId) -> Result<String, HostError> {
        Ok(self.script(document)?.source.clone())
    }

    fn eval(&mut self, frame: u32, expression: &str) -> Result<HostProperty, HostError> {
        if self.paused_at.is_none() || frame != GLOBAL_FRAME {
            return Err(HostError::Failed(format!("no frame {frame}")));
        }
        let (type_name, value) = match literal(expression.trim()) {
            Some(HostValue::Undefined) => ("Object", "undefined".to_string()),
            Some(HostValue::Null) => ("Null", "null".to_string()),
            Some(HostValue::Bool(flag)) => ("Boolean", flag.to_string()),
            Some(HostValue::Number(number)) => ("Number", number.to_string()),
            Some(HostValue::String(text)) => ("String", format!("\"{text}\"")),
            _ => (
                "Error",
                format!("ReferenceError: '{}' is undefined", expression.trim()),
            ),
        };
        Ok(HostProperty {
            id: 0,
            name: expression.to_string(),
            type_name: type_name.to_string(),
            value,
            expandable: false,
            read_only: true,
            fake: false,
        })
    }

    fn child_properties(&self, property: u32) -> Result<Vec<HostProperty>, HostError> {
        if property == LOCALS_OBJECT && self.paused_at.is_some() {
            Ok(Vec::new())
        } else {
            Err(HostError::Failed(format!("no object {property}")))
        }
    }
}
