//! Collaborator traits implemented by the host browsing engine.
//!
//! The host addresses content by opaque handles and flat character offsets.
//! Handles stay meaningful only while the host object is attached; the
//! bridge asks [`PageHost::is_attached`] before trusting a stored handle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to a live host node (documents included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

/// Opaque reference to a host stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetHandle(pub u64);

/// Host debugger document id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// Host collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Access refused, e.g. a cross-origin frame.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The object is no longer part of the page.
    #[error("host object is detached")]
    Detached,

    #[error("operation not supported by host")]
    Unsupported,

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    CdataSection,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
}

impl NodeKind {
    /// Protocol `nodeType` value.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            NodeKind::Element => 1,
            NodeKind::Attribute => 2,
            NodeKind::Text => 3,
            NodeKind::CdataSection => 4,
            NodeKind::ProcessingInstruction => 7,
            NodeKind::Comment => 8,
            NodeKind::Document => 9,
            NodeKind::DocumentType => 10,
            NodeKind::DocumentFragment => 11,
        }
    }
}

/// Snapshot of one node's own data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostNode {
    pub kind: NodeKind,
    pub name: String,
    pub local_name: String,
    pub value: String,
    pub attributes: Vec<(String, String)>,
    /// Set for documents.
    pub document_url: Option<String>,
}

impl HostNode {
    #[must_use]
    pub fn is_frame_element(&self) -> bool {
        self.kind == NodeKind::Element
            && (self.name.eq_ignore_ascii_case("iframe") || self.name.eq_ignore_ascii_case("frame"))
    }

    #[must_use]
    pub fn is_whitespace_text(&self) -> bool {
        self.kind == NodeKind::Text && self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStyleSheet {
    pub href: Option<String>,
    pub owner_document: NodeHandle,
    pub text: String,
}

/// A rule matched by an element: the `ordinal`-th style rule of `sheet`
/// in document order, media children included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRuleRef {
    pub sheet: SheetHandle,
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInheritedRules {
    pub ancestor: NodeHandle,
    pub rules: Vec<HostRuleRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Seconds since the epoch; `None` for session cookies.
    pub expires: Option<f64>,
    pub http_only: bool,
    pub secure: bool,
}

/// Result of running a page script.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object {
        class_name: String,
        description: String,
    },
    Thrown(String),
}

/// Overlay colors as CSS color strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightColors {
    pub content: String,
    pub padding: String,
    pub border: String,
    pub margin: String,
}

impl Default for HighlightColors {
    fn default() -> Self {
        Self {
            content: "rgba(168, 221, 246, 0.50)".to_string(),
            padding: "rgba(247, 163, 135, 0.50)".to_string(),
            border: "rgba(120, 181, 51, 0.50)".to_string(),
            margin: "rgba(250, 212, 107, 0.50)".to_string(),
        }
    }
}

/// Live page access: DOM, CSSOM, overlay, scripting, navigation, cookies.
pub trait PageHost {
    /// Top-level document of the current page.
    fn document(&self) -> NodeHandle;
    fn url(&self) -> String;
    fn node(&self, node: NodeHandle) -> Result<HostNode, HostError>;
    fn children(&self, node: NodeHandle) -> Result<Vec<NodeHandle>, HostError>;
    /// `None` for documents and detached nodes.
    fn parent(&self, node: NodeHandle) -> Option<NodeHandle>;
    /// Frame elements contained in `document`.
    fn frame_elements(&self, document: NodeHandle) -> Result<Vec<NodeHandle>, HostError>;
    /// Content document of a frame element; fails for cross-origin frames.
    fn content_document(&self, frame: NodeHandle) -> Result<Option<NodeHandle>, HostError>;
    fn is_attached(&self, node: NodeHandle) -> bool;
    fn node_for_backend_id(&self, backend_id: u64) -> Option<NodeHandle>;

    fn style_sheets(&self, document: NodeHandle) -> Result<Vec<SheetHandle>, HostError>;
    fn style_sheet(&self, sheet: SheetHandle) -> Result<HostStyleSheet, HostError>;
    fn set_style_sheet_text(&mut self, sheet: SheetHandle, text: &str) -> Result<(), HostError>;
    fn matched_rules(&self, element: NodeHandle) -> Result<Vec<HostRuleRef>, HostError>;
    fn inherited_rules(&self, element: NodeHandle) -> Result<Vec<HostInheritedRules>, HostError>;
    fn computed_style(&self, element: NodeHandle) -> Result<Vec<(String, String)>, HostError>;
    /// `style` attribute text, if any.
    fn inline_style(&self, element: NodeHandle) -> Result<Option<String>, HostError>;
    fn set_inline_style(&mut self, element: NodeHandle, text: &str) -> Result<(), HostError>;

    /// Draw the overlay on `element`, or hide it for `None`.
    fn highlight(
        &mut self,
        element: Option<NodeHandle>,
        colors: &HighlightColors,
    ) -> Result<(), HostError>;
    fn set_inspect_mode(&mut self, enabled: bool) -> Result<(), HostError>;
    fn execute_script(&mut self, expression: &str) -> Result<HostValue, HostError>;

    /// Completion is reported through [`HostEvent::Navigated`].
    fn navigate(&mut self, url: &str) -> Result<(), HostError>;
    fn reload(&mut self) -> Result<(), HostError>;
    fn cookies(&self) -> Result<Vec<HostCookie>, HostError>;
    fn delete_cookie(&mut self, name: &str, url: &str) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    Continue,
    StepInto,
    StepOver,
    StepOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    Step,
    Breakpoint,
    DebuggerBlock,
    HostInitiated,
    LanguageInitiated,
    DebuggerHalt,
    Error,
    MutationBreakpoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostScriptDocument {
    pub id: DocumentId,
    pub url: String,
    /// Length of the source text in characters.
    pub length: usize,
    pub source_map_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSourceLocation {
    pub document: DocumentId,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBreakpoint {
    pub id: u32,
    pub location: HostSourceLocation,
    pub bound: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStackFrame {
    pub id: u32,
    pub function_name: String,
    pub location: HostSourceLocation,
    /// Property id of the frame's locals object.
    pub locals: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBreakInfo {
    pub reason: BreakReason,
    pub description: String,
    pub breakpoints: Vec<u32>,
}

/// Debugger property as the host reports it: every value is a string and
/// the type name is the host's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProperty {
    pub id: u32,
    pub name: String,
    pub type_name: String,
    pub value: String,
    pub expandable: bool,
    pub read_only: bool,
    pub fake: bool,
}

/// Host script debugger engine.
pub trait ScriptDebugHost {
    /// Completion is reported through [`HostEvent::DebuggingEnabled`].
    fn enable(&mut self) -> Result<(), HostError>;
    fn connect(&mut self) -> Result<(), HostError>;
    fn disconnect(&mut self) -> Result<(), HostError>;
    fn resume(&mut self, action: ResumeAction) -> Result<(), HostError>;
    fn cause_break(&mut self) -> Result<(), HostError>;
    fn add_code_breakpoint(
        &mut self,
        location: HostSourceLocation,
        condition: Option<&str>,
        is_tracepoint: bool,
    ) -> Result<HostBreakpoint, HostError>;
    fn remove_breakpoint(&mut self, id: u32) -> Result<(), HostError>;
    fn frames(&self) -> Result<Vec<HostStackFrame>, HostError>;
    fn source_text(&self, document: DocumentId) -> Result<String, HostError>;
    fn eval(&mut self, frame: u32, expression: &str) -> Result<HostProperty, HostError>;
    fn child_properties(&self, property: u32) -> Result<Vec<HostProperty>, HostError>;
}

/// Asynchronous notifications from the host, merged into the bridge inbox.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Navigated { url: String },
    InspectNodeRequested { node: NodeHandle },
    DebuggingEnabled { succeeded: bool },
    DocumentsAdded(Vec<HostScriptDocument>),
    DocumentsRemoved(Vec<DocumentId>),
    DocumentsUpdated(Vec<HostScriptDocument>),
    BreakpointsResolved(Vec<HostBreakpoint>),
    Break(HostBreakInfo),
    Resumed,
}
