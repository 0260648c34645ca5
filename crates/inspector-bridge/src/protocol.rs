//! Protocol envelope and domain payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

pub type RequestId = i64;

/// Inbound `{id, method, params?}` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// `DOM` for `DOM.getDocument`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method
            .split_once('.')
            .map_or(self.method.as_str(), |(domain, _)| domain)
    }

    /// `getDocument` for `DOM.getDocument`.
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.method
            .split_once('.')
            .map_or("", |(_, method)| method)
    }

    /// Decode the params object; a missing object decodes as `{}`.
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        let params = self
            .params
            .clone()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        serde_json::from_value(params)
            .map_err(|err| BridgeError::invalid_params(format!("{}: {err}", self.method)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
}

/// Outbound `{id, result?, error?}` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
}

impl Response {
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(id: RequestId, error: ProtocolError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Outbound `{method, params?}` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: &str, params: impl Serialize) -> Self {
        Self {
            method: method.to_string(),
            params: serde_json::to_value(params).ok(),
        }
    }

    #[must_use]
    pub fn bare(method: &str) -> Self {
        Self {
            method: method.to_string(),
            params: None,
        }
    }
}

/// Anything written to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Response(Response),
    Notification(Notification),
}

/// Params shape shared by methods that take nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

// ---------------------------------------------------------------------------
// DOM
// ---------------------------------------------------------------------------

/// Protocol form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node_id: u32,
    pub node_type: u8,
    pub node_name: String,
    pub local_name: String,
    pub node_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_node_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRecord>>,
    /// Flat `[name, value, name, value, ...]` list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    #[serde(
        rename = "documentURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_document: Option<Box<NodeRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetDocumentParams {
    #[serde(default)]
    pub depth: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDocumentResult {
    pub root: NodeRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChildNodesParams {
    pub node_id: u32,
    #[serde(default)]
    pub depth: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChildNodesParams {
    pub parent_id: u32,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNodesByBackendIdsParams {
    pub backend_node_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNodesByBackendIdsResult {
    pub node_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default)]
    pub a: Option<f64>,
}

impl Rgba {
    #[must_use]
    pub fn to_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            self.r,
            self.g,
            self.b,
            self.a.unwrap_or(1.0)
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightConfig {
    #[serde(default)]
    pub content_color: Option<Rgba>,
    #[serde(default)]
    pub padding_color: Option<Rgba>,
    #[serde(default)]
    pub border_color: Option<Rgba>,
    #[serde(default)]
    pub margin_color: Option<Rgba>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightNodeParams {
    #[serde(default)]
    pub node_id: Option<u32>,
    #[serde(default)]
    pub backend_node_id: Option<u64>,
    #[serde(default)]
    pub highlight_config: Option<HighlightConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetInspectModeEnabledParams {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdParams {
    pub node_id: u32,
}

// ---------------------------------------------------------------------------
// CSS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssProperty {
    pub name: String,
    pub value: String,
    pub important: bool,
    pub implicit: bool,
    pub text: String,
    pub parsed_ok: bool,
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShorthandEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_sheet_id: Option<String>,
    pub css_properties: Vec<CssProperty>,
    pub shorthand_entries: Vec<ShorthandEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorValue {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorList {
    pub selectors: Vec<SelectorValue>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleSheetOrigin {
    Regular,
    Inspector,
    UserAgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssMedia {
    pub text: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_sheet_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_sheet_id: Option<String>,
    pub selector_list: SelectorList,
    pub origin: StyleSheetOrigin,
    pub style: CssStyle,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<CssMedia>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub rule: CssRule,
    pub matching_selectors: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritedStyleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_style: Option<CssStyle>,
    #[serde(rename = "matchedCSSRules")]
    pub matched_css_rules: Vec<RuleMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedStylesResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_style: Option<CssStyle>,
    #[serde(rename = "matchedCSSRules")]
    pub matched_css_rules: Vec<RuleMatch>,
    pub inherited: Vec<InheritedStyleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyleResult {
    pub computed_style: Vec<ComputedProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineStylesResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_style: Option<CssStyle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheetIdParams {
    pub style_sheet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSheetTextResult {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPropertyTextParams {
    pub style_sheet_id: String,
    pub range: SourceRange,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleResult {
    pub style: CssStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheetHeader {
    pub style_sheet_id: String,
    pub frame_id: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub origin: StyleSheetOrigin,
    pub title: String,
    pub disabled: bool,
    pub is_inline: bool,
    pub start_line: usize,
    pub start_column: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSheetAddedParams {
    pub header: StyleSheetHeader,
}

// ---------------------------------------------------------------------------
// Runtime / Debugger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub script_id: String,
    pub line_number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub scope_type: String,
    pub object: RemoteObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    pub call_frame_id: String,
    pub function_name: String,
    pub location: Location,
    pub scope_chain: Vec<Scope>,
    pub this: RemoteObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedParams {
    pub call_frames: Vec<CallFrame>,
    pub reason: String,
    pub hit_breakpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedParams {
    pub script_id: String,
    pub url: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub execution_context_id: u32,
    pub hash: String,
    #[serde(
        rename = "sourceMapURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_map_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlParams {
    pub line_number: usize,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub column_number: Option<usize>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlResult {
    pub breakpoint_id: String,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointIdParams {
    pub breakpoint_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResolvedParams {
    pub breakpoint_id: String,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptIdParams {
    pub script_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSourceResult {
    pub script_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameParams {
    pub call_frame_id: String,
    pub expression: String,
    #[serde(default)]
    pub object_group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    pub expression: String,
    #[serde(default)]
    pub object_group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    #[serde(default)]
    pub object_id: Option<String>,
    pub function_declaration: String,
    #[serde(default)]
    pub arguments: Option<Vec<CallArgument>>,
    #[serde(default)]
    pub return_by_value: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    pub result: RemoteObject,
    pub was_thrown: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesParams {
    pub object_id: String,
    #[serde(default)]
    pub own_properties: Option<bool>,
    #[serde(default)]
    pub accessor_properties_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    pub value: RemoteObject,
    pub writable: bool,
    pub configurable: bool,
    pub enumerable: bool,
    pub is_own: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPropertiesResult {
    pub result: Vec<PropertyDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextAuxData {
    pub frame_id: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDescription {
    pub id: u32,
    pub origin: String,
    pub name: String,
    pub aux_data: ExecutionContextAuxData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContextCreatedParams {
    pub context: ExecutionContextDescription,
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateParams {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
    pub frame_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: String,
    pub loader_id: String,
    pub url: String,
    pub mime_type: String,
    pub security_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameNavigatedParams {
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: f64,
    pub size: usize,
    pub http_only: bool,
    pub secure: bool,
    pub session: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCookiesResult {
    pub cookies: Vec<Cookie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCookieParams {
    pub cookie_name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_splits_domain_and_method() {
        let request: Request =
            serde_json::from_value(json!({"id": 3, "method": "DOM.getDocument"})).unwrap();
        assert_eq!(request.domain(), "DOM");
        assert_eq!(request.method_name(), "getDocument");
        let params: GetDocumentParams = request.parse_params().unwrap();
        assert_eq!(params.depth, None);
    }

    #[test]
    fn node_record_uses_protocol_field_names() {
        let record = NodeRecord {
            node_id: 1,
            node_type: 9,
            node_name: "#document".into(),
            local_name: String::new(),
            node_value: String::new(),
            child_node_count: Some(1),
            children: None,
            attributes: None,
            document_url: Some("http://example.test/".into()),
            frame_id: Some("main".into()),
            content_document: None,
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "nodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "localName": "",
                "nodeValue": "",
                "childNodeCount": 1,
                "documentURL": "http://example.test/",
                "frameId": "main"
            })
        );
    }

    #[test]
    fn rgba_renders_css_function() {
        let color = Rgba {
            r: 1,
            g: 2,
            b: 3,
            a: Some(0.5),
        };
        assert_eq!(color.to_css(), "rgba(1, 2, 3, 0.50)");
    }
}
