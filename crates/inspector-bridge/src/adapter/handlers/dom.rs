//! DOM domain handlers.
//! - handle_dom: route DOM.* requests
//! - get_document/request_child_nodes: tree disclosure
//! - push_nodes_by_backend_ids: reveal host-picked nodes
//! - highlight_node/hide_highlight/set_inspect_mode: overlay control
//! - handle_inspect_node: host inspect-element event

use tracing::{debug, info};

use crate::dom::{depth_from_protocol, DomState};
use crate::error::BridgeError;
use crate::host::{HighlightColors, NodeHandle};
use crate::protocol::{
    Empty, GetDocumentParams, GetDocumentResult, HighlightConfig, HighlightNodeParams,
    NodeIdParams, Notification, PushNodesByBackendIdsParams, PushNodesByBackendIdsResult,
    Request, RequestChildNodesParams, Rgba, SetInspectModeEnabledParams,
};

use super::super::core::{reply, unhandled};
use super::super::{Bridge, Reply, SheetAnnouncer};

impl Bridge {
    pub(in crate::adapter) fn handle_dom(
        &mut self,
        request: &Request,
        events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        match request.method_name() {
            "enable" | "disable" => reply(Empty {}),
            "getDocument" => self.get_document(request.parse_params()?, events),
            "requestChildNodes" => self.request_child_nodes(request.parse_params()?, events),
            "pushNodesByBackendIdsToFrontend" => {
                self.push_nodes_by_backend_ids(&request.parse_params()?, events)
            }
            "highlightNode" => self.highlight_node(&request.parse_params()?),
            "hideHighlight" => {
                self.page.highlight(None, &self.config.highlight)?;
                reply(Empty {})
            }
            "setInspectModeEnabled" => {
                let params: SetInspectModeEnabledParams = request.parse_params()?;
                self.page.set_inspect_mode(params.enabled)?;
                reply(Empty {})
            }
            _ => unhandled(request),
        }
    }

    fn get_document(
        &mut self,
        params: GetDocumentParams,
        events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        let depth = depth_from_protocol(params.depth, self.dom.default_depth());
        let mut observer = SheetAnnouncer {
            styles: &mut self.styles,
            enabled: self.enabled.css,
        };
        let root = self
            .dom
            .get_document(self.page.as_ref(), depth, &mut observer, events)?;
        reply(GetDocumentResult { root })
    }

    fn request_child_nodes(
        &mut self,
        params: RequestChildNodesParams,
        events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        let depth = depth_from_protocol(params.depth, self.dom.default_depth());
        let mut observer = SheetAnnouncer {
            styles: &mut self.styles,
            enabled: self.enabled.css,
        };
        self.dom.disclose_children(
            self.page.as_ref(),
            params.node_id,
            depth,
            &mut observer,
            events,
        )?;
        reply(Empty {})
    }

    /// Unknown or unreachable backend ids map to node id 0.
    fn push_nodes_by_backend_ids(
        &mut self,
        params: &PushNodesByBackendIdsParams,
        events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        let mut node_ids = Vec::with_capacity(params.backend_node_ids.len());
        for &backend_id in &params.backend_node_ids {
            let id = match self.page.node_for_backend_id(backend_id) {
                Some(handle) => self.push_node(handle, events).unwrap_or(0),
                None => 0,
            };
            node_ids.push(id);
        }
        reply(PushNodesByBackendIdsResult { node_ids })
    }

    fn push_node(&mut self, handle: NodeHandle, events: &mut Vec<Notification>) -> Option<u32> {
        let mut observer = SheetAnnouncer {
            styles: &mut self.styles,
            enabled: self.enabled.css,
        };
        self.dom
            .push_node(self.page.as_ref(), handle, &mut observer, events)
    }

    fn highlight_node(&mut self, params: &HighlightNodeParams) -> Result<Reply, BridgeError> {
        let handle = match (params.node_id, params.backend_node_id) {
            (Some(id), _) => self.dom.resolve(self.page.as_ref(), id)?,
            (None, Some(backend_id)) => self
                .page
                .node_for_backend_id(backend_id)
                .ok_or_else(|| BridgeError::invalid_params("unknown backendNodeId"))?,
            (None, None) => {
                return Err(BridgeError::invalid_params(
                    "nodeId or backendNodeId is required",
                ))
            }
        };
        let colors = highlight_colors(
            params.highlight_config.as_ref(),
            &self.config.highlight,
        );
        self.page.highlight(Some(handle), &colors)?;
        reply(Empty {})
    }

    /// The user picked `node` in the page; reveal it and tell the client.
    pub(in crate::adapter) fn handle_inspect_node(
        &mut self,
        node: NodeHandle,
        events: &mut Vec<Notification>,
    ) {
        if self.dom.state() != DomState::Populated {
            debug!("inspect request before the document was requested");
            return;
        }
        match self.push_node(node, events) {
            Some(node_id) => {
                info!(node_id, "inspect node requested");
                events.push(Notification::new(
                    "DOM.inspectNodeRequested",
                    NodeIdParams { node_id },
                ));
            }
            None => debug!(?node, "inspected node is not reachable"),
        }
    }
}

/// Client-supplied overlay colors, falling back to configured ones.
fn highlight_colors(
    config: Option<&HighlightConfig>,
    defaults: &HighlightColors,
) -> HighlightColors {
    let Some(config) = config else {
        return defaults.clone();
    };
    let pick = |color: Option<Rgba>, fallback: &str| {
        color.map_or_else(|| fallback.to_string(), Rgba::to_css)
    };
    HighlightColors {
        content: pick(config.content_color, &defaults.content),
        padding: pick(config.padding_color, &defaults.padding),
        border: pick(config.border_color, &defaults.border),
        margin: pick(config.margin_color, &defaults.margin),
    }
}
