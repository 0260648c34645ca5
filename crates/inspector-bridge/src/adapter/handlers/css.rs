//! CSS domain handlers.
//! - handle_css: route CSS.* requests
//! - enable: announce known documents' stylesheets
//! - style queries: matched, computed, inline
//! - getStyleSheetText/setPropertyText: snapshot text access

use tracing::info;

use crate::error::BridgeError;
use crate::protocol::{
    ComputedStyleResult, Empty, InlineStylesResult, NodeIdParams, Notification, Request,
    SetPropertyTextParams, StyleResult, StyleSheetIdParams, StyleSheetTextResult,
};
use crate::styles::StyleAgent;

use super::super::core::{reply, unhandled};
use super::super::{Bridge, Reply};

impl Bridge {
    pub(in crate::adapter) fn handle_css(
        &mut self,
        request: &Request,
        events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        match request.method_name() {
            "enable" => {
                if !self.enabled.css {
                    info!("CSS domain enabled");
                    self.enabled.css = true;
                    self.styles.enable(self.page.as_ref(), &self.dom, events);
                }
                reply(Empty {})
            }
            "disable" => {
                self.enabled.css = false;
                reply(Empty {})
            }
            "getMatchedStylesForNode" => {
                let params: NodeIdParams = request.parse_params()?;
                let result =
                    self.styles
                        .matched_styles(self.page.as_ref(), &self.dom, params.node_id, events)?;
                reply(result)
            }
            "getComputedStyleForNode" => {
                let params: NodeIdParams = request.parse_params()?;
                let computed_style =
                    StyleAgent::computed_style(self.page.as_ref(), &self.dom, params.node_id)?;
                reply(ComputedStyleResult { computed_style })
            }
            "getInlineStylesForNode" => {
                let params: NodeIdParams = request.parse_params()?;
                let inline_style = self.styles.inline_styles_for_node(
                    self.page.as_ref(),
                    &self.dom,
                    params.node_id,
                )?;
                reply(InlineStylesResult { inline_style })
            }
            "getStyleSheetText" => {
                let params: StyleSheetIdParams = request.parse_params()?;
                let text = self
                    .styles
                    .style_sheet_text(self.page.as_ref(), &params.style_sheet_id)?;
                reply(StyleSheetTextResult { text })
            }
            "setPropertyText" => {
                let params: SetPropertyTextParams = request.parse_params()?;
                let style = self
                    .styles
                    .set_property_text(self.page.as_mut(), &params, events)?;
                reply(StyleResult { style })
            }
            _ => unhandled(request),
        }
    }
}
