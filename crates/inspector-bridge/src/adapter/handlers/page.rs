//! Page domain handlers.
//! - handle_page: route Page.* requests
//! - navigate/reload: delegated; completion arrives as a host event
//! - getCookies/deleteCookie: cookie jar access
//! - handle_navigated: invalidate tree and style state

use tracing::info;

use crate::debugger::MAIN_CONTEXT_ID;
use crate::dom::MAIN_FRAME_ID;
use crate::error::BridgeError;
use crate::host::HostCookie;
use crate::protocol::{
    Cookie, DeleteCookieParams, Empty, ExecutionContextAuxData, ExecutionContextCreatedParams,
    ExecutionContextDescription, Frame, FrameNavigatedParams, GetCookiesResult, NavigateParams,
    NavigateResult, Notification, Request,
};

use super::super::core::{reply, unhandled};
use super::super::{Bridge, Reply};

impl Bridge {
    pub(in crate::adapter) fn handle_page(
        &mut self,
        request: &Request,
        _events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        match request.method_name() {
            "enable" => {
                self.enabled.page = true;
                reply(Empty {})
            }
            "disable" => {
                self.enabled.page = false;
                reply(Empty {})
            }
            "navigate" => {
                let params: NavigateParams = request.parse_params()?;
                info!(url = %params.url, "navigating");
                self.page.navigate(&params.url)?;
                reply(NavigateResult {
                    frame_id: MAIN_FRAME_ID.to_string(),
                })
            }
            "reload" => {
                self.page.reload()?;
                reply(Empty {})
            }
            "getCookies" => {
                let cookies = self.page.cookies()?.into_iter().map(cookie).collect();
                reply(GetCookiesResult { cookies })
            }
            "deleteCookie" => {
                let params: DeleteCookieParams = request.parse_params()?;
                self.page.delete_cookie(&params.cookie_name, &params.url)?;
                reply(Empty {})
            }
            _ => unhandled(request),
        }
    }

    /// The page moved to a new document. Stylesheets are removed first, then
    /// the client is told to drop its tree, then the new document's sheets,
    /// execution context and frame are announced.
    pub(in crate::adapter) fn handle_navigated(&mut self, url: &str, events: &mut Vec<Notification>) {
        info!(url, "navigated");
        self.styles.reset(events);
        self.dom.reset(self.page.document());
        events.push(Notification::bare("DOM.documentUpdated"));
        if self.enabled.css {
            self.styles.enable(self.page.as_ref(), &self.dom, events);
        }
        if self.enabled.runtime {
            events.push(Notification::bare("Runtime.executionContextsCleared"));
            events.push(self.context_created());
        }
        if self.enabled.page {
            events.push(Notification::new(
                "Page.frameNavigated",
                FrameNavigatedParams {
                    frame: Frame {
                        id: MAIN_FRAME_ID.to_string(),
                        loader_id: self.dom.generation().to_string(),
                        url: url.to_string(),
                        mime_type: "text/html".to_string(),
                        security_origin: origin_of(url),
                    },
                },
            ));
        }
    }

    pub(in crate::adapter) fn context_created(&self) -> Notification {
        Notification::new(
            "Runtime.executionContextCreated",
            ExecutionContextCreatedParams {
                context: ExecutionContextDescription {
                    id: MAIN_CONTEXT_ID,
                    origin: origin_of(&self.page.url()),
                    name: String::new(),
                    aux_data: ExecutionContextAuxData {
                        frame_id: MAIN_FRAME_ID.to_string(),
                        is_default: true,
                    },
                },
            },
        )
    }
}

fn cookie(cookie: HostCookie) -> Cookie {
    Cookie {
        size: cookie.name.chars().count() + cookie.value.chars().count(),
        expires: cookie.expires.unwrap_or(-1.0),
        session: cookie.expires.is_none(),
        name: cookie.name,
        value: cookie.value,
        domain: cookie.domain,
        path: cookie.path,
        http_only: cookie.http_only,
        secure: cookie.secure,
    }
}

/// `scheme://host[:port]`; URLs without an authority have an empty origin.
fn origin_of(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return String::new();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    format!("{scheme}://{authority}")
}
