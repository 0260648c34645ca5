//! Protocol bridge module map.
//! - core: Bridge::new, inbox handling, domain routing, stdio loop
//! - handlers: request handlers by protocol domain
//! - protocol_io: line framing + transcript logging
//! - tests: bridge unit tests

mod core;
mod handlers;
mod protocol_io;

#[cfg(test)]
mod tests;

use serde_json::Value;

use crate::config::BridgeConfig;
use crate::debugger::DebuggerBridge;
use crate::dom::{DocumentObserver, DomAgent};
use crate::host::{HostEvent, NodeHandle, PageHost};
use crate::protocol::{Notification, OutboundMessage, Response};
use crate::styles::StyleAgent;

/// One entry of the bridge inbox: client traffic and host events share a
/// single FIFO so they are handled strictly in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeInput {
    Client(String),
    Host(HostEvent),
    Shutdown,
}

/// Everything produced by handling one inbox entry. Notifications are
/// written before responses.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub notifications: Vec<Notification>,
    pub responses: Vec<Response>,
}

impl DispatchOutcome {
    #[must_use]
    pub fn into_messages(self) -> Vec<OutboundMessage> {
        self.notifications
            .into_iter()
            .map(OutboundMessage::Notification)
            .chain(self.responses.into_iter().map(OutboundMessage::Response))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.responses.is_empty()
    }
}

/// Result of a request handler.
enum Reply {
    Now(Value),
    /// Answered later from a host event.
    Deferred,
}

#[derive(Debug, Clone, Copy, Default)]
struct EnabledDomains {
    css: bool,
    page: bool,
    runtime: bool,
}

/// Forwards embedded-document discovery to the CSS agent while the CSS
/// domain is enabled.
struct SheetAnnouncer<'a> {
    styles: &'a mut StyleAgent,
    enabled: bool,
}

impl DocumentObserver for SheetAnnouncer<'_> {
    fn document_discovered(
        &mut self,
        host: &dyn PageHost,
        document: NodeHandle,
        frame_id: &str,
        events: &mut Vec<Notification>,
    ) {
        if self.enabled {
            self.styles
                .document_discovered(host, document, frame_id, events);
        }
    }
}

/// Translates client requests into host calls and host events into
/// client notifications.
pub struct Bridge {
    page: Box<dyn PageHost>,
    debugger: DebuggerBridge,
    dom: DomAgent,
    styles: StyleAgent,
    config: BridgeConfig,
    enabled: EnabledDomains,
}
