//! Remote debugging protocol bridge.
//!
//! Translates DOM, CSS, Page, Runtime and Debugger protocol requests into
//! calls on a host browsing engine ([`PageHost`], [`ScriptDebugHost`]) and
//! host events into protocol notifications. Node and stylesheet identity is
//! kept in generation-scoped registries so the client only ever sees stable
//! integer ids.

pub mod adapter;
pub mod config;
pub mod debugger;
pub mod dom;
pub mod error;
pub mod host;
pub mod protocol;
pub mod registry;
pub mod snapshot;
pub mod styles;

pub use adapter::{Bridge, BridgeInput, DispatchOutcome};
pub use config::{BridgeConfig, ConfigError, TRANSCRIPT_ENV};
pub use debugger::{DebuggerBridge, DebuggerState};
pub use dom::{DomAgent, DomState};
pub use error::{BridgeError, IdKind};
pub use host::{HostError, HostEvent, NodeHandle, PageHost, ScriptDebugHost, SheetHandle};
pub use protocol::{Notification, OutboundMessage, Request, Response};
pub use registry::IdentityRegistry;
pub use snapshot::{Overlay, OverlayState, PageSnapshot, SnapshotDebugger, SnapshotPage};
pub use styles::StyleAgent;
