//! Bridge errors and their protocol form.

#![allow(missing_docs)]

use std::fmt;

use inspector_syntax::{CssError, PositionError};
use smol_str::SmolStr;
use thiserror::Error;

use crate::host::HostError;
use crate::protocol::ProtocolError;

pub const SERVER_ERROR: i64 = -32000;
pub const INVALID_PARAMS: i64 = -32602;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;
pub const PARSE_ERROR: i64 = -32700;

/// What an unknown or stale protocol id was supposed to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Node,
    StyleSheet,
    Script,
    Breakpoint,
    CallFrame,
    Object,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdKind::Node => "node",
            IdKind::StyleSheet => "style sheet",
            IdKind::Script => "script",
            IdKind::Breakpoint => "breakpoint",
            IdKind::CallFrame => "call frame",
            IdKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Failures of a single protocol request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The inbound message is not a request envelope.
    #[error("malformed request: {0}")]
    MalformedRequest(SmolStr),

    /// Request parameters do not match the method.
    #[error("invalid params: {0}")]
    InvalidParams(SmolStr),

    /// The domain is not served by the bridge.
    #[error("'{0}' wasn't found")]
    UnknownMethod(SmolStr),

    /// The id was never minted or belongs to an earlier generation.
    #[error("unknown {kind} id '{id}'")]
    UnknownId { kind: IdKind, id: SmolStr },

    /// The id resolves to a host object that is no longer attached.
    #[error("{kind} '{id}' is no longer attached")]
    StaleState { kind: IdKind, id: SmolStr },

    /// An id was requested for a missing host object.
    #[error("no host object to identify")]
    InvalidReference,

    #[error("offset {offset} is out of range (text length {len})")]
    OutOfRange { offset: usize, len: usize },

    #[error("line {line}, column {column} is not a position in the text")]
    InvalidPosition { line: usize, column: usize },

    /// Breakpoint URL does not name a loaded script.
    #[error("no script is loaded from '{0}'")]
    UnresolvedSource(SmolStr),

    /// The domain has to be enabled first.
    #[error("{0} is not enabled")]
    NotEnabled(&'static str),

    /// A host collaborator call failed.
    #[error("host operation failed: {0}")]
    HostOperationFailed(#[from] HostError),

    /// Bridge bookkeeping disagrees with the host.
    #[error("internal error: {0}")]
    Invariant(SmolStr),
}

impl BridgeError {
    pub fn unknown_id(kind: IdKind, id: impl fmt::Display) -> Self {
        BridgeError::UnknownId {
            kind,
            id: SmolStr::new(id.to_string()),
        }
    }

    pub fn stale(kind: IdKind, id: impl fmt::Display) -> Self {
        BridgeError::StaleState {
            kind,
            id: SmolStr::new(id.to_string()),
        }
    }

    pub fn invariant(message: impl Into<SmolStr>) -> Self {
        BridgeError::Invariant(message.into())
    }

    pub fn invalid_params(message: impl fmt::Display) -> Self {
        BridgeError::InvalidParams(SmolStr::new(message.to_string()))
    }

    /// Protocol error object for a request addressed to `domain`.
    #[must_use]
    pub fn to_protocol_error(&self, domain: &str) -> ProtocolError {
        let (code, message) = match self {
            BridgeError::MalformedRequest(_) => (PARSE_ERROR, self.to_string()),
            BridgeError::InvalidParams(_)
            | BridgeError::OutOfRange { .. }
            | BridgeError::InvalidPosition { .. } => (INVALID_PARAMS, self.to_string()),
            BridgeError::UnknownMethod(_) => (METHOD_NOT_FOUND, self.to_string()),
            BridgeError::UnknownId {
                kind: IdKind::Node, ..
            }
            | BridgeError::StaleState {
                kind: IdKind::Node, ..
            } if domain == "DOM" => (SERVER_ERROR, "Node not found".to_string()),
            BridgeError::UnknownId {
                kind: IdKind::Node, ..
            }
            | BridgeError::StaleState {
                kind: IdKind::Node, ..
            } => (SERVER_ERROR, "No node with given id found".to_string()),
            BridgeError::UnknownId {
                kind: IdKind::StyleSheet,
                ..
            }
            | BridgeError::StaleState {
                kind: IdKind::StyleSheet,
                ..
            } => (
                SERVER_ERROR,
                "No style sheet with given id found".to_string(),
            ),
            BridgeError::Invariant(_) => (INTERNAL_ERROR, self.to_string()),
            _ => (SERVER_ERROR, self.to_string()),
        };
        ProtocolError { code, message }
    }
}

impl From<PositionError> for BridgeError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::OutOfRange { offset, len } => BridgeError::OutOfRange { offset, len },
            PositionError::InvalidPosition { line, column } => {
                BridgeError::InvalidPosition { line, column }
            }
        }
    }
}

impl From<CssError> for BridgeError {
    fn from(err: CssError) -> Self {
        BridgeError::Invariant(SmolStr::new(err.to_string()))
    }
}
