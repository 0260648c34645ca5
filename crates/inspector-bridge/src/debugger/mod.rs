//! Debugger domain state machine.
//!
//! `Disabled -> EnablePending -> Running <-> AtBreak`. The host engine
//! speaks flat character offsets into opaque documents; everything that
//! leaves this module is converted to script ids and line/column pairs
//! through a per-document [`LineIndex`](inspector_syntax::LineIndex) cache.

mod breakpoints;
mod documents;
mod remote;

pub use breakpoints::BreakpointRecord;
pub use remote::{remote_object, remote_value};

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, IdKind};
use crate::host::{
    BreakReason, DocumentId, HostBreakInfo, HostBreakpoint, HostError, HostProperty,
    HostScriptDocument, HostSourceLocation, HostStackFrame, ResumeAction, ScriptDebugHost,
};
use crate::protocol::{
    BreakpointIdParams, BreakpointResolvedParams, CallFrame, CallFunctionOnParams, Empty,
    EvaluateOnCallFrameParams,
    EvaluateResult, GetPropertiesParams, GetPropertiesResult, Location, Notification,
    PausedParams, PropertyDescriptor, RemoteObject, RequestId, Response, Scope,
    ScriptParsedParams, ScriptSourceResult, SetBreakpointByUrlParams, SetBreakpointByUrlResult,
};
use breakpoints::BreakpointTable;
use documents::DocumentTable;

/// Execution context id announced for the top-level page.
pub const MAIN_CONTEXT_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebuggerState {
    Disabled,
    EnablePending,
    Running,
    AtBreak,
}

/// Object group clients use for the evaluation behind property completions.
const COMPLETION_GROUP: &str = "completion";

/// Answer to a `Debugger.enable` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    /// Already enabled; respond now.
    Enabled,
    /// Parked until the host reports [`DebuggingEnabled`](crate::host::HostEvent::DebuggingEnabled).
    Pending,
}

pub struct DebuggerBridge {
    host: Box<dyn ScriptDebugHost>,
    state: DebuggerState,
    waiting: Vec<RequestId>,
    documents: DocumentTable,
    breakpoints: BreakpointTable,
    /// Frame and expression of the last completion evaluation; the
    /// following `Runtime.callFunctionOn` lists its properties.
    completion: Option<(u32, String)>,
}

impl DebuggerBridge {
    pub fn new(host: Box<dyn ScriptDebugHost>) -> Self {
        Self {
            host,
            state: DebuggerState::Disabled,
            waiting: Vec::new(),
            documents: DocumentTable::default(),
            breakpoints: BreakpointTable::default(),
            completion: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> DebuggerState {
        self.state
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self.state, DebuggerState::Running | DebuggerState::AtBreak)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == DebuggerState::AtBreak
    }

    #[must_use]
    pub fn breakpoint(&self, id: u32) -> Option<&BreakpointRecord> {
        self.breakpoints.get(id)
    }

    fn require_enabled(&self) -> Result<(), BridgeError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(BridgeError::NotEnabled("Debugger"))
        }
    }

    /// Start enabling; concurrent requests share one host round trip.
    pub fn enable(&mut self, request: RequestId) -> Result<EnableOutcome, BridgeError> {
        match self.state {
            DebuggerState::Running | DebuggerState::AtBreak => Ok(EnableOutcome::Enabled),
            DebuggerState::EnablePending => {
                debug!(request, "coalescing Debugger.enable");
                self.waiting.push(request);
                Ok(EnableOutcome::Pending)
            }
            DebuggerState::Disabled => {
                self.host.enable()?;
                info!("waiting for host debugger");
                self.state = DebuggerState::EnablePending;
                self.waiting.push(request);
                Ok(EnableOutcome::Pending)
            }
        }
    }

    /// Host finished enabling: connect and answer every parked request.
    pub fn on_debugging_enabled(&mut self, succeeded: bool) -> Vec<Response> {
        if self.state != DebuggerState::EnablePending {
            debug!(succeeded, "ignoring unsolicited debugging-enabled event");
            return Vec::new();
        }
        let outcome = if succeeded {
            self.host.connect().map_err(BridgeError::from)
        } else {
            Err(BridgeError::HostOperationFailed(HostError::Failed(
                "host refused to enable debugging".to_string(),
            )))
        };
        match &outcome {
            Ok(()) => {
                info!("debugger connected");
                self.state = DebuggerState::Running;
            }
            Err(err) => {
                warn!(error = %err, "debugger enable failed");
                self.state = DebuggerState::Disabled;
            }
        }
        self.waiting
            .drain(..)
            .map(|id| match &outcome {
                Ok(()) => Response::success(id, json!({})),
                Err(err) => Response::failure(id, err.to_protocol_error("Debugger")),
            })
            .collect()
    }

    /// Resume if paused, disconnect and forget all documents and breakpoints.
    /// Requests still parked on a pending enable are answered with an error.
    pub fn disable(&mut self, events: &mut Vec<Notification>) -> Vec<Response> {
        if self.state == DebuggerState::AtBreak {
            if let Err(err) = self.host.resume(ResumeAction::Continue) {
                warn!(error = %err, "resume before disable failed");
            }
            events.push(Notification::bare("Debugger.resumed"));
        }
        if self.is_enabled() {
            if let Err(err) = self.host.disconnect() {
                warn!(error = %err, "debugger disconnect failed");
            }
        }
        self.state = DebuggerState::Disabled;
        self.documents.clear();
        self.breakpoints.clear();
        self.completion = None;
        let error = BridgeError::NotEnabled("Debugger").to_protocol_error("Debugger");
        self.waiting
            .drain(..)
            .map(|id| Response::failure(id, error.clone()))
            .collect()
    }

    pub fn resume(
        &mut self,
        action: ResumeAction,
        events: &mut Vec<Notification>,
    ) -> Result<Empty, BridgeError> {
        match self.state {
            DebuggerState::Disabled | DebuggerState::EnablePending => {
                Err(BridgeError::NotEnabled("Debugger"))
            }
            DebuggerState::Running => Ok(Empty {}),
            DebuggerState::AtBreak => {
                self.host.resume(action)?;
                debug!(?action, "resumed");
                self.state = DebuggerState::Running;
                self.completion = None;
                events.push(Notification::bare("Debugger.resumed"));
                Ok(Empty {})
            }
        }
    }

    pub fn pause(&mut self) -> Result<Empty, BridgeError> {
        self.require_enabled()?;
        if self.state == DebuggerState::Running {
            self.host.cause_break()?;
        }
        Ok(Empty {})
    }

    /// The host resumed on its own (or confirmed a bridge resume).
    pub fn on_resumed(&mut self, events: &mut Vec<Notification>) {
        if self.state == DebuggerState::AtBreak {
            self.state = DebuggerState::Running;
            self.completion = None;
            events.push(Notification::bare("Debugger.resumed"));
        }
    }

    pub fn on_break(&mut self, info: &HostBreakInfo, events: &mut Vec<Notification>) {
        if !self.is_enabled() {
            debug!("break while disabled ignored");
            return;
        }
        self.state = DebuggerState::AtBreak;
        let frames = match self.host.frames() {
            Ok(frames) => frames,
            Err(err) => {
                warn!(error = %err, "host call stack unavailable");
                Vec::new()
            }
        };
        let call_frames = frames
            .iter()
            .map(|frame| self.call_frame(frame))
            .collect();
        let (reason, data) = match info.reason {
            BreakReason::Error => (
                "exception",
                Some(json!({ "description": info.description })),
            ),
            _ => ("other", None),
        };
        info!(reason, breakpoints = info.breakpoints.len(), "paused");
        events.push(Notification::new(
            "Debugger.paused",
            PausedParams {
                call_frames,
                reason: reason.to_string(),
                hit_breakpoints: info.breakpoints.iter().map(u32::to_string).collect(),
                data,
            },
        ));
    }

    fn call_frame(&mut self, frame: &HostStackFrame) -> CallFrame {
        let location = self.protocol_location(frame.location);
        let mut scope_chain = Vec::new();
        if let Some(locals) = frame.locals {
            scope_chain.push(scope("local", locals));
            // Fake properties of the locals object stand for enclosing scopes.
            match self.host.child_properties(locals) {
                Ok(children) => scope_chain.extend(
                    children
                        .iter()
                        .filter(|property| property.fake)
                        .map(|property| scope("closure", property.id)),
                ),
                Err(err) => warn!(error = %err, frame = frame.id, "locals unavailable"),
            }
        }
        CallFrame {
            call_frame_id: frame.id.to_string(),
            function_name: frame.function_name.clone(),
            location,
            scope_chain,
            this: RemoteObject {
                object_type: "undefined".to_string(),
                ..RemoteObject::default()
            },
        }
    }

    /// Location for a host offset; a document whose text cannot be read
    /// degrades to its start.
    fn protocol_location(&mut self, location: HostSourceLocation) -> Location {
        self.documents
            .location(self.host.as_ref(), location.document, location.offset)
            .unwrap_or_else(|err| {
                warn!(error = %err, document = location.document.0, "cannot map offset");
                Location {
                    script_id: location.document.0.to_string(),
                    line_number: 0,
                    column_number: Some(0),
                }
            })
    }

    pub fn on_documents_added(
        &mut self,
        added: Vec<HostScriptDocument>,
        events: &mut Vec<Notification>,
    ) {
        if !self.is_enabled() {
            debug!(count = added.len(), state = ?self.state, "ignoring documents before connect");
            return;
        }
        for document in added {
            // Text is fetched lazily; until then the end is reported in
            // characters on line 0.
            let (end_line, end_column) = self
                .documents
                .cached(document.id)
                .map_or((0, document.length), |lines| lines.end_position());
            debug!(id = document.id.0, url = %document.url, "script parsed");
            events.push(Notification::new(
                "Debugger.scriptParsed",
                ScriptParsedParams {
                    script_id: document.id.0.to_string(),
                    url: document.url.clone(),
                    start_line: 0,
                    start_column: 0,
                    end_line,
                    end_column,
                    execution_context_id: MAIN_CONTEXT_ID,
                    hash: String::new(),
                    source_map_url: document.source_map_url.clone(),
                },
            ));
            self.documents.add(document);
        }
    }

    pub fn on_documents_removed(&mut self, removed: &[DocumentId]) {
        for &id in removed {
            if self.documents.remove(id).is_some() {
                let unbound = self.breakpoints.unbind_document(id);
                debug!(document = id.0, ?unbound, "script removed");
            }
        }
    }

    pub fn on_documents_updated(&mut self, updated: Vec<HostScriptDocument>) {
        for document in updated {
            debug!(id = document.id.0, "script updated");
            self.documents.update(document);
        }
    }

    pub fn on_breakpoints_resolved(
        &mut self,
        resolved: &[HostBreakpoint],
        events: &mut Vec<Notification>,
    ) {
        for breakpoint in resolved {
            let Some(record) = self.breakpoints.resolve(breakpoint) else {
                debug!(id = breakpoint.id, "resolution for unknown breakpoint");
                continue;
            };
            if !record.bound {
                continue;
            }
            let location = self.protocol_location(breakpoint.location);
            events.push(Notification::new(
                "Debugger.breakpointResolved",
                BreakpointResolvedParams {
                    breakpoint_id: breakpoint.id.to_string(),
                    location,
                },
            ));
        }
    }

    pub fn set_breakpoint_by_url(
        &mut self,
        params: &SetBreakpointByUrlParams,
    ) -> Result<SetBreakpointByUrlResult, BridgeError> {
        self.require_enabled()?;
        let url = params
            .url
            .as_deref()
            .ok_or_else(|| BridgeError::invalid_params("url is required"))?;
        let document = self
            .documents
            .by_url(url)
            .ok_or_else(|| BridgeError::UnresolvedSource(url.into()))?;
        let offset = self
            .documents
            .line_index(self.host.as_ref(), document)?
            .line_column_to_offset(params.line_number, params.column_number.unwrap_or(0))?;
        let condition = params.condition.as_deref().filter(|text| !text.is_empty());
        let breakpoint = self.host.add_code_breakpoint(
            HostSourceLocation { document, offset },
            condition,
            false,
        )?;
        info!(id = breakpoint.id, url, line = params.line_number, "breakpoint set");
        self.breakpoints.insert(BreakpointRecord {
            id: breakpoint.id,
            document: breakpoint.location.document,
            offset: breakpoint.location.offset,
            condition: condition.map(str::to_string),
            is_tracepoint: false,
            bound: breakpoint.bound,
        });
        let locations = if breakpoint.bound {
            vec![self.protocol_location(breakpoint.location)]
        } else {
            Vec::new()
        };
        Ok(SetBreakpointByUrlResult {
            breakpoint_id: breakpoint.id.to_string(),
            locations,
        })
    }

    pub fn remove_breakpoint(&mut self, params: &BreakpointIdParams) -> Result<Empty, BridgeError> {
        self.require_enabled()?;
        let unknown = || BridgeError::unknown_id(IdKind::Breakpoint, &params.breakpoint_id);
        let id = params.breakpoint_id.parse::<u32>().map_err(|_| unknown())?;
        if self.breakpoints.get(id).is_none() {
            return Err(unknown());
        }
        self.host.remove_breakpoint(id)?;
        self.breakpoints.remove(id);
        info!(id, "breakpoint removed");
        Ok(Empty {})
    }

    pub fn get_script_source(&mut self, script_id: &str) -> Result<ScriptSourceResult, BridgeError> {
        self.require_enabled()?;
        let document = self.documents.parse_script_id(script_id)?;
        let text = self.host.source_text(document)?;
        self.documents.prime(document, &text);
        Ok(ScriptSourceResult {
            script_source: text,
        })
    }

    pub fn evaluate_on_call_frame(
        &mut self,
        params: &EvaluateOnCallFrameParams,
    ) -> Result<EvaluateResult, BridgeError> {
        self.require_enabled()?;
        let unknown = || BridgeError::unknown_id(IdKind::CallFrame, &params.call_frame_id);
        let frame = params.call_frame_id.parse::<u32>().map_err(|_| unknown())?;
        if !self.host.frames()?.iter().any(|candidate| candidate.id == frame) {
            return Err(unknown());
        }
        if params.object_group.as_deref() == Some(COMPLETION_GROUP) {
            self.completion = Some((frame, params.expression.clone()));
        }
        self.evaluate(frame, &params.expression)
    }

    /// Property names of the pending completion object, or of `objectId`
    /// when nothing is pending, as an object mapping each name to `true`.
    pub fn call_function_on(
        &mut self,
        params: &CallFunctionOnParams,
    ) -> Result<EvaluateResult, BridgeError> {
        self.require_enabled()?;
        let object = match self.completion.take() {
            Some((frame, expression)) => self.host.eval(frame, &expression)?.id,
            None => {
                let object_id = params
                    .object_id
                    .as_deref()
                    .ok_or_else(|| BridgeError::invalid_params("objectId is required"))?;
                object_id
                    .parse::<u32>()
                    .map_err(|_| BridgeError::unknown_id(IdKind::Object, object_id))?
            }
        };
        let names: Map<String, Value> = self
            .host
            .child_properties(object)?
            .into_iter()
            .filter(|property| !property.fake)
            .map(|property| (property.name, Value::Bool(true)))
            .collect();
        debug!(object, count = names.len(), "completion properties");
        Ok(EvaluateResult {
            result: RemoteObject {
                object_type: "object".to_string(),
                value: Some(Value::Object(names)),
                ..RemoteObject::default()
            },
            was_thrown: false,
        })
    }

    /// Evaluate in the innermost frame; `None` when not paused.
    pub fn evaluate_on_top_frame(
        &mut self,
        expression: &str,
    ) -> Option<Result<EvaluateResult, BridgeError>> {
        if !self.is_paused() {
            return None;
        }
        let top = match self.host.frames() {
            Ok(frames) => frames.first().map(|frame| frame.id)?,
            Err(err) => return Some(Err(err.into())),
        };
        Some(self.evaluate(top, expression))
    }

    fn evaluate(&mut self, frame: u32, expression: &str) -> Result<EvaluateResult, BridgeError> {
        let property = self.host.eval(frame, expression)?;
        let (result, was_thrown) = remote_object(&property);
        Ok(EvaluateResult { result, was_thrown })
    }

    pub fn get_properties(
        &self,
        params: &GetPropertiesParams,
    ) -> Result<GetPropertiesResult, BridgeError> {
        self.require_enabled()?;
        let id = params
            .object_id
            .parse::<u32>()
            .map_err(|_| BridgeError::unknown_id(IdKind::Object, &params.object_id))?;
        let properties = self.host.child_properties(id)?;
        let result = properties
            .iter()
            .filter(|property| keep_property(property, params.accessor_properties_only))
            .map(|property| PropertyDescriptor {
                name: property.name.clone(),
                value: remote_object(property).0,
                writable: !property.read_only,
                configurable: false,
                enumerable: true,
                is_own: true,
            })
            .collect();
        Ok(GetPropertiesResult { result })
    }
}

fn keep_property(property: &HostProperty, accessors_only: Option<bool>) -> bool {
    if property.fake {
        return false;
    }
    match accessors_only {
        Some(true) => property.read_only,
        Some(false) => !property.read_only,
        None => true,
    }
}

fn scope(kind: &str, object: u32) -> Scope {
    Scope {
        scope_type: kind.to_string(),
        object: RemoteObject {
            object_type: "object".to_string(),
            class_name: Some("Object".to_string()),
            description: Some("Object".to_string()),
            object_id: Some(object.to_string()),
            ..RemoteObject::default()
        },
    }
}
