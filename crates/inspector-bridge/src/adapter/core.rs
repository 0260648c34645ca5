//! Bridge core loop + request dispatch.
//! - Bridge::new/accessors
//! - handle: one inbox entry (client message or host event)
//! - dispatch: route requests by domain
//! - run_stdio: stdin reader thread + stdout writer

use std::fs::OpenOptions;
use std::io::{self, BufReader, BufWriter};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::debugger::DebuggerBridge;
use crate::dom::DomAgent;
use crate::error::BridgeError;
use crate::host::{HostEvent, PageHost, ScriptDebugHost};
use crate::protocol::{Request, Response};
use crate::styles::StyleAgent;

use super::protocol_io::{read_message, write_message, write_protocol_log};
use super::{Bridge, BridgeInput, DispatchOutcome, EnabledDomains, Reply};

impl Bridge {
    #[must_use]
    pub fn new(
        page: impl PageHost + 'static,
        script: impl ScriptDebugHost + 'static,
        config: BridgeConfig,
    ) -> Self {
        let dom = DomAgent::new(page.document(), config.default_depth);
        Self {
            page: Box::new(page),
            debugger: DebuggerBridge::new(Box::new(script)),
            dom,
            styles: StyleAgent::new(),
            config,
            enabled: EnabledDomains::default(),
        }
    }

    #[must_use]
    pub fn page(&self) -> &dyn PageHost {
        self.page.as_ref()
    }

    #[must_use]
    pub fn dom(&self) -> &DomAgent {
        &self.dom
    }

    #[must_use]
    pub fn debugger(&self) -> &DebuggerBridge {
        &self.debugger
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Process one inbox entry to completion.
    pub fn handle(&mut self, input: BridgeInput) -> DispatchOutcome {
        match input {
            BridgeInput::Client(payload) => self.handle_message(&payload),
            BridgeInput::Host(event) => self.handle_host_event(event),
            BridgeInput::Shutdown => DispatchOutcome::default(),
        }
    }

    pub fn handle_message(&mut self, payload: &str) -> DispatchOutcome {
        match serde_json::from_str::<Request>(payload) {
            Ok(request) => self.dispatch(&request),
            Err(err) => {
                warn!(%err, "malformed client message");
                let error = BridgeError::MalformedRequest(err.to_string().into());
                DispatchOutcome {
                    responses: vec![Response::failure(0, error.to_protocol_error(""))],
                    ..DispatchOutcome::default()
                }
            }
        }
    }

    pub fn handle_host_event(&mut self, event: HostEvent) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let events = &mut outcome.notifications;
        match event {
            HostEvent::Navigated { url } => self.handle_navigated(&url, events),
            HostEvent::InspectNodeRequested { node } => self.handle_inspect_node(node, events),
            HostEvent::DebuggingEnabled { succeeded } => {
                let responses = self.debugger.on_debugging_enabled(succeeded);
                outcome.responses.extend(responses);
            }
            HostEvent::DocumentsAdded(documents) => {
                self.debugger.on_documents_added(documents, events);
            }
            HostEvent::DocumentsRemoved(documents) => {
                self.debugger.on_documents_removed(&documents);
            }
            HostEvent::DocumentsUpdated(documents) => {
                self.debugger.on_documents_updated(documents);
            }
            HostEvent::BreakpointsResolved(breakpoints) => {
                self.debugger.on_breakpoints_resolved(&breakpoints, events);
            }
            HostEvent::Break(info) => self.debugger.on_break(&info, events),
            HostEvent::Resumed => self.debugger.on_resumed(events),
        }
        outcome
    }

    pub(super) fn dispatch(&mut self, request: &Request) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let domain = request.domain().to_string();
        let result = match domain.as_str() {
            "DOM" => self.handle_dom(request, &mut outcome.notifications),
            "CSS" => self.handle_css(request, &mut outcome.notifications),
            "Page" => self.handle_page(request, &mut outcome.notifications),
            "Runtime" => self.handle_runtime(request, &mut outcome.notifications),
            "Debugger" => self.handle_debugger(request, &mut outcome),
            _ => Err(BridgeError::UnknownMethod(request.method.as_str().into())),
        };
        match result {
            Ok(Reply::Now(value)) => outcome
                .responses
                .push(Response::success(request.id, value)),
            Ok(Reply::Deferred) => {}
            Err(err) => {
                if matches!(err, BridgeError::Invariant(_)) {
                    error!(%err, method = %request.method, "request aborted");
                } else {
                    debug!(%err, method = %request.method, "request failed");
                }
                outcome
                    .responses
                    .push(Response::failure(request.id, err.to_protocol_error(&domain)));
            }
        }
        outcome
    }

    /// Run the blocking stdio loop. Client lines and host events are merged
    /// in `inbox`; `sender` feeds it from a stdin reader thread, which also
    /// sends [`BridgeInput::Shutdown`] when stdin closes.
    pub fn run_stdio(
        &mut self,
        inbox: Receiver<BridgeInput>,
        sender: Sender<BridgeInput>,
    ) -> io::Result<()> {
        let mut transcript = self
            .config
            .transcript_path()
            .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok())
            .map(BufWriter::new);

        let reader_thread = thread::spawn(move || {
            let stdin = io::stdin();
            let mut reader = BufReader::new(stdin.lock());
            loop {
                match read_message(&mut reader) {
                    Ok(Some(payload)) => {
                        if sender.send(BridgeInput::Client(payload)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = sender.send(BridgeInput::Shutdown);
                        break;
                    }
                    Err(err) => {
                        warn!(%err, "stdin read failed");
                        let _ = sender.send(BridgeInput::Shutdown);
                        break;
                    }
                }
            }
        });

        let mut writer = BufWriter::new(io::stdout());
        while let Ok(input) = inbox.recv() {
            if matches!(input, BridgeInput::Shutdown) {
                info!("client disconnected");
                break;
            }
            if let (Some(logger), BridgeInput::Client(payload)) = (transcript.as_mut(), &input) {
                let _ = write_protocol_log(logger, "<-", payload);
            }
            for message in self.handle(input).into_messages() {
                let serialized = serde_json::to_string(&message)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                if let Some(logger) = transcript.as_mut() {
                    let _ = write_protocol_log(logger, "->", &serialized);
                }
                write_message(&mut writer, &serialized)?;
            }
        }

        let _ = reader_thread.join();
        Ok(())
    }
}

pub(super) fn reply<T: Serialize>(value: T) -> Result<Reply, BridgeError> {
    serde_json::to_value(value)
        .map(Reply::Now)
        .map_err(|err| BridgeError::invariant(format!("result serialization: {err}")))
}

/// Methods a domain does not implement still succeed with an empty result.
pub(super) fn unhandled(request: &Request) -> Result<Reply, BridgeError> {
    debug!(method = %request.method, "unhandled method");
    Ok(Reply::Now(json!({})))
}
