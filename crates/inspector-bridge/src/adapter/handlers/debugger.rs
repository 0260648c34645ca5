//! Debugger domain handlers.
//! - handle_debugger: route Debugger.* requests
//! - enable: deferred until the host finishes enabling
//! - disable: also answers enables still parked
//! - resume/stepInto/stepOver/stepOut/pause: run control
//! - breakpoints, evaluateOnCallFrame, getScriptSource

use serde_json::json;

use crate::debugger::EnableOutcome;
use crate::error::BridgeError;
use crate::host::ResumeAction;
use crate::protocol::{
    BreakpointIdParams, Empty, EvaluateOnCallFrameParams, Request, ScriptIdParams,
    SetBreakpointByUrlParams,
};

use super::super::core::{reply, unhandled};
use super::super::{Bridge, DispatchOutcome, Reply};

impl Bridge {
    pub(in crate::adapter) fn handle_debugger(
        &mut self,
        request: &Request,
        outcome: &mut DispatchOutcome,
    ) -> Result<Reply, BridgeError> {
        let events = &mut outcome.notifications;
        match request.method_name() {
            "enable" => match self.debugger.enable(request.id)? {
                EnableOutcome::Enabled => Ok(Reply::Now(json!({}))),
                EnableOutcome::Pending => Ok(Reply::Deferred),
            },
            "disable" => {
                let parked = self.debugger.disable(events);
                outcome.responses.extend(parked);
                reply(Empty {})
            }
            "resume" => reply(self.debugger.resume(ResumeAction::Continue, events)?),
            "stepInto" => reply(self.debugger.resume(ResumeAction::StepInto, events)?),
            "stepOver" => reply(self.debugger.resume(ResumeAction::StepOver, events)?),
            "stepOut" => reply(self.debugger.resume(ResumeAction::StepOut, events)?),
            "pause" => reply(self.debugger.pause()?),
            "setBreakpointByUrl" => {
                let params: SetBreakpointByUrlParams = request.parse_params()?;
                reply(self.debugger.set_breakpoint_by_url(&params)?)
            }
            "removeBreakpoint" => {
                let params: BreakpointIdParams = request.parse_params()?;
                reply(self.debugger.remove_breakpoint(&params)?)
            }
            "evaluateOnCallFrame" => {
                let params: EvaluateOnCallFrameParams = request.parse_params()?;
                reply(self.debugger.evaluate_on_call_frame(&params)?)
            }
            "getScriptSource" => {
                let params: ScriptIdParams = request.parse_params()?;
                reply(self.debugger.get_script_source(&params.script_id)?)
            }
            _ => unhandled(request),
        }
    }
}
