//! Runtime domain handlers.
//! - handle_runtime: route Runtime.* requests
//! - enable: announce the page's execution context
//! - evaluate: paused frame when at a break, page script otherwise
//! - callFunctionOn: completion property names while paused, page script otherwise
//! - getProperties: debugger object children

use crate::debugger::remote_value;
use crate::error::BridgeError;
use crate::protocol::{
    CallFunctionOnParams, Empty, EvaluateParams, EvaluateResult, GetPropertiesParams,
    Notification, Request,
};

use super::super::core::{reply, unhandled};
use super::super::{Bridge, Reply};

impl Bridge {
    pub(in crate::adapter) fn handle_runtime(
        &mut self,
        request: &Request,
        events: &mut Vec<Notification>,
    ) -> Result<Reply, BridgeError> {
        match request.method_name() {
            "enable" => {
                if !self.enabled.runtime {
                    self.enabled.runtime = true;
                    events.push(self.context_created());
                }
                reply(Empty {})
            }
            "disable" => {
                self.enabled.runtime = false;
                reply(Empty {})
            }
            "evaluate" => {
                let params: EvaluateParams = request.parse_params()?;
                if let Some(result) = self.debugger.evaluate_on_top_frame(&params.expression) {
                    return reply(result?);
                }
                let value = self.page.execute_script(&params.expression)?;
                let (result, was_thrown) = remote_value(&value);
                reply(EvaluateResult { result, was_thrown })
            }
            "callFunctionOn" => {
                let params: CallFunctionOnParams = request.parse_params()?;
                if self.debugger.is_paused() {
                    return reply(self.debugger.call_function_on(&params)?);
                }
                let value = self.page.execute_script(&page_call(&params))?;
                let (result, was_thrown) = remote_value(&value);
                reply(EvaluateResult { result, was_thrown })
            }
            "getProperties" => {
                let params: GetPropertiesParams = request.parse_params()?;
                reply(self.debugger.get_properties(&params)?)
            }
            _ => unhandled(request),
        }
    }
}

/// `declaration.call(window, args...)` with each argument as a JSON literal.
fn page_call(params: &CallFunctionOnParams) -> String {
    let mut call = format!("{}.call(window", params.function_declaration);
    for argument in params.arguments.iter().flatten() {
        call.push_str(", ");
        match &argument.value {
            Some(value) => call.push_str(&value.to_string()),
            None => call.push_str("undefined"),
        }
    }
    call.push(')');
    call
}
