//! Bridge unit tests.
//! - envelope errors and domain routing
//! - navigation invalidation
//! - debugger enable coalescing and run control
//! - outbound ordering

use crossbeam_channel::{unbounded, Receiver};
use expect_test::expect;
use serde_json::{json, Value};

use super::*;
use crate::config::BridgeConfig;
use crate::debugger::DebuggerState;
use crate::error::{METHOD_NOT_FOUND, PARSE_ERROR, SERVER_ERROR};
use crate::protocol::OutboundMessage;
use crate::snapshot::PageSnapshot;

const PAGE: &str = r#"{
    "url": "http://example.test/index.html",
    "document": {
        "styleSheets": [{"href": "http://example.test/site.css", "text": "p { color: red; }"}],
        "children": [
            {"name": "HTML", "children": [
                {"name": "BODY", "children": [
                    {"name": "P", "matched": [{"sheet": 0, "rule": 0}]}
                ]}
            ]}
        ]
    },
    "scripts": [
        {"url": "http://example.test/app.js", "source": "var a = 1;\nfunction f() {\n  return a;\n}\n"}
    ]
}"#;

fn bridge() -> (Bridge, Receiver<BridgeInput>) {
    let snapshot: PageSnapshot = serde_json::from_str(PAGE).unwrap();
    let (tx, rx) = unbounded();
    let (page, script) = snapshot.into_hosts(Some(tx));
    (Bridge::new(page, script, BridgeConfig::default()), rx)
}

fn send(bridge: &mut Bridge, id: i64, method: &str, params: Value) -> DispatchOutcome {
    let payload = json!({"id": id, "method": method, "params": params}).to_string();
    bridge.handle(BridgeInput::Client(payload))
}

/// Handle every host event queued so far, in order.
fn pump(bridge: &mut Bridge, inbox: &Receiver<BridgeInput>) -> DispatchOutcome {
    let mut merged = DispatchOutcome::default();
    while let Ok(input) = inbox.try_recv() {
        let outcome = bridge.handle(input);
        merged.notifications.extend(outcome.notifications);
        merged.responses.extend(outcome.responses);
    }
    merged
}

fn methods(outcome: &DispatchOutcome) -> Vec<&str> {
    outcome
        .notifications
        .iter()
        .map(|event| event.method.as_str())
        .collect()
}

fn result(outcome: &DispatchOutcome) -> &Value {
    outcome.responses[0].result.as_ref().unwrap()
}

#[test]
fn malformed_message_answers_with_id_zero() {
    let (mut bridge, _) = bridge();
    let outcome = bridge.handle(BridgeInput::Client("{not json".to_string()));
    assert_eq!(outcome.responses.len(), 1);
    assert_eq!(outcome.responses[0].id, 0);
    assert_eq!(
        outcome.responses[0].error.as_ref().unwrap().code,
        PARSE_ERROR
    );
}

#[test]
fn replaced_bytes_in_a_method_name_still_get_an_answer() {
    let (mut bridge, _) = bridge();
    let outcome = bridge.handle(BridgeInput::Client(
        "{\"id\":1,\"method\":\"DOM.x\u{fffd}\"}".to_string(),
    ));
    assert_eq!(outcome.responses[0].id, 1);
    assert_eq!(result(&outcome), &json!({}));
    let next = send(&mut bridge, 2, "DOM.getDocument", json!({}));
    assert_eq!(result(&next)["root"]["nodeId"], 1);
}

#[test]
fn unknown_domain_is_method_not_found() {
    let (mut bridge, _) = bridge();
    let outcome = send(&mut bridge, 4, "Tracing.start", json!({}));
    let error = outcome.responses[0].error.as_ref().unwrap();
    assert_eq!(outcome.responses[0].id, 4);
    assert_eq!(error.code, METHOD_NOT_FOUND);

    let wire: Vec<String> = outcome
        .into_messages()
        .iter()
        .map(|message| serde_json::to_string(message).unwrap())
        .collect();
    expect![[r#"["{\"id\":4,\"error\":{\"code\":-32601,\"message\":\"'Tracing.start' wasn't found\"}}"]"#]]
        .assert_eq(&format!("{wire:?}"));
}

#[test]
fn unknown_method_of_known_domain_succeeds_empty() {
    let (mut bridge, _) = bridge();
    let outcome = send(&mut bridge, 5, "DOM.collectClassNamesFromSubtree", json!({}));
    assert_eq!(result(&outcome), &json!({}));
}

#[test]
fn notifications_precede_the_response() {
    let (mut bridge, _) = bridge();
    let root = send(&mut bridge, 1, "DOM.getDocument", json!({}));
    let html = result(&root)["root"]["children"][0]["nodeId"].clone();
    let messages =
        send(&mut bridge, 2, "DOM.requestChildNodes", json!({"nodeId": html})).into_messages();
    assert!(matches!(
        messages.first(),
        Some(OutboundMessage::Notification(event)) if event.method == "DOM.setChildNodes"
    ));
    assert!(matches!(
        messages.last(),
        Some(OutboundMessage::Response(response)) if response.id == 2
    ));
}

#[test]
fn navigation_invalidates_node_ids() {
    let (mut bridge, inbox) = bridge();
    let root = send(&mut bridge, 1, "DOM.getDocument", json!({}));
    let html = result(&root)["root"]["children"][0]["nodeId"].as_u64().unwrap();
    send(&mut bridge, 2, "Page.enable", json!({}));

    let navigate = send(&mut bridge, 3, "Page.navigate", json!({"url": "http://example.test/next"}));
    assert_eq!(result(&navigate)["frameId"], "main");
    let navigated = pump(&mut bridge, &inbox);
    assert_eq!(
        methods(&navigated),
        vec!["DOM.documentUpdated", "Page.frameNavigated"]
    );

    let stale = send(&mut bridge, 4, "DOM.requestChildNodes", json!({"nodeId": html}));
    let error = stale.responses[0].error.as_ref().unwrap();
    assert_eq!(error.code, SERVER_ERROR);
    assert_eq!(error.message, "Node not found");
}

#[test]
fn navigation_removes_announced_sheets() {
    let (mut bridge, inbox) = bridge();
    let enabled = send(&mut bridge, 1, "CSS.enable", json!({}));
    assert_eq!(methods(&enabled), vec!["CSS.styleSheetAdded"]);

    send(&mut bridge, 2, "Page.reload", json!({}));
    let navigated = pump(&mut bridge, &inbox);
    assert_eq!(
        methods(&navigated),
        vec![
            "CSS.styleSheetRemoved",
            "DOM.documentUpdated",
            "CSS.styleSheetAdded"
        ]
    );
}

#[test]
fn concurrent_debugger_enables_share_one_round_trip() {
    let (mut bridge, inbox) = bridge();
    assert!(send(&mut bridge, 1, "Debugger.enable", json!({})).is_empty());
    assert!(send(&mut bridge, 2, "Debugger.enable", json!({})).is_empty());
    assert_eq!(bridge.debugger().state(), DebuggerState::EnablePending);

    let enabled = pump(&mut bridge, &inbox);
    let ids: Vec<i64> = enabled.responses.iter().map(|response| response.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(methods(&enabled), vec!["Debugger.scriptParsed"]);
    assert_eq!(bridge.debugger().state(), DebuggerState::Running);

    let again = send(&mut bridge, 3, "Debugger.enable", json!({}));
    assert_eq!(result(&again), &json!({}));
}

#[test]
fn disable_answers_parked_enables() {
    let (mut bridge, _) = bridge();
    send(&mut bridge, 1, "Debugger.enable", json!({}));
    let disabled = send(&mut bridge, 2, "Debugger.disable", json!({}));
    let ids: Vec<i64> = disabled.responses.iter().map(|response| response.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(disabled.responses[0].error.is_some());
    assert_eq!(disabled.responses[1].result, Some(json!({})));
}

#[test]
fn pause_then_resume() {
    let (mut bridge, inbox) = bridge();
    send(&mut bridge, 1, "Debugger.enable", json!({}));
    pump(&mut bridge, &inbox);

    let paused = send(&mut bridge, 2, "Debugger.pause", json!({}));
    assert_eq!(result(&paused), &json!({}));
    let event = pump(&mut bridge, &inbox);
    assert_eq!(methods(&event), vec!["Debugger.paused"]);
    let params = event.notifications[0].params.as_ref().unwrap();
    assert_eq!(params["reason"], "other");
    assert_eq!(params["callFrames"][0]["location"]["lineNumber"], 0);
    assert!(bridge.debugger().is_paused());

    let evaluated = send(&mut bridge, 3, "Runtime.evaluate", json!({"expression": "2"}));
    assert_eq!(result(&evaluated)["result"]["type"], "number");

    let resumed = send(&mut bridge, 4, "Debugger.resume", json!({}));
    assert_eq!(methods(&resumed), vec!["Debugger.resumed"]);
    assert!(!bridge.debugger().is_paused());
}

#[test]
fn call_function_on_follows_the_pause_state() {
    let (mut bridge, inbox) = bridge();
    let declaration = "function() { return Object.keys(this); }";
    let running = send(
        &mut bridge,
        1,
        "Runtime.callFunctionOn",
        json!({"functionDeclaration": declaration}),
    );
    assert_eq!(result(&running)["wasThrown"], true);

    send(&mut bridge, 2, "Debugger.enable", json!({}));
    pump(&mut bridge, &inbox);
    send(&mut bridge, 3, "Debugger.pause", json!({}));
    let paused = pump(&mut bridge, &inbox);
    let params = paused.notifications[0].params.as_ref().unwrap();
    let locals = params["callFrames"][0]["scopeChain"][0]["object"]["objectId"].clone();

    let listed = send(
        &mut bridge,
        4,
        "Runtime.callFunctionOn",
        json!({"objectId": locals, "functionDeclaration": declaration, "returnByValue": true}),
    );
    assert_eq!(result(&listed)["result"]["type"], "object");
    assert_eq!(result(&listed)["result"]["value"], json!({}));
    assert_eq!(result(&listed)["wasThrown"], false);
}

#[test]
fn resume_requires_enabled_debugger() {
    let (mut bridge, _) = bridge();
    let outcome = send(&mut bridge, 1, "Debugger.resume", json!({}));
    let error = outcome.responses[0].error.as_ref().unwrap();
    assert_eq!(error.code, SERVER_ERROR);
    assert!(error.message.contains("not enabled"));
}

#[test]
fn runtime_enable_announces_context_once() {
    let (mut bridge, _) = bridge();
    let first = send(&mut bridge, 1, "Runtime.enable", json!({}));
    assert_eq!(methods(&first), vec!["Runtime.executionContextCreated"]);
    let context = &first.notifications[0].params.as_ref().unwrap()["context"];
    assert_eq!(context["origin"], "http://example.test");
    assert_eq!(context["auxData"]["isDefault"], true);
    assert!(send(&mut bridge, 2, "Runtime.enable", json!({}))
        .notifications
        .is_empty());
}

#[test]
fn page_evaluation_reports_thrown_values() {
    let (mut bridge, _) = bridge();
    let url = send(&mut bridge, 1, "Runtime.evaluate", json!({"expression": "document.URL"}));
    assert_eq!(
        result(&url)["result"]["value"],
        "http://example.test/index.html"
    );
    let thrown = send(&mut bridge, 2, "Runtime.evaluate", json!({"expression": "boom()"}));
    assert_eq!(result(&thrown)["wasThrown"], true);
}
