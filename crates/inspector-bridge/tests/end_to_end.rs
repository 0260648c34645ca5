//! Whole protocol flows over a snapshot page.

use crossbeam_channel::{unbounded, Receiver};
use inspector_bridge::host::HighlightColors;
use inspector_bridge::{
    Bridge, BridgeConfig, BridgeInput, DispatchOutcome, HostEvent, NodeHandle, Overlay,
    PageSnapshot, SnapshotPage,
};
use serde_json::{json, Value};

const PAGE: &str = r#"{
    "url": "http://example.test/",
    "document": {
        "styleSheets": [
            {"href": "http://example.test/site.css", "text": "html { color: red; }\n@media print {\n  p { margin: 0 }\n}\n"}
        ],
        "children": [
            {"name": "HTML", "matched": [{"sheet": 0, "rule": 0}], "children": [
                {"name": "BODY", "children": [
                    {"name": "P", "attributes": {"style": "font-weight: bold;"}, "matched": [{"sheet": 0, "rule": 1}],
                     "computed": {"display": "block", "color": "red"}},
                    {"name": "IFRAME", "content": {
                        "url": "http://example.test/inner.html",
                        "styleSheets": [{"text": "span { color: blue; }"}],
                        "children": [{"name": "SPAN"}]
                    }},
                    {"name": "IFRAME", "crossOrigin": true, "content": {
                        "url": "http://other.test/",
                        "children": [{"name": "EM"}]
                    }}
                ]}
            ]}
        ]
    },
    "scripts": [
        {"url": "http://example.test/app.js", "source": "var a = 1;\nfunction f() {\n  return a;\n}\n"}
    ],
    "cookies": [
        {"name": "sid", "value": "abc", "domain": ".example.test"}
    ]
}"#;

struct Session {
    bridge: Bridge,
    inbox: Receiver<BridgeInput>,
    next_id: i64,
    overlay: Overlay,
    /// Same snapshot, same generation: handles and backend ids match the
    /// bridge's page until it navigates.
    mirror: SnapshotPage,
}

impl Session {
    fn new() -> Self {
        let snapshot: PageSnapshot = serde_json::from_str(PAGE).unwrap();
        let mirror = SnapshotPage::new(snapshot.clone(), None);
        let (tx, inbox) = unbounded();
        let (page, script) = snapshot.into_hosts(Some(tx));
        let overlay = page.overlay();
        Self {
            bridge: Bridge::new(page, script, BridgeConfig::default()),
            inbox,
            next_id: 0,
            overlay,
            mirror,
        }
    }

    fn node(&self, name: &str) -> NodeHandle {
        self.mirror.find_by_name(name).unwrap()
    }

    fn backend_id(&self, name: &str) -> u64 {
        self.mirror.backend_id(self.node(name)).unwrap()
    }

    /// Feed one host event and collect what the client would see.
    fn host_event(&mut self, event: HostEvent) -> Vec<(String, Value)> {
        let mut outcome = self.bridge.handle(BridgeInput::Host(event));
        self.drain(&mut outcome);
        outcome
            .notifications
            .into_iter()
            .map(|event| (event.method, event.params.unwrap_or(Value::Null)))
            .collect()
    }

    /// Send one request, then drain the host events it queued.
    fn call(&mut self, method: &str, params: Value) -> (Value, Vec<(String, Value)>) {
        self.next_id += 1;
        let id = self.next_id;
        let payload = json!({"id": id, "method": method, "params": params}).to_string();
        let mut outcome = self.bridge.handle(BridgeInput::Client(payload));
        self.drain(&mut outcome);
        let response = outcome
            .responses
            .iter()
            .find(|response| response.id == id)
            .unwrap_or_else(|| panic!("no response to {method}"));
        let body = match (&response.result, &response.error) {
            (Some(result), _) => result.clone(),
            (None, Some(error)) => json!({"error": error.code, "message": error.message}),
            (None, None) => Value::Null,
        };
        let events = outcome
            .notifications
            .into_iter()
            .map(|event| (event.method, event.params.unwrap_or(Value::Null)))
            .collect();
        (body, events)
    }

    fn drain(&mut self, outcome: &mut DispatchOutcome) {
        while let Ok(input) = self.inbox.try_recv() {
            let next = self.bridge.handle(input);
            outcome.notifications.extend(next.notifications);
            outcome.responses.extend(next.responses);
        }
    }
}

fn names(events: &[(String, Value)]) -> Vec<&str> {
    events.iter().map(|(method, _)| method.as_str()).collect()
}

#[test]
fn document_children_and_matched_styles() {
    let mut session = Session::new();
    let (document, _) = session.call("DOM.getDocument", json!({}));
    let root = &document["root"];
    assert_eq!(root["nodeId"], 1);
    assert_eq!(root["frameId"], "main");
    assert_eq!(root["documentURL"], "http://example.test/");

    let (_, events) = session.call("DOM.requestChildNodes", json!({"nodeId": 1}));
    assert_eq!(names(&events), vec!["DOM.setChildNodes"]);
    let set = &events[0].1;
    assert_eq!(set["parentId"], 1);
    let html = set["nodes"][0]["nodeId"].clone();
    assert_eq!(set["nodes"][0]["nodeName"], "HTML");

    let (matched, events) = session.call("CSS.getMatchedStylesForNode", json!({"nodeId": html}));
    assert_eq!(names(&events), vec!["CSS.styleSheetAdded"]);
    let rule = &matched["matchedCSSRules"][0]["rule"];
    assert_eq!(rule["selectorList"]["text"], "html");
    assert_eq!(rule["style"]["cssProperties"][0]["name"], "color");
    assert_eq!(rule["style"]["cssProperties"][0]["value"], "red");

    let sheet_id = rule["styleSheetId"].clone();
    let (text, _) = session.call("CSS.getStyleSheetText", json!({"styleSheetId": sheet_id}));
    assert!(text["text"].as_str().unwrap().starts_with("html { color: red; }"));
}

#[test]
fn whole_tree_reaches_into_accessible_frames() {
    let mut session = Session::new();
    let (document, _) = session.call("DOM.getDocument", json!({"depth": -1}));
    let body = &document["root"]["children"][0]["children"][0];
    let frames = body["children"].as_array().unwrap();
    assert_eq!(frames.len(), 3);

    let inner = &frames[1]["contentDocument"];
    assert_eq!(inner["documentURL"], "http://example.test/inner.html");
    assert!(frames[1]["frameId"].as_str().unwrap().starts_with("frame."));
    assert!(frames[2].get("contentDocument").is_none());
}

#[test]
fn backend_ids_disclose_ancestry_or_answer_zero() {
    let mut session = Session::new();
    session.call("DOM.getDocument", json!({}));
    let backend_ids = json!([session.backend_id("P"), 9999, session.backend_id("EM")]);

    let (pushed, events) = session.call(
        "DOM.pushNodesByBackendIdsToFrontend",
        json!({"backendNodeIds": backend_ids}),
    );
    let node_ids = pushed["nodeIds"].as_array().unwrap();
    assert_ne!(node_ids[0], 0);
    assert_eq!(node_ids[1], 0);
    assert_eq!(node_ids[2], 0);
    assert_eq!(names(&events), vec!["DOM.setChildNodes", "DOM.setChildNodes"]);
    let body_children = &events[1].1["nodes"];
    assert_eq!(body_children[0]["nodeName"], "P");
    assert_eq!(body_children[0]["nodeId"], node_ids[0]);

    let (again, events) = session.call(
        "DOM.pushNodesByBackendIdsToFrontend",
        json!({"backendNodeIds": [session.backend_id("P")]}),
    );
    assert_eq!(again["nodeIds"][0], node_ids[0]);
    assert!(events.is_empty());
}

#[test]
fn ancestry_disclosure_crosses_into_frames() {
    let mut session = Session::new();
    session.call("DOM.getDocument", json!({}));
    let (pushed, events) = session.call(
        "DOM.pushNodesByBackendIdsToFrontend",
        json!({"backendNodeIds": [session.backend_id("SPAN")]}),
    );
    let span_id = pushed["nodeIds"][0].clone();
    assert_ne!(span_id, 0);

    // HTML, BODY, then the frame's document; the frame element itself has
    // no children message because its document rides in its record.
    assert_eq!(
        names(&events),
        vec!["DOM.setChildNodes", "DOM.setChildNodes", "DOM.setChildNodes"]
    );
    let frame = &events[1].1["nodes"][1];
    assert_eq!(frame["nodeName"], "IFRAME");
    let inner_id = frame["contentDocument"]["nodeId"].clone();
    assert_eq!(events[2].1["parentId"], inner_id);
    assert_eq!(events[2].1["nodes"][0]["nodeName"], "SPAN");
    assert_eq!(events[2].1["nodes"][0]["nodeId"], span_id);
}

#[test]
fn inspect_requests_wait_for_the_document() {
    let mut session = Session::new();
    let p = session.node("P");
    assert!(session
        .host_event(HostEvent::InspectNodeRequested { node: p })
        .is_empty());

    session.call("DOM.getDocument", json!({}));
    let events = session.host_event(HostEvent::InspectNodeRequested { node: p });
    assert_eq!(
        names(&events),
        vec![
            "DOM.setChildNodes",
            "DOM.setChildNodes",
            "DOM.inspectNodeRequested"
        ]
    );
    assert_eq!(events[2].1["nodeId"], events[1].1["nodes"][0]["nodeId"]);

    let em = session.node("EM");
    assert!(session
        .host_event(HostEvent::InspectNodeRequested { node: em })
        .is_empty());
}

#[test]
fn overlay_follows_highlight_and_inspect_mode() {
    let mut session = Session::new();
    session.call("DOM.getDocument", json!({}));
    let (pushed, _) = session.call(
        "DOM.pushNodesByBackendIdsToFrontend",
        json!({"backendNodeIds": [session.backend_id("P")]}),
    );
    let p_id = pushed["nodeIds"][0].clone();

    let (done, _) = session.call("DOM.highlightNode", json!({"nodeId": p_id}));
    assert_eq!(done, json!({}));
    let state = session.overlay.state();
    assert_eq!(state.highlighted, Some(session.node("P")));
    assert_eq!(state.colors, Some(HighlightColors::default()));

    session.call(
        "DOM.highlightNode",
        json!({
            "backendNodeId": session.backend_id("BODY"),
            "highlightConfig": {"contentColor": {"r": 255, "g": 0, "b": 0, "a": 0.5}}
        }),
    );
    let state = session.overlay.state();
    assert_eq!(state.highlighted, Some(session.node("BODY")));
    let colors = state.colors.unwrap();
    assert_eq!(colors.content, "rgba(255, 0, 0, 0.50)");
    assert_eq!(colors.margin, HighlightColors::default().margin);

    let (missing, _) = session.call("DOM.highlightNode", json!({}));
    assert_eq!(missing["error"], -32602);

    session.call("DOM.hideHighlight", json!({}));
    assert_eq!(session.overlay.state().highlighted, None);

    assert!(!session.overlay.state().inspect_mode);
    session.call("DOM.setInspectModeEnabled", json!({"enabled": true}));
    assert!(session.overlay.state().inspect_mode);
    session.call("DOM.setInspectModeEnabled", json!({"enabled": false}));
    assert!(!session.overlay.state().inspect_mode);
}

#[test]
fn css_enable_announces_embedded_sheets() {
    let mut session = Session::new();
    session.call("DOM.getDocument", json!({"depth": -1}));
    let (_, events) = session.call("CSS.enable", json!({}));
    assert_eq!(
        names(&events),
        vec!["CSS.styleSheetAdded", "CSS.styleSheetAdded"]
    );
    let frame_ids: Vec<&str> = events
        .iter()
        .map(|(_, params)| params["header"]["frameId"].as_str().unwrap())
        .collect();
    assert_eq!(frame_ids[0], "main");
    assert!(frame_ids[1].starts_with("frame."));
}

#[test]
fn inline_style_edit_round_trips() {
    let mut session = Session::new();
    let (document, _) = session.call("DOM.getDocument", json!({"depth": -1}));
    let p = document["root"]["children"][0]["children"][0]["children"][0]["nodeId"].clone();

    let (inline, _) = session.call("CSS.getInlineStylesForNode", json!({"nodeId": p}));
    let style = &inline["inlineStyle"];
    assert_eq!(style["cssProperties"][0]["name"], "font-weight");
    let inline_id = style["styleSheetId"].clone();

    let (edited, events) = session.call(
        "CSS.setPropertyText",
        json!({
            "styleSheetId": inline_id,
            "range": {"startLine": 0, "startColumn": 0, "endLine": 0, "endColumn": 18},
            "text": "color: green;"
        }),
    );
    assert_eq!(names(&events), vec!["CSS.styleSheetChanged"]);
    assert_eq!(edited["style"]["cssProperties"][0]["name"], "color");
    assert_eq!(edited["style"]["cssProperties"][0]["value"], "green");

    let (computed, _) = session.call("CSS.getComputedStyleForNode", json!({"nodeId": p}));
    assert_eq!(computed["computedStyle"][0]["name"], "display");
    assert_eq!(computed["computedStyle"][0]["value"], "block");

    let (missing, _) = session.call("CSS.getComputedStyleForNode", json!({"nodeId": 999}));
    assert_eq!(missing["error"], -32000);
    assert_eq!(missing["message"], "No node with given id found");

    let (missing, _) = session.call("DOM.requestChildNodes", json!({"nodeId": 999}));
    assert_eq!(missing["message"], "Node not found");
}

#[test]
fn navigation_resets_ids_and_sheets() {
    let mut session = Session::new();
    session.call("Page.enable", json!({}));
    session.call("CSS.enable", json!({}));
    let (document, _) = session.call("DOM.getDocument", json!({}));
    let html = document["root"]["children"][0]["nodeId"].clone();

    let (navigated, events) = session.call("Page.navigate", json!({"url": "http://example.test/b"}));
    assert_eq!(navigated["frameId"], "main");
    assert_eq!(
        names(&events),
        vec![
            "CSS.styleSheetRemoved",
            "DOM.documentUpdated",
            "CSS.styleSheetAdded",
            "Page.frameNavigated"
        ]
    );
    assert_eq!(events[0].1["styleSheetId"], "1");
    assert_eq!(events[3].1["frame"]["url"], "http://example.test/b");

    let (stale, _) = session.call("DOM.requestChildNodes", json!({"nodeId": html}));
    assert_eq!(stale["message"], "Node not found");

    let (fresh, _) = session.call("DOM.getDocument", json!({}));
    assert_eq!(fresh["root"]["documentURL"], "http://example.test/b");
}

#[test]
fn sheet_ids_from_before_navigation_stay_dead() {
    let mut session = Session::new();
    let (_, events) = session.call("CSS.enable", json!({}));
    let old_id = events[0].1["header"]["styleSheetId"].clone();

    let (_, events) = session.call("Page.reload", json!({}));
    let added = events
        .iter()
        .find(|(method, _)| method == "CSS.styleSheetAdded")
        .unwrap();
    assert_ne!(added.1["header"]["styleSheetId"], old_id);

    let (edit, _) = session.call(
        "CSS.setPropertyText",
        json!({
            "styleSheetId": old_id,
            "range": {"startLine": 0, "startColumn": 7, "endLine": 0, "endColumn": 18},
            "text": "color: blue;"
        }),
    );
    assert_eq!(edit["error"], -32000);
    assert_eq!(edit["message"], "No style sheet with given id found");

    let (text, _) = session.call("CSS.getStyleSheetText", json!({"styleSheetId": old_id}));
    assert_eq!(text["message"], "No style sheet with given id found");
}

#[test]
fn cookies_are_listed_and_deleted() {
    let mut session = Session::new();
    let (cookies, _) = session.call("Page.getCookies", json!({}));
    assert_eq!(cookies["cookies"][0]["name"], "sid");
    assert_eq!(cookies["cookies"][0]["session"], true);

    session.call(
        "Page.deleteCookie",
        json!({"cookieName": "sid", "url": "http://example.test/"}),
    );
    let (cookies, _) = session.call("Page.getCookies", json!({}));
    assert_eq!(cookies["cookies"], json!([]));
}

#[test]
fn breakpoints_pause_and_resume() {
    let mut session = Session::new();
    let (enabled, events) = session.call("Debugger.enable", json!({}));
    assert_eq!(enabled, json!({}));
    assert_eq!(names(&events), vec!["Debugger.scriptParsed"]);
    let parsed = &events[0].1;
    assert_eq!(parsed["url"], "http://example.test/app.js");
    let script_id = parsed["scriptId"].clone();

    let (unknown, _) = session.call(
        "Debugger.setBreakpointByUrl",
        json!({"url": "http://example.test/missing.js", "lineNumber": 0}),
    );
    assert_eq!(unknown["error"], -32000);

    let (breakpoint, _) = session.call(
        "Debugger.setBreakpointByUrl",
        json!({"url": "http://example.test/app.js", "lineNumber": 2, "columnNumber": 2}),
    );
    let location = &breakpoint["locations"][0];
    assert_eq!(location["scriptId"], script_id);
    assert_eq!(location["lineNumber"], 2);
    assert_eq!(location["columnNumber"], 2);
    let breakpoint_id = breakpoint["breakpointId"].clone();

    let (_, events) = session.call("Debugger.pause", json!({}));
    assert_eq!(names(&events), vec!["Debugger.paused"]);
    let paused = &events[0].1;
    assert_eq!(paused["hitBreakpoints"], json!([breakpoint_id]));
    let frame = &paused["callFrames"][0];
    assert_eq!(frame["location"]["lineNumber"], 2);
    let frame_id = frame["callFrameId"].clone();

    let (value, _) = session.call(
        "Debugger.evaluateOnCallFrame",
        json!({"callFrameId": frame_id, "expression": "'hi'"}),
    );
    assert_eq!(value["result"]["type"], "string");
    assert_eq!(value["result"]["value"], "hi");

    let (source, _) = session.call("Debugger.getScriptSource", json!({"scriptId": script_id}));
    assert!(source["scriptSource"].as_str().unwrap().starts_with("var a = 1;"));

    let (_, events) = session.call("Debugger.stepOver", json!({}));
    assert_eq!(names(&events), vec!["Debugger.resumed"]);

    let (removed, _) = session.call(
        "Debugger.removeBreakpoint",
        json!({"breakpointId": breakpoint_id}),
    );
    assert_eq!(removed, json!({}));
    let (again, _) = session.call(
        "Debugger.removeBreakpoint",
        json!({"breakpointId": breakpoint_id}),
    );
    assert_eq!(again["error"], -32000);
}
