use pdl::Blocks;
use pretty_assertions::assert_eq;
use serde_json::json;
use viewer::loop_trace::ELLIPSIS;
use viewer::{ClickAction, DisplayNode, PLACEHOLDER, RenderError, Session, Tag, ViewerConfig};

fn load(value: serde_json::Value) -> Blocks {
    Blocks::from_value(value).expect("decode failed")
}

fn texts(nodes: &[DisplayNode<'_>]) -> Vec<String> {
    nodes.iter().map(DisplayNode::text).collect()
}

#[test]
fn collapse_and_expand_round_trip() {
    let trace = load(json!({"kind": "model", "model": "m", "result": "Hello!"}));
    let mut session = Session::new(&trace, "code").unwrap();
    let expanded = session.root().to_vec();

    session.activate(&[0]).unwrap();
    let summary = session.root().to_vec();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].html.as_deref(), Some("Hello!"));
    assert_eq!(summary[0].on_click, Some(ClickAction::ShowBlocks(&trace)));

    session.activate(&[0]).unwrap();
    assert_eq!(session.root(), expanded.as_slice());

    session.activate(&[0]).unwrap();
    assert_eq!(session.root(), summary.as_slice());
}

#[test]
fn clicks_bubble_to_the_enclosing_block() {
    let trace = load(json!({"kind": "message", "role": "user", "content": "hi", "result": "hi"}));
    let mut session = Session::new(&trace, "code").unwrap();
    // container > fieldset > "user: " label, which has no handler of its own
    session.activate(&[0, 0, 0]).unwrap();
    assert_eq!(texts(session.root()), vec!["hi"]);
    assert_eq!(session.root()[0].on_click, Some(ClickAction::ShowBlocks(&trace)));
}

#[test]
fn innermost_handler_wins() {
    let trace = load(json!({
        "kind": "sequence",
        "sequence": [{"kind": "get", "get": "x", "result": "inner"}],
        "result": "outer",
    }));
    let mut session = Session::new(&trace, "code").unwrap();
    // container > fieldset > inner container
    session.activate(&[0, 0, 0]).unwrap();
    let body = &session.root()[0].children[0];
    assert_eq!(texts(&body.children), vec!["inner"]);
    assert!(body.children[0].has_tag(Tag::Block));
    assert_eq!(session.root()[0].on_click, Some(ClickAction::ShowOutput(&trace)));
}

#[test]
fn loop_iterations_revealed_one_at_a_time() {
    let trace = load(json!({
        "kind": "repeat",
        "repeat": "${ i }",
        "trace": ["i1", "i2", "i3"],
    }));
    let mut session = Session::new(&trace, "code").unwrap();
    let body = |session: &Session<'_>| texts(&session.root()[0].children[0].children);

    assert_eq!(body(&session), vec![ELLIPSIS, "i3"]);

    session.activate(&[0, 0, 0]).unwrap();
    assert_eq!(body(&session), vec![ELLIPSIS, "i2", "i3"]);

    session.activate(&[0, 0, 0]).unwrap();
    assert_eq!(body(&session), vec!["i1", "i2", "i3"]);
}

#[test]
fn hidden_results_stay_hidden_in_summary() {
    for contribute in [json!([]), json!(["context"])] {
        let trace = load(json!({"kind": "data", "data": 1, "result": 1, "contribute": contribute}));
        let mut session = Session::new(&trace, "code").unwrap();
        session.activate(&[0]).unwrap();
        let summary = &session.root()[0];
        assert!(summary.has_tag(Tag::ResultHidden));
        assert_eq!(summary.html.as_deref(), Some(PLACEHOLDER));
    }
}

#[test]
fn hover_publishes_cleaned_code() {
    let trace = load(json!({
        "kind": "sequence",
        "sequence": [{"kind": "get", "get": "x", "result": "v", "location": {"file": "f"}}],
        "result": "v",
    }));
    let mut session = Session::new(&trace, "current").unwrap();
    assert_eq!(session.code().text, None);

    session.hover(&[0, 0]).unwrap();
    assert_eq!(
        session.code().text.as_deref(),
        Some("{\n  \"kind\": \"sequence\",\n  \"sequence\": [\n    {\n      \"kind\": \"get\",\n      \"get\": \"x\"\n    }\n  ]\n}")
    );

    session.hover(&[0, 0, 0, 0]).unwrap();
    assert_eq!(
        session.code().text.as_deref(),
        Some("{\n  \"kind\": \"get\",\n  \"get\": \"x\"\n}")
    );
    assert_eq!(session.code().id, "current");
}

#[test]
fn failed_reveal_leaves_tree_untouched() {
    let trace = load(json!({
        "kind": "for",
        "repeat": "${ x }",
        "trace": [{"x": 1}, "fine"],
    }));
    let mut session = Session::new(&trace, "code").unwrap();
    let before = session.root().to_vec();
    let err = session.activate(&[0, 0, 0]).unwrap_err();
    assert!(matches!(err, RenderError::MissingKind { .. }));
    assert_eq!(session.root(), before.as_slice());
}

#[test]
fn unknown_kind_fails_only_where_it_is_rendered() {
    for earlier in [json!({"kind": "teleport"}), json!({"x": 1})] {
        let trace = load(json!({
            "kind": "repeat",
            "repeat": "${ i }",
            "trace": [earlier, "fine"],
        }));
        let mut session = Session::new(&trace, "code").unwrap();
        let before = session.root().to_vec();
        match session.activate(&[0, 0, 0]).unwrap_err() {
            RenderError::UnknownKind { html } => assert!(html.contains("teleport")),
            RenderError::MissingKind { html } => assert!(html.contains("&quot;x&quot;")),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(session.root(), before.as_slice());
    }
}

#[test]
fn unknown_kind_error_carries_escaped_node() {
    let trace = load(json!({"kind": "teleport", "to": "<mars>"}));
    let err = Session::new(&trace, "code").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown kind:\n{<br>  &quot;kind&quot;: &quot;teleport&quot;,<br>  &quot;to&quot;: &quot;&lt;mars&gt;&quot;<br>}"
    );
}

#[test]
fn bad_paths_are_errors() {
    let trace = Blocks::text("x");
    let mut session = Session::new(&trace, "code").unwrap();
    assert_eq!(session.activate(&[3]), Err(RenderError::NoNodeAtPath(vec![3])));
    assert_eq!(session.hover(&[]), Err(RenderError::NoNodeAtPath(vec![])));
}

#[test]
fn root_without_kind_fails_to_render() {
    let trace = load(json!({"text": "hello"}));
    let err = Session::new(&trace, "code").unwrap_err();
    assert_eq!(err.to_string(), "missing kind:\n{<br>  &quot;text&quot;: &quot;hello&quot;<br>}");
}

#[test]
fn page_contains_code_slot_contents() {
    let trace = load(json!({"kind": "get", "get": "<x>"}));
    let mut session = Session::new(&trace, "code").unwrap();
    session.hover(&[0]).unwrap();
    let html = session.to_html(&ViewerConfig::default(), "");
    assert!(html.contains("<div id=\"code\"><pre>{<br>  &quot;kind&quot;"));
    assert!(html.contains("&lt;x&gt;"));
}
