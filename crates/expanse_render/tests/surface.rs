//! Mounted surfaces: rendering, events and overlays.

use std::sync::Arc;

use expanse_actions::{HostServices, OverlayHost, OverlayRequest};
use expanse_core::RuntimeConfig;
use expanse_render::{Element, ElementKind, LeafKind, RenderError, Surface};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

#[derive(Default)]
struct Overlays {
    opened: Mutex<Vec<OverlayRequest>>,
    closed: Mutex<usize>,
}

impl OverlayHost for Overlays {
    fn open(&self, request: OverlayRequest) {
        self.opened.lock().push(request);
    }

    fn close(&self) {
        *self.closed.lock() += 1;
    }
}

fn mount(root: Value) -> Surface {
    Surface::new(
        "acme.labels",
        root,
        HostServices::new(),
        Arc::new(RuntimeConfig::default()),
    )
}

#[tokio::test]
async fn bound_input_writes_state_before_actions() {
    let surface = mount(json!({
        "kind": "INPUT",
        "props": {
            "bindTo": "draft.subject",
            "onChange": { "action": "SET_STATE", "key": "echo", "value": "${state.draft.subject}!" }
        }
    }));

    let rendered = surface.render(&json!({}));
    let summary = surface
        .fire(&rendered, "0", "onChange", json!("Hello"))
        .await
        .expect("input has onChange");

    assert_eq!(summary.executed, 1);
    assert_eq!(surface.state().get("draft.subject"), Some(json!("Hello")));
    assert_eq!(surface.state().get("echo"), Some(json!("Hello!")));

    let rerendered = surface.render(&json!({}));
    assert_eq!(rerendered.elements[0].prop("value"), Some(&json!("Hello")));
}

#[tokio::test]
async fn bound_input_without_actions_still_writes() {
    let surface = mount(json!({ "kind": "TOGGLE", "props": { "bindTo": "notify" } }));
    let rendered = surface.render(&json!({}));

    let summary = surface
        .fire(&rendered, "0", "onChange", json!(true))
        .await
        .expect("bound inputs always accept onChange");

    assert_eq!(summary.executed, 0);
    assert_eq!(surface.state().get("notify"), Some(json!(true)));
}

#[tokio::test]
async fn handlers_keep_their_item_scope() {
    let surface = mount(json!({
        "kind": "FOR_EACH",
        "props": { "items": "${context.labels}" },
        "children": [{
            "kind": "BUTTON",
            "props": {
                "label": "${item}",
                "onClick": { "action": "SET_STATE", "key": "picked", "value": "${item}#${index}" }
            }
        }]
    }));
    let rendered = surface.render(&json!({ "labels": ["work", "home"] }));
    assert_eq!(rendered.elements.len(), 2);

    surface
        .fire(&rendered, "1", "onClick", Value::Null)
        .await
        .expect("button has onClick");
    assert_eq!(surface.state().get("picked"), Some(json!("home#1")));
}

#[tokio::test]
async fn wizard_steps_advance_through_actions() {
    let next = json!({ "action": "NEXT_STEP" });
    let surface = mount(json!({
        "kind": "WIZARD",
        "props": {
            "id": "setup",
            "steps": [
                { "kind": "BUTTON", "props": { "label": "Next", "onClick": next } },
                { "kind": "BUTTON", "props": { "label": "Finish", "onClick": next } }
            ]
        }
    }));

    let first = surface.render(&json!({}));
    assert_eq!(first.find("0.0").and_then(Element::text), Some("Next"));
    surface.fire(&first, "0.0", "onClick", Value::Null).await.expect("step button");

    let second = surface.render(&json!({}));
    assert_eq!(second.find("0.0").and_then(Element::text), Some("Finish"));
    assert_eq!(second.elements[0].prop("isLast"), Some(&json!(true)));

    // The last step's NEXT_STEP is clamped.
    surface.fire(&second, "0.0", "onClick", Value::Null).await.expect("step button");
    assert_eq!(surface.state().get("_wizard.setup"), Some(json!(1)));
}

#[tokio::test]
async fn overlays_render_against_the_surface_state() {
    let host = Arc::new(Overlays::default());
    let mut overlays = Map::new();
    overlays.insert(
        "picker".into(),
        json!({ "kind": "CARD", "props": { "title": "${context.props.title}", "text": "${state.choice}" } }),
    );
    let surface = Surface::new(
        "acme.labels",
        json!({
            "kind": "BUTTON",
            "props": {
                "label": "Pick",
                "onClick": [
                    { "action": "SET_STATE", "key": "choice", "value": "blue" },
                    { "action": "OPEN_OVERLAY", "overlay": "picker", "props": { "title": "Colors" } }
                ]
            }
        }),
        HostServices::new().with_overlays(host.clone()),
        Arc::new(RuntimeConfig::default()),
    )
    .with_overlays(overlays);

    let rendered = surface.render(&json!({}));
    surface.fire(&rendered, "0", "onClick", Value::Null).await.expect("button");

    let request = host.opened.lock().pop().expect("overlay opened");
    assert_eq!(request.extension_id, "acme.labels");
    let overlay = surface.render_overlay(&request);
    let card = &overlay.elements[0];
    assert_eq!(card.kind, ElementKind::Leaf(LeafKind::Card));
    assert_eq!(card.prop("title"), Some(&json!("Colors")));
    assert_eq!(card.text(), Some("blue"));
}

#[tokio::test]
async fn unknown_targets_are_errors() {
    let surface = mount(json!({ "kind": "TEXT", "props": { "text": "hi" } }));
    let rendered = surface.render(&json!({}));

    assert_eq!(
        surface.fire(&rendered, "7", "onClick", Value::Null).await,
        Err(RenderError::ElementNotFound("7".into()))
    );
    assert_eq!(
        surface.fire(&rendered, "0", "onClick", Value::Null).await,
        Err(RenderError::HandlerNotFound {
            key: "0".into(),
            event: "onClick".into(),
        })
    );
}

#[test]
fn state_changes_notify_subscribers() {
    let surface = mount(json!({ "kind": "SET_VAR", "props": { "name": "seen", "value": true } }));
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    surface
        .state()
        .subscribe(move |change| sink.lock().push(change.path.clone()));

    surface.render(&json!({}));
    surface.render(&json!({}));

    assert_eq!(*changes.lock(), vec![Some("seen".to_string())]);
}
