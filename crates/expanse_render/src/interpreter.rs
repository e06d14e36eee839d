//! Component-tree interpretation.
//!
//! [`Interpreter::render`] walks a manifest tree depth-first and produces a
//! [`Rendered`] forest. For each node it resolves the props against the
//! current scope and dispatches on the node's [`Kind`]:
//!
//! | Kind | Rule |
//! |------|------|
//! | `CONDITIONAL` | `condition` truthy renders `then` (or the children), else `else` |
//! | `SWITCH` | first entry of `cases` or first `CASE` child matching `value`, else `default`/`DEFAULT` |
//! | `FOR_EACH` | body once per item of `items` (or `count`), with `item`/`index` in context; `empty` when none |
//! | layouts | an element wrapping the rendered children |
//! | `WIZARD` | `steps[cursor]`, cursor read from state |
//! | `SET_VAR` | nothing; records a [`StateWrite`] when `value` differs from state |
//! | `DEBUG` | an element carrying `{context, state, props}` |
//!
//! Interpretation is a pure function of the tree, the context, the state
//! snapshot and the environment: it never writes state itself and never
//! fails. Problems become [`RenderDiagnostic`]s and the affected node renders
//! nothing.

use std::sync::Arc;

use expanse_actions::{DEFAULT_WIZARD_ID, wizard_state_key};
use expanse_core::RuntimeConfig;
use expanse_template::{Scope, matches_key, resolve, resolve_string, truthy};
use serde_json::{Map, Value, json};

use crate::element::{Element, ElementKind, Handler, Rendered, StateWrite, assign_keys};
use crate::error::RenderDiagnostic;
use crate::kind::{Kind, LeafKind};
use crate::node::{ComponentNode, node_list};

/// Props a control-flow kind holds as sub-templates; resolved only when
/// their branch is taken. Every other kind resolves all of its props.
#[must_use]
pub fn deferred_props(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Conditional => &["then", "else"],
        Kind::Switch => &["cases", "default"],
        Kind::ForEach => &["empty", "template"],
        Kind::Wizard => &["steps"],
        _ => &[],
    }
}

/// Returns `true` for event props such as `onClick`.
#[must_use]
pub fn is_event_prop(name: &str) -> bool {
    name.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// One render pass over a tree.
#[derive(Debug)]
pub struct Interpreter<'a> {
    config: &'a RuntimeConfig,
    state: &'a Value,
    env: &'a Value,
    diagnostics: Vec<RenderDiagnostic>,
    writes: Vec<StateWrite>,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter over a state snapshot and environment.
    #[must_use]
    pub fn new(config: &'a RuntimeConfig, state: &'a Value, env: &'a Value) -> Self {
        Self {
            config,
            state,
            env,
            diagnostics: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Renders a node (or list of nodes) against a context.
    #[must_use]
    pub fn render(mut self, root: &Value, context: &Value) -> Rendered {
        let context = Arc::new(context.clone());
        let mut elements = Vec::new();
        for node in node_list(root) {
            self.node(node, &context, 0, &mut elements);
        }
        assign_keys(&mut elements, "");
        Rendered {
            elements,
            diagnostics: self.diagnostics,
            writes: self.writes,
        }
    }

    fn scope<'s>(&self, context: &'s Value) -> Scope<'s>
    where
        'a: 's,
    {
        Scope::new(context, self.state, self.env)
    }

    fn diagnose(&mut self, diagnostic: RenderDiagnostic) {
        tracing::warn!(%diagnostic, "render problem");
        self.diagnostics.push(diagnostic);
    }

    fn nodes(&mut self, list: &Value, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        for node in node_list(list) {
            self.node(node, context, depth, out);
        }
    }

    fn children(&mut self, children: &[Value], context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        for child in children {
            self.node(child, context, depth + 1, out);
        }
    }

    fn node(&mut self, raw: &Value, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        if depth >= self.config.max_render_depth() {
            self.diagnose(RenderDiagnostic::DepthExceeded {
                max: self.config.max_render_depth(),
            });
            return;
        }

        // Bare strings are text nodes.
        if let Value::String(_) = raw {
            let mut props = Map::new();
            props.insert("text".into(), Value::String(resolve_string(raw, &self.scope(context))));
            out.push(Element::new(ElementKind::Leaf(LeafKind::Text), props));
            return;
        }

        let node = match ComponentNode::parse(raw) {
            Ok(node) => node,
            Err(diagnostic) => {
                self.diagnose(diagnostic);
                return;
            }
        };
        let Some(kind) = Kind::parse(&node.kind) else {
            self.diagnose(RenderDiagnostic::UnknownKind { kind: node.kind });
            return;
        };

        match kind {
            Kind::Conditional => self.conditional(&node, context, depth, out),
            Kind::Switch => self.switch(&node, context, depth, out),
            Kind::Case => self.diagnose(RenderDiagnostic::Misplaced { kind: "CASE" }),
            Kind::Default => self.diagnose(RenderDiagnostic::Misplaced { kind: "DEFAULT" }),
            Kind::ForEach => self.for_each(&node, context, depth, out),
            Kind::Layout(layout) => {
                let props = self.props(kind, &node, context);
                let mut element = Element::new(ElementKind::Layout(layout), props);
                self.children(&node.children, context, depth, &mut element.children);
                out.push(element);
            }
            Kind::Wizard => self.wizard(&node, context, depth, out),
            Kind::SetVar => self.set_var(&node, context),
            Kind::Debug => {
                let props = self.props(kind, &node, context);
                let mut dump = Map::new();
                dump.insert("context".into(), (**context).clone());
                dump.insert("state".into(), self.state.clone());
                dump.insert("props".into(), Value::Object(props));
                out.push(Element::new(ElementKind::Debug, dump));
            }
            Kind::Leaf(leaf) => self.leaf(leaf, &node, context, depth, out),
        }
    }

    /// Resolves every prop except the kind's sub-templates and event props.
    fn props(&self, kind: Kind, node: &ComponentNode, context: &Value) -> Map<String, Value> {
        let scope = self.scope(context);
        let deferred = deferred_props(kind);
        node.props
            .iter()
            .filter(|(name, _)| !deferred.contains(&name.as_str()) && !is_event_prop(name))
            .map(|(name, value)| (name.clone(), resolve(value, &scope).into_owned()))
            .collect()
    }

    fn resolved(&self, value: Option<&Value>, context: &Value) -> Value {
        value.map_or(Value::Null, |value| resolve(value, &self.scope(context)).into_owned())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Control flow
    // ─────────────────────────────────────────────────────────────────────────

    fn conditional(&mut self, node: &ComponentNode, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        let condition = self.resolved(node.prop(&["condition", "when", "if"]), context);
        if truthy(&condition) {
            match node.props.get("then") {
                Some(then) => self.nodes(then, context, depth + 1, out),
                None => self.children(&node.children, context, depth, out),
            }
        } else if let Some(otherwise) = node.props.get("else") {
            self.nodes(otherwise, context, depth + 1, out);
        }
    }

    fn switch(&mut self, node: &ComponentNode, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        let value = self.resolved(node.prop(&["value", "on"]), context);

        if let Some(Value::Object(cases)) = node.props.get("cases")
            && let Some(branch) = cases
                .iter()
                .find(|(key, _)| matches_key(&value, &Value::String((*key).clone())))
                .map(|(_, branch)| branch)
        {
            self.nodes(branch, context, depth + 1, out);
            return;
        }

        let mut fallback: Option<Vec<Value>> = None;
        for child in &node.children {
            let Ok(case) = ComponentNode::parse(child) else {
                continue;
            };
            match Kind::parse(&case.kind) {
                Some(Kind::Case) => {
                    let case_value = self.resolved(case.prop(&["value", "when"]), context);
                    if matches_key(&value, &case_value) {
                        self.children(&case.children, context, depth + 1, out);
                        return;
                    }
                }
                Some(Kind::Default) if fallback.is_none() => fallback = Some(case.children),
                _ => {}
            }
        }

        if let Some(default) = node.props.get("default") {
            self.nodes(default, context, depth + 1, out);
        } else if let Some(children) = fallback {
            self.children(&children, context, depth + 1, out);
        }
    }

    fn for_each(&mut self, node: &ComponentNode, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        let limit = self.config.max_repeat();
        let source = self.resolved(node.prop(&["items", "each", "source", "data"]), context);
        let (requested, items): (usize, Vec<Value>) = match source {
            Value::Array(items) => (items.len(), items),
            _ => {
                let count = self.resolved(node.props.get("count"), context);
                let count = count
                    .as_u64()
                    .or_else(|| count.as_str().and_then(|text| text.trim().parse().ok()))
                    .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
                (count, (0..count.min(limit)).map(|n| json!(n)).collect())
            }
        };

        if requested == 0 {
            if let Some(empty) = node.props.get("empty") {
                self.nodes(empty, context, depth + 1, out);
            }
            return;
        }
        if requested > limit {
            self.diagnose(RenderDiagnostic::RepeatTruncated { requested, limit });
        }

        let item_as = alias(node, &["as", "itemAs"], "item");
        let index_as = alias(node, &["indexAs"], "index");
        let body = node.props.get("template");

        for (index, item) in items.into_iter().take(limit).enumerate() {
            let derived = Arc::new(extend(context, [
                (item_as.as_str(), item),
                (index_as.as_str(), json!(index)),
            ]));
            match body {
                Some(body) => self.nodes(body, &derived, depth + 1, out),
                None => self.children(&node.children, &derived, depth, out),
            }
        }
    }

    fn wizard(&mut self, node: &ComponentNode, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        let id = match self.resolved(node.props.get("id"), context) {
            Value::String(id) if !id.is_empty() => id,
            _ => DEFAULT_WIZARD_ID.to_string(),
        };
        let steps: &[Value] = match node.props.get("steps") {
            Some(steps) => node_list(steps),
            None => &node.children,
        };
        let total = steps.len();
        let cursor = lookup_dotted(self.state, &wizard_state_key(&id))
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
            .min(total.saturating_sub(1));

        let wizard = json!({
            "id": id,
            "step": cursor,
            "total": total,
            "isFirst": cursor == 0,
            "isLast": cursor + 1 >= total,
        });
        let derived = Arc::new(extend(context, [("wizard", wizard.clone())]));

        let mut props = self.props(Kind::Wizard, node, context);
        if let Value::Object(info) = wizard {
            props.extend(info);
        }
        let mut element = Element::new(ElementKind::Wizard, props);
        if let Some(step) = steps.get(cursor) {
            self.nodes(step, &derived, depth + 1, &mut element.children);
        }
        out.push(element);
    }

    fn set_var(&mut self, node: &ComponentNode, context: &Value) {
        let path = node
            .prop(&["name", "key"])
            .map(|name| resolve_string(name, &self.scope(context)))
            .unwrap_or_default();
        if path.is_empty() {
            self.diagnose(RenderDiagnostic::InvalidNode {
                message: "SET_VAR requires a name".to_string(),
            });
            return;
        }
        let value = self.resolved(node.props.get("value"), context);
        let changed = lookup_dotted(self.state, &path).map_or(!value.is_null(), |current| *current != value);
        if changed {
            self.writes.push(StateWrite { path, value });
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Leaves
    // ─────────────────────────────────────────────────────────────────────────

    fn leaf(&mut self, kind: LeafKind, node: &ComponentNode, context: &Arc<Value>, depth: usize, out: &mut Vec<Element>) {
        let mut props = self.props(Kind::Leaf(kind), node, context);
        if props.get("visible").is_some_and(|visible| !truthy(visible)) {
            return;
        }
        if let Some(disabled) = props.get_mut("disabled") {
            *disabled = Value::Bool(truthy(disabled));
        }

        let bind_to = props
            .get("bindTo")
            .and_then(Value::as_str)
            .filter(|_| kind.is_input())
            .map(str::to_string);
        if let Some(path) = &bind_to
            && !props.contains_key("value")
        {
            let bound = lookup_dotted(self.state, path).cloned().unwrap_or(Value::Null);
            props.insert("value".into(), bound);
        }

        let mut element = Element::new(ElementKind::Leaf(kind), props);
        element.handlers = node
            .props
            .iter()
            .filter(|(name, _)| is_event_prop(name))
            .map(|(name, actions)| Handler {
                event: name.clone(),
                actions: actions.clone(),
                context: Arc::clone(context),
            })
            .collect();
        if bind_to.is_some() && element.handler("onChange").is_none() {
            element.handlers.push(Handler {
                event: "onChange".into(),
                actions: Value::Null,
                context: Arc::clone(context),
            });
        }
        element.bind_to = bind_to;

        self.children(&node.children, context, depth, &mut element.children);
        out.push(element);
    }
}

fn alias(node: &ComponentNode, names: &[&str], default: &str) -> String {
    node.prop(names)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn extend<'k>(context: &Value, entries: impl IntoIterator<Item = (&'k str, Value)>) -> Value {
    let mut map = match context {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in entries {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

/// Reads a dotted path out of a state snapshot.
pub(crate) fn lookup_dotted<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tree: &Value, context: &Value, state: &Value) -> Rendered {
        let config = RuntimeConfig::default();
        Interpreter::new(&config, state, &json!({})).render(tree, context)
    }

    fn texts(rendered: &Rendered) -> Vec<String> {
        rendered
            .iter()
            .filter_map(Element::text)
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn event_props_are_detected() {
        assert!(is_event_prop("onClick"));
        assert!(is_event_prop("onChange"));
        assert!(!is_event_prop("one"));
        assert!(!is_event_prop("on"));
    }

    #[test]
    fn leaves_keep_props_named_like_sub_templates() {
        let tree = json!({
            "kind": "SELECT",
            "props": {
                "options": ["friendly", "formal"],
                "default": "${state.tone}",
                "empty": "No options",
                "template": "${item}"
            }
        });
        let rendered = render(&tree, &json!({}), &json!({ "tone": "formal" }));
        let select = &rendered.elements[0];
        assert_eq!(select.prop("default"), Some(&json!("formal")));
        assert_eq!(select.prop("empty"), Some(&json!("No options")));
        assert!(select.prop("template").is_some());
    }

    #[test]
    fn control_flow_keeps_sub_templates_unresolved() {
        assert_eq!(deferred_props(Kind::Switch), &["cases", "default"]);
        assert!(deferred_props(Kind::Leaf(LeafKind::Select)).is_empty());
    }

    #[test]
    fn conditional_picks_branch() {
        let tree = json!({
            "kind": "CONDITIONAL",
            "props": {
                "condition": "${state.open}",
                "then": { "kind": "TEXT", "props": { "text": "open" } },
                "else": [{ "kind": "TEXT", "props": { "text": "closed" } }]
            }
        });
        assert_eq!(texts(&render(&tree, &json!({}), &json!({ "open": true }))), vec!["open"]);
        assert_eq!(texts(&render(&tree, &json!({}), &json!({}))), vec!["closed"]);
    }

    #[test]
    fn conditional_without_else_renders_nothing() {
        let tree = json!({
            "kind": "condition",
            "props": { "condition": false },
            "children": [{ "kind": "TEXT", "props": { "text": "x" } }]
        });
        let rendered = render(&tree, &json!({}), &json!({}));
        assert!(rendered.elements.is_empty());
        assert!(rendered.diagnostics.is_empty());
    }

    #[test]
    fn switch_prefers_cases_map_then_case_children() {
        let tree = json!({
            "kind": "SWITCH",
            "props": {
                "value": "${context.folder}",
                "cases": { "inbox": "Inbox view" }
            },
            "children": [
                { "kind": "CASE", "props": { "value": "sent" }, "children": ["Sent view"] },
                { "kind": "DEFAULT", "children": ["Other view"] }
            ]
        });
        assert_eq!(texts(&render(&tree, &json!({ "folder": "inbox" }), &json!({}))), vec!["Inbox view"]);
        assert_eq!(texts(&render(&tree, &json!({ "folder": "sent" }), &json!({}))), vec!["Sent view"]);
        assert_eq!(texts(&render(&tree, &json!({ "folder": "spam" }), &json!({}))), vec!["Other view"]);
    }

    #[test]
    fn for_each_binds_item_and_index() {
        let tree = json!({
            "kind": "FOR_EACH",
            "props": { "items": "${context.labels}", "as": "label" },
            "children": [{ "kind": "BADGE", "props": { "text": "${index}-${label}" } }]
        });
        let rendered = render(&tree, &json!({ "labels": ["work", "home"] }), &json!({}));
        assert_eq!(texts(&rendered), vec!["0-work", "1-home"]);
    }

    #[test]
    fn repeat_by_count_is_capped() {
        let config = RuntimeConfig::default().with_max_repeat(3);
        let tree = json!({ "kind": "REPEAT", "props": { "count": 10 }, "children": ["${item}"] });
        let rendered = Interpreter::new(&config, &json!({}), &json!({})).render(&tree, &json!({}));
        assert_eq!(texts(&rendered), vec!["0", "1", "2"]);
        assert!(matches!(
            rendered.diagnostics.as_slice(),
            [RenderDiagnostic::RepeatTruncated { limit: 3, .. }]
        ));
    }

    #[test]
    fn wizard_renders_current_step() {
        let tree = json!({
            "kind": "WIZARD",
            "props": {
                "id": "setup",
                "steps": [
                    ["Step one"],
                    ["Step ${wizard.step} of ${wizard.total}"]
                ]
            }
        });
        let first = render(&tree, &json!({}), &json!({}));
        assert_eq!(texts(&first), vec!["Step one"]);

        let second = render(&tree, &json!({}), &json!({ "_wizard": { "setup": 1 } }));
        assert_eq!(texts(&second), vec!["Step 1 of 2"]);

        let clamped = render(&tree, &json!({}), &json!({ "_wizard": { "setup": 9 } }));
        assert_eq!(clamped.elements[0].prop("step"), Some(&json!(1)));
    }

    #[test]
    fn set_var_writes_only_on_change() {
        let tree = json!({ "kind": "SET_VAR", "props": { "name": "greeting", "value": "Hi ${context.name}" } });

        let changed = render(&tree, &json!({ "name": "Ana" }), &json!({}));
        assert_eq!(
            changed.writes,
            vec![StateWrite {
                path: "greeting".into(),
                value: json!("Hi Ana"),
            }]
        );
        assert!(changed.elements.is_empty());

        let settled = render(&tree, &json!({ "name": "Ana" }), &json!({ "greeting": "Hi Ana" }));
        assert!(settled.writes.is_empty());
    }

    #[test]
    fn inputs_read_bound_state_and_get_change_handler() {
        let tree = json!({ "kind": "INPUT", "props": { "bindTo": "draft.subject", "placeholder": "Subject" } });
        let rendered = render(&tree, &json!({}), &json!({ "draft": { "subject": "Hello" } }));
        let input = &rendered.elements[0];

        assert_eq!(input.prop("value"), Some(&json!("Hello")));
        assert_eq!(input.bind_to.as_deref(), Some("draft.subject"));
        assert_eq!(input.handler("onChange").map(|h| &h.actions), Some(&Value::Null));
    }

    #[test]
    fn event_props_are_not_resolved() {
        let tree = json!({
            "kind": "BUTTON",
            "props": {
                "label": "Send ${context.count}",
                "onClick": { "action": "SET_STATE", "key": "k", "value": "${result}" }
            }
        });
        let rendered = render(&tree, &json!({ "count": 2 }), &json!({}));
        let button = &rendered.elements[0];

        assert_eq!(button.text(), Some("Send 2"));
        assert!(button.prop("onClick").is_none());
        assert_eq!(
            button.handler("onClick").map(|h| h.actions["value"].clone()),
            Some(json!("${result}"))
        );
    }

    #[test]
    fn hidden_leaves_render_nothing() {
        let tree = json!([
            { "kind": "TEXT", "props": { "text": "a", "visible": "${state.show}" } },
            { "kind": "TEXT", "props": { "text": "b", "disabled": 1 } }
        ]);
        let rendered = render(&tree, &json!({}), &json!({ "show": false }));
        assert_eq!(texts(&rendered), vec!["b"]);
        assert_eq!(rendered.elements[0].prop("disabled"), Some(&json!(true)));
    }

    #[test]
    fn depth_limit_is_reported() {
        let config = RuntimeConfig::default().with_max_render_depth(2);
        let tree = json!({ "kind": "BOX", "children": [{ "kind": "BOX", "children": ["deep"] }] });
        let rendered = Interpreter::new(&config, &json!({}), &json!({})).render(&tree, &json!({}));
        assert_eq!(
            rendered.diagnostics,
            vec![RenderDiagnostic::DepthExceeded { max: 2 }]
        );
        assert_eq!(rendered.iter().count(), 2);
    }

    #[test]
    fn debug_dumps_scope() {
        let tree = json!({ "kind": "DEBUG", "props": { "label": "${state.k}" } });
        let rendered = render(&tree, &json!({ "user": "ana" }), &json!({ "k": 1 }));
        let dump = &rendered.elements[0];
        assert_eq!(dump.kind, ElementKind::Debug);
        assert_eq!(dump.prop("props"), Some(&json!({ "label": 1 })));
        assert_eq!(dump.prop("state"), Some(&json!({ "k": 1 })));
    }

    #[test]
    fn lookup_dotted_walks_objects_and_arrays() {
        let state = json!({ "a": { "b": [10, 20] } });
        assert_eq!(lookup_dotted(&state, "a.b.1"), Some(&json!(20)));
        assert_eq!(lookup_dotted(&state, "a.c"), None);
    }
}
