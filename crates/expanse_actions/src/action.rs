//! The closed action vocabulary.
//!
//! An action descriptor is a JSON object whose `action` field names one of
//! the tags below; the remaining fields are tag-specific and may contain
//! `${...}` templates. Descriptors are decoded into [`Action`] without
//! resolving anything: template fields stay raw [`Value`]s and are resolved
//! by the dispatcher right before the action executes, so each action sees
//! the state written by the actions before it.
//!
//! Nested chains (`onSuccess`, `onConfirm`, `onCancel`) are kept as raw
//! descriptors too. They are resolved later, once the `result` they may
//! reference exists. Any descriptor may also carry an `onError` chain; the
//! dispatcher reads it from the raw descriptor, so it works even when the
//! rest of the descriptor is malformed.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ActionError;

/// Tone of a toast notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    /// Neutral information.
    #[default]
    #[serde(alias = "default")]
    Info,
    /// Completed successfully.
    Success,
    /// Needs attention.
    Warning,
    /// Something failed.
    #[serde(alias = "destructive")]
    Error,
}

/// How an OAuth authorization page is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthMode {
    /// A popup window; the surface stays mounted and `onSuccess` runs.
    #[default]
    Popup,
    /// A full-page redirect; the surface is torn down.
    Redirect,
}

/// A decoded action descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    // ── State ────────────────────────────────────────────────────────────────
    /// Writes `value` at `key`.
    SetState(KeyValue),
    /// Shallow-merges the object `value` into the object at `key`.
    MergeState(KeyValue),
    /// Flips the truthiness of the value at `key`.
    ToggleState(Key),
    /// Removes `keys`, or the whole state when none are given.
    ResetState(ResetState),
    /// Pushes `value` onto the array at `key`.
    AppendArray(KeyValue),
    /// Removes the element at `index` from the array at `key`.
    RemoveArrayItem(RemoveArrayItem),
    /// Writes `source` mapped through `template` to `target`.
    MapArray(MapArray),
    /// Writes the elements of `source` satisfying `condition` to `target`.
    FilterArray(FilterArray),

    // ── Backend I/O ──────────────────────────────────────────────────────────
    /// Calls a registered backend function.
    CallBackend(CallBackend),
    /// Writes an encrypted per-user value.
    SecureSave(SecureSave),
    /// Reads an encrypted per-user value.
    SecureRead(SecureRead),

    // ── Navigation / UI ──────────────────────────────────────────────────────
    /// Opens an external URL.
    OpenUrl(OpenUrl),
    /// Navigates within the host application.
    Navigate(Navigate),
    /// Renders a named overlay subtree in the host's overlay container.
    OpenOverlay(OpenOverlay),
    /// Closes the current overlay.
    CloseOverlay,
    /// Asks the user to confirm, then branches.
    Confirm(Confirm),
    /// Copies text to the clipboard.
    CopyToClipboard(CopyToClipboard),
    /// Shows a toast.
    Toast(Toast),
    /// Sets a loading flag in state.
    SetLoading(SetLoading),
    /// Waits before the next action.
    Delay(Delay),

    // ── Editor ───────────────────────────────────────────────────────────────
    /// Inserts HTML at the editor cursor.
    InsertContent(InsertContent),
    /// Appends HTML to the message body.
    AppendBody(EditorContent),
    /// Replaces the message body.
    SetBody(EditorContent),

    // ── OAuth ────────────────────────────────────────────────────────────────
    /// Starts a provider authorization.
    OauthConnect(OAuthConnect),
    /// Revokes a provider connection.
    OauthDisconnect(OAuthDisconnect),

    // ── Wizard ───────────────────────────────────────────────────────────────
    /// Advances a wizard.
    NextStep(WizardTarget),
    /// Moves a wizard back.
    PrevStep(WizardTarget),
    /// Jumps a wizard to a step.
    GoToStep(GoToStep),
}

impl Action {
    /// Every tag this dispatcher understands.
    pub const TAGS: &'static [&'static str] = &[
        "SET_STATE",
        "MERGE_STATE",
        "TOGGLE_STATE",
        "RESET_STATE",
        "APPEND_ARRAY",
        "REMOVE_ARRAY_ITEM",
        "MAP_ARRAY",
        "FILTER_ARRAY",
        "CALL_BACKEND",
        "SECURE_SAVE",
        "SECURE_READ",
        "OPEN_URL",
        "NAVIGATE",
        "OPEN_OVERLAY",
        "CLOSE_OVERLAY",
        "CONFIRM",
        "COPY_TO_CLIPBOARD",
        "TOAST",
        "SET_LOADING",
        "DELAY",
        "INSERT_CONTENT",
        "APPEND_BODY",
        "SET_BODY",
        "OAUTH_CONNECT",
        "OAUTH_DISCONNECT",
        "NEXT_STEP",
        "PREV_STEP",
        "GO_TO_STEP",
    ];

    /// Returns the wire tag of this action.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SetState(_) => "SET_STATE",
            Self::MergeState(_) => "MERGE_STATE",
            Self::ToggleState(_) => "TOGGLE_STATE",
            Self::ResetState(_) => "RESET_STATE",
            Self::AppendArray(_) => "APPEND_ARRAY",
            Self::RemoveArrayItem(_) => "REMOVE_ARRAY_ITEM",
            Self::MapArray(_) => "MAP_ARRAY",
            Self::FilterArray(_) => "FILTER_ARRAY",
            Self::CallBackend(_) => "CALL_BACKEND",
            Self::SecureSave(_) => "SECURE_SAVE",
            Self::SecureRead(_) => "SECURE_READ",
            Self::OpenUrl(_) => "OPEN_URL",
            Self::Navigate(_) => "NAVIGATE",
            Self::OpenOverlay(_) => "OPEN_OVERLAY",
            Self::CloseOverlay => "CLOSE_OVERLAY",
            Self::Confirm(_) => "CONFIRM",
            Self::CopyToClipboard(_) => "COPY_TO_CLIPBOARD",
            Self::Toast(_) => "TOAST",
            Self::SetLoading(_) => "SET_LOADING",
            Self::Delay(_) => "DELAY",
            Self::InsertContent(_) => "INSERT_CONTENT",
            Self::AppendBody(_) => "APPEND_BODY",
            Self::SetBody(_) => "SET_BODY",
            Self::OauthConnect(_) => "OAUTH_CONNECT",
            Self::OauthDisconnect(_) => "OAUTH_DISCONNECT",
            Self::NextStep(_) => "NEXT_STEP",
            Self::PrevStep(_) => "PREV_STEP",
            Self::GoToStep(_) => "GO_TO_STEP",
        }
    }

    /// Returns `true` if `tag` names a known action.
    #[must_use]
    pub fn is_known_tag(tag: &str) -> bool {
        Self::TAGS.contains(&tag)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// A state key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Key {
    /// Dotted state path; may be templated.
    pub key: String,
}

/// A state key and a value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyValue {
    /// Dotted state path; may be templated.
    pub key: String,
    /// Value to write.
    #[serde(default)]
    pub value: Value,
}

/// Payload of `RESET_STATE`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResetState {
    /// Keys to remove; everything when absent.
    #[serde(default, alias = "key", deserialize_with = "one_or_many")]
    pub keys: Option<Vec<String>>,
}

/// Payload of `REMOVE_ARRAY_ITEM`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoveArrayItem {
    /// Dotted state path of the array.
    pub key: String,
    /// Index to remove; may be templated.
    pub index: Value,
}

/// Payload of `MAP_ARRAY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapArray {
    /// The array to map; usually a reference like `${state.items}`.
    pub source: Value,
    /// State key receiving the mapped array.
    #[serde(alias = "targetState")]
    pub target: String,
    /// Per-item template, resolved with the item in context.
    pub template: Value,
    /// Context name of the current item.
    #[serde(default = "default_item_alias", alias = "as")]
    pub item_as: String,
    /// Context name of the current index.
    #[serde(default = "default_index_alias")]
    pub index_as: String,
}

/// Payload of `FILTER_ARRAY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterArray {
    /// The array to filter.
    pub source: Value,
    /// State key receiving the filtered array.
    #[serde(alias = "targetState")]
    pub target: String,
    /// Per-item condition; kept when truthy.
    pub condition: Value,
    /// Context name of the current item.
    #[serde(default = "default_item_alias", alias = "as")]
    pub item_as: String,
    /// Context name of the current index.
    #[serde(default = "default_index_alias")]
    pub index_as: String,
}

/// Payload of `CALL_BACKEND`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallBackend {
    /// Registered function name.
    #[serde(alias = "functionName")]
    pub function: String,
    /// Arguments; may be templated at any depth.
    #[serde(default)]
    pub args: Value,
    /// State key receiving the result.
    #[serde(default)]
    pub target_state: Option<String>,
    /// State key set to `true` for the duration of the call.
    #[serde(default)]
    pub loading_key: Option<String>,
    /// Chain run with `result` in context.
    #[serde(default)]
    pub on_success: Option<Value>,
}

/// Payload of `SECURE_SAVE`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureSave {
    /// Storage key.
    pub key: String,
    /// Value to store.
    #[serde(default)]
    pub value: Value,
    /// Chain run after the write.
    #[serde(default)]
    pub on_success: Option<Value>,
}

/// Payload of `SECURE_READ`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureRead {
    /// Storage key.
    pub key: String,
    /// State key receiving the value.
    #[serde(default)]
    pub target_state: Option<String>,
    /// Chain run with `result` in context.
    #[serde(default)]
    pub on_success: Option<Value>,
}

/// Payload of `OPEN_URL`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenUrl {
    /// Target URL; may be templated.
    pub url: Value,
    /// Open in a new tab.
    #[serde(default = "default_true")]
    pub new_tab: bool,
}

/// Payload of `NAVIGATE`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Navigate {
    /// In-app path; may be templated.
    #[serde(alias = "to")]
    pub path: Value,
}

/// Payload of `OPEN_OVERLAY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenOverlay {
    /// Name of an entry in `context.overlays`.
    #[serde(alias = "name")]
    pub overlay: String,
    /// Extra values made available to the overlay as `context.props`.
    #[serde(default)]
    pub props: Value,
}

/// Payload of `CONFIRM`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirm {
    /// Question shown to the user.
    pub message: Value,
    /// Optional dialog title.
    #[serde(default)]
    pub title: Value,
    /// Chain run when accepted.
    #[serde(default)]
    pub on_confirm: Option<Value>,
    /// Chain run when declined.
    #[serde(default)]
    pub on_cancel: Option<Value>,
}

/// Payload of `COPY_TO_CLIPBOARD`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyToClipboard {
    /// Text to copy; may be templated.
    #[serde(alias = "value")]
    pub text: Value,
    /// Toast shown after copying; defaults to "Copied to clipboard".
    #[serde(default)]
    pub success_message: Option<Value>,
}

/// Payload of `TOAST`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Toast {
    /// Text; may be templated.
    pub message: Value,
    /// Tone.
    #[serde(default, alias = "type")]
    pub variant: ToastVariant,
}

/// Payload of `SET_LOADING`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetLoading {
    /// State key of the flag; `loading` when absent.
    #[serde(default)]
    pub key: Option<String>,
    /// Flag value; truthiness is stored.
    #[serde(default = "default_true_value")]
    pub value: Value,
}

/// Payload of `DELAY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Delay {
    /// Milliseconds; a number or a template resolving to one.
    #[serde(alias = "duration")]
    pub ms: Value,
}

/// Payload of `INSERT_CONTENT`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertContent {
    /// HTML to insert; may be templated.
    pub content: Value,
    /// Close the current overlay afterwards.
    #[serde(default)]
    pub close_overlay: bool,
}

/// Payload of `APPEND_BODY` and `SET_BODY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditorContent {
    /// HTML; may be templated.
    pub content: Value,
}

/// Payload of `OAUTH_CONNECT`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConnect {
    /// Provider slug, e.g. `google`.
    pub provider: String,
    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Presentation; the dispatcher's default when absent.
    #[serde(default)]
    pub mode: Option<OAuthMode>,
    /// Where a redirect should land afterwards.
    #[serde(default)]
    pub return_to: Option<Value>,
    /// Chain run when a popup authorization completes.
    #[serde(default)]
    pub on_success: Option<Value>,
}

/// Payload of `OAUTH_DISCONNECT`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthDisconnect {
    /// Provider slug.
    pub provider: String,
    /// Chain run after disconnecting.
    #[serde(default)]
    pub on_success: Option<Value>,
}

/// Payload of `NEXT_STEP` and `PREV_STEP`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WizardTarget {
    /// Wizard id; the enclosing wizard when absent.
    #[serde(default, alias = "wizardId")]
    pub wizard: Option<String>,
}

/// Payload of `GO_TO_STEP`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoToStep {
    /// Wizard id; the enclosing wizard when absent.
    #[serde(default, alias = "wizardId")]
    pub wizard: Option<String>,
    /// Zero-based step; may be templated.
    pub step: Value,
}

fn default_item_alias() -> String {
    "item".to_string()
}

fn default_index_alias() -> String {
    "index".to_string()
}

fn default_true() -> bool {
    true
}

fn default_true_value() -> Value {
    Value::Bool(true)
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|keys| match keys {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of decoding one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A well-formed known action.
    Action(Action),
    /// A tag this dispatcher does not know. Skipped with a warning.
    Unknown(String),
    /// A known tag whose fields do not parse, or a descriptor without a tag.
    Malformed(ActionError),
}

/// Decodes one action descriptor.
#[must_use]
pub fn decode(descriptor: &Value) -> Decoded {
    let Some(tag) = descriptor.get("action").and_then(Value::as_str) else {
        return Decoded::Malformed(ActionError::Malformed {
            tag: String::new(),
            message: "descriptor has no string `action` field".to_string(),
        });
    };
    if !Action::is_known_tag(tag) {
        return Decoded::Unknown(tag.to_string());
    }
    match Action::deserialize(descriptor) {
        Ok(action) => Decoded::Action(action),
        Err(err) => Decoded::Malformed(ActionError::Malformed {
            tag: tag.to_string(),
            message: err.to_string(),
        }),
    }
}

/// Normalizes a single descriptor or a list of descriptors into a slice.
///
/// `null` yields an empty list.
#[must_use]
pub fn descriptors(actions: &Value) -> &[Value] {
    match actions {
        Value::Array(list) => list,
        Value::Null => &[],
        single => core::slice::from_ref(single),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_fields_without_resolving() {
        let decoded = decode(&json!({
            "action": "SET_STATE",
            "key": "greeting",
            "value": "Hi ${context.user.name}"
        }));
        assert_eq!(
            decoded,
            Decoded::Action(Action::SetState(KeyValue {
                key: "greeting".into(),
                value: json!("Hi ${context.user.name}"),
            }))
        );
    }

    #[test]
    fn call_backend_accepts_aliases() {
        let Decoded::Action(Action::CallBackend(call)) = decode(&json!({
            "action": "CALL_BACKEND",
            "functionName": "summarize",
            "args": { "id": "${context.email.id}" },
            "targetState": "summary",
            "onSuccess": { "action": "TOAST", "message": "done" }
        })) else {
            panic!("expected CALL_BACKEND");
        };
        assert_eq!(call.function, "summarize");
        assert_eq!(call.target_state.as_deref(), Some("summary"));
        assert!(call.on_success.is_some());
        assert_eq!(call.loading_key, None);
    }

    #[test]
    fn unit_tag_ignores_extra_fields() {
        assert_eq!(
            decode(&json!({ "action": "CLOSE_OVERLAY", "reason": "done" })),
            Decoded::Action(Action::CloseOverlay)
        );
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        assert_eq!(
            decode(&json!({ "action": "LAUNCH_ROCKET" })),
            Decoded::Unknown("LAUNCH_ROCKET".into())
        );
    }

    #[test]
    fn known_tag_with_bad_fields_is_malformed() {
        let decoded = decode(&json!({ "action": "SET_STATE", "value": 1 }));
        let Decoded::Malformed(ActionError::Malformed { tag, .. }) = decoded else {
            panic!("expected malformed, got {decoded:?}");
        };
        assert_eq!(tag, "SET_STATE");
    }

    #[test]
    fn reset_state_takes_one_or_many_keys() {
        let one = decode(&json!({ "action": "RESET_STATE", "key": "a" }));
        let many = decode(&json!({ "action": "RESET_STATE", "keys": ["a", "b"] }));
        let all = decode(&json!({ "action": "RESET_STATE" }));

        assert_eq!(
            one,
            Decoded::Action(Action::ResetState(ResetState {
                keys: Some(vec!["a".into()])
            }))
        );
        assert_eq!(
            many,
            Decoded::Action(Action::ResetState(ResetState {
                keys: Some(vec!["a".into(), "b".into()])
            }))
        );
        assert_eq!(all, Decoded::Action(Action::ResetState(ResetState { keys: None })));
    }

    #[test]
    fn tag_table_matches_variants() {
        for tag in Action::TAGS {
            let decoded = decode(&json!({ "action": tag }));
            assert!(
                !matches!(decoded, Decoded::Unknown(_)),
                "{tag} should be known"
            );
            if let Decoded::Action(action) = decoded {
                assert_eq!(action.tag(), *tag);
            }
        }
    }

    #[test]
    fn descriptors_normalizes_shapes() {
        assert!(descriptors(&Value::Null).is_empty());
        assert_eq!(descriptors(&json!({ "action": "TOAST" })).len(), 1);
        assert_eq!(descriptors(&json!([{}, {}])).len(), 2);
    }
}
