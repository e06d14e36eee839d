//! Sequential action dispatch.
//!
//! [`ActionDispatcher::run`] takes a single descriptor or a list, and executes
//! the actions strictly in order, awaiting each one before starting the next.
//! Every action resolves its fields against a fresh snapshot of the state, so
//! a write made by one action is visible to the actions after it.
//!
//! # Failure handling
//!
//! A failing action never aborts the list. The failure is routed to the
//! descriptor's `onError` chain (with `error` and `errorCode` in context) when
//! one is declared, to the notifier's sign-in prompt for `AUTH_REQUIRED`, and
//! to a generic error toast otherwise. Unknown tags are skipped with a
//! warning.
//!
//! Chained actions (`onSuccess`, `onConfirm`, ...) run through the same loop
//! one level deeper; chains nested beyond the configured depth are skipped.

use core::fmt;
use core::time::Duration;
use std::sync::Arc;

use expanse_core::RuntimeConfig;
use expanse_template::{Scope, is_template, resolve, resolve_string, truthy};
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};
use tracing::Instrument;

use crate::action::{Action, Decoded, OAuthMode, ToastVariant, decode, descriptors};
use crate::error::ActionError;
use crate::services::{HostServices, OAuthOutcome, OAuthRequest, OverlayRequest, oauth_url};
use crate::state::StateStore;

/// Wizard id used when neither the action nor the context names one.
pub const DEFAULT_WIZARD_ID: &str = "default";

/// Returns the state path holding a wizard's step cursor.
#[must_use]
pub fn wizard_state_key(wizard_id: &str) -> String {
    format!("_wizard.{wizard_id}")
}

/// Counts of what one [`ActionDispatcher::run`] did, including nested chains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Actions that completed.
    pub executed: usize,
    /// Actions that failed and were routed to `onError` or a toast.
    pub failed: usize,
    /// Unknown actions and chains skipped for depth.
    pub skipped: usize,
}

impl RunSummary {
    fn absorb(&mut self, other: Self) {
        self.executed += other.executed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionDispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Executes action descriptors on behalf of one extension.
#[derive(Clone)]
pub struct ActionDispatcher {
    extension_id: Arc<str>,
    services: HostServices,
    config: Arc<RuntimeConfig>,
    env: Arc<Value>,
    oauth_mode: OAuthMode,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("extension_id", &self.extension_id)
            .field("services", &self.services)
            .field("oauth_mode", &self.oauth_mode)
            .finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    /// Creates a dispatcher for an extension.
    #[must_use]
    pub fn new(
        extension_id: impl Into<Arc<str>>,
        services: HostServices,
        config: Arc<RuntimeConfig>,
    ) -> Self {
        let env = Arc::new(config.env());
        Self {
            extension_id: extension_id.into(),
            services,
            config,
            env,
            oauth_mode: OAuthMode::default(),
        }
    }

    /// Sets how `OAUTH_CONNECT` opens authorization pages when the descriptor
    /// does not say.
    #[must_use]
    pub fn with_oauth_mode(mut self, mode: OAuthMode) -> Self {
        self.oauth_mode = mode;
        self
    }

    /// Returns the extension this dispatcher acts for.
    #[must_use]
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the `env` namespace value.
    #[must_use]
    pub fn env(&self) -> &Value {
        &self.env
    }

    /// Runs one descriptor or a list of descriptors.
    ///
    /// `extra` is merged over `context` (its keys win) before any field is
    /// resolved.
    pub async fn run(
        &self,
        actions: &Value,
        context: &Value,
        state: &StateStore,
        extra: Map<String, Value>,
    ) -> RunSummary {
        let span = tracing::debug_span!("dispatch", extension_id = %self.extension_id);
        self.run_nested(actions, context, state, extra, 0)
            .instrument(span)
            .await
    }

    fn run_nested<'a>(
        &'a self,
        actions: &'a Value,
        context: &'a Value,
        state: &'a StateStore,
        extra: Map<String, Value>,
        depth: usize,
    ) -> BoxFuture<'a, RunSummary> {
        Box::pin(async move {
            let mut summary = RunSummary::default();
            let list = descriptors(actions);
            if depth > self.config.max_action_depth() {
                tracing::warn!(
                    depth,
                    max = self.config.max_action_depth(),
                    skipped = list.len(),
                    "action chain too deep, skipping"
                );
                summary.skipped += list.len();
                return summary;
            }

            let context = merge_context(context, extra);
            for descriptor in list {
                let result = match decode(descriptor) {
                    Decoded::Action(action) => {
                        tracing::debug!(action = action.tag(), depth, "executing action");
                        self.execute(&action, &context, state, depth, &mut summary)
                            .await
                    }
                    Decoded::Unknown(tag) => {
                        tracing::warn!(tag = %tag, "unknown action skipped");
                        summary.skipped += 1;
                        continue;
                    }
                    Decoded::Malformed(err) => Err(err),
                };
                match result {
                    Ok(()) => summary.executed += 1,
                    Err(err) => {
                        summary.failed += 1;
                        self.fail(descriptor, &err, &context, state, depth, &mut summary)
                            .await;
                    }
                }
            }
            summary
        })
    }

    async fn fail(
        &self,
        descriptor: &Value,
        err: &ActionError,
        context: &Value,
        state: &StateStore,
        depth: usize,
        summary: &mut RunSummary,
    ) {
        tracing::warn!(error = %err, code = err.code(), "action failed");
        if let Some(on_error) = descriptor.get("onError").filter(|chain| !chain.is_null()) {
            let mut extra = Map::new();
            extra.insert("error".into(), Value::String(err.to_string()));
            extra.insert("errorCode".into(), Value::String(err.code().into()));
            let nested = self
                .run_nested(on_error, context, state, extra, depth + 1)
                .await;
            summary.absorb(nested);
            return;
        }
        if err.is_auth_required() {
            if let Some(notifier) = self.services.notifier() {
                notifier.sign_in_required(&self.extension_id);
            }
            return;
        }
        self.toast(&format!("Something went wrong: {err}"), ToastVariant::Error);
    }

    async fn chain(
        &self,
        next: Option<&Value>,
        context: &Value,
        state: &StateStore,
        extra: Map<String, Value>,
        depth: usize,
        summary: &mut RunSummary,
    ) {
        if let Some(next) = next.filter(|chain| !chain.is_null()) {
            let nested = self.run_nested(next, context, state, extra, depth + 1).await;
            summary.absorb(nested);
        }
    }

    fn toast(&self, message: &str, variant: ToastVariant) {
        match self.services.notifier() {
            Some(notifier) => notifier.toast(message, variant),
            None => tracing::info!(message, ?variant, "toast (no notifier)"),
        }
    }

    async fn execute(
        &self,
        action: &Action,
        context: &Value,
        state: &StateStore,
        depth: usize,
        summary: &mut RunSummary,
    ) -> Result<(), ActionError> {
        let snapshot = state.snapshot();
        let scope = Scope::new(context, &snapshot, &self.env);

        match action {
            // ── State ────────────────────────────────────────────────────────
            Action::SetState(a) => {
                let value = resolve(&a.value, &scope).into_owned();
                state.set(&text(&a.key, &scope), value);
            }
            Action::MergeState(a) => {
                let Value::Object(partial) = resolve(&a.value, &scope).into_owned() else {
                    return Err(ActionError::invalid_field("value", "expected an object"));
                };
                state.merge(&text(&a.key, &scope), partial);
            }
            Action::ToggleState(a) => {
                let key = text(&a.key, &scope);
                let current = state.get(&key).is_some_and(|value| truthy(&value));
                state.set(&key, Value::Bool(!current));
            }
            Action::ResetState(a) => match &a.keys {
                None => state.clear(),
                Some(keys) => {
                    for key in keys {
                        state.remove(&text(key, &scope));
                    }
                }
            },
            Action::AppendArray(a) => {
                let key = text(&a.key, &scope);
                let mut items = match state.get(&key) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(ActionError::invalid_field("key", format!("'{key}' is not an array")));
                    }
                };
                items.push(resolve(&a.value, &scope).into_owned());
                state.set(&key, Value::Array(items));
            }
            Action::RemoveArrayItem(a) => {
                let key = text(&a.key, &scope);
                let index = as_index(&resolve(&a.index, &scope))
                    .ok_or_else(|| ActionError::invalid_field("index", "expected a non-negative integer"))?;
                if let Some(Value::Array(mut items)) = state.get(&key)
                    && index < items.len()
                {
                    items.remove(index);
                    state.set(&key, Value::Array(items));
                }
            }
            Action::MapArray(a) => {
                let target = text(&a.target, &scope);
                let items = source_items(&resolve(&a.source, &scope))?;
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let item_context = augment(context, &a.item_as, item, &a.index_as, index);
                    let item_scope = Scope::new(&item_context, &snapshot, &self.env);
                    mapped.push(resolve(&a.template, &item_scope).into_owned());
                }
                state.set(&target, Value::Array(mapped));
            }
            Action::FilterArray(a) => {
                let target = text(&a.target, &scope);
                let items = source_items(&resolve(&a.source, &scope))?;
                let mut kept = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    let item_context = augment(context, &a.item_as, item.clone(), &a.index_as, index);
                    let item_scope = Scope::new(&item_context, &snapshot, &self.env);
                    if truthy(&resolve(&a.condition, &item_scope)) {
                        kept.push(item);
                    }
                }
                state.set(&target, Value::Array(kept));
            }

            // ── Backend I/O ──────────────────────────────────────────────────
            Action::CallBackend(a) => {
                let backend = self.services.backend()?;
                let function = text(&a.function, &scope);
                let args = resolve(&a.args, &scope).into_owned();
                let loading_key = a.loading_key.as_deref().map(|key| text(key, &scope));
                if let Some(key) = &loading_key {
                    state.set(key, Value::Bool(true));
                }
                let result = backend
                    .call(&self.extension_id, &function, args, context)
                    .await;
                if let Some(key) = &loading_key {
                    state.set(key, Value::Bool(false));
                }
                let result = result?;
                if let Some(target) = &a.target_state {
                    state.set(&text(target, &scope), result.clone());
                }
                let extra = single("result", result);
                self.chain(a.on_success.as_ref(), context, state, extra, depth, summary)
                    .await;
            }
            Action::SecureSave(a) => {
                let user_id = self.services.user_id()?;
                let storage = self.services.storage()?;
                let value = resolve(&a.value, &scope).into_owned();
                storage.write(&text(&a.key, &scope), value, user_id).await?;
                self.chain(a.on_success.as_ref(), context, state, Map::new(), depth, summary)
                    .await;
            }
            Action::SecureRead(a) => {
                let user_id = self.services.user_id()?;
                let storage = self.services.storage()?;
                let value = storage
                    .read(&text(&a.key, &scope), user_id)
                    .await?
                    .unwrap_or(Value::Null);
                if let Some(target) = &a.target_state {
                    state.set(&text(target, &scope), value.clone());
                }
                let extra = single("result", value);
                self.chain(a.on_success.as_ref(), context, state, extra, depth, summary)
                    .await;
            }

            // ── Navigation / UI ──────────────────────────────────────────────
            Action::OpenUrl(a) => {
                let url = non_empty("url", resolve_string(&a.url, &scope))?;
                self.services.navigator()?.open_url(&url, a.new_tab);
            }
            Action::Navigate(a) => {
                let path = non_empty("path", resolve_string(&a.path, &scope))?;
                self.services.navigator()?.navigate(&path);
            }
            Action::OpenOverlay(a) => {
                let overlays = self.services.overlays()?;
                let name = text(&a.overlay, &scope);
                let node = context
                    .get("overlays")
                    .and_then(|overlays| overlays.get(&name))
                    .cloned()
                    .ok_or_else(|| ActionError::OverlayNotFound(name.clone()))?;
                let props = resolve(&a.props, &scope).into_owned();
                let overlay_context = merge_context(context, single("props", props));
                overlays.open(OverlayRequest {
                    extension_id: self.extension_id.to_string(),
                    name,
                    node,
                    context: overlay_context,
                });
            }
            Action::CloseOverlay => self.services.overlays()?.close(),
            Action::Confirm(a) => {
                let notifier = self
                    .services
                    .notifier()
                    .ok_or_else(|| ActionError::unavailable("notifier"))?;
                let message = resolve_string(&a.message, &scope);
                let title = resolve_string(&a.title, &scope);
                let title = (!title.is_empty()).then_some(title.as_str());
                let next = if notifier.confirm(title, &message).await {
                    a.on_confirm.as_ref()
                } else {
                    a.on_cancel.as_ref()
                };
                self.chain(next, context, state, Map::new(), depth, summary)
                    .await;
            }
            Action::CopyToClipboard(a) => {
                let clipboard = self.services.clipboard()?;
                clipboard
                    .write_text(&resolve_string(&a.text, &scope))
                    .await?;
                let message = a
                    .success_message
                    .as_ref()
                    .map_or_else(|| "Copied to clipboard".to_string(), |m| resolve_string(m, &scope));
                if !message.is_empty() {
                    self.toast(&message, ToastVariant::Success);
                }
            }
            Action::Toast(a) => self.toast(&resolve_string(&a.message, &scope), a.variant),
            Action::SetLoading(a) => {
                let key = a
                    .key
                    .as_deref()
                    .map_or_else(|| "loading".to_string(), |key| text(key, &scope));
                state.set(&key, Value::Bool(truthy(&resolve(&a.value, &scope))));
            }
            Action::Delay(a) => {
                let ms = as_millis(&resolve(&a.ms, &scope))
                    .ok_or_else(|| ActionError::invalid_field("ms", "expected a number of milliseconds"))?;
                let delay = Duration::from_millis(ms).min(self.config.max_delay());
                tokio::time::sleep(delay).await;
            }

            // ── Editor ───────────────────────────────────────────────────────
            Action::InsertContent(a) => {
                let editor = self.services.editor()?;
                editor.insert_content(&resolve_string(&a.content, &scope));
                if a.close_overlay {
                    self.services.overlays()?.close();
                }
            }
            Action::AppendBody(a) => {
                self.services
                    .editor()?
                    .append_body(&resolve_string(&a.content, &scope));
            }
            Action::SetBody(a) => {
                self.services
                    .editor()?
                    .set_body(&resolve_string(&a.content, &scope));
            }

            // ── OAuth ────────────────────────────────────────────────────────
            Action::OauthConnect(a) => {
                let oauth = self.services.oauth()?;
                let provider = text(&a.provider, &scope);
                let return_to = a.return_to.as_ref().map(|r| resolve_string(r, &scope));
                let request = OAuthRequest {
                    url: oauth_url(&provider, &self.extension_id, &a.scopes, return_to.as_deref()),
                    provider,
                    mode: a.mode.unwrap_or(self.oauth_mode),
                };
                match oauth.connect(&request).await? {
                    OAuthOutcome::Completed => {
                        let extra = single("provider", Value::String(request.provider));
                        self.chain(a.on_success.as_ref(), context, state, extra, depth, summary)
                            .await;
                    }
                    outcome => tracing::debug!(provider = %request.provider, ?outcome, "authorization not completed"),
                }
            }
            Action::OauthDisconnect(a) => {
                let provider = text(&a.provider, &scope);
                self.services
                    .oauth()?
                    .disconnect(&self.extension_id, &provider)
                    .await?;
                let extra = single("provider", Value::String(provider));
                self.chain(a.on_success.as_ref(), context, state, extra, depth, summary)
                    .await;
            }

            // ── Wizard ───────────────────────────────────────────────────────
            Action::NextStep(a) => {
                let (key, total) = wizard_cursor(a.wizard.as_deref(), context);
                let current = step_at(state, &key);
                state.set(&key, json!(clamp_step(current.saturating_add(1), total)));
            }
            Action::PrevStep(a) => {
                let (key, total) = wizard_cursor(a.wizard.as_deref(), context);
                let current = step_at(state, &key);
                state.set(&key, json!(clamp_step(current.saturating_sub(1), total)));
            }
            Action::GoToStep(a) => {
                let (key, total) = wizard_cursor(a.wizard.as_deref(), context);
                let step = as_index(&resolve(&a.step, &scope))
                    .ok_or_else(|| ActionError::invalid_field("step", "expected a non-negative integer"))?;
                state.set(&key, json!(clamp_step(step, total)));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves a string field that may itself be a template.
fn text(source: &str, scope: &Scope<'_>) -> String {
    if is_template(source) {
        resolve_string(&Value::String(source.to_string()), scope)
    } else {
        source.to_string()
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, ActionError> {
    if value.is_empty() {
        Err(ActionError::invalid_field(field, "resolved to empty text"))
    } else {
        Ok(value)
    }
}

fn single(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

/// Overlays `extra` on `context`. A non-object context is replaced.
fn merge_context(context: &Value, extra: Map<String, Value>) -> Value {
    match context {
        Value::Object(base) if extra.is_empty() => Value::Object(base.clone()),
        Value::Object(base) => {
            let mut merged = base.clone();
            merged.extend(extra);
            Value::Object(merged)
        }
        _ if extra.is_empty() => context.clone(),
        _ => Value::Object(extra),
    }
}

fn augment(context: &Value, item_as: &str, item: Value, index_as: &str, index: usize) -> Value {
    let mut extra = Map::new();
    extra.insert(item_as.to_string(), item);
    extra.insert(index_as.to_string(), json!(index));
    merge_context(context, extra)
}

fn source_items(source: &Value) -> Result<Vec<Value>, ActionError> {
    match source {
        Value::Array(items) => Ok(items.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(ActionError::invalid_field(
            "source",
            format!("expected an array, got {other}"),
        )),
    }
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_millis(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|ms| *ms >= 0.0).map(|ms| ms as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Returns the cursor key and, when the context describes the same wizard,
/// its step count.
fn wizard_cursor(requested: Option<&str>, context: &Value) -> (String, Option<usize>) {
    let current = context.get("wizard");
    let current_id = current
        .and_then(|wizard| wizard.get("id"))
        .and_then(Value::as_str);
    let id = requested.or(current_id).unwrap_or(DEFAULT_WIZARD_ID);
    let total = current
        .filter(|_| current_id.unwrap_or(DEFAULT_WIZARD_ID) == id)
        .and_then(|wizard| wizard.get("total"))
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok());
    (wizard_state_key(id), total)
}

fn step_at(state: &StateStore, key: &str) -> usize {
    state.get(key).as_ref().and_then(as_index).unwrap_or(0)
}

fn clamp_step(step: usize, total: Option<usize>) -> usize {
    match total {
        Some(total) => step.min(total.saturating_sub(1)),
        None => step,
    }
}
