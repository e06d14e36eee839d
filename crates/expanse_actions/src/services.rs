//! Host services consumed by the dispatcher.
//!
//! The runtime never talks to a server, a browser or an editor directly. Every
//! side effect that leaves the state store goes through one of the traits in
//! this module, implemented by the host and bundled into [`HostServices`].
//! A missing service is not fatal: the action needing it fails with
//! [`ActionError::ServiceUnavailable`] and is routed like any other failure.

use core::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::action::{OAuthMode, ToastVariant};
use crate::error::{ActionError, BackendError};

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Executes named server-side functions on behalf of an extension.
///
/// Implementations must reject any `function` not on the extension's
/// allow-list with [`BackendError::FunctionNotAllowed`].
#[async_trait]
pub trait BackendExecutor: Send + Sync + 'static {
    /// Invokes `function` with resolved `args`.
    ///
    /// `context` is the caller's full context, for implementations that
    /// forward it to the server.
    async fn call(
        &self,
        extension_id: &str,
        function: &str,
        args: Value,
        context: &Value,
    ) -> Result<Value, BackendError>;
}

/// The `{success, result | error}` envelope a remote executor returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// The result on success.
    #[serde(default)]
    pub result: Value,
    /// The error message on failure.
    #[serde(default)]
    pub error: Option<String>,
    /// A machine-readable failure code such as `AUTH_REQUIRED`.
    #[serde(default)]
    pub code: Option<String>,
}

impl BackendResponse {
    /// Converts the envelope into a result.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::AuthRequired`] for the `AUTH_REQUIRED` code and
    /// [`BackendError::Failed`] for any other failure.
    pub fn into_result(self) -> Result<Value, BackendError> {
        if self.success {
            return Ok(self.result);
        }
        if self.code.as_deref() == Some("AUTH_REQUIRED") {
            return Err(BackendError::AuthRequired);
        }
        Err(BackendError::Failed(
            self.error.unwrap_or_else(|| "backend call failed".to_string()),
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Secure storage
// ─────────────────────────────────────────────────────────────────────────────

/// End-to-end encrypted, per-user key/value storage.
#[async_trait]
pub trait SecureStorage: Send + Sync + 'static {
    /// Stores `value` under `key` for `user_id`.
    async fn write(&self, key: &str, value: Value, user_id: &str) -> Result<(), BackendError>;

    /// Reads the value under `key` for `user_id`.
    async fn read(&self, key: &str, user_id: &str) -> Result<Option<Value>, BackendError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor / overlays / navigation
// ─────────────────────────────────────────────────────────────────────────────

/// Bridge to the message being composed.
pub trait EditorBridge: Send + Sync + 'static {
    /// Inserts HTML at the cursor.
    fn insert_content(&self, html: &str);
    /// Appends HTML to the end of the body.
    fn append_body(&self, html: &str);
    /// Replaces the body.
    fn set_body(&self, html: &str);
}

/// Request to render an overlay subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRequest {
    /// The extension that owns the overlay.
    pub extension_id: String,
    /// Overlay name from `context.overlays`.
    pub name: String,
    /// The overlay's component tree, unresolved.
    pub node: Value,
    /// The context the overlay renders against, with resolved `props`.
    pub context: Value,
}

/// Renders subtrees outside normal layout flow.
pub trait OverlayHost: Send + Sync + 'static {
    /// Shows an overlay.
    fn open(&self, request: OverlayRequest);
    /// Closes the current overlay.
    fn close(&self);
}

/// Browser-level navigation.
pub trait Navigator: Send + Sync + 'static {
    /// Opens an external URL.
    fn open_url(&self, url: &str, new_tab: bool);
    /// Navigates within the host application.
    fn navigate(&self, path: &str);
}

/// System clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync + 'static {
    /// Writes text.
    async fn write_text(&self, text: &str) -> Result<(), BackendError>;
}

/// User-facing notifications and prompts.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Shows a non-blocking toast.
    fn toast(&self, message: &str, variant: ToastVariant);

    /// Asks the user to confirm. Resolves to `true` when accepted.
    async fn confirm(&self, title: Option<&str>, message: &str) -> bool;

    /// Prompts the user to sign in after an `AUTH_REQUIRED` failure.
    fn sign_in_required(&self, extension_id: &str) {
        self.toast(&format!("Sign in to continue using {extension_id}"), ToastVariant::Warning);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth
// ─────────────────────────────────────────────────────────────────────────────

/// Path prefix of the host's OAuth authorization endpoint.
pub const OAUTH_PATH: &str = "/api/auth/oauth";

/// A provider authorization about to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRequest {
    /// Provider slug.
    pub provider: String,
    /// Authorization URL under [`OAUTH_PATH`].
    pub url: String,
    /// Popup or redirect.
    pub mode: OAuthMode,
}

/// How an authorization ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthOutcome {
    /// The popup completed and the account is connected.
    Completed,
    /// The page is redirecting away.
    Redirected,
    /// The user closed the popup.
    Cancelled,
}

/// The host's authentication layer.
#[async_trait]
pub trait OAuthBridge: Send + Sync + 'static {
    /// Opens the authorization URL as requested.
    async fn connect(&self, request: &OAuthRequest) -> Result<OAuthOutcome, BackendError>;

    /// Revokes the extension's connection to a provider.
    async fn disconnect(&self, extension_id: &str, provider: &str) -> Result<(), BackendError>;
}

/// Builds the authorization URL for a provider.
#[must_use]
pub fn oauth_url(provider: &str, extension_id: &str, scopes: &[String], return_to: Option<&str>) -> String {
    let mut url = format!(
        "{OAUTH_PATH}/{}?extensionId={}",
        urlencoding::encode(provider),
        urlencoding::encode(extension_id)
    );
    if !scopes.is_empty() {
        url.push_str("&scopes=");
        url.push_str(&urlencoding::encode(&scopes.join(" ")));
    }
    if let Some(return_to) = return_to.filter(|r| !r.is_empty()) {
        url.push_str("&returnTo=");
        url.push_str(&urlencoding::encode(return_to));
    }
    url
}

// ─────────────────────────────────────────────────────────────────────────────
// HostServices
// ─────────────────────────────────────────────────────────────────────────────

/// The set of host services available to one dispatcher.
#[derive(Clone, Default)]
pub struct HostServices {
    backend: Option<Arc<dyn BackendExecutor>>,
    storage: Option<Arc<dyn SecureStorage>>,
    editor: Option<Arc<dyn EditorBridge>>,
    overlays: Option<Arc<dyn OverlayHost>>,
    navigator: Option<Arc<dyn Navigator>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    notifier: Option<Arc<dyn Notifier>>,
    oauth: Option<Arc<dyn OAuthBridge>>,
    user_id: Option<String>,
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("backend", &self.backend.is_some())
            .field("storage", &self.storage.is_some())
            .field("editor", &self.editor.is_some())
            .field("overlays", &self.overlays.is_some())
            .field("navigator", &self.navigator.is_some())
            .field("clipboard", &self.clipboard.is_some())
            .field("notifier", &self.notifier.is_some())
            .field("oauth", &self.oauth.is_some())
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl HostServices {
    /// Creates an empty service set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend executor.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn BackendExecutor>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the secure storage.
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn SecureStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the editor bridge.
    #[must_use]
    pub fn with_editor(mut self, editor: Arc<dyn EditorBridge>) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Sets the overlay host.
    #[must_use]
    pub fn with_overlays(mut self, overlays: Arc<dyn OverlayHost>) -> Self {
        self.overlays = Some(overlays);
        self
    }

    /// Sets the navigator.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Sets the clipboard.
    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Sets the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the OAuth bridge.
    #[must_use]
    pub fn with_oauth(mut self, oauth: Arc<dyn OAuthBridge>) -> Self {
        self.oauth = Some(oauth);
        self
    }

    /// Sets the signed-in user, which keys secure storage.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub(crate) fn backend(&self) -> Result<&dyn BackendExecutor, ActionError> {
        self.backend
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("backend executor"))
    }

    pub(crate) fn storage(&self) -> Result<&dyn SecureStorage, ActionError> {
        self.storage
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("secure storage"))
    }

    pub(crate) fn editor(&self) -> Result<&dyn EditorBridge, ActionError> {
        self.editor
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("editor"))
    }

    pub(crate) fn overlays(&self) -> Result<&dyn OverlayHost, ActionError> {
        self.overlays
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("overlay host"))
    }

    pub(crate) fn navigator(&self) -> Result<&dyn Navigator, ActionError> {
        self.navigator
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("navigator"))
    }

    pub(crate) fn clipboard(&self) -> Result<&dyn Clipboard, ActionError> {
        self.clipboard
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("clipboard"))
    }

    pub(crate) fn notifier(&self) -> Option<&dyn Notifier> {
        self.notifier.as_deref()
    }

    pub(crate) fn oauth(&self) -> Result<&dyn OAuthBridge, ActionError> {
        self.oauth
            .as_deref()
            .ok_or_else(|| ActionError::unavailable("OAuth"))
    }

    /// Returns the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::AuthRequired`] when no user is set.
    pub(crate) fn user_id(&self) -> Result<&str, ActionError> {
        self.user_id
            .as_deref()
            .ok_or(ActionError::Backend(BackendError::AuthRequired))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Toasts(Mutex<Vec<(String, ToastVariant)>>);

    #[async_trait]
    impl Notifier for Toasts {
        fn toast(&self, message: &str, variant: ToastVariant) {
            self.0.lock().push((message.to_string(), variant));
        }

        async fn confirm(&self, _title: Option<&str>, _message: &str) -> bool {
            false
        }
    }

    #[test]
    fn default_sign_in_prompt_names_the_extension() {
        let toasts = Toasts::default();
        toasts.sign_in_required("acme.crm");
        assert_eq!(
            *toasts.0.lock(),
            vec![("Sign in to continue using acme.crm".to_string(), ToastVariant::Warning)]
        );
    }

    #[test]
    fn response_envelope_maps_auth_required() {
        let response: BackendResponse = serde_json::from_value(json!({
            "success": false,
            "error": "not signed in",
            "code": "AUTH_REQUIRED"
        }))
        .expect("envelope should parse");
        assert_eq!(response.into_result(), Err(BackendError::AuthRequired));
    }

    #[test]
    fn response_envelope_success() {
        let response: BackendResponse =
            serde_json::from_value(json!({ "success": true, "result": { "n": 3 } }))
                .expect("envelope should parse");
        assert_eq!(response.into_result(), Ok(json!({ "n": 3 })));
    }

    #[test]
    fn oauth_url_encodes_parameters() {
        let url = oauth_url(
            "google",
            "acme.calendar",
            &["calendar.read".into(), "email".into()],
            Some("/settings?tab=ext"),
        );
        assert_eq!(
            url,
            "/api/auth/oauth/google?extensionId=acme.calendar&scopes=calendar.read%20email&returnTo=%2Fsettings%3Ftab%3Dext"
        );
    }

    #[test]
    fn missing_services_report_unavailable() {
        let services = HostServices::new();
        assert!(matches!(
            services.storage(),
            Err(ActionError::ServiceUnavailable { service: "secure storage" })
        ));
        assert!(services.notifier().is_none());
        assert!(services.user_id().is_err_and(|e| e.is_auth_required()));
    }
}
