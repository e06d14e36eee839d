//! In-memory host services that record what the dispatcher asked of them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use expanse_actions::{
    BackendError, Clipboard, EditorBridge, HostServices, Navigator, Notifier, OAuthBridge,
    OAuthOutcome, OAuthRequest, OverlayHost, OverlayRequest, SecureStorage, ToastVariant,
};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Default)]
pub struct Recorder {
    pub toasts: Mutex<Vec<(String, ToastVariant)>>,
    pub sign_ins: Mutex<Vec<String>>,
    pub confirm_answer: Mutex<bool>,
    pub editor: Mutex<Vec<String>>,
    pub overlays: Mutex<Vec<OverlayRequest>>,
    pub overlay_closes: Mutex<usize>,
    pub urls: Mutex<Vec<String>>,
    pub clipboard: Mutex<Vec<String>>,
    pub storage: Mutex<HashMap<(String, String), Value>>,
    pub oauth: Mutex<Vec<OAuthRequest>>,
    pub disconnects: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn toast_messages(&self) -> Vec<String> {
        self.toasts.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

/// Every service backed by one shared recorder.
pub struct Host(pub Arc<Recorder>);

#[async_trait]
impl Notifier for Host {
    fn toast(&self, message: &str, variant: ToastVariant) {
        self.0.toasts.lock().push((message.to_string(), variant));
    }

    async fn confirm(&self, _title: Option<&str>, _message: &str) -> bool {
        *self.0.confirm_answer.lock()
    }

    fn sign_in_required(&self, extension_id: &str) {
        self.0.sign_ins.lock().push(extension_id.to_string());
    }
}

impl EditorBridge for Host {
    fn insert_content(&self, html: &str) {
        self.0.editor.lock().push(format!("insert:{html}"));
    }

    fn append_body(&self, html: &str) {
        self.0.editor.lock().push(format!("append:{html}"));
    }

    fn set_body(&self, html: &str) {
        self.0.editor.lock().push(format!("set:{html}"));
    }
}

impl OverlayHost for Host {
    fn open(&self, request: OverlayRequest) {
        self.0.overlays.lock().push(request);
    }

    fn close(&self) {
        *self.0.overlay_closes.lock() += 1;
    }
}

impl Navigator for Host {
    fn open_url(&self, url: &str, new_tab: bool) {
        self.0.urls.lock().push(format!("open:{url}:{new_tab}"));
    }

    fn navigate(&self, path: &str) {
        self.0.urls.lock().push(format!("navigate:{path}"));
    }
}

#[async_trait]
impl Clipboard for Host {
    async fn write_text(&self, text: &str) -> Result<(), BackendError> {
        self.0.clipboard.lock().push(text.to_string());
        Ok(())
    }
}

#[async_trait]
impl SecureStorage for Host {
    async fn write(&self, key: &str, value: Value, user_id: &str) -> Result<(), BackendError> {
        self.0
            .storage
            .lock()
            .insert((user_id.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn read(&self, key: &str, user_id: &str) -> Result<Option<Value>, BackendError> {
        Ok(self
            .0
            .storage
            .lock()
            .get(&(user_id.to_string(), key.to_string()))
            .cloned())
    }
}

#[async_trait]
impl OAuthBridge for Host {
    async fn connect(&self, request: &OAuthRequest) -> Result<OAuthOutcome, BackendError> {
        self.0.oauth.lock().push(request.clone());
        Ok(OAuthOutcome::Completed)
    }

    async fn disconnect(&self, _extension_id: &str, provider: &str) -> Result<(), BackendError> {
        self.0.disconnects.lock().push(provider.to_string());
        Ok(())
    }
}

/// Returns services wired to a fresh recorder, without a backend.
pub fn services() -> (HostServices, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let host = Arc::new(Host(Arc::clone(&recorder)));
    let services = HostServices::new()
        .with_notifier(host.clone())
        .with_editor(host.clone())
        .with_overlays(host.clone())
        .with_navigator(host.clone())
        .with_clipboard(host.clone())
        .with_storage(host.clone())
        .with_oauth(host);
    (services, recorder)
}
