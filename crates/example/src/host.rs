//! A console stand-in for the webmail client.

use std::sync::Arc;

use async_trait::async_trait;
use expanse_actions::{
    EditorBridge, HostServices, Navigator, Notifier, OverlayHost, OverlayRequest, ToastVariant,
};
use parking_lot::Mutex;

/// Host services that print what they are asked to do and keep the draft
/// body in memory.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    body: Mutex<String>,
    overlays: Mutex<Vec<OverlayRequest>>,
}

impl ConsoleHost {
    /// Creates a host with an empty draft.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the current draft body.
    #[must_use]
    pub fn body(&self) -> String {
        self.body.lock().clone()
    }

    /// Takes the overlays opened since the last call.
    pub fn take_overlays(&self) -> Vec<OverlayRequest> {
        core::mem::take(&mut *self.overlays.lock())
    }

    /// Bundles this host as [`HostServices`].
    #[must_use]
    pub fn services(self: &Arc<Self>) -> HostServices {
        HostServices::new()
            .with_notifier(self.clone())
            .with_editor(self.clone())
            .with_overlays(self.clone())
            .with_navigator(self.clone())
    }
}

#[async_trait]
impl Notifier for ConsoleHost {
    fn toast(&self, message: &str, variant: ToastVariant) {
        println!("  [toast:{variant:?}] {message}");
    }

    async fn confirm(&self, title: Option<&str>, message: &str) -> bool {
        println!("  [confirm] {}: {message} -> yes", title.unwrap_or("Confirm"));
        true
    }
}

impl EditorBridge for ConsoleHost {
    fn insert_content(&self, html: &str) {
        self.body.lock().push_str(html);
    }

    fn append_body(&self, html: &str) {
        let mut body = self.body.lock();
        body.push('\n');
        body.push_str(html);
    }

    fn set_body(&self, html: &str) {
        html.clone_into(&mut self.body.lock());
    }
}

impl OverlayHost for ConsoleHost {
    fn open(&self, request: OverlayRequest) {
        println!("  [overlay] open '{}' for {}", request.name, request.extension_id);
        self.overlays.lock().push(request);
    }

    fn close(&self) {
        println!("  [overlay] close");
    }
}

impl Navigator for ConsoleHost {
    fn open_url(&self, url: &str, new_tab: bool) {
        println!("  [navigate] open {url} (new tab: {new_tab})");
    }

    fn navigate(&self, path: &str) {
        println!("  [navigate] {path}");
    }
}
