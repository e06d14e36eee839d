//! Example webmail host built with Expanse.
//!
//! The host loads one domain manifest and three compiled-in expansions, then
//! walks through a compose session:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Composer                                                    │
//! │                                                              │
//! │  COMPOSER_TOOLBAR ── manifest button ──▶ CALL_BACKEND        │
//! │                                          INSERT_CONTENT      │
//! │                                                              │
//! │  Send ──▶ PRE_SEND chain                                     │
//! │           HIGH    acme.subject-guard  (may stop)             │
//! │           NORMAL  acme.signature      (appends signature)    │
//! │           MONITOR acme.audit          (observes only)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod expansions;
pub mod host;

pub use expansions::{SendAudit, Signature, SubjectGuard};
pub use host::ConsoleHost;

use expanse_actions::{BackendError, FunctionRegistry};
use serde_json::{Value, json};

/// The installed-extension document for the demo domain.
pub const DOMAIN_MANIFEST: &str = r#"{
    "extensions": [
        {
            "extensionId": "acme.greeter",
            "template": {
                "mounts": [{
                    "point": "COMPOSER_TOOLBAR",
                    "component": {
                        "kind": "ROW",
                        "children": [
                            {
                                "kind": "SELECT",
                                "props": {
                                    "label": "Tone",
                                    "bindTo": "tone",
                                    "options": ["friendly", "formal"]
                                }
                            },
                            {
                                "kind": "BUTTON",
                                "props": {
                                    "label": "Greet ${compose.to.0}",
                                    "disabled": "${state.loading}",
                                    "onClick": [
                                        { "action": "CALL_BACKEND", "function": "greeting",
                                          "args": { "to": "${compose.to.0}", "tone": "${state.tone}" },
                                          "targetState": "greeting", "loadingKey": "loading" },
                                        { "action": "INSERT_CONTENT", "content": "${state.greeting}" },
                                        { "action": "TOAST", "message": "Greeting inserted", "variant": "success" }
                                    ]
                                }
                            }
                        ]
                    },
                    "slashCommand": {
                        "name": "greet",
                        "description": "Insert a greeting",
                        "actions": { "action": "INSERT_CONTENT", "content": "Hello!" }
                    }
                }]
            }
        }
    ]
}"#;

/// Backend functions the demo domain allows.
#[must_use]
pub fn functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    functions.register("acme.greeter", "greeting", |args: Value, _context: Value| async move {
        let to = args["to"].as_str().unwrap_or("there");
        let name = to.split('@').next().unwrap_or(to);
        let greeting = match args["tone"].as_str() {
            Some("formal") => format!("Dear {name},"),
            _ => format!("Hi {name}!"),
        };
        Ok::<_, BackendError>(json!(greeting))
    });
    functions
}
