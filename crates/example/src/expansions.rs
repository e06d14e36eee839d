//! Code-defined expansions for the outgoing-message pipeline.

use expanse_registry::{
    ClientExpansion, HandlerError, HandlerOutcome, MountPoint, Priority, Registration, handler_fn,
};
use serde_json::{Map, Value, json};

/// Appends a signature to every outgoing message.
pub struct Signature {
    /// Signature text.
    pub text: String,
}

impl ClientExpansion for Signature {
    const ID: &'static str = "acme.signature";

    fn contributions(&self) -> Vec<Registration> {
        let text = self.text.clone();
        vec![Registration::native(
            MountPoint::PreSend,
            handler_fn(move |message: Value| {
                let text = text.clone();
                async move {
                    let body = message["body"].as_str().unwrap_or_default();
                    let mut partial = Map::new();
                    partial.insert("body".into(), json!(format!("{body}\n--\n{text}")));
                    Ok::<_, HandlerError>(HandlerOutcome::Update(partial))
                }
            }),
        )]
    }
}

/// Holds back messages without a subject.
pub struct SubjectGuard;

impl ClientExpansion for SubjectGuard {
    const ID: &'static str = "acme.subject-guard";

    fn contributions(&self) -> Vec<Registration> {
        vec![
            Registration::native(
                MountPoint::PreSend,
                handler_fn(|message: Value| async move {
                    let subject = message["subject"].as_str().unwrap_or_default();
                    if subject.trim().is_empty() {
                        Ok::<_, HandlerError>(HandlerOutcome::Stop)
                    } else {
                        Ok(HandlerOutcome::Continue)
                    }
                }),
            )
            .with_priority(Priority::High),
        ]
    }
}

/// Logs every message that reaches the end of the pipeline.
pub struct SendAudit;

impl ClientExpansion for SendAudit {
    const ID: &'static str = "acme.audit";

    fn contributions(&self) -> Vec<Registration> {
        vec![
            Registration::native(
                MountPoint::PreSend,
                handler_fn(|message: Value| async move {
                    let recipients = message["to"].as_array().map_or(0, Vec::len);
                    tracing::info!(recipients, "message leaving the composer");
                    Ok::<_, HandlerError>(HandlerOutcome::Continue)
                }),
            )
            .with_priority(Priority::Monitor),
        ]
    }
}
