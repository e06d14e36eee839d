//! Example composer session.
//!
//! Mounts the composer toolbar from a domain manifest, clicks its button,
//! then sends two drafts through the pre-send pipeline.
//!
//! # Usage
//!
//! ```bash
//! composer
//! EXPANSE_LOG=debug composer
//! EXPANSE_LOG_FORMAT=json composer
//! EXPANSE_FEATURE_ACME_SIGNATURE=false composer
//! ```

use std::sync::Arc;

use example::{ConsoleHost, DOMAIN_MANIFEST, SendAudit, Signature, SubjectGuard, functions};
use expanse_core::{FeatureFlags, RuntimeConfig, TracingConfig};
use expanse_registry::{ExpansionRegistry, ManifestLoader, MountPoint, MountRegistry, PriorityChain};
use expanse_render::{ElementKind, LeafKind};
use serde_json::{Value, json};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    TracingConfig::from_env().with_host_target("example").init();

    let config = match RuntimeConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    // Compiled-in expansions are on unless a flag turns them off.
    let flags = FeatureFlags::from_env().with_default(true);

    // Registries
    let registry = Arc::new(MountRegistry::new());
    let report = match ManifestLoader::new(Arc::clone(&registry)).load_str(DOMAIN_MANIFEST) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    println!("Loaded extensions: {:?}", report.loaded);

    let mut expansions = ExpansionRegistry::new(Arc::clone(&registry), flags);
    expansions.add(SubjectGuard);
    expansions.add(Signature {
        text: "Sent from my Expanse".to_string(),
    });
    expansions.add(SendAudit);
    println!("Enabled expansions: {:?}", expansions.enabled());

    for (extension_id, command) in registry.slash_commands() {
        println!("Slash command /{} ({extension_id}): {}", command.name, command.description);
    }

    // Composer toolbar
    let host = ConsoleHost::new();
    let services = host.services().with_backend(Arc::new(functions()));
    let compose = json!({ "compose": { "to": ["ana@example.com"], "subject": "Lunch" } });

    for registration in registry.by_mount_point(&MountPoint::ComposerToolbar) {
        let Some(surface) = registration.mount(services.clone(), Arc::clone(&config)) else {
            continue;
        };
        println!("\n[{}] toolbar", surface.extension_id());

        let rendered = surface.render(&compose);
        if let Some(select) = rendered.by_kind(ElementKind::Leaf(LeafKind::Select)).first()
            && let Err(e) = surface.trigger(select, "onChange", json!("formal")).await
        {
            eprintln!("Error: {e}");
        }

        let rendered = surface.render(&compose);
        let Some(button) = rendered.by_kind(ElementKind::Leaf(LeafKind::Button)).first().copied() else {
            continue;
        };
        println!("  click '{}'", button.text().unwrap_or_default());
        match surface.trigger(button, "onClick", Value::Null).await {
            Ok(summary) => println!("  {summary:?}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    println!("\nDraft body: {:?}", host.body());

    // Pre-send pipeline
    let chain = PriorityChain::new(Arc::clone(&registry));
    let drafts = [
        json!({ "to": ["ana@example.com"], "subject": "Lunch", "body": host.body() }),
        json!({ "to": ["ana@example.com"], "subject": "", "body": "no subject" }),
    ];
    for draft in drafts {
        println!("\nSending {:?}", draft["subject"]);
        match chain.run(&MountPoint::PreSend, draft).await {
            Ok(report) if report.is_intercepted() => {
                println!("  held back by {}", report.intercepted_by.unwrap_or_default());
            }
            Ok(report) => {
                println!("  handlers: {:?}", report.ran);
                println!("  sent body: {:?}", report.value["body"]);
            }
            Err(e) => eprintln!("  send blocked: {e}"),
        }
    }
}
