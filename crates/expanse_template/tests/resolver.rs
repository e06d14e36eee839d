//! Property and behaviour tests for template resolution.

use std::borrow::Cow;

use expanse_template::{Scope, resolve};
use proptest::prelude::*;
use serde_json::{Value, json};

fn sample_context() -> Value {
    json!({
        "name": "Ana",
        "email": { "subject": "Quarterly", "to": ["a@x.io", "b@x.io"] },
        "attachments": []
    })
}

#[test]
fn pure_reference_borrows_the_context_value() {
    let context = sample_context();
    let state = json!({});
    let env = json!({});
    let scope = Scope::new(&context, &state, &env);

    let template = json!("${context.email}");
    let resolved = resolve(&template, &scope);

    assert!(matches!(resolved, Cow::Borrowed(_)));
    let expected = context.get("email").expect("fixture has email");
    assert!(
        core::ptr::eq(&*resolved, expected),
        "pure reference should return the referenced value itself"
    );
}

#[test]
fn greeting_interpolation() {
    let context = json!({ "name": "Ana" });
    let state = json!({});
    let env = json!({});
    let scope = Scope::new(&context, &state, &env);

    assert_eq!(*resolve(&json!("Hi ${context.name}!"), &scope), json!("Hi Ana!"));

    let empty = json!({});
    let scope = scope.with_context(&empty);
    assert_eq!(*resolve(&json!("Hi ${context.name}!"), &scope), json!("Hi !"));
}

#[test]
fn shorthand_and_explicit_paths_agree() {
    let context = sample_context();
    let state = json!({});
    let env = json!({});
    let scope = Scope::new(&context, &state, &env);

    assert_eq!(
        resolve(&json!("${email.subject}"), &scope),
        resolve(&json!("${context.email.subject}"), &scope)
    );
    assert_eq!(*resolve(&json!("${email.to.length}"), &scope), json!(2));
    assert_eq!(*resolve(&json!("${attachments.length}"), &scope), json!(0));
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        ".{0,12}".prop_map(Value::String),
        "\\$\\{[a-z.]{0,10}\\}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-z]{1,5}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn resolve_is_total(template in arb_json(), context in arb_json(), state in arb_json()) {
        let env = json!({});
        let scope = Scope::new(&context, &state, &env);
        let _ = resolve(&template, &scope);
    }

    #[test]
    fn resolve_is_deterministic(template in arb_json(), context in arb_json()) {
        let state = json!({ "k": 1 });
        let env = json!({});
        let scope = Scope::new(&context, &state, &env);
        prop_assert_eq!(resolve(&template, &scope), resolve(&template, &scope));
    }

    #[test]
    fn arbitrary_strings_never_panic(source in ".{0,40}") {
        let context = sample_context();
        let state = json!({});
        let env = json!({});
        let scope = Scope::new(&context, &state, &env);
        let _ = resolve(&Value::String(source), &scope);
    }
}
