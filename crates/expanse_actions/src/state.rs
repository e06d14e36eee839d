//! Per-surface state store.
//!
//! A [`StateStore`] holds the key/value state of one mounted surface. Actions
//! write it; every node reads it through the `state` namespace. Writes are
//! visible to the next read immediately, while observers are told about them
//! through [`StateStore::subscribe`] so the host can schedule a re-render.
//!
//! Keys are dotted paths: `form.email` addresses the `email` field of the
//! object stored at `form`, creating intermediate objects as needed.
//!
//! # Example
//!
//! ```
//! use expanse_actions::StateStore;
//! use serde_json::json;
//!
//! let store = StateStore::new();
//! assert!(store.set("draft.subject", json!("Hello")));
//! assert_eq!(store.snapshot(), json!({ "draft": { "subject": "Hello" } }));
//!
//! // Writing the same value again is a no-op.
//! assert!(!store.set("draft.subject", json!("Hello")));
//! ```

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// A committed state write, delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// The dotted path that was written, or `None` when the store was cleared.
    pub path: Option<String>,
    /// Store version after the write.
    pub version: u64,
}

/// Handle returned by [`StateStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&StateChange) + Send + Sync>;

#[derive(Default)]
struct Inner {
    values: Map<String, Value>,
    version: u64,
}

/// Mutable key/value state scoped to one surface.
#[derive(Default)]
pub struct StateStore {
    inner: RwLock<Inner>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("StateStore")
            .field("values", &inner.values)
            .field("version", &inner.version)
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with values.
    #[must_use]
    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            inner: RwLock::new(Inner { values, version: 0 }),
            ..Self::default()
        }
    }

    /// Returns a copy of the whole state as a JSON object.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        Value::Object(self.inner.read().values.clone())
    }

    /// Returns the value at a dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        let inner = self.inner.read();
        let mut segments = split(path);
        let first = segments.next()?;
        let mut current = inner.values.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    /// Returns the number of committed writes.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Writes a value at a dotted path.
    ///
    /// Returns `true` if the stored value changed. Intermediate segments that
    /// are missing or not objects are replaced by empty objects.
    pub fn set(&self, path: &str, value: Value) -> bool {
        self.write(path, |slot| {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        })
    }

    /// Shallow-merges an object into the object stored at a path.
    ///
    /// A missing or non-object value at the path is replaced by `partial`.
    pub fn merge(&self, path: &str, partial: Map<String, Value>) -> bool {
        self.write(path, |slot| match slot {
            Value::Object(existing) => {
                let mut changed = false;
                for (key, value) in partial {
                    if existing.get(&key) != Some(&value) {
                        existing.insert(key, value);
                        changed = true;
                    }
                }
                changed
            }
            other => {
                *other = Value::Object(partial);
                true
            }
        })
    }

    /// Removes the value at a path. Returns `true` if something was removed.
    pub fn remove(&self, path: &str) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            let (parent, last) = match path.rsplit_once('.') {
                Some((parent, last)) => (Some(parent), last),
                None => (None, path),
            };
            let container = match parent {
                None => Some(&mut inner.values),
                Some(parent) => object_at_mut(&mut inner.values, parent),
            };
            let removed = container.is_some_and(|map| map.remove(last).is_some());
            if removed {
                inner.version += 1;
            }
            removed.then_some(inner.version)
        };
        match removed {
            Some(version) => {
                self.notify(&StateChange {
                    path: Some(path.to_string()),
                    version,
                });
                true
            }
            None => false,
        }
    }

    /// Removes every value.
    pub fn clear(&self) {
        let version = {
            let mut inner = self.inner.write();
            if inner.values.is_empty() {
                return;
            }
            inner.values.clear();
            inner.version += 1;
            inner.version
        };
        self.notify(&StateChange {
            path: None,
            version,
        });
    }

    /// Registers a listener called after every committed write.
    ///
    /// Listeners run outside the store's lock and may read the store.
    pub fn subscribe(&self, listener: impl Fn(&StateChange) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed) + 1);
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn write(&self, path: &str, apply: impl FnOnce(&mut Value) -> bool) -> bool {
        let version = {
            let mut inner = self.inner.write();
            let slot = slot_mut(&mut inner.values, path);
            if !apply(slot) {
                return false;
            }
            inner.version += 1;
            inner.version
        };
        self.notify(&StateChange {
            path: Some(path.to_string()),
            version,
        });
        true
    }

    fn notify(&self, change: &StateChange) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

/// Returns the slot for `path`, creating objects along the way.
fn slot_mut<'a>(root: &'a mut Map<String, Value>, path: &str) -> &'a mut Value {
    let mut segments: Vec<&str> = split(path).collect();
    let last = segments.pop().unwrap_or(path);
    let mut map = root;
    for segment in segments {
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        map = match entry {
            Value::Object(inner) => inner,
            _ => unreachable!("entry was just made an object"),
        };
    }
    map.entry(last.to_string()).or_insert(Value::Null)
}

fn object_at_mut<'a>(root: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Map<String, Value>> {
    let mut map = root;
    for segment in split(path) {
        map = map.get_mut(segment)?.as_object_mut()?;
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn set_and_get_nested_paths() {
        let store = StateStore::new();
        store.set("form.email", json!("a@x.io"));
        store.set("form.count", json!(2));

        assert_eq!(store.get("form.email"), Some(json!("a@x.io")));
        assert_eq!(store.get("form"), Some(json!({ "email": "a@x.io", "count": 2 })));
        assert_eq!(store.get("form.missing"), None);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn set_replaces_non_object_intermediates() {
        let store = StateStore::new();
        store.set("a", json!(5));
        store.set("a.b", json!(true));
        assert_eq!(store.snapshot(), json!({ "a": { "b": true } }));
    }

    #[test]
    fn redundant_writes_do_not_notify() {
        let store = StateStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.set("k", json!(1)));
        assert!(!store.set("k", json!(1)));
        assert!(store.set("k", json!(2)));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn merge_is_shallow() {
        let store = StateStore::new();
        store.set("prefs", json!({ "theme": "dark", "nested": { "a": 1 } }));

        let partial = json!({ "nested": { "b": 2 }, "lang": "pt" });
        let Value::Object(partial) = partial else {
            unreachable!()
        };
        assert!(store.merge("prefs", partial));

        assert_eq!(
            store.get("prefs"),
            Some(json!({ "theme": "dark", "nested": { "b": 2 }, "lang": "pt" }))
        );
    }

    #[test]
    fn remove_and_clear() {
        let store = StateStore::new();
        store.set("a.b", json!(1));
        store.set("c", json!(2));

        assert!(store.remove("a.b"));
        assert!(!store.remove("a.b"));
        assert_eq!(store.snapshot(), json!({ "a": {}, "c": 2 }));

        store.clear();
        assert_eq!(store.snapshot(), json!({}));
    }

    #[test]
    fn listener_may_read_the_store() {
        let store = Arc::new(StateStore::new());
        let seen = Arc::new(RwLock::new(Vec::new()));

        let store_clone = Arc::clone(&store);
        let seen_clone = Arc::clone(&seen);
        store.subscribe(move |change| {
            let path = change.path.clone().unwrap_or_default();
            seen_clone.write().push(store_clone.get(&path));
        });

        store.set("x", json!("y"));
        assert_eq!(*seen.read(), vec![Some(json!("y"))]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = StateStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.unsubscribe(id));
        store.set("k", json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscriptions_are_independent() {
        let store = StateStore::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_clone = Arc::clone(&first);
        let second_clone = Arc::clone(&second);
        let a = store.subscribe(move |_| {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        let b = store.subscribe(move |_| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_ne!(a, b);

        assert!(store.unsubscribe(a));
        assert!(!store.unsubscribe(a));
        store.set("k", json!(1));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
