//! Reactive scope
//!
//! The data context directive expressions run against. Writes that change a
//! value notify subscribers with the full dotted path, which is how a
//! renderer learns what to refresh.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{JsError, JsValue};

/// Handle returned by `Scope::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A single observed write
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeChange {
    /// Dotted property path, e.g. `nested.foo`
    pub path: String,
    pub old: JsValue,
    pub new: JsValue,
}

type Subscriber = Rc<dyn Fn(&ScopeChange)>;

struct ScopeInner {
    data: JsValue,
    version: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

/// Shared, reactive scope object
#[derive(Clone)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scope")
            .field("data", &inner.data)
            .field("version", &inner.version)
            .finish()
    }
}

impl Scope {
    /// Empty scope (`{}`)
    pub fn new() -> Self {
        Self::from_value(JsValue::object())
    }

    /// Scope over an object value; anything else yields an empty scope
    pub fn from_value(value: JsValue) -> Self {
        let data = match value {
            JsValue::Object(_) => value,
            _ => JsValue::object(),
        };
        Self {
            inner: Rc::new(RefCell::new(ScopeInner {
                data,
                version: 0,
                subscribers: Vec::new(),
                next_subscription: 0,
            })),
        }
    }

    /// Scope from top-level properties
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsValue)>,
    {
        Self::from_value(JsValue::object_from(pairs))
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether a top-level property exists
    pub fn has(&self, name: &str) -> bool {
        self.inner
            .borrow()
            .data
            .as_object()
            .is_some_and(|map| map.contains_key(name))
    }

    /// Top-level property (`undefined` when missing)
    pub fn get(&self, name: &str) -> JsValue {
        self.inner.borrow().data.get(name)
    }

    /// Property at a dotted path; `undefined` when any segment is missing
    pub fn get_path(&self, path: &str) -> JsValue {
        let inner = self.inner.borrow();
        let mut current = &inner.data;
        for segment in path.split('.') {
            match current.as_object().and_then(|map| map.get(segment)) {
                Some(next) => current = next,
                None => return JsValue::Undefined,
            }
        }
        current.clone()
    }

    /// Set a top-level property
    pub fn set(&self, name: &str, value: JsValue) {
        // A single segment always lands in the root object.
        let _ = self.set_path(&[name.to_string()], value);
    }

    /// Set a property at `path`, notifying subscribers if the value changed
    ///
    /// Fails like a JS member write when an intermediate value is
    /// `undefined`/`null`; writes through other primitives are dropped.
    pub fn set_path(&self, path: &[String], value: JsValue) -> Result<(), JsError> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(());
        };

        let change = {
            let mut inner = self.inner.borrow_mut();
            let mut current = &mut inner.data;
            for segment in parents {
                let map = match current {
                    JsValue::Object(map) => map,
                    _ => return Ok(()),
                };
                current = match map.get_mut(segment.as_str()) {
                    Some(next) if next.is_nullish() => {
                        return Err(JsError::TypeError(format!(
                            "Cannot set properties of {} (setting '{}')",
                            next.to_js_string(),
                            last
                        )));
                    }
                    Some(next) => next,
                    None => {
                        return Err(JsError::TypeError(format!(
                            "Cannot set properties of undefined (setting '{}')",
                            last
                        )));
                    }
                };
            }

            let Some(map) = current.as_object_mut() else {
                return Ok(());
            };
            let old = map.insert(last.clone(), value.clone()).unwrap_or_default();
            if old == value {
                None
            } else {
                inner.version += 1;
                Some(ScopeChange { path: path.join("."), old, new: value })
            }
        };

        if let Some(change) = change {
            tracing::trace!("Scope write {} = {}", change.path, change.new);
            self.notify(&change);
        }
        Ok(())
    }

    fn notify(&self, change: &ScopeChange) {
        let subscribers: Vec<Subscriber> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .map(|(_, s)| Rc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(change);
        }
    }

    /// Observe every changing write
    pub fn subscribe(&self, callback: impl Fn(&ScopeChange) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        inner.subscribers.push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        inner.subscribers.len() != before
    }

    /// Number of changing writes so far
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Copy of the whole scope object
    pub fn snapshot(&self) -> JsValue {
        self.inner.borrow().data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_get_and_set() {
        let scope = Scope::from_pairs([("foo", JsValue::from("bar"))]);
        assert_eq!(scope.get("foo"), JsValue::from("bar"));
        scope.set("foo", JsValue::from("baz"));
        assert_eq!(scope.get("foo"), JsValue::from("baz"));
        assert_eq!(scope.get("missing"), JsValue::Undefined);
    }

    #[test]
    fn test_nested_write_notifies_full_path() {
        let scope = Scope::from_pairs([(
            "nested",
            JsValue::object_from([("foo", JsValue::from("bar"))]),
        )]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        scope.subscribe(move |change| s.borrow_mut().push(change.path.clone()));

        scope.set_path(&path("nested.foo"), JsValue::from("baz")).unwrap();

        assert_eq!(scope.get_path("nested.foo"), JsValue::from("baz"));
        assert_eq!(*seen.borrow(), vec!["nested.foo".to_string()]);
    }

    #[test]
    fn test_unchanged_write_is_silent() {
        let scope = Scope::from_pairs([("count", JsValue::from(1))]);
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        scope.subscribe(move |_| *h.borrow_mut() += 1);

        scope.set("count", JsValue::from(1));
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(scope.version(), 0);

        scope.set("count", JsValue::from(2));
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(scope.version(), 1);
    }

    #[test]
    fn test_write_through_undefined_fails() {
        let scope = Scope::new();
        let err = scope.set_path(&path("missing.foo"), JsValue::from(1)).unwrap_err();
        assert!(matches!(err, JsError::TypeError(_)));
    }

    #[test]
    fn test_subscriber_may_write_back() {
        let scope = Scope::from_pairs([("a", JsValue::from(0)), ("b", JsValue::from(0))]);
        let inner = scope.clone();
        scope.subscribe(move |change| {
            if change.path == "a" {
                inner.set("b", change.new.clone());
            }
        });
        scope.set("a", JsValue::from(5));
        assert_eq!(scope.get("b"), JsValue::from(5));
    }

    #[test]
    fn test_unsubscribe() {
        let scope = Scope::new();
        let id = scope.subscribe(|_| {});
        assert!(scope.unsubscribe(id));
        assert!(!scope.unsubscribe(id));
    }
}
