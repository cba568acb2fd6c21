//! Event listener storage
//!
//! Listeners are keyed by target and event type. Dispatch works from
//! snapshots so callbacks may add or remove listeners while running.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Event, NodeId};

/// Something listeners can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Node(NodeId),
}

/// Handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
    pub once: bool,
}

/// Listener callback
pub type ListenerCallback = Rc<dyn Fn(&mut Event)>;

struct Listener {
    id: ListenerId,
    event_type: String,
    options: ListenerOptions,
    callback: ListenerCallback,
}

/// Listener registry for every target in a document
#[derive(Default)]
pub struct ListenerStore {
    by_target: HashMap<EventTarget, Vec<Listener>>,
    index: HashMap<ListenerId, EventTarget>,
    next_id: u64,
}

impl fmt::Debug for ListenerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerStore")
            .field("targets", &self.by_target.len())
            .field("listeners", &self.index.len())
            .finish()
    }
}

impl ListenerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener
    pub fn add(
        &mut self,
        target: EventTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: ListenerCallback,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);

        self.by_target.entry(target).or_default().push(Listener {
            id,
            event_type: event_type.to_string(),
            options,
            callback,
        });
        self.index.insert(id, target);
        id
    }

    /// Remove a listener
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(target) = self.index.remove(&id) else {
            return false;
        };
        if let Some(listeners) = self.by_target.get_mut(&target) {
            listeners.retain(|l| l.id != id);
            if listeners.is_empty() {
                self.by_target.remove(&target);
            }
        }
        true
    }

    /// Remove every listener on a target
    pub fn clear_target(&mut self, target: EventTarget) -> usize {
        let Some(listeners) = self.by_target.remove(&target) else {
            return 0;
        };
        for listener in &listeners {
            self.index.remove(&listener.id);
        }
        listeners.len()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of listeners for a target and event type (both phases)
    pub fn count(&self, target: EventTarget, event_type: &str) -> usize {
        self.by_target
            .get(&target)
            .map_or(0, |ls| ls.iter().filter(|l| l.event_type == event_type).count())
    }

    /// Total number of listeners
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Listeners for one phase, in registration order
    pub(crate) fn snapshot(
        &self,
        target: EventTarget,
        event_type: &str,
        capture: bool,
    ) -> Vec<(ListenerId, ListenerOptions, ListenerCallback)> {
        self.by_target
            .get(&target)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|l| l.options.capture == capture && l.event_type == event_type)
                    .map(|l| (l.id, l.options, Rc::clone(&l.callback)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ListenerCallback {
        Rc::new(|_: &mut Event| {})
    }

    #[test]
    fn test_add_and_remove() {
        let mut store = ListenerStore::new();
        let target = EventTarget::Node(NodeId(3));

        let id1 = store.add(target, "click", ListenerOptions::default(), noop());
        let _id2 = store.add(target, "click", ListenerOptions::default(), noop());
        let _id3 = store.add(target, "keydown", ListenerOptions::default(), noop());

        assert_eq!(store.count(target, "click"), 2);
        assert_eq!(store.count(target, "keydown"), 1);

        assert!(store.remove(id1));
        assert!(!store.remove(id1));
        assert_eq!(store.count(target, "click"), 1);
    }

    #[test]
    fn test_snapshot_filters_phase() {
        let mut store = ListenerStore::new();
        let capture = ListenerOptions { capture: true, ..ListenerOptions::default() };
        store.add(EventTarget::Document, "click", capture, noop());
        store.add(EventTarget::Document, "click", ListenerOptions::default(), noop());

        assert_eq!(store.snapshot(EventTarget::Document, "click", true).len(), 1);
        assert_eq!(store.snapshot(EventTarget::Document, "click", false).len(), 1);
        assert!(store.snapshot(EventTarget::Window, "click", false).is_empty());
    }

    #[test]
    fn test_clear_target() {
        let mut store = ListenerStore::new();
        let node = EventTarget::Node(NodeId(1));
        store.add(node, "click", ListenerOptions::default(), noop());
        store.add(node, "input", ListenerOptions::default(), noop());
        store.add(EventTarget::Window, "click", ListenerOptions::default(), noop());

        assert_eq!(store.clear_target(node), 2);
        assert_eq!(store.len(), 1);
    }
}
