//! Outside-click tracking
//!
//! One capturing document listener per event type serves every `.outside`
//! binding. On each event the tracker walks a copy of its registry and calls
//! the handlers whose element the event started outside of. The tracker is
//! an explicit object owned by the runtime (or shared between runtimes) and
//! can be reset between test runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fos_dom::{Dom, DomTree, Event, EventTarget, ListenerId, ListenerOptions, NodeId};

use crate::BindingId;

/// Handler invoked for an outside event
pub type OutsideHandler = Rc<dyn Fn(&mut Event)>;

struct Entry {
    binding: BindingId,
    element: NodeId,
    event_name: String,
    handler: OutsideHandler,
}

/// Registry of `.outside` bindings
#[derive(Default)]
pub struct OutsideClickTracker {
    entries: RefCell<Vec<Entry>>,
    /// Installed document listeners by event type
    installed: RefCell<Vec<(String, ListenerId)>>,
}

impl fmt::Debug for OutsideClickTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutsideClickTracker")
            .field("entries", &self.entries.borrow().len())
            .field("installed", &self.installed.borrow().len())
            .finish()
    }
}

impl OutsideClickTracker {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Add a binding, installing the document listener for its event type
    /// on first use
    pub fn register(
        self: &Rc<Self>,
        dom: &Dom,
        binding: BindingId,
        element: NodeId,
        event_name: &str,
        handler: OutsideHandler,
    ) {
        self.install(dom, event_name);
        self.entries.borrow_mut().push(Entry {
            binding,
            element,
            event_name: event_name.to_string(),
            handler,
        });
    }

    fn install(self: &Rc<Self>, dom: &Dom, event_name: &str) {
        if self.installed.borrow().iter().any(|(name, _)| name == event_name) {
            return;
        }

        let tracker = Rc::downgrade(self);
        let weak_dom = dom.downgrade();
        let options = ListenerOptions { capture: true, ..ListenerOptions::default() };
        let id = dom.add_event_listener(EventTarget::Document, event_name, options, move |event| {
            if let (Some(tracker), Some(dom)) = (tracker.upgrade(), weak_dom.upgrade()) {
                tracker.handle(&dom, event);
            }
        });
        tracing::debug!("Installed outside listener for '{}'", event_name);
        self.installed.borrow_mut().push((event_name.to_string(), id));
    }

    /// Remove a binding; the document listener stays installed
    pub fn unregister(&self, binding: BindingId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.binding != binding);
        entries.len() != before
    }

    pub fn is_registered(&self, binding: BindingId) -> bool {
        self.entries.borrow().iter().any(|entry| entry.binding == binding)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether a document listener is installed for `event_name`
    pub fn is_installed(&self, event_name: &str) -> bool {
        self.installed.borrow().iter().any(|(name, _)| name == event_name)
    }

    /// Forget every binding and uninstall the document listeners
    pub fn reset(&self, dom: &Dom) {
        self.entries.borrow_mut().clear();
        for (_, id) in self.installed.borrow_mut().drain(..) {
            dom.remove_event_listener(id);
        }
    }

    /// Whether `target` lies outside `element`
    pub fn is_outside(tree: &DomTree, element: NodeId, target: EventTarget) -> bool {
        match target {
            EventTarget::Node(node) => !tree.contains(element, node),
            EventTarget::Window | EventTarget::Document => true,
        }
    }

    /// Whether the element is attached and has a rendered box
    pub fn is_interactable(tree: &DomTree, element: NodeId) -> bool {
        tree.is_connected(element) && tree.geometry(element).is_some_and(|g| g.has_box())
    }

    /// Whether `event` started outside `element` while it is interactable
    pub fn accepts(&self, dom: &Dom, element: NodeId, event: &Event) -> bool {
        let document = dom.document();
        let tree = document.tree();
        Self::is_outside(tree, element, event.target) && Self::is_interactable(tree, element)
    }

    fn handle(&self, dom: &Dom, event: &mut Event) {
        // Handlers may bind or unbind, so iterate over a copy.
        let candidates: Vec<(BindingId, NodeId, OutsideHandler)> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.event_name == event.event_type)
            .map(|entry| (entry.binding, entry.element, Rc::clone(&entry.handler)))
            .collect();

        for (binding, element, handler) in candidates {
            if !self.is_registered(binding) {
                continue;
            }
            if self.accepts(dom, element, event) {
                handler(event);
            } else {
                tracing::trace!("{} ignores {} (inside or hidden)", binding, event.event_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dom: Dom,
        outer: NodeId,
        list: NodeId,
        item: NodeId,
    }

    fn fixture() -> Fixture {
        let dom = Dom::new("test://outside");
        let outer = dom.append_element(dom.body(), "div").unwrap();
        let list = dom.append_element(outer, "ul").unwrap();
        let item = dom.append_element(list, "li").unwrap();
        dom.set_size(list, 100.0, 20.0).unwrap();
        Fixture { dom, outer, list, item }
    }

    fn counter(count: &Rc<RefCell<u32>>) -> OutsideHandler {
        let count = Rc::clone(count);
        Rc::new(move |_: &mut Event| *count.borrow_mut() += 1)
    }

    #[test]
    fn test_fires_only_for_outside_clicks() {
        let f = fixture();
        let tracker = OutsideClickTracker::new();
        let count = Rc::new(RefCell::new(0));
        tracker.register(&f.dom, BindingId(1), f.list, "click", counter(&count));

        f.dom.click(f.item);
        f.dom.click(f.list);
        assert_eq!(*count.borrow(), 0);

        f.dom.click(f.outer);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_hidden_element_ignores_clicks() {
        let f = fixture();
        let tracker = OutsideClickTracker::new();
        let count = Rc::new(RefCell::new(0));
        tracker.register(&f.dom, BindingId(1), f.list, "click", counter(&count));

        f.dom.set_size(f.list, 0.0, 0.0).unwrap();
        f.dom.click(f.outer);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_single_listener_per_event_type() {
        let f = fixture();
        let tracker = OutsideClickTracker::new();
        let count = Rc::new(RefCell::new(0));
        tracker.register(&f.dom, BindingId(1), f.list, "click", counter(&count));
        tracker.register(&f.dom, BindingId(2), f.item, "click", counter(&count));

        assert_eq!(f.dom.listener_count(EventTarget::Document, "click"), 1);
        assert!(tracker.is_installed("click"));

        tracker.unregister(BindingId(1));
        assert_eq!(tracker.len(), 1);
        assert_eq!(f.dom.listener_count(EventTarget::Document, "click"), 1);
    }

    #[test]
    fn test_handler_may_unregister_others() {
        let f = fixture();
        let tracker = OutsideClickTracker::new();
        let count = Rc::new(RefCell::new(0));

        let weak = Rc::downgrade(&tracker);
        tracker.register(
            &f.dom,
            BindingId(1),
            f.list,
            "click",
            Rc::new(move |_: &mut Event| {
                if let Some(tracker) = weak.upgrade() {
                    tracker.unregister(BindingId(2));
                }
            }),
        );
        tracker.register(&f.dom, BindingId(2), f.list, "click", counter(&count));

        f.dom.click(f.outer);
        assert_eq!(*count.borrow(), 0);
        assert!(!tracker.is_registered(BindingId(2)));
    }

    #[test]
    fn test_reset() {
        let f = fixture();
        let tracker = OutsideClickTracker::new();
        tracker.register(&f.dom, BindingId(1), f.list, "click", Rc::new(|_: &mut Event| {}));
        tracker.reset(&f.dom);

        assert!(tracker.is_empty());
        assert!(!tracker.is_installed("click"));
        assert_eq!(f.dom.total_listeners(), 0);
    }
}
