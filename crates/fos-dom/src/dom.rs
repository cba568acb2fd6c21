//! Shared DOM handle and event dispatch
//!
//! `Dom` is a cheap, clonable handle over one document and its listener
//! store. Listener callbacks receive only the event; anything they need
//! from the document they reach through a (weak) `Dom` handle of their own,
//! so no borrow is held while a callback runs.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::{
    Document, DomError, Event, EventPhase, EventTarget, KeyboardEventInit, ListenerId,
    ListenerOptions, ListenerStore, NodeId,
};

/// Callback told which nodes left the document (preorder, subtree roots first)
pub type RemovalObserver = Rc<dyn Fn(&[NodeId])>;

/// Handle for a registered removal observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Global event targets the host provides
///
/// A browser host has both; a non-browser host (server-side, tests of
/// fragments) may have neither, in which case listeners cannot be attached
/// to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostGlobals {
    pub window: bool,
    pub document: bool,
}

impl HostGlobals {
    pub const BROWSER: Self = Self { window: true, document: true };
    pub const HEADLESS: Self = Self { window: false, document: false };
}

impl Default for HostGlobals {
    fn default() -> Self {
        Self::BROWSER
    }
}

struct DomInner {
    document: RefCell<Document>,
    listeners: RefCell<ListenerStore>,
    observers: RefCell<Vec<(ObserverId, RemovalObserver)>>,
    next_observer: std::cell::Cell<u64>,
    globals: HostGlobals,
}

/// Shared document + listener store
#[derive(Clone)]
pub struct Dom {
    inner: Rc<DomInner>,
}

/// Non-owning `Dom` handle for callbacks stored inside the DOM itself
#[derive(Clone)]
pub struct WeakDom {
    inner: Weak<DomInner>,
}

impl WeakDom {
    pub fn upgrade(&self) -> Option<Dom> {
        self.inner.upgrade().map(|inner| Dom { inner })
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("url", &self.inner.document.borrow().url())
            .field("globals", &self.inner.globals)
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl Dom {
    /// Browser host: empty HTML skeleton with window and document globals
    pub fn new(url: &str) -> Self {
        Self::with_document(Document::new(url), HostGlobals::BROWSER)
    }

    /// Non-browser host without window/document globals
    pub fn headless(url: &str) -> Self {
        Self::with_document(Document::new(url), HostGlobals::HEADLESS)
    }

    pub fn with_document(document: Document, globals: HostGlobals) -> Self {
        Self {
            inner: Rc::new(DomInner {
                document: RefCell::new(document),
                listeners: RefCell::new(ListenerStore::new()),
                observers: RefCell::new(Vec::new()),
                next_observer: std::cell::Cell::new(0),
                globals,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakDom {
        WeakDom { inner: Rc::downgrade(&self.inner) }
    }

    pub fn ptr_eq(&self, other: &Dom) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether listeners can be attached to `target` in this host
    pub fn has_global(&self, target: EventTarget) -> bool {
        match target {
            EventTarget::Window => self.inner.globals.window,
            EventTarget::Document => self.inner.globals.document,
            EventTarget::Node(_) => true,
        }
    }

    pub fn globals(&self) -> HostGlobals {
        self.inner.globals
    }

    /// Borrow the document
    ///
    /// Panics if called while a `document_mut` borrow is alive.
    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    /// Borrow the document mutably
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    /// `<body>` element
    pub fn body(&self) -> NodeId {
        self.document().body()
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.document_mut().tree_mut().create_element(tag)
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let mut document = self.document_mut();
        let tree = document.tree_mut();
        let node = tree.create_element(tag);
        tree.append_child(parent, node)?;
        Ok(node)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.document_mut().tree_mut().append_child(parent, child)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.document_mut().tree_mut().set_attribute(node, name, value)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document().tree().attribute(node, name).map(str::to_string)
    }

    /// Set the layout box an element reports (offsetWidth/offsetHeight)
    pub fn set_size(&self, node: NodeId, width: f64, height: f64) -> Result<(), DomError> {
        self.document_mut().tree_mut().set_size(node, width, height)
    }

    /// Detach a node and notify removal observers about its subtree
    pub fn remove_node(&self, node: NodeId) -> Result<(), DomError> {
        let removed = {
            let mut document = self.document_mut();
            let tree = document.tree_mut();
            let was_connected = tree.is_connected(node);
            tree.remove_child(node)?;
            if was_connected { tree.subtree(node) } else { Vec::new() }
        };
        if removed.is_empty() {
            return Ok(());
        }

        tracing::debug!("Removed {} nodes rooted at {:?}", removed.len(), node);
        let observers: Vec<RemovalObserver> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(&removed);
        }
        Ok(())
    }

    /// Watch for nodes leaving the document
    pub fn observe_removals(&self, observer: RemovalObserver) -> ObserverId {
        let next = self.inner.next_observer.get() + 1;
        self.inner.next_observer.set(next);
        let id = ObserverId(next);
        self.inner.observers.borrow_mut().push((id, observer));
        id
    }

    pub fn disconnect_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(observer, _)| *observer != id);
        observers.len() != before
    }

    // === Listeners ===

    /// Register a listener
    pub fn add_event_listener(
        &self,
        target: EventTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: impl Fn(&mut Event) + 'static,
    ) -> ListenerId {
        self.inner
            .listeners
            .borrow_mut()
            .add(target, event_type, options, Rc::new(callback))
    }

    /// Remove a listener; safe to call from inside a running callback
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow().contains(id)
    }

    /// Number of listeners for a target and event type
    pub fn listener_count(&self, target: EventTarget, event_type: &str) -> usize {
        self.inner.listeners.borrow().count(target, event_type)
    }

    /// Total listeners registered
    pub fn total_listeners(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    // === Dispatch ===

    /// Propagation path, outermost first, ending with the target itself
    fn event_path(&self, target: EventTarget) -> Vec<EventTarget> {
        let mut path = Vec::new();
        let globals = self.inner.globals;
        match target {
            EventTarget::Window => {}
            EventTarget::Document => {
                if globals.window {
                    path.push(EventTarget::Window);
                }
            }
            EventTarget::Node(node) => {
                let document = self.document();
                let tree = document.tree();
                let ancestors = tree.ancestors(node);
                if tree.is_connected(node) {
                    if globals.window {
                        path.push(EventTarget::Window);
                    }
                    if globals.document {
                        path.push(EventTarget::Document);
                    }
                }
                path.extend(
                    ancestors
                        .into_iter()
                        .rev()
                        .filter(|&ancestor| ancestor != NodeId::ROOT)
                        .map(EventTarget::Node),
                );
            }
        }
        path.push(target);
        path
    }

    /// Dispatch an event through capture, target and bubble phases
    ///
    /// Returns the event after dispatch so callers can inspect
    /// `is_default_prevented`.
    pub fn dispatch_event(&self, target: EventTarget, mut event: Event) -> Event {
        event.target = target;
        let path = self.event_path(target);
        let Some((_, ancestors)) = path.split_last() else {
            return event;
        };

        tracing::trace!("Dispatching {} to {:?} (path length {})", event.event_type, target, path.len());

        'dispatch: {
            for &current in ancestors {
                event.phase = EventPhase::Capturing;
                event.current_target = current;
                self.invoke_listeners(current, &mut event, true);
                if event.is_propagation_stopped() {
                    break 'dispatch;
                }
            }

            event.phase = EventPhase::AtTarget;
            event.current_target = target;
            self.invoke_listeners(target, &mut event, true);
            if event.is_propagation_stopped() {
                break 'dispatch;
            }
            self.invoke_listeners(target, &mut event, false);
            if event.is_propagation_stopped() || !event.bubbles {
                break 'dispatch;
            }

            for &current in ancestors.iter().rev() {
                event.phase = EventPhase::Bubbling;
                event.current_target = current;
                self.invoke_listeners(current, &mut event, false);
                if event.is_propagation_stopped() {
                    break 'dispatch;
                }
            }
        }

        event.phase = EventPhase::None;
        event.current_target = target;
        event
    }

    fn invoke_listeners(&self, current: EventTarget, event: &mut Event, capture: bool) {
        let listeners = self
            .inner
            .listeners
            .borrow()
            .snapshot(current, &event.event_type, capture);

        for (id, options, callback) in listeners {
            // Removed by an earlier listener during this dispatch.
            if !self.has_listener(id) {
                continue;
            }
            if options.once {
                self.remove_event_listener(id);
            }
            event.set_in_passive_listener(options.passive);
            callback(event);
            event.set_in_passive_listener(false);
            if event.is_immediate_propagation_stopped() {
                break;
            }
        }
    }

    // === User actions ===

    /// `element.click()`, including checkbox activation behavior
    pub fn click(&self, node: NodeId) -> Event {
        let toggled = {
            let mut document = self.document_mut();
            match document.tree_mut().element_mut(node) {
                Some(el) if el.is_checkbox() => {
                    let previous = el.checked;
                    el.checked = !previous;
                    Some(previous)
                }
                _ => None,
            }
        };

        let event = self.dispatch_event(EventTarget::Node(node), Event::click());

        // Canceled activation restores the pre-click state.
        if let Some(previous) = toggled {
            if event.is_default_prevented() {
                if let Some(el) = self.document_mut().tree_mut().element_mut(node) {
                    el.checked = previous;
                }
            }
        }
        event
    }

    /// Fire a keydown at a node
    pub fn key_down(&self, node: NodeId, init: KeyboardEventInit) -> Event {
        self.dispatch_event(EventTarget::Node(node), Event::key_down(init))
    }

    /// Fire a keyup at a node
    pub fn key_up(&self, node: NodeId, init: KeyboardEventInit) -> Event {
        self.dispatch_event(EventTarget::Node(node), Event::key_up(init))
    }

    /// Set a control's value and fire `input` at it
    pub fn input(&self, node: NodeId, value: &str) -> Event {
        if let Some(el) = self.document_mut().tree_mut().element_mut(node) {
            el.value = value.to_string();
        }
        self.dispatch_event(EventTarget::Node(node), Event::input(value))
    }

    /// `checked` state of a checkbox
    pub fn is_checked(&self, node: NodeId) -> bool {
        self.document().tree().element(node).is_some_and(|el| el.checked)
    }
}
