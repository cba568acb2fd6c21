//! DOM Events
//!
//! Event objects with mouse, keyboard and input payloads, plus the
//! propagation / default-action state listeners manipulate during dispatch.

use crate::{EventTarget, NodeId};

/// Key modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool, // Cmd on Mac, Win on Windows
}

impl KeyModifiers {
    /// Check if any modifier is pressed
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Create from booleans
    pub fn from_flags(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Self {
        Self { shift, ctrl, alt, meta }
    }

    pub fn meta() -> Self {
        Self { meta: true, ..Self::default() }
    }

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button (usually left)
    #[default]
    Primary,
    /// Auxiliary button (usually middle/wheel)
    Auxiliary,
    /// Secondary button (usually right)
    Secondary,
}

/// Mouse event payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseEventInit {
    pub client_x: f64,
    pub client_y: f64,
    pub button: MouseButton,
    pub modifiers: KeyModifiers,
}

/// Keyboard event payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyboardEventInit {
    /// `KeyboardEvent.key` as reported by the platform ("Enter", " ", "a", ...)
    pub key: String,
    pub code: String,
    pub modifiers: KeyModifiers,
    pub repeat: bool,
}

impl KeyboardEventInit {
    /// Payload for a key with no modifiers held
    pub fn key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    /// Add modifiers
    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Event payload by interface
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventDetail {
    #[default]
    None,
    Mouse(MouseEventInit),
    Keyboard(KeyboardEventInit),
    /// `input` events carry the control's value at dispatch time
    Input { value: String },
    /// `CustomEvent.detail`
    Custom(Option<String>),
}

/// Dispatch phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub target: EventTarget,
    pub current_target: EventTarget,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    pub detail: EventDetail,
    pub timestamp: f64,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    in_passive_listener: bool,
}

impl Event {
    /// Bubbling, cancelable event with no payload
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            target: EventTarget::Document,
            current_target: EventTarget::Document,
            phase: EventPhase::None,
            bubbles: true,
            cancelable: true,
            detail: EventDetail::None,
            timestamp: 0.0,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            in_passive_listener: false,
        }
    }

    /// `new CustomEvent(type, { detail })`: neither bubbles nor cancelable
    pub fn custom(event_type: &str, detail: Option<&str>) -> Self {
        Self {
            bubbles: false,
            cancelable: false,
            detail: EventDetail::Custom(detail.map(str::to_string)),
            ..Self::new(event_type)
        }
    }

    /// Create a click event
    pub fn click() -> Self {
        Self::mouse("click", MouseEventInit::default())
    }

    /// Create a mouse event
    pub fn mouse(event_type: &str, init: MouseEventInit) -> Self {
        Self {
            detail: EventDetail::Mouse(init),
            ..Self::new(event_type)
        }
    }

    /// Create a keyboard event
    pub fn keyboard(event_type: &str, init: KeyboardEventInit) -> Self {
        Self {
            detail: EventDetail::Keyboard(init),
            ..Self::new(event_type)
        }
    }

    /// Create a keydown event
    pub fn key_down(init: KeyboardEventInit) -> Self {
        Self::keyboard("keydown", init)
    }

    /// Create a keyup event
    pub fn key_up(init: KeyboardEventInit) -> Self {
        Self::keyboard("keyup", init)
    }

    /// Create an input event (bubbles, not cancelable)
    pub fn input(value: &str) -> Self {
        Self {
            cancelable: false,
            detail: EventDetail::Input { value: value.to_string() },
            ..Self::new("input")
        }
    }

    /// Set the timestamp
    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Prevent default action
    ///
    /// Ignored for non-cancelable events and inside passive listeners.
    pub fn prevent_default(&mut self) {
        if self.cancelable && !self.in_passive_listener {
            self.default_prevented = true;
        }
    }

    /// Stop propagation to further targets
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip remaining listeners on the current target
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    pub(crate) fn set_in_passive_listener(&mut self, passive: bool) {
        self.in_passive_listener = passive;
    }

    /// Keyboard payload, if this is a keyboard event
    pub fn keyboard_init(&self) -> Option<&KeyboardEventInit> {
        match &self.detail {
            EventDetail::Keyboard(init) => Some(init),
            _ => None,
        }
    }

    /// `KeyboardEvent.key`
    pub fn key(&self) -> Option<&str> {
        self.keyboard_init().map(|init| init.key.as_str())
    }

    /// Modifier flags from a keyboard or mouse payload
    pub fn modifiers(&self) -> KeyModifiers {
        match &self.detail {
            EventDetail::Keyboard(init) => init.modifiers,
            EventDetail::Mouse(init) => init.modifiers,
            _ => KeyModifiers::default(),
        }
    }

    /// Target node, when the target is a node
    pub fn target_node(&self) -> Option<NodeId> {
        match self.target {
            EventTarget::Node(node) => Some(node),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let mut input = Event::input("x");
        input.prevent_default();
        assert!(!input.is_default_prevented());

        let mut click = Event::click();
        click.prevent_default();
        assert!(click.is_default_prevented());
    }

    #[test]
    fn test_passive_listener_ignores_prevent_default() {
        let mut event = Event::new("wheel");
        event.set_in_passive_listener(true);
        event.prevent_default();
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_keyboard_accessors() {
        let event = Event::key_down(KeyboardEventInit::key("Enter").with_modifiers(KeyModifiers::meta()));
        assert_eq!(event.key(), Some("Enter"));
        assert!(event.modifiers().meta);
        assert_eq!(Event::click().key(), None);
    }

    #[test]
    fn test_custom_event_defaults() {
        let event = Event::custom("my:event", Some("payload"));
        assert!(!event.bubbles);
        assert!(!event.cancelable);
        assert_eq!(event.detail, EventDetail::Custom(Some("payload".to_string())));
    }
}
