//! Event Bindings for JavaScript
//!
//! Exposes a DOM event to expressions as the `$event` object.

use fos_dom::{Event, EventDetail, MouseButton};

use crate::JsValue;

/// Build the script-visible view of an event
pub fn event_to_value(event: &Event) -> JsValue {
    let modifiers = event.modifiers();
    let mut props: Vec<(&str, JsValue)> = vec![
        ("type", JsValue::from(event.event_type.as_str())),
        ("bubbles", JsValue::Bool(event.bubbles)),
        ("cancelable", JsValue::Bool(event.cancelable)),
        ("defaultPrevented", JsValue::Bool(event.is_default_prevented())),
        ("timeStamp", JsValue::Number(event.timestamp)),
        ("ctrlKey", JsValue::Bool(modifiers.ctrl)),
        ("shiftKey", JsValue::Bool(modifiers.shift)),
        ("altKey", JsValue::Bool(modifiers.alt)),
        ("metaKey", JsValue::Bool(modifiers.meta)),
    ];

    match &event.detail {
        EventDetail::Keyboard(init) => {
            props.push(("key", JsValue::from(init.key.as_str())));
            props.push(("code", JsValue::from(init.code.as_str())));
            props.push(("repeat", JsValue::Bool(init.repeat)));
        }
        EventDetail::Mouse(init) => {
            let button = match init.button {
                MouseButton::Primary => 0,
                MouseButton::Auxiliary => 1,
                MouseButton::Secondary => 2,
            };
            props.push(("clientX", JsValue::Number(init.client_x)));
            props.push(("clientY", JsValue::Number(init.client_y)));
            props.push(("button", JsValue::from(button)));
        }
        EventDetail::Input { value } => {
            props.push(("value", JsValue::from(value.as_str())));
        }
        EventDetail::Custom(detail) => {
            let detail = detail.as_deref().map_or(JsValue::Null, JsValue::from);
            props.push(("detail", detail));
        }
        EventDetail::None => {}
    }

    JsValue::object_from(props)
}
