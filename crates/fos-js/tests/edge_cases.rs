//! Edge case tests for fos-js
//!
//! Expression evaluation against reactive scopes, `$event` access and the
//! virtual timer queue.

use fos_dom::{Event, KeyboardEventInit};
use fos_js::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

// ============================================================================
// EVALUATION EDGE CASES
// ============================================================================

#[test]
fn test_empty_code() {
    let scope = Scope::new();
    assert_eq!(eval("", &scope), Ok(JsValue::Undefined));
    assert_eq!(eval("   \n\t  ", &scope), Ok(JsValue::Undefined));
}

#[test]
fn test_comment_only() {
    let scope = Scope::new();
    assert!(eval("// just a comment", &scope).is_ok());
    assert!(eval("/* block comment */", &scope).is_ok());
}

#[test]
fn test_multiple_statements() {
    let scope = Scope::from_pairs([("a", JsValue::from(1)), ("b", JsValue::from(2))]);
    let result = eval("a = a + b; b = 10; a + b", &scope).unwrap();
    assert_eq!(result, JsValue::Number(13.0));
}

#[test]
fn test_object_literal_assignment() {
    let scope = Scope::new();
    eval("state = { open: true, label: 'menu' }", &scope).unwrap();
    assert_eq!(scope.get_path("state.open"), JsValue::Bool(true));
    assert_eq!(scope.get_path("state.label"), JsValue::from("menu"));
}

#[test]
fn test_toggle_expression() {
    let scope = Scope::from_pairs([("isOpen", JsValue::Bool(false))]);
    eval("isOpen = !isOpen", &scope).unwrap();
    assert_eq!(scope.get("isOpen"), JsValue::Bool(true));
}

#[test]
fn test_string_escapes() {
    let scope = Scope::new();
    assert_eq!(eval(r#"'it\'s'"#, &scope).unwrap(), JsValue::from("it's"));
    assert_eq!(eval(r#""a\nb""#, &scope).unwrap(), JsValue::from("a\nb"));
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[test]
fn test_syntax_errors() {
    let scope = Scope::new();
    for source in ["foo =", "(a", "{ a: }", "a +* b", "'open"] {
        assert!(
            matches!(eval(source, &scope), Err(JsError::Syntax(_))),
            "expected syntax error for {source:?}"
        );
    }
}

#[test]
fn test_reference_error_leaves_scope_untouched() {
    let scope = Scope::from_pairs([("foo", JsValue::from("bar"))]);
    assert_eq!(
        eval("foo = missing", &scope),
        Err(JsError::Reference("missing".to_string()))
    );
    assert_eq!(scope.get("foo"), JsValue::from("bar"));
    assert_eq!(scope.version(), 0);
}

#[test]
fn test_error_display() {
    let err = JsError::Reference("nope".to_string());
    assert_eq!(err.to_string(), "ReferenceError: nope is not defined");
}

// ============================================================================
// $event
// ============================================================================

#[test]
fn test_event_local() {
    let scope = Scope::from_pairs([("lastKey", JsValue::Null)]);
    let event = Event::key_down(KeyboardEventInit::key("Escape"));
    let locals = Locals::new().with("$event", event_to_value(&event));

    Interpreter::new()
        .evaluate("lastKey = $event.key; kind = $event.type", &scope, &locals)
        .unwrap();

    assert_eq!(scope.get("lastKey"), JsValue::from("Escape"));
    assert_eq!(scope.get("kind"), JsValue::from("keydown"));
}

// ============================================================================
// REACTIVITY
// ============================================================================

#[test]
fn test_subscribers_see_each_write() {
    let scope = Scope::from_pairs([("count", JsValue::from(0))]);
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = Rc::clone(&log);
    scope.subscribe(move |change| l.borrow_mut().push((change.path.clone(), change.new.clone())));

    eval("count++; count++", &scope).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            ("count".to_string(), JsValue::Number(1.0)),
            ("count".to_string(), JsValue::Number(2.0)),
        ]
    );
}

// ============================================================================
// TIMERS
// ============================================================================

#[test]
fn test_timer_drives_scope_write() {
    let scope = Scope::from_pairs([("ticks", JsValue::from(0))]);
    let timers = TimerManager::new();
    let interpreter = Rc::new(Interpreter::new());

    for delay in [50, 100, 150] {
        let scope = scope.clone();
        let interpreter = Rc::clone(&interpreter);
        timers.set_timeout(Duration::from_millis(delay), move || {
            let _ = interpreter.evaluate("ticks++", &scope, &Locals::new());
        });
    }

    timers.advance(Duration::from_millis(100));
    assert_eq!(scope.get("ticks"), JsValue::Number(2.0));
    timers.advance(Duration::from_millis(100));
    assert_eq!(scope.get("ticks"), JsValue::Number(3.0));
    assert!(!timers.has_pending());
}
