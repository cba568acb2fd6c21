//! Effect evaluation
//!
//! An effect is the directive expression run against the element's scope.
//! Evaluation goes through `ExpressionEvaluator` so hosts can plug in their
//! own engine; `ScriptEvaluator` is the built-in one.

use fos_dom::{Event, NodeId};
use fos_js::{Interpreter, JsError, JsValue, Locals, Scope, event_to_value};

use crate::BindingId;

/// Evaluates directive expressions
pub trait ExpressionEvaluator {
    /// Run `expression` against `scope` for `event`
    fn evaluate(&self, expression: &str, scope: &Scope, event: &Event) -> Result<JsValue, JsError>;
}

/// `fos-js` interpreter with `$event` in scope
#[derive(Debug, Default)]
pub struct ScriptEvaluator {
    interpreter: Interpreter,
}

impl ScriptEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExpressionEvaluator for ScriptEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope, event: &Event) -> Result<JsValue, JsError> {
        if expression.trim().is_empty() {
            return Ok(JsValue::Undefined);
        }
        let locals = Locals::new().with("$event", event_to_value(event));
        self.interpreter.evaluate(expression, scope, &locals)
    }
}

/// A directive expression that failed while handling an event
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{binding} ({event} on {element:?}) failed to evaluate `{expression}`: {error}")]
pub struct EffectFailure {
    pub binding: BindingId,
    pub element: NodeId,
    pub event: String,
    pub expression: String,
    #[source]
    pub error: JsError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::KeyboardEventInit;

    #[test]
    fn test_event_is_visible() {
        let scope = Scope::from_pairs([("last", JsValue::Null)]);
        let evaluator = ScriptEvaluator::new();
        let event = Event::key_down(KeyboardEventInit::key("a"));

        evaluator.evaluate("last = $event.key", &scope, &event).unwrap();
        assert_eq!(scope.get("last"), JsValue::from("a"));
    }

    #[test]
    fn test_empty_expression() {
        let evaluator = ScriptEvaluator::new();
        assert_eq!(
            evaluator.evaluate("  ", &Scope::new(), &Event::click()),
            Ok(JsValue::Undefined)
        );
    }

    #[test]
    fn test_failure_message() {
        let failure = EffectFailure {
            binding: BindingId(3),
            element: NodeId::ROOT,
            event: "click".to_string(),
            expression: "nope()".to_string(),
            error: JsError::Syntax("Unexpected token".to_string()),
        };
        let message = failure.to_string();
        assert!(message.starts_with("binding#3 (click on"));
        assert!(message.contains("`nope()`"));
    }
}
