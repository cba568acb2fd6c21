//! fOS JavaScript Runtime
//!
//! The script side of directive bindings: a small JavaScript-subset
//! expression interpreter, reactive scopes expressions read and write, a
//! virtual-clock timer queue, and `$event` bindings for DOM events.
//!
//! Features:
//! - Expressions: assignment (`=`, `+=`, `-=`), `++`/`--`, ternary, logical,
//!   comparison and arithmetic operators, member access, object literals
//! - Reactive scope with change subscriptions
//! - Timers (setTimeout/clearTimeout) on a deterministic clock

mod value;
mod scope;
mod timers;
mod event_bindings;
pub mod engine;

pub use value::JsValue;
pub use scope::{Scope, ScopeChange, SubscriptionId};
pub use timers::{TimerId, TimerManager};
pub use event_bindings::event_to_value;
pub use engine::{Interpreter, Locals};

/// Evaluate a single expression against a scope
pub fn eval(code: &str, scope: &Scope) -> Result<JsValue, JsError> {
    Interpreter::new().evaluate(code, scope, &Locals::new())
}

/// JavaScript error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JsError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("JavaScript error: {0}")]
    Runtime(String),
}
