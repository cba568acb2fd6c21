//! fOS Directives - declarative event bindings
//!
//! Binds `on:<event>[.modifier]*="<expression>"` attributes (also `x-on:`
//! and the `@` short form) to DOM listeners. A directive is parsed into an
//! event name and a modifier list, turned into a listener plan (attach
//! target, native options, ordered guards), and registered on the DOM.
//! When the event fires, the guards run in a fixed order and the expression
//! is evaluated against the element's reactive scope.
//!
//! ```text
//! attribute ─► Directive::parse ─► ListenerPlan::build ─► DirectiveRuntime::bind
//!                                                            │
//!   native event ─► key ─► stop ─► prevent ─► outside ─► debounce ─► once ─► effect
//! ```

mod attribute;
mod builder;
mod config;
mod debounce;
mod effect;
mod error;
mod keys;
mod modifiers;
mod outside;
mod runtime;

pub use attribute::{Directive, is_directive_attribute, split_event_name, strip_directive_prefix};
pub use builder::{AttachTarget, Guard, ListenerPlan};
pub use config::{DirectiveConfig, TargetConflict};
pub use debounce::Debouncer;
pub use effect::{EffectFailure, ExpressionEvaluator, ScriptEvaluator};
pub use error::DirectiveError;
pub use keys::{KeyFilter, ModifierKey, key_aliases};
pub use modifiers::{Modifier, ModifierSet, parse_modifiers, parse_modifiers_strict};
pub use outside::OutsideClickTracker;
pub use runtime::{DirectiveRuntime, DirectiveRuntimeBuilder, ErrorHook};

/// Identifier of one bound directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u64);

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "binding#{}", self.0)
    }
}
