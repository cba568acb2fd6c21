//! Binding errors

use fos_dom::NodeId;

/// Failure to bind a directive
///
/// Evaluation failures are not binding errors: they surface as
/// `EffectFailure` through the runtime's error hooks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("Attribute '{0}' is not an event directive")]
    NotADirective(String),

    #[error("Directive '{0}' has no event name")]
    EmptyEventName(String),

    #[error("No {target} is available to listen on for '{event}'")]
    MissingTarget { target: &'static str, event: String },

    #[error("Directive '{0}' uses both .window and .document")]
    ConflictingTargets(String),

    #[error("Unknown modifier '{modifier}' in '{directive}'")]
    UnknownModifier { directive: String, modifier: String },

    #[error("Unknown element: {0:?}")]
    UnknownElement(NodeId),
}
