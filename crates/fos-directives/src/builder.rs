//! Listener planning
//!
//! Turns a parsed directive into everything needed to register it: where to
//! listen, with which native options, and the guards to run before the
//! expression. Guard order is fixed here, independent of modifier order.

use std::time::Duration;

use fos_dom::{EventTarget, ListenerOptions, NodeId};

use crate::keys::KeyFilter;
use crate::{Directive, DirectiveConfig, DirectiveError, TargetConflict};

/// Events fired often enough that blocking on listeners hurts scrolling
const HIGH_FREQUENCY_EVENTS: &[&str] = &["scroll", "wheel", "touchstart", "touchmove", "mousemove"];

/// Where the native listener goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachTarget {
    Element,
    Window,
    Document,
}

impl AttachTarget {
    pub fn resolve(self, element: NodeId) -> EventTarget {
        match self {
            AttachTarget::Element => EventTarget::Node(element),
            AttachTarget::Window => EventTarget::Window,
            AttachTarget::Document => EventTarget::Document,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttachTarget::Element => "element",
            AttachTarget::Window => "window",
            AttachTarget::Document => "document",
        }
    }
}

/// A pipeline step run before the expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Suppress unless the key filter matches
    KeyMatch(KeyFilter),
    StopPropagation,
    PreventDefault,
    /// Suppress unless the event started outside the element
    Outside,
    /// Defer to the trailing edge of a burst
    Debounce(Duration),
    /// Suppress after the first invocation
    Once,
}

/// Registration plan for one directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerPlan {
    pub event_name: String,
    pub target: AttachTarget,
    pub options: ListenerOptions,
    pub guards: Vec<Guard>,
}

impl ListenerPlan {
    pub fn build(directive: &Directive, config: &DirectiveConfig) -> Result<Self, DirectiveError> {
        let set = directive.modifier_set();

        let target = if set.outside {
            // Outside detection listens for every click in the document.
            AttachTarget::Document
        } else if set.window && set.document {
            match config.target_conflict {
                TargetConflict::PreferWindow => {
                    tracing::debug!("{}: .window and .document both set, using window", directive.attribute);
                    AttachTarget::Window
                }
                TargetConflict::Reject => {
                    return Err(DirectiveError::ConflictingTargets(directive.attribute.clone()));
                }
            }
        } else if set.window {
            AttachTarget::Window
        } else if set.document {
            AttachTarget::Document
        } else {
            AttachTarget::Element
        };

        let passive = config.passive_high_frequency
            && !set.prevent
            && HIGH_FREQUENCY_EVENTS.contains(&directive.event_name.as_str());
        let options = ListenerOptions { capture: false, passive, once: false };

        let mut guards = Vec::new();
        let filter = KeyFilter::from_names(set.keys.iter().map(String::as_str));
        if !filter.is_empty() {
            guards.push(Guard::KeyMatch(filter));
        }
        if set.stop && set.outside {
            // The tracker listens in the document capture phase, before the
            // click reaches its own target; stopping there would starve
            // unrelated bindings.
            tracing::debug!("{}: .stop has no effect on outside bindings", directive.attribute);
        } else if set.stop {
            guards.push(Guard::StopPropagation);
        }
        if set.prevent {
            guards.push(Guard::PreventDefault);
        }
        if set.outside {
            guards.push(Guard::Outside);
        }
        if let Some(wait) = set.debounce_wait(config.default_debounce()) {
            guards.push(Guard::Debounce(wait));
        }
        if set.once {
            guards.push(Guard::Once);
        }

        Ok(Self {
            event_name: directive.event_name.clone(),
            target,
            options,
            guards,
        })
    }

    pub fn has_guard(&self, guard: &Guard) -> bool {
        self.guards.contains(guard)
    }

    pub fn is_outside(&self) -> bool {
        self.guards.contains(&Guard::Outside)
    }

    pub fn is_once(&self) -> bool {
        self.guards.contains(&Guard::Once)
    }

    pub fn debounce_wait(&self) -> Option<Duration> {
        self.guards.iter().find_map(|guard| match guard {
            Guard::Debounce(wait) => Some(*wait),
            _ => None,
        })
    }

    pub fn key_filter(&self) -> Option<&KeyFilter> {
        self.guards.iter().find_map(|guard| match guard {
            Guard::KeyMatch(filter) => Some(filter),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(attr: &str) -> ListenerPlan {
        plan_with(attr, &DirectiveConfig::default()).unwrap()
    }

    fn plan_with(attr: &str, config: &DirectiveConfig) -> Result<ListenerPlan, DirectiveError> {
        let directive = Directive::parse(attr, "", config)?;
        ListenerPlan::build(&directive, config)
    }

    #[test]
    fn test_default_target_is_element() {
        let plan = plan("@click");
        assert_eq!(plan.target, AttachTarget::Element);
        assert_eq!(plan.options, ListenerOptions::default());
        assert!(plan.guards.is_empty());
    }

    #[test]
    fn test_guard_order_is_fixed() {
        let plan = plan("@keydown.once.debounce.prevent.enter.stop");
        let kinds: Vec<&str> = plan
            .guards
            .iter()
            .map(|g| match g {
                Guard::KeyMatch(_) => "key",
                Guard::StopPropagation => "stop",
                Guard::PreventDefault => "prevent",
                Guard::Outside => "outside",
                Guard::Debounce(_) => "debounce",
                Guard::Once => "once",
            })
            .collect();
        assert_eq!(kinds, vec!["key", "stop", "prevent", "debounce", "once"]);
        assert_eq!(plan.debounce_wait(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_order_independence() {
        let tokens = ["window", "once", "stop", "enter", "debounce"];
        let reference = plan(&format!("@keydown.{}", tokens.join(".")));

        // Every rotation of the chain (debounce keeps no duration token).
        for shift in 1..tokens.len() {
            let mut rotated = tokens.to_vec();
            rotated.rotate_left(shift);
            let other = plan(&format!("@keydown.{}", rotated.join(".")));
            assert_eq!(other.target, reference.target);
            assert_eq!(other.options, reference.options);
            assert_eq!(other.guards, reference.guards);
        }
    }

    #[test]
    fn test_window_document_conflict() {
        assert_eq!(plan("@click.document.window").target, AttachTarget::Window);

        let config = DirectiveConfig { target_conflict: TargetConflict::Reject, ..DirectiveConfig::default() };
        assert_eq!(
            plan_with("@click.window.document", &config),
            Err(DirectiveError::ConflictingTargets("@click.window.document".to_string()))
        );
        assert_eq!(plan_with("@click.window", &config).unwrap().target, AttachTarget::Window);
    }

    #[test]
    fn test_outside_listens_on_document() {
        let plan = plan("@click.away");
        assert_eq!(plan.target, AttachTarget::Document);
        assert!(plan.is_outside());
    }

    #[test]
    fn test_outside_drops_stop() {
        let plan = plan("@click.outside.stop.prevent");
        assert!(!plan.has_guard(&Guard::StopPropagation));
        assert!(plan.has_guard(&Guard::PreventDefault));
        assert!(plan.has_guard(&Guard::Outside));
    }

    #[test]
    fn test_passive_for_high_frequency_events() {
        assert!(plan("@scroll").options.passive);
        assert!(!plan("@scroll.prevent").options.passive);
        assert!(!plan("@click").options.passive);

        let config = DirectiveConfig { passive_high_frequency: false, ..DirectiveConfig::default() };
        assert!(!plan_with("@wheel", &config).unwrap().options.passive);
    }

    #[test]
    fn test_resolve_targets() {
        let element = NodeId::ROOT;
        assert_eq!(AttachTarget::Element.resolve(element), EventTarget::Node(element));
        assert_eq!(AttachTarget::Window.resolve(element), EventTarget::Window);
        assert_eq!(AttachTarget::Document.name(), "document");
    }
}
