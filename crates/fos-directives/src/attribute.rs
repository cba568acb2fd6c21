//! Directive attribute syntax
//!
//! `x-on:click.prevent`, `on:keydown.enter` and `@click` all name an event
//! directive. The event name runs up to the first `.`; it may itself contain
//! `:` or `-` (`x-on:my:event.document`).

use crate::modifiers::{Modifier, ModifierSet, parse_modifiers, parse_modifiers_strict};
use crate::{DirectiveConfig, DirectiveError};

/// Parsed event directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Attribute name as written
    pub attribute: String,
    pub event_name: String,
    pub modifiers: Vec<Modifier>,
    pub expression: String,
}

impl Directive {
    /// Parse an attribute name / value pair
    pub fn parse(attribute: &str, expression: &str, config: &DirectiveConfig) -> Result<Self, DirectiveError> {
        let rest = strip_directive_prefix(attribute, config)
            .ok_or_else(|| DirectiveError::NotADirective(attribute.to_string()))?;

        let (event_name, raw_modifiers) = split_event_name(rest);
        if event_name.is_empty() {
            return Err(DirectiveError::EmptyEventName(attribute.to_string()));
        }

        let modifiers = if config.strict_modifiers {
            parse_modifiers_strict(raw_modifiers, attribute)?
        } else {
            parse_modifiers(raw_modifiers)
        };

        Ok(Self {
            attribute: attribute.to_string(),
            event_name: event_name.to_string(),
            modifiers,
            expression: expression.to_string(),
        })
    }

    /// Order-free summary of the modifiers
    pub fn modifier_set(&self) -> ModifierSet {
        ModifierSet::from_modifiers(&self.modifiers)
    }

    pub fn has_modifier(&self, modifier: &Modifier) -> bool {
        self.modifiers.contains(modifier)
    }
}

/// Remainder after the directive prefix (`click.prevent` for `@click.prevent`)
pub fn strip_directive_prefix<'a>(attribute: &'a str, config: &DirectiveConfig) -> Option<&'a str> {
    config
        .prefixes
        .iter()
        .map(String::as_str)
        .chain((!config.shorthand.is_empty()).then_some(config.shorthand.as_str()))
        .find_map(|prefix| attribute.strip_prefix(prefix))
}

/// Split `event.mod1.mod2` at the first dot
pub fn split_event_name(rest: &str) -> (&str, &str) {
    rest.split_once('.').unwrap_or((rest, ""))
}

pub fn is_directive_attribute(attribute: &str, config: &DirectiveConfig) -> bool {
    strip_directive_prefix(attribute, config).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(attr: &str) -> Result<Directive, DirectiveError> {
        Directive::parse(attr, "foo = 'baz'", &DirectiveConfig::default())
    }

    #[test]
    fn test_prefix_forms() {
        for attr in ["x-on:click", "on:click", "@click"] {
            let directive = parse(attr).unwrap();
            assert_eq!(directive.event_name, "click");
            assert!(directive.modifiers.is_empty());
        }
    }

    #[test]
    fn test_namespaced_event_name() {
        let directive = parse("x-on:my:event.document").unwrap();
        assert_eq!(directive.event_name, "my:event");
        assert_eq!(directive.modifiers, vec![Modifier::Document]);
    }

    #[test]
    fn test_modifiers_split_after_event() {
        let directive = parse("x-on:input.debounce.100ms").unwrap();
        assert_eq!(directive.event_name, "input");
        assert_eq!(directive.modifiers, vec![Modifier::Debounce(Some(Duration::from_millis(100)))]);
    }

    #[test]
    fn test_rejects_non_directives() {
        assert_eq!(parse("class"), Err(DirectiveError::NotADirective("class".to_string())));
        assert_eq!(parse("x-bind:class"), Err(DirectiveError::NotADirective("x-bind:class".to_string())));
        assert_eq!(parse("@.once"), Err(DirectiveError::EmptyEventName("@.once".to_string())));
        assert!(!is_directive_attribute("x-data", &DirectiveConfig::default()));
    }

    #[test]
    fn test_custom_prefixes() {
        let config = DirectiveConfig {
            prefixes: vec!["data-on-".to_string()],
            shorthand: String::new(),
            ..DirectiveConfig::default()
        };
        let directive = Directive::parse("data-on-click.once", "", &config).unwrap();
        assert_eq!(directive.event_name, "click");
        assert!(directive.has_modifier(&Modifier::Once));
        assert!(!is_directive_attribute("@click", &config));
    }

    #[test]
    fn test_strict_config() {
        let config = DirectiveConfig { strict_modifiers: true, ..DirectiveConfig::default() };
        assert!(matches!(
            Directive::parse("@click.prevnet", "", &config),
            Err(DirectiveError::UnknownModifier { .. })
        ));
    }
}
