//! Directive Configuration

use std::time::Duration;

use serde::Deserialize;

/// What to do when a directive asks for both `.window` and `.document`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetConflict {
    /// Listen on the window
    #[default]
    PreferWindow,
    /// Refuse to bind
    Reject,
}

/// Directive engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    /// Long attribute prefixes, tried in order
    pub prefixes: Vec<String>,

    /// Short attribute prefix (`@click`)
    pub shorthand: String,

    /// Debounce wait when `.debounce` has no duration (milliseconds)
    pub default_debounce_ms: u64,

    /// `.window` + `.document` resolution
    pub target_conflict: TargetConflict,

    /// Reject unknown modifier tokens instead of reading them as key names
    pub strict_modifiers: bool,

    /// Register scroll/wheel/touch listeners passive unless `.prevent` is used
    pub passive_high_frequency: bool,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["x-on:".to_string(), "on:".to_string()],
            shorthand: "@".to_string(),
            default_debounce_ms: 250,
            target_conflict: TargetConflict::PreferWindow,
            strict_modifiers: false,
            passive_high_frequency: true,
        }
    }
}

impl DirectiveConfig {
    pub fn default_debounce(&self) -> Duration {
        Duration::from_millis(self.default_debounce_ms)
    }
}
