//! Key name matching
//!
//! Directive key names are kebab-case (`enter`, `arrow-up`, `page-down`).
//! Keyboard events report `KeyboardEvent.key` values (`"Enter"`,
//! `"ArrowUp"`, `" "`). Modifier-key names (`ctrl`, `shift`, `alt`,
//! `meta`/`cmd`) check the event's modifier flags instead of its key.

use fos_dom::{Event, KeyModifiers};

/// A modifier key checked through the event's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl ModifierKey {
    /// Parse a directive modifier-key name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(ModifierKey::Ctrl),
            "shift" => Some(ModifierKey::Shift),
            "alt" | "option" => Some(ModifierKey::Alt),
            "meta" | "cmd" | "command" | "super" => Some(ModifierKey::Meta),
            _ => None,
        }
    }

    pub fn is_held(self, modifiers: KeyModifiers) -> bool {
        match self {
            ModifierKey::Ctrl => modifiers.ctrl,
            ModifierKey::Shift => modifiers.shift,
            ModifierKey::Alt => modifiers.alt,
            ModifierKey::Meta => modifiers.meta,
        }
    }
}

/// Canonical key name → `KeyboardEvent.key` values it accepts
const KEY_ALIASES: &[(&str, &[&str])] = &[
    // Older browsers report the space bar as "Spacebar".
    ("space", &[" ", "Spacebar"]),
    ("enter", &["Enter"]),
    ("escape", &["Escape", "Esc"]),
    ("tab", &["Tab"]),
    ("backspace", &["Backspace"]),
    ("delete", &["Delete", "Del"]),
    ("arrow-up", &["ArrowUp", "Up"]),
    ("arrow-down", &["ArrowDown", "Down"]),
    ("arrow-left", &["ArrowLeft", "Left"]),
    ("arrow-right", &["ArrowRight", "Right"]),
    ("page-up", &["PageUp"]),
    ("page-down", &["PageDown"]),
    ("home", &["Home"]),
    ("end", &["End"]),
    ("period", &["."]),
    ("comma", &[","]),
    ("slash", &["/"]),
    ("equal", &["="]),
    ("minus", &["-"]),
];

/// Alternate spellings of canonical names
const NAME_ALIASES: &[(&str, &str)] = &[
    ("esc", "escape"),
    ("return", "enter"),
    ("spacebar", "space"),
    ("del", "delete"),
    ("up", "arrow-up"),
    ("down", "arrow-down"),
    ("left", "arrow-left"),
    ("right", "arrow-right"),
];

/// Named keys accepted in strict mode beyond the alias table
const OTHER_NAMED_KEYS: &[&str] = &[
    "caps-lock", "insert", "context-menu", "num-lock", "scroll-lock", "pause",
    "print-screen", "dead", "unidentified",
];

fn canonical_name(name: &str) -> &str {
    NAME_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |(_, canonical)| *canonical)
}

/// `KeyboardEvent.key` values a directive key name accepts directly
pub fn key_aliases(name: &str) -> &'static [&'static str] {
    let lower = name.to_ascii_lowercase();
    let canonical = canonical_name(&lower);
    KEY_ALIASES
        .iter()
        .find(|(key, _)| *key == canonical)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// `PageDown` → `page-down`
fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    let mut prev_lower = false;
    for c in key.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('-');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        if c == '_' {
            out.push('-');
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Whether an event key satisfies one declared (non-modifier) key name
pub fn key_matches(declared: &str, event_key: &str) -> bool {
    let declared = declared.to_ascii_lowercase();
    if key_aliases(&declared).iter().any(|alias| *alias == event_key) {
        return true;
    }
    let canonical = canonical_name(&declared);
    kebab_case(event_key) == canonical || event_key.eq_ignore_ascii_case(&declared)
}

/// Whether strict mode accepts `name` as a key
pub(crate) fn is_known_key_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if ModifierKey::from_name(&lower).is_some() || !key_aliases(&lower).is_empty() {
        return true;
    }
    if lower.chars().count() == 1 || OTHER_NAMED_KEYS.iter().any(|k| *k == lower) {
        return true;
    }
    // Function keys f1..f24
    lower
        .strip_prefix('f')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| (1..=24).contains(&n))
}

/// Declared key names of one binding, split into keys and modifier keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    keys: Vec<String>,
    modifiers: Vec<ModifierKey>,
}

impl KeyFilter {
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut filter = Self::default();
        for name in names {
            match ModifierKey::from_name(name) {
                Some(modifier) => {
                    if !filter.modifiers.contains(&modifier) {
                        filter.modifiers.push(modifier);
                    }
                }
                None => filter.keys.push(name.to_ascii_lowercase()),
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.modifiers.is_empty()
    }

    /// Declared non-modifier keys
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn modifiers(&self) -> &[ModifierKey] {
        &self.modifiers
    }

    /// Every declared modifier key must be held; if any other keys are
    /// declared, a keyboard event's key must match one of them. Events
    /// without a key (clicks) are only checked for modifier keys.
    pub fn matches(&self, event: &Event) -> bool {
        let held = event.modifiers();
        if !self.modifiers.iter().all(|m| m.is_held(held)) {
            return false;
        }
        if self.keys.is_empty() {
            return true;
        }
        match event.key() {
            Some(key) => self.keys.iter().any(|declared| key_matches(declared, key)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::{KeyboardEventInit, MouseEventInit};

    fn key(k: &str) -> Event {
        Event::key_down(KeyboardEventInit::key(k))
    }

    fn key_with(k: &str, modifiers: KeyModifiers) -> Event {
        Event::key_down(KeyboardEventInit::key(k).with_modifiers(modifiers))
    }

    #[test]
    fn test_enter_not_escape() {
        let filter = KeyFilter::from_names(["enter"]);
        assert!(filter.matches(&key("Enter")));
        assert!(!filter.matches(&key("Escape")));
    }

    #[test]
    fn test_space_aliases() {
        let filter = KeyFilter::from_names(["space"]);
        assert!(filter.matches(&key(" ")));
        assert!(filter.matches(&key("Spacebar")));
        assert!(!filter.matches(&key("Enter")));
    }

    #[test]
    fn test_cmd_enter_combo() {
        let filter = KeyFilter::from_names(["cmd", "enter"]);
        assert!(!filter.matches(&key("Enter")));
        assert!(!filter.matches(&key_with("Escape", KeyModifiers::meta())));
        assert!(filter.matches(&key_with("Enter", KeyModifiers::meta())));
        assert_eq!(filter.modifiers(), &[ModifierKey::Meta]);
    }

    #[test]
    fn test_kebab_and_case_fallback() {
        assert!(key_matches("page-down", "PageDown"));
        assert!(key_matches("a", "A"));
        assert!(key_matches("arrow-up", "ArrowUp"));
        assert!(key_matches("up", "Up"));
        assert!(key_matches("esc", "Escape"));
        assert!(!key_matches("a", "b"));
    }

    #[test]
    fn test_mouse_event_checks_modifiers_only() {
        let filter = KeyFilter::from_names(["shift", "a"]);
        let plain = Event::click();
        let shifted = Event::mouse(
            "click",
            MouseEventInit { modifiers: KeyModifiers::shift(), ..MouseEventInit::default() },
        );
        assert!(!filter.matches(&plain));
        assert!(filter.matches(&shifted));
    }

    #[test]
    fn test_extra_modifiers_do_not_block() {
        let filter = KeyFilter::from_names(["enter"]);
        assert!(filter.matches(&key_with("Enter", KeyModifiers::ctrl())));
    }

    #[test]
    fn test_known_key_names() {
        for name in ["enter", "cmd", "a", "7", "f12", "caps-lock", "esc"] {
            assert!(is_known_key_name(name), "{name}");
        }
        for name in ["prevnet", "f30", "wobble"] {
            assert!(!is_known_key_name(name), "{name}");
        }
    }
}
