//! Modifier chain parsing
//!
//! `keydown.cmd.enter.debounce.100ms.stop` → `[Key(cmd), Key(enter),
//! Debounce(100ms), Stop]`. Parsing keeps source order; everything that
//! acts on the binding (target, options, guard order) reads the summary in
//! `ModifierSet`, so reordering modifiers never changes behavior. The one
//! positional rule is that a duration must directly follow `debounce`.

use std::time::Duration;

use crate::DirectiveError;
use crate::keys::is_known_key_name;

/// One parsed modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Stop,
    Prevent,
    Window,
    Document,
    Outside,
    Once,
    Debounce(Option<Duration>),
    /// Key or modifier-key name, lowercased
    Key(String),
}

impl Modifier {
    fn control_word(token: &str) -> Option<Modifier> {
        Some(match token {
            "stop" => Modifier::Stop,
            "prevent" => Modifier::Prevent,
            "window" => Modifier::Window,
            "document" => Modifier::Document,
            "outside" | "away" => Modifier::Outside,
            "once" => Modifier::Once,
            "debounce" => Modifier::Debounce(None),
            _ => return None,
        })
    }
}

enum Token {
    Duration(Duration),
    BareNumber(u64),
    Word,
}

fn classify(token: &str) -> Token {
    let number = |digits: &str| -> Option<u64> {
        (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .then(|| digits.parse().ok())
            .flatten()
    };
    if let Some(ms) = token.strip_suffix("ms").and_then(number) {
        Token::Duration(Duration::from_millis(ms))
    } else if let Some(secs) = token.strip_suffix('s').and_then(number) {
        Token::Duration(Duration::from_secs(secs))
    } else if let Some(n) = number(token) {
        Token::BareNumber(n)
    } else {
        Token::Word
    }
}

/// Parse a modifier chain (the part after the event name, without the
/// leading dot)
///
/// Never fails: unknown tokens become key names.
pub fn parse_modifiers(raw: &str) -> Vec<Modifier> {
    parse(raw, None).unwrap_or_default()
}

/// Like `parse_modifiers`, but rejects tokens that are neither modifiers,
/// durations following `debounce`, nor known key names
pub fn parse_modifiers_strict(raw: &str, directive: &str) -> Result<Vec<Modifier>, DirectiveError> {
    parse(raw, Some(directive))
}

fn parse(raw: &str, strict: Option<&str>) -> Result<Vec<Modifier>, DirectiveError> {
    let mut out: Vec<Modifier> = Vec::new();

    for token in raw.split('.').filter(|t| !t.is_empty()) {
        let token = token.to_ascii_lowercase();
        if let Some(modifier) = Modifier::control_word(&token) {
            out.push(modifier);
            continue;
        }

        let duration = match classify(&token) {
            Token::Duration(d) => Some(d),
            Token::BareNumber(n) => Some(Duration::from_millis(n)),
            Token::Word => None,
        };
        if let (Some(duration), Some(Modifier::Debounce(wait @ None))) = (duration, out.last_mut()) {
            *wait = Some(duration);
            continue;
        }

        match classify(&token) {
            // A lone "100ms" has nothing to refine.
            Token::Duration(_) => {
                if let Some(directive) = strict {
                    return Err(unknown(directive, &token));
                }
                tracing::trace!("Dropping stray duration modifier '{}'", token);
            }
            // Digit keys: keydown.1
            Token::BareNumber(_) => out.push(Modifier::Key(token)),
            Token::Word => {
                if let Some(directive) = strict {
                    if !is_known_key_name(&token) {
                        return Err(unknown(directive, &token));
                    }
                }
                out.push(Modifier::Key(token));
            }
        }
    }

    Ok(out)
}

fn unknown(directive: &str, token: &str) -> DirectiveError {
    DirectiveError::UnknownModifier {
        directive: directive.to_string(),
        modifier: token.to_string(),
    }
}

/// Order-free summary of a modifier list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierSet {
    pub stop: bool,
    pub prevent: bool,
    pub window: bool,
    pub document: bool,
    pub outside: bool,
    pub once: bool,
    /// `Some(None)`: debounce with the default wait
    pub debounce: Option<Option<Duration>>,
    /// Key names in declaration order, without duplicates
    pub keys: Vec<String>,
}

impl ModifierSet {
    pub fn from_modifiers(modifiers: &[Modifier]) -> Self {
        let mut set = Self::default();
        for modifier in modifiers {
            match modifier {
                Modifier::Stop => set.stop = true,
                Modifier::Prevent => set.prevent = true,
                Modifier::Window => set.window = true,
                Modifier::Document => set.document = true,
                Modifier::Outside => set.outside = true,
                Modifier::Once => set.once = true,
                Modifier::Debounce(wait) => {
                    // The first explicit duration wins.
                    if !matches!(set.debounce, Some(Some(_))) {
                        set.debounce = Some(*wait);
                    }
                }
                Modifier::Key(name) => {
                    if !set.keys.contains(name) {
                        set.keys.push(name.clone());
                    }
                }
            }
        }
        set
    }

    /// Resolved debounce wait, if the binding is debounced
    pub fn debounce_wait(&self, default: Duration) -> Option<Duration> {
        self.debounce.map(|wait| wait.unwrap_or(default))
    }
}
