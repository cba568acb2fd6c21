//! JavaScript values
//!
//! Plain data only: expressions bound to DOM events read and write scope
//! properties, they never create functions.

use std::collections::BTreeMap;
use std::fmt;

/// JavaScript value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(BTreeMap<String, JsValue>),
}

impl JsValue {
    /// Empty object
    pub fn object() -> Self {
        JsValue::Object(BTreeMap::new())
    }

    /// Object from key/value pairs
    pub fn object_from<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsValue)>,
    {
        JsValue::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, JsValue>> {
        match self {
            JsValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, JsValue>> {
        match self {
            JsValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Own property lookup; `undefined` for missing keys and non-objects
    pub fn get(&self, key: &str) -> JsValue {
        match self {
            JsValue::Object(map) => map.get(key).cloned().unwrap_or_default(),
            JsValue::String(s) if key == "length" => JsValue::Number(s.chars().count() as f64),
            _ => JsValue::Undefined,
        }
    }

    /// ToBoolean
    pub fn truthy(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Bool(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Object(_) => true,
        }
    }

    /// ToNumber
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined | JsValue::Object(_) => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Bool(b) => {
                if *b { 1.0 } else { 0.0 }
            }
            JsValue::Number(n) => *n,
            JsValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// ToString
    pub fn to_js_string(&self) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Bool(b) => b.to_string(),
            JsValue::Number(n) => format_number(*n),
            JsValue::String(s) => s.clone(),
            JsValue::Object(_) => "[object Object]".to_string(),
        }
    }

    /// `typeof`
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null | JsValue::Object(_) => "object",
            JsValue::Bool(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            // Objects are copied by value here, so there is no identity to compare.
            (JsValue::Object(_), JsValue::Object(_)) => false,
            _ => self == other,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (JsValue::Object(_), _) | (_, JsValue::Object(_)) => false,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => a.strict_equals(b),
            (a, b) => a.to_number() == b.to_number(),
        }
    }
}

/// Number::toString for the cases expressions produce
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::String(s) => write!(f, "'{}'", s),
            JsValue::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", key, value)?;
                }
                if map.is_empty() { write!(f, "}}") } else { write!(f, " }}") }
            }
            other => f.write_str(&other.to_js_string()),
        }
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Bool(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(s.to_string())
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(JsValue::Number(2.0).to_js_string(), "2");
        assert_eq!(JsValue::Number(-0.5).to_js_string(), "-0.5");
        assert_eq!(JsValue::Number(f64::NAN).to_js_string(), "NaN");
    }

    #[test]
    fn test_truthiness() {
        assert!(!JsValue::from("").truthy());
        assert!(JsValue::from("0").truthy());
        assert!(!JsValue::Number(0.0).truthy());
        assert!(JsValue::object().truthy());
        assert!(!JsValue::Null.truthy());
    }

    #[test]
    fn test_equality() {
        assert!(JsValue::from("1").loose_equals(&JsValue::Number(1.0)));
        assert!(!JsValue::from("1").strict_equals(&JsValue::Number(1.0)));
        assert!(JsValue::Null.loose_equals(&JsValue::Undefined));
        assert!(!JsValue::Null.strict_equals(&JsValue::Undefined));
        assert!(!JsValue::Number(f64::NAN).strict_equals(&JsValue::Number(f64::NAN)));
    }

    #[test]
    fn test_display() {
        let value = JsValue::object_from([("foo", JsValue::from("bar")), ("n", JsValue::from(1))]);
        assert_eq!(value.to_string(), "{ foo: 'bar', n: 1 }");
    }
}
