//! Dynamic values rendered by templates.
//!
//! A [`Value`] is what variables resolve to and what filters consume and produce. Host types that are not plain data
//! implement [`Object`].

use std::{cmp::Ordering, fmt, sync::Arc};

use indexmap::IndexMap;

use crate::safe_string::SafeString;

/// A host value that templates can read attributes from.
///
/// Implement this for application types that should be reachable through dotted lookups such as `user.name`.
pub trait Object: fmt::Debug + Send + Sync {
    /// Returns the named attribute, or `None` if the object has no such attribute.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Overrides the truthiness of the object. Objects are true by default.
    fn truthiness(&self) -> Option<bool> {
        None
    }

    /// Returns the object viewed as a sequence, for iteration by tags such as `for`.
    fn as_list(&self) -> Option<Vec<Value>> {
        None
    }

    /// Returns the text written when the object itself is output.
    fn to_text(&self) -> String {
        String::new()
    }
}

/// A dynamically typed template value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The result of a failed lookup. Renders as nothing and is never true.
    #[default]
    Invalid,

    /// A boolean.
    Bool(bool),

    /// An integer.
    Int(i64),

    /// A floating-point number.
    Float(f64),

    /// A string with its escaping state.
    String(SafeString),

    /// An ordered sequence.
    List(Vec<Value>),

    /// An insertion-ordered mapping.
    Map(IndexMap<String, Value>),

    /// A host object.
    Object(Arc<dyn Object>),
}

impl Value {
    /// Builds a mapping value from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds a sequence value.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Converts a JSON document into a template value.
    ///
    /// Integers that fit in `i64` stay integers; every other number becomes a float. `null` becomes
    /// [`Value::Invalid`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Invalid,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or_default(),
            },
            serde_json::Value::String(s) => Self::String(SafeString::new(s)),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect())
            }
        }
    }

    /// Returns `false` only for [`Value::Invalid`].
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Returns a short name for the dynamic type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Returns the truthiness of the value.
    ///
    /// Numbers are true only when strictly positive, so `-1` is false.
    pub fn is_true(&self) -> bool {
        match self {
            Self::Invalid => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i > 0,
            Self::Float(f) => *f > 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
            Self::Object(object) => object.truthiness().unwrap_or(true),
        }
    }

    /// Compares two values for template equality.
    ///
    /// Strings compare by text alone, ignoring escaping state. Everything else must match in dynamic type, so `5`
    /// does not equal `"5"` and `5` does not equal `5.0`. Objects are equal only to themselves.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Invalid, Self::Invalid) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a.as_str() == b.as_str(),
            (Self::List(a), Self::List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y)),
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| v.equals(other)))
            }
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Orders two values for the `<`, `<=`, `>` and `>=` comparisons.
    ///
    /// Numbers of either representation compare numerically and strings compare lexically. Any other pairing is
    /// unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.as_str().cmp(b.as_str())),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns `true` if `item` is a member of this value, as used by the `in` operator.
    ///
    /// Strings test for a substring, sequences for an equal element and mappings for a key.
    pub fn contains(&self, item: &Value) -> bool {
        match self {
            Self::String(haystack) => match item {
                Self::String(needle) => haystack.contains(needle.as_str()),
                _ => false,
            },
            Self::List(items) => items.iter().any(|candidate| candidate.equals(item)),
            Self::Map(entries) => match item {
                Self::String(key) => entries.contains_key(key.as_str()),
                _ => false,
            },
            Self::Object(object) => object
                .as_list()
                .is_some_and(|items| items.iter().any(|candidate| candidate.equals(item))),
            _ => false,
        }
    }

    /// Normalizes the value into a sequence.
    ///
    /// Invalid values give an empty sequence, mappings give their keys, sequences pass through and scalars become a
    /// one-element sequence.
    pub fn to_list(&self) -> Vec<Value> {
        match self {
            Self::Invalid => Vec::new(),
            Self::List(items) => items.clone(),
            Self::Map(entries) => entries.keys().map(|k| Value::from(k.as_str())).collect(),
            Self::Object(object) => object.as_list().unwrap_or_else(|| vec![self.clone()]),
            other => vec![other.clone()],
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_safe_string(&self) -> Option<&SafeString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_safe_string().map(SafeString::as_str)
    }

    /// Converts the value into the text that would be written for it.
    ///
    /// Strings keep their escaping state. Every other value produces an untrusted string.
    pub fn to_safe_string(&self) -> SafeString {
        match self {
            Self::String(s) => s.clone(),
            other => SafeString::new(other.to_text()),
        }
    }

    fn to_text(&self) -> String {
        match self {
            Self::Invalid => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.as_str().to_string(),
            Self::List(items) => list_to_text(items),
            Self::Map(entries) => {
                let parts = entries
                    .iter()
                    .map(|(k, v)| format!("'{}': {}", k, item_to_text(v)))
                    .collect::<Vec<_>>();
                format!("{{{}}}", parts.join(", "))
            }
            Self::Object(object) => object.to_text(),
        }
    }

    /// Resolves one segment of a dotted lookup against this value.
    ///
    /// Mappings try the key first and then the `size`/`count`, `items`, `keys` and `values` accessors. Sequences
    /// accept `size`/`count` and numeric indexes. Strings expose a handful of text accessors. Objects defer to
    /// [`Object::attribute`]. Anything that cannot be resolved is [`Value::Invalid`].
    pub fn lookup(&self, segment: &str) -> Value {
        match self {
            Self::Map(entries) => {
                if let Some(value) = entries.get(segment) {
                    return value.clone();
                }
                match segment {
                    "size" | "count" => Value::Int(entries.len() as i64),
                    "items" => Value::List(
                        entries
                            .iter()
                            .map(|(k, v)| Value::List(vec![Value::from(k.as_str()), v.clone()]))
                            .collect(),
                    ),
                    "keys" => Value::List(entries.keys().map(|k| Value::from(k.as_str())).collect()),
                    "values" => Value::List(entries.values().cloned().collect()),
                    _ => Value::Invalid,
                }
            }
            Self::List(items) => match segment {
                "size" | "count" => Value::Int(items.len() as i64),
                _ => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or_default(),
            },
            Self::String(s) => string_accessor(s.as_str(), segment),
            Self::Object(object) => object.attribute(segment).unwrap_or_default(),
            _ => Value::Invalid,
        }
    }
}

fn list_to_text(items: &[Value]) -> String {
    let parts = items.iter().map(item_to_text).collect::<Vec<_>>();
    format!("[{}]", parts.join(", "))
}

fn item_to_text(item: &Value) -> String {
    match item {
        Value::String(s) => format!("'{}'", s.as_str()),
        other => other.to_text(),
    }
}

fn python_bool(b: bool) -> Value {
    Value::from(if b { "True" } else { "False" })
}

fn string_accessor(s: &str, name: &str) -> Value {
    match name {
        "capitalize" => {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => Value::from(first.to_uppercase().chain(chars).collect::<String>()),
                None => Value::from(""),
            }
        }
        "lower" => Value::from(s.to_lowercase()),
        "upper" => Value::from(s.to_uppercase()),
        "strip" => Value::from(s.trim()),
        "splitlines" => Value::List(s.split('\n').map(Value::from).collect()),
        "isalnum" => python_bool(s.chars().all(char::is_alphanumeric)),
        "isalpha" => python_bool(s.chars().all(char::is_alphabetic)),
        "isdigit" => python_bool(s.chars().all(char::is_numeric)),
        "islower" => python_bool(s.to_lowercase() == s),
        "isupper" => python_bool(s.to_uppercase() == s),
        "isspace" => python_bool(s.trim().is_empty()),
        _ => Value::Invalid,
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(SafeString::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(SafeString::new(s))
    }
}

impl From<SafeString> for Value {
    fn from(s: SafeString) -> Self {
        Self::String(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Self::list(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Self::Map(entries)
    }
}

impl From<Arc<dyn Object>> for Value {
    fn from(object: Arc<dyn Object>) -> Self {
        Self::Object(object)
    }
}
