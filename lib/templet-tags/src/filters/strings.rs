use templet_core::{output::escape_html, Filter, SafeString, Value};

/// `safe`: trusts the input, so it is written without escaping.
#[derive(Clone, Copy, Debug, Default)]
pub struct SafeFilter;

impl Filter for SafeFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        Value::String(input.to_safe_string().mark_safe())
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `escape`: marks the input for escaping when written, even with autoescaping off.
#[derive(Clone, Copy, Debug, Default)]
pub struct EscapeFilter;

impl Filter for EscapeFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        Value::String(input.to_safe_string().mark_for_escaping())
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `force_escape`: escapes the input immediately, even if it is safe.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForceEscapeFilter;

impl Filter for ForceEscapeFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        Value::String(SafeString::safe(escape_html(input.to_safe_string().as_str())))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `upper`: converts to upper case.
///
/// Not safe, since upper-casing can break entities such as `&amp;`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpperFilter;

impl Filter for UpperFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        Value::String(SafeString::new(input.to_safe_string().to_uppercase()))
    }
}

/// `lower`: converts to lower case.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowerFilter;

impl Filter for LowerFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        Value::String(SafeString::new(input.to_safe_string().to_lowercase()))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `capfirst`: upper-cases the first character.
#[derive(Clone, Copy, Debug, Default)]
pub struct CapFirstFilter;

impl Filter for CapFirstFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        let s = input.to_safe_string();
        let mut chars = s.chars();
        let text = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Value::String(SafeString::new(text))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `title`: upper-cases the first letter of each word and lower-cases the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct TitleFilter;

impl Filter for TitleFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        let mut text = String::new();
        let mut word_start = true;
        for c in input.to_safe_string().chars() {
            if word_start {
                text.extend(c.to_uppercase());
            } else {
                text.extend(c.to_lowercase());
            }
            word_start = c.is_whitespace();
        }
        Value::String(SafeString::new(text))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `cut:arg`: removes every occurrence of the argument.
///
/// A safe input stays safe, except when cutting `;`, which can break entities.
#[derive(Clone, Copy, Debug, Default)]
pub struct CutFilter;

impl Filter for CutFilter {
    fn filter(&self, input: &Value, arg: Option<&Value>, _autoescape: bool) -> Value {
        let s = input.to_safe_string();
        let pattern = arg.map(Value::to_safe_string).unwrap_or_default();
        if pattern.is_empty() {
            return Value::String(s);
        }

        let text = s.replace(pattern.as_str(), "");
        if s.is_safe() && pattern.as_str() != ";" {
            Value::String(SafeString::safe(text))
        } else {
            Value::String(SafeString::new(text))
        }
    }
}

/// `addslashes`: puts a backslash before backslashes and quotes.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddSlashesFilter;

impl Filter for AddSlashesFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        let s = input.to_safe_string();
        let mut text = String::with_capacity(s.len());
        for c in s.chars() {
            if matches!(c, '\\' | '"' | '\'') {
                text.push('\\');
            }
            text.push(c);
        }
        Value::String(SafeString::new(text))
    }

    fn is_safe(&self) -> bool {
        true
    }
}
