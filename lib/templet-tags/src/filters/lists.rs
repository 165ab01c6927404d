use templet_core::{Filter, SafeString, Value};

use super::conditional_escape;

/// `join:sep`: joins the items of a sequence with a separator.
///
/// With autoescaping on, unsafe items are escaped. The separator is escaped unless it is safe. The result is safe.
#[derive(Clone, Copy, Debug, Default)]
pub struct JoinFilter;

impl Filter for JoinFilter {
    fn filter(&self, input: &Value, arg: Option<&Value>, autoescape: bool) -> Value {
        let Value::List(items) = input else {
            return Value::Invalid;
        };

        let separator = arg.map(|arg| conditional_escape(&arg.to_safe_string())).unwrap_or_default();
        let text = items
            .iter()
            .map(|item| {
                let s = item.to_safe_string();
                if autoescape {
                    conditional_escape(&s)
                } else {
                    s.into_string()
                }
            })
            .collect::<Vec<_>>()
            .join(&separator);
        Value::String(SafeString::safe(text))
    }

    fn is_safe(&self) -> bool {
        true
    }

    fn needs_autoescape(&self) -> bool {
        true
    }
}

/// `length`: the number of items in a sequence or characters in a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthFilter;

impl Filter for LengthFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        match input {
            Value::List(items) => Value::from(items.len()),
            Value::String(s) => Value::from(s.chars().count()),
            _ => Value::Invalid,
        }
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// `first`: the first item of a sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstFilter;

impl Filter for FirstFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        match input {
            Value::List(items) => items.first().cloned().unwrap_or_else(|| Value::from("")),
            _ => Value::Invalid,
        }
    }
}

/// `last`: the last item of a sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastFilter;

impl Filter for LastFilter {
    fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
        match input {
            Value::List(items) => items.last().cloned().unwrap_or_else(|| Value::from("")),
            _ => Value::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_escapes_with_autoescape() {
        let items = Value::list(["<a>", "b"]);
        let sep = Value::from(" & ");

        let joined = JoinFilter.filter(&items, Some(&sep), true).to_safe_string();
        assert_eq!(joined, "&lt;a&gt; &amp; b");
        assert!(joined.is_safe());

        let joined = JoinFilter.filter(&items, Some(&sep), false).to_safe_string();
        assert_eq!(joined, "<a> &amp; b");

        let safe_items = Value::List(vec![Value::from(SafeString::safe("<a>")), Value::from("b")]);
        let joined = JoinFilter.filter(&safe_items, Some(&Value::from(SafeString::safe("<br>"))), true);
        assert_eq!(joined.to_safe_string(), "<a><br>b");
    }

    #[test]
    fn test_join_requires_a_sequence() {
        assert!(!JoinFilter.filter(&Value::from("abc"), None, true).is_valid());
    }

    #[test]
    fn test_length() {
        assert_eq!(LengthFilter.filter(&Value::list([1, 2, 3]), None, false).as_int(), Some(3));
        assert_eq!(LengthFilter.filter(&Value::from("héllo"), None, false).as_int(), Some(5));
        assert!(!LengthFilter.filter(&Value::from(7), None, false).is_valid());
    }

    #[test]
    fn test_first_and_last() {
        let items = Value::list(["a", "b", "c"]);
        assert_eq!(FirstFilter.filter(&items, None, false).as_str(), Some("a"));
        assert_eq!(LastFilter.filter(&items, None, false).as_str(), Some("c"));
        assert_eq!(FirstFilter.filter(&Value::List(Vec::new()), None, false).as_str(), Some(""));
        assert!(!LastFilter.filter(&Value::from(1), None, false).is_valid());
    }
}
