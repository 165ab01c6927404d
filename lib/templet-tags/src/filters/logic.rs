use templet_core::{Filter, Value};

/// `default:arg`: the argument when the input is invalid or renders as empty text.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFilter;

impl Filter for DefaultFilter {
    fn filter(&self, input: &Value, arg: Option<&Value>, _autoescape: bool) -> Value {
        if !input.is_valid() || input.to_safe_string().is_empty() {
            return arg.cloned().unwrap_or_default();
        }
        Value::String(input.to_safe_string())
    }
}

/// `default_if_none:arg`: the argument when the input is invalid.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultIfNoneFilter;

impl Filter for DefaultIfNoneFilter {
    fn filter(&self, input: &Value, arg: Option<&Value>, _autoescape: bool) -> Value {
        if !input.is_valid() {
            return arg.cloned().unwrap_or_default();
        }
        Value::String(input.to_safe_string())
    }
}

/// `yesno:"yes,no,maybe"`: maps true, false and invalid input to one of the given words.
///
/// Without an argument the words are `yes`, `no` and `maybe`. With two words, invalid input maps to the second. Any
/// other number of words leaves the input unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct YesNoFilter;

impl Filter for YesNoFilter {
    fn filter(&self, input: &Value, arg: Option<&Value>, _autoescape: bool) -> Value {
        let arg = arg.map(Value::to_safe_string).unwrap_or_default();
        let (yes, no, maybe) = if arg.is_empty() {
            ("yes", "no", "maybe")
        } else {
            match arg.split(',').collect::<Vec<_>>()[..] {
                [yes, no] => (yes, no, no),
                [yes, no, maybe] => (yes, no, maybe),
                _ => return Value::String(input.to_safe_string()),
            }
        };

        let word = if !input.is_valid() {
            maybe
        } else if !input.to_safe_string().is_empty() {
            yes
        } else {
            no
        };
        Value::from(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let fallback = Value::from("n/a");
        assert_eq!(DefaultFilter.filter(&Value::Invalid, Some(&fallback), false).as_str(), Some("n/a"));
        assert_eq!(DefaultFilter.filter(&Value::from(""), Some(&fallback), false).as_str(), Some("n/a"));
        assert_eq!(DefaultFilter.filter(&Value::from("x"), Some(&fallback), false).as_str(), Some("x"));
    }

    #[test]
    fn test_default_if_none() {
        let fallback = Value::from("n/a");
        assert_eq!(
            DefaultIfNoneFilter.filter(&Value::Invalid, Some(&fallback), false).as_str(),
            Some("n/a")
        );
        assert_eq!(DefaultIfNoneFilter.filter(&Value::from(""), Some(&fallback), false).as_str(), Some(""));
    }

    #[test]
    fn test_yesno() {
        let yesno = |input: &Value, arg: Option<&str>| {
            let arg = arg.map(Value::from);
            YesNoFilter.filter(input, arg.as_ref(), false).to_safe_string().into_string()
        };

        assert_eq!(yesno(&Value::from("x"), None), "yes");
        assert_eq!(yesno(&Value::from(""), None), "no");
        assert_eq!(yesno(&Value::Invalid, None), "maybe");
        assert_eq!(yesno(&Value::Invalid, Some("on,off")), "off");
        assert_eq!(yesno(&Value::Invalid, Some("on,off,unknown")), "unknown");
        assert_eq!(yesno(&Value::from("kept"), Some("only")), "kept");
    }
}
