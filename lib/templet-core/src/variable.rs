//! Literals and dotted lookups.

use crate::{context::Context, error::TemplateError, safe_string::SafeString, value::Value};

/// A literal or a dotted lookup path, parsed once and resolved against many contexts.
///
/// Classification happens at construction, in priority order: numbers (integer unless the text has a `.` or an
/// exponent), quoted strings (unescaped and marked safe), then dotted lookups such as `user.address.0`. The
/// translation marker `_(...)` wraps either form and is otherwise transparent.
#[derive(Clone, Debug, Default)]
pub struct Variable {
    source: String,
    literal: Option<Value>,
    lookups: Vec<String>,
    translate: bool,
}

impl Variable {
    /// Parses `source` into a variable.
    ///
    /// An empty `source` produces an invalid variable that always resolves to [`Value::Invalid`].
    ///
    /// # Errors
    ///
    /// Returns a syntax error for a number with a trailing dot, for an empty path segment and for a path segment
    /// starting with an underscore.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut variable = Self {
            source: source.to_string(),
            ..Self::default()
        };
        if source.is_empty() {
            return Ok(variable);
        }

        let mut body = source;
        if let Some(inner) = body.strip_prefix("_(").and_then(|rest| rest.strip_suffix(')')) {
            variable.translate = true;
            body = inner;
        }

        if let Some(number) = parse_number(body) {
            variable.literal = Some(number?);
        } else if let Some(text) = unquote(body) {
            variable.literal = Some(Value::String(SafeString::safe(text)));
        } else {
            for segment in body.split('.') {
                if segment.is_empty() {
                    return Err(TemplateError::syntax(format!(
                        "Variables and attributes may not be empty: '{}'",
                        source
                    )));
                }
                if segment.starts_with('_') {
                    return Err(TemplateError::syntax(format!(
                        "Variables and attributes may not begin with underscores: '{}'",
                        source
                    )));
                }
                variable.lookups.push(segment.to_string());
            }
        }

        Ok(variable)
    }

    /// Returns `true` unless the variable was built from an empty string.
    pub fn is_valid(&self) -> bool {
        !self.source.is_empty()
    }

    /// Returns `true` if the variable is a literal rather than a lookup.
    pub fn is_constant(&self) -> bool {
        self.literal.is_some()
    }

    /// Returns `true` if the variable was wrapped in the translation marker.
    pub fn is_localized(&self) -> bool {
        self.translate
    }

    /// Returns the literal value, if this is a literal.
    pub fn literal(&self) -> Option<&Value> {
        self.literal.as_ref()
    }

    /// Returns the lookup path segments. Empty for literals.
    pub fn lookups(&self) -> &[String] {
        &self.lookups
    }

    /// Returns the source text the variable was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolves the variable against `ctx`.
    ///
    /// A lookup whose first segment is absent from the context, or whose later segments cannot be resolved, gives
    /// [`Value::Invalid`].
    pub fn resolve(&self, ctx: &Context) -> Value {
        if let Some(literal) = &self.literal {
            return literal.clone();
        }

        let Some((first, rest)) = self.lookups.split_first() else {
            return Value::Invalid;
        };
        let Some(root) = ctx.lookup(first) else {
            return Value::Invalid;
        };

        let mut value = root.clone();
        for segment in rest {
            value = value.lookup(segment);
            if !value.is_valid() {
                break;
            }
        }
        value
    }

    /// Resolves the variable and applies the truthiness rule.
    pub fn is_true(&self, ctx: &Context) -> bool {
        self.resolve(ctx).is_true()
    }
}

fn parse_number(s: &str) -> Option<Result<Value, TemplateError>> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let digits = digits.strip_prefix('.').unwrap_or(digits);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    if s.contains(['.', 'e', 'E']) {
        let value = s.parse::<f64>().ok()?;
        if s.ends_with('.') {
            return Some(Err(TemplateError::syntax(format!(
                "Variable may not end with a dot: '{}'",
                s
            ))));
        }
        Some(Ok(Value::Float(value)))
    } else {
        s.parse::<i64>()
            .map(Value::Int)
            .or_else(|_| s.parse::<f64>().map(Value::Float))
            .ok()
            .map(Ok)
    }
}

fn unquote(s: &str) -> Option<String> {
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if s.len() < 2 || !s.ends_with(quote) {
        return None;
    }

    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next == quote || next == '\\' => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}
