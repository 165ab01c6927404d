//! Variables followed by filter chains.
//!
//! This is the grammar behind every `{{ ... }}` and most tag arguments: a literal or lookup, then any number of
//! `|filter` or `|filter:argument` segments.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use regex::Regex;

use crate::{
    context::Context, error::TemplateError, filter::Filter, parser::Parser, value::Value, variable::Variable,
};

const CONSTANT_STRING: &str = concat!(
    r#"(?:"[^"\\]*(?:\\.[^"\\]*)*""#,
    r#"|'[^'\\]*(?:\\.[^'\\]*)*')"#,
);
const VAR_CHARS: &str = r"[A-Za-z0-9_.]";
const NUMBER: &str = r"[-+.]?\d[\d.e]*";
const FILTER: &str = r"\|\w+";

// `_(...)` around a string, a number or a lookup.
fn localized() -> String {
    format!(r"(?:_\((?:{c}|{n}|{v}+)\))", c = CONSTANT_STRING, n = NUMBER, v = VAR_CHARS)
}

fn filter_regex() -> &'static Regex {
    static FILTER_RE: OnceLock<Regex> = OnceLock::new();
    FILTER_RE.get_or_init(|| {
        // The root expression is anchored at the start; everything after it is a filter or a filter argument.
        let pattern = format!(
            "^{c}|^{l}|^{v}+|{n}|{f}|:(?:{c}|{l}|{v}+|{n}|{f})",
            c = CONSTANT_STRING,
            l = localized(),
            v = VAR_CHARS,
            n = NUMBER,
            f = FILTER
        );
        Regex::new(&pattern).expect("filter expression pattern should be valid")
    })
}

#[derive(Clone)]
struct FilterCall {
    name: String,
    filter: Arc<dyn Filter>,
    arg: Option<Variable>,
}

/// A variable followed by a chain of filters, such as `user.name|default:"anonymous"|upper`.
///
/// Parsing records the first error it finds and keeps scanning to the end of the source; an expression with an error
/// must not be used. Filter names are resolved against the parser when the expression is built, so an unknown filter
/// is a parse-time error.
#[derive(Clone, Default)]
pub struct FilterExpression {
    variable: Variable,
    filters: Vec<FilterCall>,
    error: Option<TemplateError>,
}

impl FilterExpression {
    /// Parses `source`, recording any error on the expression.
    pub fn new(source: &str, parser: &Parser<'_>) -> Self {
        let mut expr = Self::default();
        let mut pos = 0;
        let mut argument_orphaned = false;

        while let Some(m) = filter_regex().find_at(source, pos) {
            if m.start() != pos {
                expr.record(TemplateError::syntax(format!(
                    "Could not parse some characters: \"{}\"",
                    &source[pos..m.start()]
                )));
            }

            let token = m.as_str();
            if let Some(name) = token.strip_prefix('|') {
                match parser.get_filter(name) {
                    Ok(filter) => {
                        expr.filters.push(FilterCall {
                            name: name.to_string(),
                            filter,
                            arg: None,
                        });
                        argument_orphaned = false;
                    }
                    Err(e) => {
                        expr.record(e);
                        argument_orphaned = true;
                    }
                }
            } else if let Some(arg) = token.strip_prefix(':') {
                if argument_orphaned {
                    // The filter itself failed to resolve and has already been reported.
                } else if expr.filters.is_empty() {
                    expr.record(TemplateError::syntax(format!(
                        "Filter argument without a filter: \"{}\"",
                        arg
                    )));
                } else if let Some(name) = expr
                    .filters
                    .last()
                    .filter(|call| call.arg.is_some())
                    .map(|call| call.name.clone())
                {
                    expr.record(TemplateError::syntax(format!(
                        "Filter '{}' takes at most one argument: '{}'",
                        name, source
                    )));
                } else {
                    match Variable::parse(arg) {
                        Ok(variable) => {
                            if let Some(call) = expr.filters.last_mut() {
                                call.arg = Some(variable);
                            }
                        }
                        Err(e) => expr.record(e),
                    }
                }
            } else {
                match Variable::parse(token) {
                    Ok(variable) => expr.variable = variable,
                    Err(e) => expr.record(e),
                }
            }

            pos = m.end();
        }

        if pos != source.len() {
            let remainder = &source[pos..];
            let error = match (remainder.strip_prefix(':'), expr.filters.last()) {
                (Some(""), Some(call)) => {
                    TemplateError::syntax(format!("Missing argument to filter: '{}'", call.name))
                }
                _ => TemplateError::syntax(format!(
                    "Could not parse the remainder: '{}' from '{}'",
                    remainder, source
                )),
            };
            expr.record(error);
        }

        expr
    }

    /// Parses `source`, failing on the first recorded error.
    ///
    /// # Errors
    ///
    /// Returns the first syntax or unknown-filter error found in `source`.
    pub fn parse(source: &str, parser: &Parser<'_>) -> Result<Self, TemplateError> {
        let mut expr = Self::new(source, parser);
        match expr.error.take() {
            Some(e) => Err(e),
            None => Ok(expr),
        }
    }

    fn record(&mut self, error: TemplateError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Returns the first error recorded while parsing.
    pub fn error(&self) -> Option<&TemplateError> {
        self.error.as_ref()
    }

    /// Returns `true` if the expression has a root variable and parsed without error.
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.variable.is_valid()
    }

    /// Returns the root variable.
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Returns the names of the filters in the chain, in application order.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|call| call.name.as_str())
    }

    /// Resolves the root variable and applies each filter in turn.
    ///
    /// After each filter that returns a string, the result's escaping state is recomputed from the filter's input:
    /// it is safe if the filter is safe and the input was safe, marked for escaping if the input was, and otherwise
    /// left as the filter returned it. This lets an unsafe filter such as `upper` undo an earlier `safe`.
    pub fn resolve(&self, ctx: &Context) -> Value {
        let mut value = self.variable.resolve(ctx);

        for call in &self.filters {
            let arg = call.arg.as_ref().map(|variable| variable.resolve(ctx));
            let (input_safe, input_needs_escape) = value
                .as_safe_string()
                .map(|s| (s.is_safe(), s.needs_escape()))
                .unwrap_or((false, false));
            let autoescape = call.filter.needs_autoescape() && ctx.autoescape();

            value = match call.filter.filter(&value, arg.as_ref(), autoescape) {
                Value::String(s) if call.filter.is_safe() && input_safe => Value::String(s.mark_safe()),
                Value::String(s) if input_needs_escape => Value::String(s.mark_for_escaping()),
                other => other,
            };
        }

        value
    }

    /// Resolves the expression and applies the truthiness rule.
    pub fn is_true(&self, ctx: &Context) -> bool {
        self.resolve(ctx).is_true()
    }

    /// Resolves the expression and normalizes it into a sequence.
    pub fn to_list(&self, ctx: &Context) -> Vec<Value> {
        self.resolve(ctx).to_list()
    }
}

impl fmt::Debug for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterExpression")
            .field("variable", &self.variable)
            .field("filters", &self.filter_names().collect::<Vec<_>>())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::Engine, error::ErrorKind, library::TagLibrary, safe_string::SafeString};

    struct Upper;

    impl Filter for Upper {
        fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
            Value::from(input.to_safe_string().to_uppercase())
        }
    }

    struct MarkSafe;

    impl Filter for MarkSafe {
        fn filter(&self, input: &Value, _arg: Option<&Value>, _autoescape: bool) -> Value {
            Value::String(input.to_safe_string().mark_safe())
        }

        fn is_safe(&self) -> bool {
            true
        }
    }

    struct Append;

    impl Filter for Append {
        fn filter(&self, input: &Value, arg: Option<&Value>, _autoescape: bool) -> Value {
            let suffix = arg.map(|a| a.to_safe_string().into_string()).unwrap_or_default();
            Value::String(input.to_safe_string().map(|s| s + &suffix))
        }

        fn is_safe(&self) -> bool {
            true
        }
    }

    struct ReportAutoescape;

    impl Filter for ReportAutoescape {
        fn filter(&self, _input: &Value, _arg: Option<&Value>, autoescape: bool) -> Value {
            Value::Bool(autoescape)
        }

        fn needs_autoescape(&self) -> bool {
            true
        }
    }

    struct TestFilters;

    impl TagLibrary for TestFilters {
        fn filters(&self) -> Vec<(String, Arc<dyn Filter>)> {
            vec![
                ("upper".to_string(), Arc::new(Upper) as Arc<dyn Filter>),
                ("safe".to_string(), Arc::new(MarkSafe) as Arc<dyn Filter>),
                ("append".to_string(), Arc::new(Append) as Arc<dyn Filter>),
                ("autoescape_flag".to_string(), Arc::new(ReportAutoescape) as Arc<dyn Filter>),
            ]
        }
    }

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.register_library("test_filters", Arc::new(TestFilters));
        engine.set_default_libraries(["test_filters"]);
        engine
    }

    fn with_parser<R>(f: impl FnOnce(&Parser<'_>) -> R) -> R {
        let engine = engine();
        let parser = Parser::new(&engine, Vec::new()).unwrap();
        f(&parser)
    }

    #[test]
    fn test_unsafe_filter_after_safe_reverts_safety() {
        let ctx: Context = [("x", "<b>")].into_iter().collect();
        let value = with_parser(|p| FilterExpression::parse("x|safe|upper", p).unwrap().resolve(&ctx));

        let s = value.as_safe_string().unwrap();
        assert_eq!(s.as_str(), "<B>");
        assert!(!s.is_safe());
    }

    #[test]
    fn test_safe_filter_marks_output_safe() {
        let ctx: Context = [("x", "<b>")].into_iter().collect();
        let value = with_parser(|p| FilterExpression::parse("x|safe", p).unwrap().resolve(&ctx));
        assert!(value.as_safe_string().unwrap().is_safe());
    }

    #[test]
    fn test_escaping_requirement_propagates() {
        let ctx: Context = [("x", Value::String(SafeString::new("a").mark_for_escaping()))]
            .into_iter()
            .collect();
        let value = with_parser(|p| FilterExpression::parse("x|append:'b'", p).unwrap().resolve(&ctx));

        let s = value.as_safe_string().unwrap();
        assert_eq!(s.as_str(), "ab");
        assert!(s.needs_escape());
    }

    #[test]
    fn test_arguments_resolve_from_context() {
        let ctx: Context = [("x", "a"), ("y", "z")].into_iter().collect();
        let value = with_parser(|p| FilterExpression::parse("x|append:y|upper", p).unwrap().resolve(&ctx));
        assert_eq!(value.as_str(), Some("AZ"));
    }

    #[test]
    fn test_autoescape_flag_only_passed_on_request() {
        let mut ctx = Context::new();
        let flag = with_parser(|p| FilterExpression::parse("1|autoescape_flag", p).unwrap().resolve(&ctx));
        assert!(matches!(flag, Value::Bool(true)));

        ctx.set_autoescape(false);
        let flag = with_parser(|p| FilterExpression::parse("1|autoescape_flag", p).unwrap().resolve(&ctx));
        assert!(matches!(flag, Value::Bool(false)));
    }

    #[test]
    fn test_unknown_filter_is_parse_error() {
        let err = with_parser(|p| FilterExpression::parse("x|nope", p).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::TagSyntax);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_gap_between_tokens_is_error() {
        let err = with_parser(|p| FilterExpression::parse("x |upper", p).unwrap_err());
        assert!(err.to_string().starts_with("Could not parse some characters"));
    }

    #[test]
    fn test_trailing_garbage_is_error() {
        let err = with_parser(|p| FilterExpression::parse("x|upper!", p).unwrap_err());
        assert!(err.to_string().contains("remainder"));
    }

    #[test]
    fn test_missing_argument_is_error() {
        let err = with_parser(|p| FilterExpression::parse("x|append:", p).unwrap_err());
        assert_eq!(err.to_string(), "Missing argument to filter: 'append'");
    }

    #[test]
    fn test_second_filter_argument_is_error() {
        let err = with_parser(|p| FilterExpression::parse("x|append:'a':'b'", p).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::TagSyntax);
        assert_eq!(err.to_string(), "Filter 'append' takes at most one argument: 'x|append:'a':'b''");
    }

    #[test]
    fn test_underscores_inside_string_literals() {
        let ctx = Context::new();
        let value = with_parser(|p| FilterExpression::parse("\"a._b\"|append:'_c'", p).unwrap().resolve(&ctx));
        assert_eq!(value.as_str(), Some("a._b_c"));
    }

    #[test]
    fn test_localized_roots_and_arguments() {
        let ctx: Context = [("name", "ada"), ("suffix", "!")].into_iter().collect();
        let value = with_parser(|p| FilterExpression::parse("_(name)|append:_(suffix)", p).unwrap().resolve(&ctx));
        assert_eq!(value.as_str(), Some("ada!"));

        let number = with_parser(|p| FilterExpression::parse("_(42)", p).unwrap());
        assert!(number.variable().is_localized());
        assert_eq!(number.resolve(&ctx).as_int(), Some(42));

        let err = with_parser(|p| FilterExpression::parse("_(_secret)", p).unwrap_err());
        assert!(err.to_string().contains("underscores"));
    }

    #[test]
    fn test_underscore_attribute_is_error() {
        let err = with_parser(|p| FilterExpression::parse("user._hidden", p).unwrap_err());
        assert!(err.to_string().contains("underscores"));
    }

    #[test]
    fn test_first_error_is_kept_after_scanning_everything() {
        let expr = with_parser(|p| FilterExpression::new("x|nope|upper!", p));
        assert!(!expr.is_valid());
        assert!(expr.error().unwrap().to_string().contains("nope"));
    }

    #[test]
    fn test_literal_roots() {
        let ctx = Context::new();
        let names = with_parser(|p| {
            let expr = FilterExpression::parse("\"it's\"|upper", p).unwrap();
            (expr.resolve(&ctx), expr.filter_names().map(str::to_string).collect::<Vec<_>>())
        });
        assert_eq!(names.0.as_str(), Some("IT'S"));
        assert_eq!(names.1, vec!["upper".to_string()]);

        let negative = with_parser(|p| FilterExpression::parse("-5", p).unwrap().resolve(&ctx));
        assert_eq!(negative.as_int(), Some(-5));
    }

    #[test]
    fn test_to_list_and_truthiness() {
        let ctx: Context = [("items", Value::list([1, 2])), ("empty", Value::list(Vec::<i64>::new()))]
            .into_iter()
            .collect();
        with_parser(|p| {
            assert_eq!(FilterExpression::parse("items", p).unwrap().to_list(&ctx).len(), 2);
            assert!(!FilterExpression::parse("empty", p).unwrap().is_true(&ctx));
            assert!(FilterExpression::parse("missing", p).unwrap().to_list(&ctx).is_empty());
        });
    }
}
