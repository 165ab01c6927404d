//! Boolean expressions for the `if` tag.
//!
//! Expressions are parsed with binding powers, lowest first: `or`, `and`, `not`, `in`/`not in`, then the comparisons.
//! Operands are filter expressions resolved when the expression is evaluated.

use std::{cmp::Ordering, iter::Peekable, vec::IntoIter};

use crate::{
    context::Context, error::TemplateError, filter_expression::FilterExpression, parser::Parser, value::Value,
};

const NOT_BINDING_POWER: u8 = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Operator {
    Or,
    And,
    In,
    NotIn,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl Operator {
    fn from_word(word: &str) -> Option<Self> {
        let op = match word {
            "or" => Self::Or,
            "and" => Self::And,
            "in" => Self::In,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanEqual,
            _ => return None,
        };
        Some(op)
    }

    fn binding_power(&self) -> u8 {
        match self {
            Self::Or => 6,
            Self::And => 7,
            Self::In | Self::NotIn => 9,
            Self::Equal
            | Self::NotEqual
            | Self::LessThan
            | Self::LessThanEqual
            | Self::GreaterThan
            | Self::GreaterThanEqual => 10,
        }
    }

    fn build(&self, lhs: IfExpression, rhs: IfExpression) -> IfExpression {
        let inner = Box::new((lhs, rhs));
        match self {
            Self::Or => IfExpression::Or(inner),
            Self::And => IfExpression::And(inner),
            Self::In => IfExpression::In(inner),
            Self::NotIn => IfExpression::NotIn(inner),
            Self::Equal => IfExpression::Equal(inner),
            Self::NotEqual => IfExpression::NotEqual(inner),
            Self::LessThan => IfExpression::LessThan(inner),
            Self::LessThanEqual => IfExpression::LessThanEqual(inner),
            Self::GreaterThan => IfExpression::GreaterThan(inner),
            Self::GreaterThanEqual => IfExpression::GreaterThanEqual(inner),
        }
    }
}

#[derive(Debug)]
enum IfToken {
    Atom(String),
    Not,
    Operator(Operator),
}

fn lex(words: &[String]) -> Vec<IfToken> {
    let mut tokens = Vec::with_capacity(words.len());
    let mut words = words.iter().peekable();
    while let Some(word) = words.next() {
        let token = match word.as_str() {
            "not" if words.peek().is_some_and(|next| next.as_str() == "in") => {
                words.next();
                IfToken::Operator(Operator::NotIn)
            }
            "not" => IfToken::Not,
            other => match Operator::from_word(other) {
                Some(op) => IfToken::Operator(op),
                None => IfToken::Atom(other.to_string()),
            },
        };
        tokens.push(token);
    }
    tokens
}

/// A parsed `if` condition.
#[derive(Debug)]
pub enum IfExpression {
    /// A single operand, true according to the truthiness rule.
    Operand(FilterExpression),

    /// Logical negation.
    Not(Box<IfExpression>),

    /// Short-circuiting conjunction.
    And(Box<(IfExpression, IfExpression)>),

    /// Short-circuiting disjunction.
    Or(Box<(IfExpression, IfExpression)>),

    /// Membership of the left operand in the right.
    In(Box<(IfExpression, IfExpression)>),

    /// Non-membership of the left operand in the right.
    NotIn(Box<(IfExpression, IfExpression)>),

    /// Template equality.
    Equal(Box<(IfExpression, IfExpression)>),

    /// Template inequality.
    NotEqual(Box<(IfExpression, IfExpression)>),

    /// `<`
    LessThan(Box<(IfExpression, IfExpression)>),

    /// `<=`
    LessThanEqual(Box<(IfExpression, IfExpression)>),

    /// `>`
    GreaterThan(Box<(IfExpression, IfExpression)>),

    /// `>=`
    GreaterThanEqual(Box<(IfExpression, IfExpression)>),
}

impl IfExpression {
    /// Parses the words of an `if` tag, without the leading `if`.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the expression is empty, mixes `and` and `or`, has an operator where an operand is
    /// expected or an operand left over at the end, or if an operand is not a valid filter expression.
    pub fn parse(words: &[String], parser: &Parser<'_>) -> Result<Self, TemplateError> {
        let tokens = lex(words);

        let has_and = tokens.iter().any(|t| matches!(t, IfToken::Operator(Operator::And)));
        let has_or = tokens.iter().any(|t| matches!(t, IfToken::Operator(Operator::Or)));
        if has_and && has_or {
            return Err(TemplateError::syntax("'if' tags can't mix 'and' and 'or'"));
        }

        let mut tokens = tokens.into_iter().peekable();
        let expr = parse_binding_power(&mut tokens, parser, 0)?;
        match tokens.next() {
            None => Ok(expr),
            Some(IfToken::Atom(atom)) => Err(TemplateError::syntax(format!(
                "Unused '{}' at end of if expression.",
                atom
            ))),
            Some(other) => Err(TemplateError::syntax(format!(
                "Unexpected {:?} at end of if expression.",
                other
            ))),
        }
    }

    /// Evaluates the condition against `ctx`.
    pub fn evaluate(&self, ctx: &Context) -> bool {
        match self {
            Self::Operand(expr) => expr.is_true(ctx),
            Self::Not(inner) => !inner.evaluate(ctx),
            Self::And(pair) => pair.0.evaluate(ctx) && pair.1.evaluate(ctx),
            Self::Or(pair) => pair.0.evaluate(ctx) || pair.1.evaluate(ctx),
            Self::In(pair) => pair.1.value(ctx).contains(&pair.0.value(ctx)),
            Self::NotIn(pair) => !pair.1.value(ctx).contains(&pair.0.value(ctx)),
            Self::Equal(pair) => pair.0.value(ctx).equals(&pair.1.value(ctx)),
            Self::NotEqual(pair) => !pair.0.value(ctx).equals(&pair.1.value(ctx)),
            Self::LessThan(pair) => compare(pair, ctx, |o| o == Ordering::Less),
            Self::LessThanEqual(pair) => compare(pair, ctx, |o| o != Ordering::Greater),
            Self::GreaterThan(pair) => compare(pair, ctx, |o| o == Ordering::Greater),
            Self::GreaterThanEqual(pair) => compare(pair, ctx, |o| o != Ordering::Less),
        }
    }

    fn value(&self, ctx: &Context) -> Value {
        match self {
            Self::Operand(expr) => expr.resolve(ctx),
            other => Value::Bool(other.evaluate(ctx)),
        }
    }
}

fn compare<F>(pair: &(IfExpression, IfExpression), ctx: &Context, accept: F) -> bool
where
    F: FnOnce(Ordering) -> bool,
{
    pair.0.value(ctx).compare(&pair.1.value(ctx)).is_some_and(accept)
}

fn parse_binding_power(
    tokens: &mut Peekable<IntoIter<IfToken>>, parser: &Parser<'_>, min_binding_power: u8,
) -> Result<IfExpression, TemplateError> {
    let mut lhs = match tokens.next() {
        None => return Err(TemplateError::syntax("Unexpected end of expression in if tag.")),
        Some(IfToken::Atom(atom)) => IfExpression::Operand(FilterExpression::parse(&atom, parser)?),
        Some(IfToken::Not) => {
            let operand = parse_binding_power(tokens, parser, NOT_BINDING_POWER)?;
            IfExpression::Not(Box::new(operand))
        }
        Some(IfToken::Operator(op)) => {
            return Err(TemplateError::syntax(format!(
                "Not expecting '{:?}' in this position in if tag.",
                op
            )))
        }
    };

    loop {
        let op = match tokens.peek() {
            None => break,
            Some(IfToken::Operator(op)) => *op,
            Some(IfToken::Atom(atom)) => {
                return Err(TemplateError::syntax(format!(
                    "Unused '{}' at end of if expression.",
                    atom
                )))
            }
            Some(IfToken::Not) => return Err(TemplateError::syntax("Unused 'not' at end of if expression.")),
        };
        let binding_power = op.binding_power();
        if binding_power <= min_binding_power {
            break;
        }

        tokens.next();
        let rhs = parse_binding_power(tokens, parser, binding_power)?;
        lhs = op.build(lhs, rhs);
    }

    Ok(lhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::Engine, error::ErrorKind, parser::smart_split};

    fn parse(source: &str) -> Result<IfExpression, TemplateError> {
        let engine = Engine::new();
        let parser = Parser::new(&engine, Vec::new()).unwrap();
        IfExpression::parse(&smart_split(source), &parser)
    }

    fn eval(source: &str, ctx: &Context) -> bool {
        parse(source).unwrap().evaluate(ctx)
    }

    #[test]
    fn test_not_binds_tighter_than_or() {
        let expr = parse("not a or b").unwrap();
        assert!(matches!(expr, IfExpression::Or(ref pair) if matches!(pair.0, IfExpression::Not(_))));

        let ctx: Context = [("a", true), ("b", true)].into_iter().collect();
        assert!(eval("not a or b", &ctx));
    }

    #[test]
    fn test_comparisons_bind_tighter_than_and() {
        let expr = parse("a == b and not c in d").unwrap();
        let IfExpression::And(pair) = expr else {
            panic!("expected a conjunction");
        };
        assert!(matches!(pair.0, IfExpression::Equal(_)));
        let IfExpression::Not(inner) = &pair.1 else {
            panic!("expected a negation");
        };
        assert!(matches!(**inner, IfExpression::In(_)));
    }

    #[test]
    fn test_mixing_and_or_is_rejected() {
        let err = parse("a or b and c").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TagSyntax);
        assert_eq!(err.to_string(), "'if' tags can't mix 'and' and 'or'");
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(parse("").is_err());
        assert!(parse("a and").is_err());
        assert!(parse("and a").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("a == b c").is_err());
    }

    #[test]
    fn test_membership() {
        let ctx: Context = [("names", Value::list(["Ada", "Grace"])), ("who", Value::from("Ada"))]
            .into_iter()
            .collect();
        assert!(eval("who in names", &ctx));
        assert!(eval("'Linus' not in names", &ctx));
        assert!(eval("'da' in who", &ctx));
    }

    #[test]
    fn test_ordering_and_equality() {
        let ctx: Context = [("n", 5)].into_iter().collect();
        assert!(eval("n > 3", &ctx));
        assert!(eval("n >= 5.0", &ctx));
        assert!(eval("n == 5", &ctx));
        assert!(!eval("n == '5'", &ctx));
        assert!(eval("n != '5'", &ctx));
        assert!(!eval("missing < 3", &ctx));
    }

    #[test]
    fn test_or_short_circuits() {
        let ctx: Context = [("a", true)].into_iter().collect();
        assert!(eval("a or missing.deeply.nested", &ctx));
        assert!(!eval("missing and a", &ctx));
    }
}
