use indexmap::IndexMap;
use templet_core::{
    parser::smart_split, Context, FilterExpression, Node, NodeFactory, NodeList, OutputStream, Parser, TemplateError,
    Value,
};

use super::parse_until;

const FOR_LOOP: &str = "forloop";
const PARENT_LOOP: &str = "parentloop";

/// Parses `{% for x[, y...] in expr [reversed] %}`, with an optional `{% empty %}` branch.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForFactory;

impl NodeFactory for ForFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let mut words = smart_split(tag_content);
        if words.len() < 4 {
            return Err(TemplateError::syntax(format!(
                "'for' statements should have at least four words: {}",
                tag_content
            )));
        }

        words.remove(0);
        let reversed = words.last().is_some_and(|word| word == "reversed");
        if reversed {
            words.pop();
        }

        if words.len() < 3 || words[words.len() - 2] != "in" {
            return Err(TemplateError::syntax(format!(
                "'for' statements should use the form 'for x in y': {}",
                tag_content
            )));
        }

        let source = words.pop().unwrap_or_default();
        words.pop();
        let loop_vars = parse_loop_vars(&words)?;
        let expr = FilterExpression::parse(&source, parser)?;

        let (body, closing) = parse_until(parser, &["empty", "endfor"])?;
        let empty = if closing.command() == "empty" {
            parse_until(parser, &["endfor"])?.0
        } else {
            NodeList::new()
        };

        Ok(Box::new(ForNode {
            loop_vars,
            expr,
            reversed,
            body,
            empty,
        }))
    }
}

// Loop variables may be written `a,b`, `a, b` or `a ,b`, but consecutive names must be separated by a comma.
fn parse_loop_vars(words: &[String]) -> Result<Vec<String>, TemplateError> {
    let mut joined = String::new();
    for word in words {
        if joined.is_empty() || joined.ends_with(',') || word.starts_with(',') {
            joined.push_str(word);
        } else {
            return Err(TemplateError::syntax("'for' tag missing ',' separator for arguments"));
        }
    }

    let vars = joined.split(',').map(str::to_string).collect::<Vec<_>>();
    if vars.iter().any(String::is_empty) {
        return Err(TemplateError::syntax("'for' tag got extra ',' separator for arguments"));
    }
    Ok(vars)
}

/// Renders its body once per item of a sequence or mapping.
///
/// Each iteration runs in its own scope holding the loop variables and a `forloop` mapping with `counter`,
/// `counter0`, `revcounter`, `revcounter0`, `first` and `last`, plus `parentloop` when nested in another loop.
#[derive(Debug)]
pub struct ForNode {
    loop_vars: Vec<String>,
    expr: FilterExpression,
    reversed: bool,
    body: NodeList,
    empty: NodeList,
}

impl ForNode {
    fn items(&self, value: Value) -> Option<Vec<Value>> {
        let mut items = match value {
            // Mapping entries become `[key, value]` pairs, which unpack into two loop variables.
            Value::Map(entries) if self.loop_vars.len() <= 2 => entries
                .into_iter()
                .map(|(key, value)| Value::List(vec![Value::from(key), value]))
                .collect(),
            Value::Map(_) | Value::Invalid => return None,
            other => other.to_list(),
        };
        if self.reversed {
            items.reverse();
        }
        Some(items)
    }

    fn bind(&self, item: Value, ctx: &mut Context) {
        if self.loop_vars.len() == 1 {
            ctx.insert(self.loop_vars[0].as_str(), item);
            return;
        }

        match item {
            Value::List(values) => {
                let mut values = values.into_iter();
                for var in &self.loop_vars {
                    ctx.insert(var.as_str(), values.next().unwrap_or_default());
                }
            }
            other => {
                for var in &self.loop_vars {
                    ctx.insert(var.as_str(), other.lookup(var));
                }
            }
        }
    }
}

impl Node for ForNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let value = self.expr.resolve(ctx);
        let items = match self.items(value) {
            Some(items) if !items.is_empty() => items,
            _ => return self.empty.render(out, ctx),
        };

        let mut forloop = IndexMap::new();
        if let Some(parent) = ctx.lookup(FOR_LOOP) {
            forloop.insert(PARENT_LOOP.to_string(), parent.clone());
        }

        let count = items.len();
        ctx.scoped(|ctx| {
            for (i, item) in items.into_iter().enumerate() {
                forloop.insert("counter0".to_string(), Value::from(i));
                forloop.insert("counter".to_string(), Value::from(i + 1));
                forloop.insert("revcounter".to_string(), Value::from(count - i));
                forloop.insert("revcounter0".to_string(), Value::from(count - i - 1));
                forloop.insert("first".to_string(), Value::from(i == 0));
                forloop.insert("last".to_string(), Value::from(i + 1 == count));
                ctx.insert(FOR_LOOP, forloop.clone());

                self.bind(item, ctx);
                self.body.render(out, ctx)?;
            }
            Ok(())
        })
    }
}
