use templet_core::{
    parser::smart_split, Context, FilterExpression, Node, NodeFactory, NodeList, OutputStream, Parser, TemplateError,
};

use super::parse_body;

/// Parses `{% with value as name %}` or `{% with name=value other=value %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WithFactory;

impl NodeFactory for WithFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        let invalid = || {
            TemplateError::syntax(format!(
                "{} expected format is 'name=value' or 'value as name'",
                words.first().map(String::as_str).unwrap_or("with")
            ))
        };

        let mut bindings = Vec::new();
        if words.len() == 4 && words[2] == "as" {
            bindings.push((words[3].clone(), FilterExpression::parse(&words[1], parser)?));
        } else if words.len() > 1 {
            for word in &words[1..] {
                let (name, value) = word.split_once('=').ok_or_else(invalid)?;
                if name.is_empty() || value.is_empty() {
                    return Err(invalid());
                }
                bindings.push((name.to_string(), FilterExpression::parse(value, parser)?));
            }
        } else {
            return Err(invalid());
        }

        let body = parse_body(parser, "endwith")?;
        Ok(Box::new(WithNode { bindings, body }))
    }
}

/// Renders its body in a new scope holding one or more named values.
#[derive(Debug)]
pub struct WithNode {
    bindings: Vec<(String, FilterExpression)>,
    body: NodeList,
}

impl Node for WithNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        // Every value is resolved against the enclosing scope before any of them is bound.
        let values = self
            .bindings
            .iter()
            .map(|(name, expr)| (name.as_str(), expr.resolve(ctx)))
            .collect::<Vec<_>>();

        ctx.scoped(|ctx| {
            for (name, value) in values {
                ctx.insert(name, value);
            }
            self.body.render(out, ctx)
        })
    }
}
