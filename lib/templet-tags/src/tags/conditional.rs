use templet_core::{
    if_expr::IfExpression, parser::smart_split, Context, Node, NodeFactory, NodeList, OutputStream, Parser,
    TemplateError,
};

use super::parse_until;

/// Parses `{% if %}`, with any number of `{% elif %}` branches and an optional `{% else %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IfFactory;

impl NodeFactory for IfFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = Some(parse_condition(tag_content, parser)?);

        loop {
            let (body, closing) = parse_until(parser, &["elif", "else", "endif"])?;
            branches.push((condition.take(), body));

            match closing.command() {
                "elif" => condition = Some(parse_condition(&closing.content, parser)?),
                "else" => {
                    let (body, _) = parse_until(parser, &["endif"])?;
                    branches.push((None, body));
                    break;
                }
                _ => break,
            }
        }

        Ok(Box::new(IfNode { branches }))
    }
}

fn parse_condition(tag_content: &str, parser: &Parser<'_>) -> Result<IfExpression, TemplateError> {
    let words = smart_split(tag_content);
    let Some((command, args)) = words.split_first() else {
        return Err(TemplateError::syntax("'if' statement requires at least one argument"));
    };
    if args.is_empty() {
        return Err(TemplateError::syntax(format!(
            "'{}' statement requires at least one argument",
            command
        )));
    }
    IfExpression::parse(args, parser)
}

/// Renders the body of the first branch whose condition holds.
#[derive(Debug)]
pub struct IfNode {
    branches: Vec<(Option<IfExpression>, NodeList)>,
}

impl Node for IfNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        for (condition, body) in &self.branches {
            let matched = condition.as_ref().map_or(true, |condition| condition.evaluate(ctx));
            if matched {
                return body.render(out, ctx);
            }
        }
        Ok(())
    }
}
