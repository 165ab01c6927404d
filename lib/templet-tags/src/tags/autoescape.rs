use templet_core::{parser::smart_split, Context, Node, NodeFactory, NodeList, OutputStream, Parser, TemplateError};

use super::parse_body;

/// Parses `{% autoescape on|off %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoescapeFactory;

impl NodeFactory for AutoescapeFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        if words.len() != 2 {
            return Err(TemplateError::syntax("autoescape takes two arguments."));
        }

        let enabled = match words[1].as_str() {
            "on" => true,
            "off" => false,
            _ => return Err(TemplateError::syntax("argument must be 'on' or 'off'")),
        };

        let body = parse_body(parser, "endautoescape")?;
        Ok(Box::new(AutoescapeNode { enabled, body }))
    }
}

/// Renders its body with autoescaping switched on or off, restoring the previous setting afterwards.
#[derive(Debug)]
pub struct AutoescapeNode {
    enabled: bool,
    body: NodeList,
}

impl Node for AutoescapeNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let previous = ctx.autoescape();
        ctx.set_autoescape(self.enabled);
        let result = self.body.render(out, ctx);
        ctx.set_autoescape(previous);
        result
    }
}
