use templet_core::{parser::smart_split, Context, Node, NodeFactory, OutputStream, Parser, TemplateError};

/// Parses `{% load lib1 lib2 %}`, making the named libraries available to the rest of the template.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadFactory;

impl NodeFactory for LoadFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        if words.len() < 2 {
            return Err(TemplateError::syntax("'load' tag requires at least one argument"));
        }

        for name in &words[1..] {
            parser.load_lib(name)?;
        }
        Ok(Box::new(LoadNode))
    }
}

/// The result of a `load` tag. Renders nothing.
#[derive(Debug)]
pub struct LoadNode;

impl Node for LoadNode {
    fn render(&self, _out: &mut OutputStream<'_>, _ctx: &mut Context) -> Result<(), TemplateError> {
        Ok(())
    }
}
