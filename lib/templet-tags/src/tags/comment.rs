use templet_core::{Context, Node, NodeFactory, OutputStream, Parser, TemplateError};

/// Parses `{% comment %}`, discarding everything up to `{% endcomment %}` unparsed.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommentFactory;

impl NodeFactory for CommentFactory {
    fn get_node(&self, _tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        parser.skip_past("endcomment")?;
        Ok(Box::new(CommentNode))
    }
}

#[derive(Debug)]
struct CommentNode;

impl Node for CommentNode {
    fn render(&self, _out: &mut OutputStream<'_>, _ctx: &mut Context) -> Result<(), TemplateError> {
        Ok(())
    }
}
