use templet_core::{Context, Node, NodeFactory, NodeList, OutputStream, Parser, TemplateError};

use crate::tags::parse_body;

// Renders `body` with mutating mode switched off, restoring the previous mode afterwards.
fn render_static(body: &NodeList, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
    let was_mutating = ctx.is_mutating();
    ctx.set_mutating(false);
    let result = body.render(out, ctx);
    ctx.set_mutating(was_mutating);
    result
}

/// Parses `{% raw %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawFactory;

impl NodeFactory for RawFactory {
    fn get_node(&self, _tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let body = parse_body(parser, "endraw")?;
        Ok(Box::new(RawNode { body }))
    }
}

/// A block that is never folded into text, so its body is evaluated afresh on every render of a mutable template.
#[derive(Debug)]
pub struct RawNode {
    body: NodeList,
}

impl Node for RawNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        render_static(&self.body, out, ctx)
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

/// Parses `{% repeater %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RepeaterFactory;

impl NodeFactory for RepeaterFactory {
    fn get_node(&self, _tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let body = parse_body(parser, "endrepeater")?;
        Ok(Box::new(RepeaterNode { body }))
    }
}

/// A block evaluated on every render of a mutable template, with each render's output kept in the template.
///
/// The output accumulates: a later render emits everything earlier renders produced, followed by its own.
#[derive(Debug)]
pub struct RepeaterNode {
    body: NodeList,
}

impl Node for RepeaterNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        render_static(&self.body, out, ctx)
    }

    fn is_repeatable(&self) -> bool {
        true
    }
}
