use templet_core::{
    Context, FilterExpression, Node, NodeFactory, NodeList, OutputStream, Parser, SafeString, TemplateError,
};

use super::parse_body;

const BODY_VAR: &str = "var";

/// Parses `{% filter chain %}`, such as `{% filter lower|cut:" " %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterFactory;

impl NodeFactory for FilterFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let chain = tag_content
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or_default();
        if chain.is_empty() {
            return Err(TemplateError::syntax("'filter' tag requires a filter chain"));
        }

        let expr = FilterExpression::parse(&format!("{}|{}", BODY_VAR, chain), parser)?;
        if let Some(name) = expr.filter_names().find(|name| matches!(*name, "safe" | "escape")) {
            return Err(TemplateError::syntax(format!(
                "Use the \"autoescape\" tag instead of the '{}' filter.",
                name
            )));
        }

        let body = parse_body(parser, "endfilter")?;
        Ok(Box::new(FilterNode { expr, body }))
    }
}

/// Renders its body and passes the output through a filter chain.
#[derive(Debug)]
pub struct FilterNode {
    expr: FilterExpression,
    body: NodeList,
}

impl Node for FilterNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let mut output = String::new();
        self.body.render(&mut out.fork(&mut output), ctx)?;

        // Variables in the body were escaped as it rendered; the filtered result is written as is.
        let value = ctx.scoped(|ctx| {
            ctx.insert(BODY_VAR, SafeString::safe(output));
            self.expr.resolve(ctx)
        });
        out.write_raw(value.to_safe_string().as_str())?;
        Ok(())
    }
}
