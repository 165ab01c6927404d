use templet_core::{
    parser::smart_split, Context, FilterExpression, Node, NodeFactory, NodeList, OutputStream, Parser, TemplateError,
};

use super::parse_until;

/// Parses `{% ifequal a b %}` or `{% ifnotequal a b %}`, with an optional `{% else %}`.
#[derive(Clone, Copy, Debug)]
pub struct IfEqualFactory {
    negate: bool,
}

impl IfEqualFactory {
    /// Creates the factory for `ifequal`.
    pub const fn equal() -> Self {
        Self { negate: false }
    }

    /// Creates the factory for `ifnotequal`.
    pub const fn not_equal() -> Self {
        Self { negate: true }
    }
}

impl NodeFactory for IfEqualFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        if words.len() != 3 {
            let command = words.first().map(String::as_str).unwrap_or("ifequal");
            return Err(TemplateError::syntax(format!("{} tag takes two arguments.", command)));
        }

        let lhs = FilterExpression::parse(&words[1], parser)?;
        let rhs = FilterExpression::parse(&words[2], parser)?;
        let end_tag = format!("end{}", words[0]);

        let (when_true, closing) = parse_until(parser, &["else", end_tag.as_str()])?;
        let when_false = if closing.command() == "else" {
            parse_until(parser, &[end_tag.as_str()])?.0
        } else {
            NodeList::new()
        };

        Ok(Box::new(IfEqualNode {
            lhs,
            rhs,
            negate: self.negate,
            when_true,
            when_false,
        }))
    }
}

/// Chooses between two bodies by comparing two expressions for equality.
#[derive(Debug)]
pub struct IfEqualNode {
    lhs: FilterExpression,
    rhs: FilterExpression,
    negate: bool,
    when_true: NodeList,
    when_false: NodeList,
}

impl Node for IfEqualNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let equal = self.lhs.resolve(ctx).equals(&self.rhs.resolve(ctx));
        if equal != self.negate {
            self.when_true.render(out, ctx)
        } else {
            self.when_false.render(out, ctx)
        }
    }
}
