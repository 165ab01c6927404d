use templet_core::{
    node::write_value, parser::smart_split, Context, FilterExpression, Node, NodeFactory, OutputStream, Parser,
    TemplateError,
};

/// Parses `{% firstof a b c %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstOfFactory;

impl NodeFactory for FirstOfFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        if words.len() < 2 {
            return Err(TemplateError::syntax("'firstof' statement requires at least one argument"));
        }

        let candidates = words[1..]
            .iter()
            .map(|word| FilterExpression::parse(word, parser))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(FirstOfNode { candidates }))
    }
}

/// Outputs the first of its arguments that is true, or nothing.
#[derive(Debug)]
pub struct FirstOfNode {
    candidates: Vec<FilterExpression>,
}

impl Node for FirstOfNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        for candidate in &self.candidates {
            let value = candidate.resolve(ctx);
            if value.is_true() {
                return write_value(&value, out, ctx);
            }
        }
        Ok(())
    }
}
