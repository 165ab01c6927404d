use std::{collections::HashMap, sync::Arc};

use templet_core::{
    node::write_value, parser::smart_split, Context, FilterExpression, Node, NodeFactory, NodeId, OutputStream,
    Parser, TemplateError,
};

// Named cycles declared so far in the template being parsed.
#[derive(Default)]
struct NamedCycles(HashMap<String, CycleNode>);

/// Parses `{% cycle a b c %}`, `{% cycle a b c as name %}`, the comma form `{% cycle a,b,c %}` and references to a
/// named cycle, `{% cycle name %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleFactory;

impl NodeFactory for CycleFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let mut words = smart_split(tag_content);
        if words.len() < 2 {
            return Err(TemplateError::syntax("'cycle' tag requires at least two arguments"));
        }

        // `cycle a,b,c` is shorthand for `cycle "a" "b" "c"`.
        if words[1].contains(',') {
            let mut rest = words.split_off(1).into_iter();
            if let Some(items) = rest.next() {
                words.extend(items.split(',').map(|item| format!("\"{}\"", item)));
            }
            words.extend(rest);
        }

        if words.len() == 2 {
            let name = &words[1];
            let cycles = &parser.state_mut::<NamedCycles>().0;
            if cycles.is_empty() {
                return Err(TemplateError::syntax(format!(
                    "No named cycles in template. '{}' is not defined",
                    name
                )));
            }
            let node = cycles
                .get(name)
                .cloned()
                .ok_or_else(|| TemplateError::syntax(format!("Node not found: {}", name)))?;
            return Ok(Box::new(node));
        }

        let count = words.len();
        let (sources, name) = if count > 4 && words[count - 2] == "as" {
            (&words[1..count - 2], Some(words[count - 1].clone()))
        } else {
            (&words[1..], None)
        };

        let values = sources
            .iter()
            .map(|source| FilterExpression::parse(source, parser))
            .collect::<Result<Vec<_>, _>>()?;

        let node = CycleNode {
            id: parser.next_node_id(),
            values: Arc::new(values),
            name,
        };
        if let Some(name) = &node.name {
            parser.state_mut::<NamedCycles>().0.insert(name.clone(), node.clone());
        }
        Ok(Box::new(node))
    }
}

/// Outputs the next of its values each time it is rendered, wrapping around at the end.
///
/// The position is kept per template render, so every render starts from the first value. References to a named
/// cycle share its position. A named cycle also stores its current value in the context under its name.
#[derive(Clone, Debug)]
pub struct CycleNode {
    id: NodeId,
    values: Arc<Vec<FilterExpression>>,
    name: Option<String>,
}

impl Node for CycleNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let position = ctx.render_context().data_mut::<usize>(self.id);
        let index = *position % self.values.len();
        *position = index + 1;

        let value = self.values[index].resolve(ctx);
        if let Some(name) = &self.name {
            ctx.insert(name.as_str(), value.clone());
        }
        write_value(&value, out, ctx)
    }
}
