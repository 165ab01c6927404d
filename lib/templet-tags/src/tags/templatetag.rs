use templet_core::{parser::smart_split, Context, Node, NodeFactory, OutputStream, Parser, TemplateError};

fn delimiter(keyword: &str) -> Option<&'static str> {
    let delimiter = match keyword {
        "openblock" => "{%",
        "closeblock" => "%}",
        "openvariable" => "{{",
        "closevariable" => "}}",
        "openbrace" => "{",
        "closebrace" => "}",
        "opencomment" => "{#",
        "closecomment" => "#}",
        _ => return None,
    };
    Some(delimiter)
}

/// Parses `{% templatetag keyword %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateTagFactory;

impl NodeFactory for TemplateTagFactory {
    fn get_node(&self, tag_content: &str, _parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        if words.len() != 2 {
            return Err(TemplateError::syntax("'templatetag' statement takes one argument"));
        }

        let delimiter = delimiter(&words[1]).ok_or_else(|| TemplateError::syntax("Not a template tag"))?;
        Ok(Box::new(TemplateTagNode { delimiter }))
    }
}

/// Outputs one of the template syntax delimiters literally.
#[derive(Debug)]
pub struct TemplateTagNode {
    delimiter: &'static str,
}

impl Node for TemplateTagNode {
    fn render(&self, out: &mut OutputStream<'_>, _ctx: &mut Context) -> Result<(), TemplateError> {
        out.write_raw(self.delimiter)?;
        Ok(())
    }
}
