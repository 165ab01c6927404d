use std::sync::OnceLock;

use regex::Regex;
use templet_core::{Context, Node, NodeFactory, NodeList, OutputStream, Parser, SafeString, TemplateError};

use super::parse_body;

fn between_tags_regex() -> &'static Regex {
    static BETWEEN_TAGS_RE: OnceLock<Regex> = OnceLock::new();
    BETWEEN_TAGS_RE.get_or_init(|| Regex::new(r">\s+<").expect("between-tags pattern should be valid"))
}

/// Removes whitespace between HTML tags, and around the whole output.
pub fn strip_spaces_between_tags(input: &str) -> String {
    between_tags_regex().replace_all(input.trim(), "><").into_owned()
}

/// Parses `{% spaceless %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpacelessFactory;

impl NodeFactory for SpacelessFactory {
    fn get_node(&self, _tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let body = parse_body(parser, "endspaceless")?;
        Ok(Box::new(SpacelessNode { body }))
    }
}

/// Renders its body with the whitespace between tags removed.
#[derive(Debug)]
pub struct SpacelessNode {
    body: NodeList,
}

impl Node for SpacelessNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let mut output = String::new();
        self.body.render(&mut out.fork(&mut output), ctx)?;
        out.write_safe_string(&SafeString::safe(strip_spaces_between_tags(&output)))?;
        Ok(())
    }
}
