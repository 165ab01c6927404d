//! Compiled template nodes.

use crate::{
    context::Context, error::TemplateError, filter_expression::FilterExpression, output::OutputStream, value::Value,
};

mod list;
pub use self::list::NodeList;

/// Identifier assigned to a node by the parser that created it.
///
/// Unique within a single template. Nodes that need per-render state use it as their key into the
/// [`RenderContext`][crate::context::RenderContext].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(crate) u32);

/// An element of a compiled template.
///
/// Nodes are immutable once parsed and may be rendered any number of times, from any number of threads, against
/// different contexts.
pub trait Node: Send + Sync {
    /// Writes the node's output to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be rendered against `ctx`, or if `out` refuses a write. Rendering stops at
    /// the first error.
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError>;

    /// Returns `true` if the node must survive a mutable render pass rather than being folded into the text before
    /// it.
    fn is_persistent(&self) -> bool {
        self.is_repeatable()
    }

    /// Returns `true` if the node keeps rendering on every mutable pass and accumulates its output into the text
    /// before it.
    fn is_repeatable(&self) -> bool {
        false
    }

    /// Returns `true` if the node is only allowed before any other non-text node.
    ///
    /// None of the built-in tags use this. It exists for plugin tags that must open a template, such as an
    /// inheritance tag naming the parent template; the parser rejects them anywhere else.
    fn must_be_first(&self) -> bool {
        false
    }

    /// Returns the node as a text node, if it is one.
    fn as_text(&self) -> Option<&TextNode> {
        None
    }

    /// Returns the node as a mutable text node, if it is one.
    fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        None
    }
}

/// Literal text copied to the output unchanged.
#[derive(Clone, Debug, Default)]
pub struct TextNode {
    content: String,
}

impl TextNode {
    /// Creates a text node.
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Returns the text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Appends `s` to the text.
    pub fn append_content(&mut self, s: &str) {
        self.content.push_str(s);
    }
}

impl Node for TextNode {
    fn render(&self, out: &mut OutputStream<'_>, _ctx: &mut Context) -> Result<(), TemplateError> {
        out.write_raw(&self.content)?;
        Ok(())
    }

    fn as_text(&self) -> Option<&TextNode> {
        Some(self)
    }

    fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        Some(self)
    }
}

/// A `{{ ... }}` tag.
#[derive(Debug)]
pub struct VariableNode {
    expr: FilterExpression,
}

impl VariableNode {
    /// Creates a node that outputs `expr`.
    pub fn new(expr: FilterExpression) -> Self {
        Self { expr }
    }

    /// Returns the expression this node outputs.
    pub fn expression(&self) -> &FilterExpression {
        &self.expr
    }
}

impl Node for VariableNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let value = self.expr.resolve(ctx);
        write_value(&value, out, ctx)
    }
}

/// Writes `value` the way a variable tag would.
///
/// Unsafe strings are escaped when autoescaping is on, and whatever escaping the value already carries is applied
/// regardless.
pub fn write_value(value: &Value, out: &mut OutputStream<'_>, ctx: &Context) -> Result<(), TemplateError> {
    let mut s = value.to_safe_string();
    if ctx.autoescape() && !s.is_safe() {
        s.set_needs_escape(true);
    }
    out.write_safe_string(&s)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safe_string::SafeString;

    fn write(value: Value, autoescape: bool) -> String {
        let mut ctx = Context::new();
        ctx.set_autoescape(autoescape);

        let mut out = String::new();
        let mut stream = OutputStream::new(&mut out);
        write_value(&value, &mut stream, &ctx).unwrap();
        out
    }

    #[test]
    fn test_text_node_is_verbatim() {
        let node = TextNode::new("<p>{{ not a tag }}</p>");
        let mut out = String::new();
        node.render(&mut OutputStream::new(&mut out), &mut Context::new()).unwrap();
        assert_eq!(out, "<p>{{ not a tag }}</p>");
    }

    #[test]
    fn test_autoescape_applies_to_unsafe_strings() {
        assert_eq!(write(Value::from("<b>"), true), "&lt;b&gt;");
        assert_eq!(write(Value::from("<b>"), false), "<b>");
        assert_eq!(write(Value::String(SafeString::safe("<b>")), true), "<b>");
    }

    #[test]
    fn test_explicit_escaping_survives_autoescape_off() {
        let value = Value::String(SafeString::new("<b>").mark_for_escaping());
        assert_eq!(write(value, false), "&lt;b&gt;");
    }

    #[test]
    fn test_invalid_renders_empty() {
        assert_eq!(write(Value::Invalid, true), "");
    }

    #[test]
    fn test_default_flags() {
        let node = TextNode::new("x");
        assert!(!node.is_persistent());
        assert!(!node.is_repeatable());
        assert!(!node.must_be_first());
    }
}
