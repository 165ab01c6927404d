use std::fmt;

use tracing::trace;

use super::{Node, TextNode};
use crate::{context::Context, error::TemplateError, output::OutputStream};

/// An ordered sequence of nodes.
#[derive(Default)]
pub struct NodeList {
    nodes: Vec<Box<dyn Node>>,
    contains_non_text: bool,
}

impl NodeList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    pub fn push(&mut self, node: Box<dyn Node>) {
        if node.as_text().is_none() {
            self.contains_non_text = true;
        }
        self.nodes.push(node);
    }

    /// Appends literal text as a new text node.
    pub fn push_text<S: Into<String>>(&mut self, text: S) {
        self.push(Box::new(TextNode::new(text)));
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the list has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if any node in the list is not a text node.
    pub fn contains_non_text(&self) -> bool {
        self.contains_non_text
    }

    /// Returns an iterator over the nodes.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Node> {
        self.nodes.iter().map(|node| node.as_ref())
    }

    /// Renders every node in order.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first node error.
    pub fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        for node in &self.nodes {
            node.render(out, ctx)?;
        }
        Ok(())
    }

    /// Renders the list, editing it in place when the context is mutating.
    ///
    /// Outside of a mutating context this is identical to [`render`][Self::render].
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first node error. Nodes folded away before the error stay folded.
    pub fn render_mut(&mut self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        if ctx.is_mutating() {
            self.render_folding(out, ctx)
        } else {
            self.render(out, ctx)
        }
    }

    // Each node's output is appended to the nearest surviving text node before it, unless the node is persistent and
    // not repeatable. Non-persistent nodes whose output was absorbed by a non-persistent text node are removed. The
    // last node is never removed, so it is only absorbed when repeatable.
    fn render_folding(&mut self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let count = self.nodes.len();
        let mut rendered = String::new();
        let mut folded = vec![false; count];
        let mut previous: Option<usize> = None;
        let mut result = Ok(());

        for index in 0..count {
            let (persistent, repeatable) = {
                let node = &self.nodes[index];
                (node.is_persistent(), node.is_repeatable())
            };

            let mut buffer = String::new();
            let rendered_ok = self.nodes[index].render(&mut out.fork(&mut buffer), ctx);
            rendered.push_str(&buffer);
            if let Err(e) = rendered_ok {
                result = Err(e);
                break;
            }

            let is_last = index + 1 == count;
            if let Some(prev) = previous {
                let prev_persistent = self.nodes[prev].is_persistent();
                if let Some(text) = self.nodes[prev].as_text_mut() {
                    if repeatable || (!persistent && !is_last) {
                        text.append_content(&buffer);
                        if !is_last && !persistent && !prev_persistent {
                            folded[index] = true;
                            continue;
                        }
                    }
                }
            }
            previous = Some(index);
        }

        let removed = folded.iter().filter(|f| **f).count();
        if removed > 0 {
            let mut flags = folded.into_iter();
            self.nodes.retain(|_| !flags.next().unwrap_or(false));
            self.contains_non_text = self.nodes.iter().any(|node| node.as_text().is_none());
            trace!(removed, remaining = self.nodes.len(), "Folded nodes into preceding text.");
        }

        out.write_raw(&rendered)?;
        result
    }
}

impl fmt::Debug for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeList")
            .field("len", &self.nodes.len())
            .field("contains_non_text", &self.contains_non_text)
            .finish()
    }
}
