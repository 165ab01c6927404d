//! Compiled templates.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::{
    context::Context,
    engine::Engine,
    error::{ErrorKind, TemplateError},
    node::NodeList,
    output::OutputStream,
    parser::Parser,
};

fn compile(engine: &Engine, source: &str, name: &str) -> (NodeList, Option<TemplateError>) {
    let tokens = engine.tokenize(source);
    let result = Parser::new(engine, tokens).and_then(|mut parser| {
        let nodes = parser.parse(&[])?;
        Ok((nodes, parser.take_recovered_error()))
    });

    match result {
        Ok((nodes, recovered)) => {
            if let Some(e) = &recovered {
                warn!(template = name, error = %e, "Template compiled with errors.");
            } else {
                debug!(template = name, nodes = nodes.len(), "Compiled template.");
            }
            (nodes, recovered)
        }
        Err(e) => {
            warn!(template = name, error = %e, "Failed to compile template.");
            (NodeList::new(), Some(e))
        }
    }
}

// Runs a render with the per-render state a template owns set up and torn down around it.
fn render_with<F>(name: &str, ctx: &mut Context, render: F) -> Result<(), TemplateError>
where
    F: FnOnce(&mut Context) -> Result<(), TemplateError>,
{
    ctx.clear_external_media();
    ctx.render_context().push();
    let result = render(ctx);
    ctx.render_context().pop();

    if let Err(e) = &result {
        debug!(template = name, error = %e, "Failed to render template.");
    }
    result
}

/// A compiled template.
///
/// Compilation never fails outright: a template that could not be compiled stores the error and renders as empty
/// output. A template whose only problem was an unknown block tag keeps everything else it parsed and still renders.
/// Rendering does not modify the template, so one template can be rendered from many threads at once, each with its
/// own [`Context`].
#[derive(Debug)]
pub struct Template {
    name: String,
    nodes: NodeList,
    compile_error: Option<TemplateError>,
    render_error: Mutex<Option<TemplateError>>,
}

impl Template {
    pub(crate) fn compile(engine: &Engine, source: &str, name: &str) -> Self {
        let (nodes, compile_error) = compile(engine, source, name);
        Self {
            name: name.to_string(),
            nodes,
            compile_error,
            render_error: Mutex::new(None),
        }
    }

    /// Returns the name the template was compiled under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled node tree.
    pub fn nodes(&self) -> &NodeList {
        &self.nodes
    }

    /// Renders the template to `out`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a node. Output written before the error stays written.
    pub fn render_to(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let result = render_with(&self.name, ctx, |ctx| self.nodes.render(out, ctx));
        if let Ok(mut slot) = self.render_error.lock() {
            *slot = result.as_ref().err().cloned();
        }
        result
    }

    /// Renders the template to a string.
    ///
    /// A render error is recorded and reported by [`error`][Self::error]; the output up to the error is returned.
    pub fn render(&self, ctx: &mut Context) -> String {
        let mut output = String::new();
        let _ = self.render_to(&mut OutputStream::new(&mut output), ctx);
        output
    }

    /// Returns the kind of the compile error, or else of the error raised by the most recent render.
    pub fn error(&self) -> Option<ErrorKind> {
        if let Some(e) = &self.compile_error {
            return Some(e.kind());
        }
        self.render_error
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(TemplateError::kind))
    }

    /// Returns the message of the error reported by [`error`][Self::error], or an empty string.
    pub fn error_string(&self) -> String {
        if let Some(e) = &self.compile_error {
            return e.to_string();
        }
        self.render_error
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(ToString::to_string))
            .unwrap_or_default()
    }

    /// Returns the compile error, if compilation failed or skipped an unknown tag.
    pub fn compile_error(&self) -> Option<&TemplateError> {
        self.compile_error.as_ref()
    }
}

/// A compiled template that folds its static output into text as it renders.
///
/// Every render runs the node list in mutating mode: output of nodes that are neither persistent nor repeatable is
/// folded into the text node before them and the nodes are dropped, so later renders only re-evaluate what is left.
/// Rendering edits the tree, so it takes `&mut self`.
#[derive(Debug)]
pub struct MutableTemplate {
    name: String,
    nodes: NodeList,
    compile_error: Option<TemplateError>,
    render_error: Option<TemplateError>,
}

impl MutableTemplate {
    pub(crate) fn compile(engine: &Engine, source: &str, name: &str) -> Self {
        let (nodes, compile_error) = compile(engine, source, name);
        Self {
            name: name.to_string(),
            nodes,
            compile_error,
            render_error: None,
        }
    }

    /// Returns the name the template was compiled under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of nodes left at the top level of the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Renders the template to `out`, folding static output into text.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a node. Output written before the error stays written.
    pub fn render_to(&mut self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        let was_mutating = ctx.is_mutating();
        ctx.set_mutating(true);
        let nodes = &mut self.nodes;
        let result = render_with(&self.name, ctx, |ctx| nodes.render_mut(out, ctx));
        ctx.set_mutating(was_mutating);

        self.render_error = result.as_ref().err().cloned();
        result
    }

    /// Renders the template to a string, recording any render error.
    pub fn render(&mut self, ctx: &mut Context) -> String {
        let mut output = String::new();
        let _ = self.render_to(&mut OutputStream::new(&mut output), ctx);
        output
    }

    /// Returns the kind of the compile error, or else of the error raised by the most recent render.
    pub fn error(&self) -> Option<ErrorKind> {
        self.compile_error
            .as_ref()
            .or(self.render_error.as_ref())
            .map(TemplateError::kind)
    }

    /// Returns the message of the error reported by [`error`][Self::error], or an empty string.
    pub fn error_string(&self) -> String {
        self.compile_error
            .as_ref()
            .or(self.render_error.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}
