//! Variable scopes and per-render state.

use std::{any::Any, collections::HashMap, fmt};

use indexmap::IndexMap;
use tracing::warn;

use crate::{node::NodeId, value::Value};

/// A single scope of named values.
pub type Scope = IndexMap<String, Value>;

/// A media file referenced during a render pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExternalMedia {
    /// Base URI the file was found under.
    pub uri: String,

    /// File name relative to `uri`.
    pub file_name: String,
}

/// Per-node state that lives for one template render.
///
/// Each template render pushes a frame on entry and pops it on exit, so nodes of a template rendered inside another
/// template never see each other's state.
#[derive(Default)]
pub struct RenderContext {
    frames: Vec<HashMap<NodeId, Box<dyn Any + Send>>>,
}

impl RenderContext {
    /// Starts a new frame.
    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Discards the current frame.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Returns the state stored for `node` in the current frame, creating it with `Default` if absent.
    ///
    /// If the node previously stored a different type, the stored value is replaced.
    pub fn data_mut<T>(&mut self, node: NodeId) -> &mut T
    where
        T: Any + Default + Send,
    {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        let top = self.frames.len() - 1;
        let frame = &mut self.frames[top];
        let slot = frame.entry(node).or_insert_with(|| Box::new(T::default()));
        if !slot.is::<T>() {
            *slot = Box::new(T::default());
        }
        slot.downcast_mut::<T>().expect("slot holds a T")
    }

    /// Returns `true` if the current frame holds state for `node`.
    pub fn contains(&self, node: NodeId) -> bool {
        self.frames.last().is_some_and(|frame| frame.contains_key(&node))
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext").field("frames", &self.frames.len()).finish()
    }
}

/// The variables and render state for a single render call.
///
/// Scopes form a stack: lookups search from the most recently pushed scope down to the initial one, and inserts go
/// into the topmost scope. Tags that push a scope must pop it again before returning; [`Context::scoped`] does both.
#[derive(Debug)]
pub struct Context {
    scopes: Vec<Scope>,
    autoescape: bool,
    mutating: bool,
    external_media: Vec<ExternalMedia>,
    render_context: RenderContext,
}

impl Context {
    /// Creates a context with an empty initial scope.
    pub fn new() -> Self {
        Self::from_scope(Scope::new())
    }

    /// Creates a context whose initial scope is `scope`.
    pub fn from_scope(scope: Scope) -> Self {
        Self {
            scopes: vec![scope],
            autoescape: true,
            mutating: false,
            external_media: Vec::new(),
            render_context: RenderContext::default(),
        }
    }

    /// Creates a context from a mapping value. Any other kind of value gives an empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Map(entries) => Self::from_scope(entries),
            _ => Self::new(),
        }
    }

    /// Pushes a new, empty scope.
    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pops the topmost scope.
    ///
    /// The initial scope is never removed; popping it is a bug in the calling tag and is logged.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        } else {
            warn!("Attempted to pop the initial context scope. Ignoring.");
        }
    }

    /// Runs `f` inside a freshly pushed scope, popping it afterwards.
    pub fn scoped<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push();
        let result = f(self);
        self.pop();
        result
    }

    /// Inserts a value into the topmost scope.
    pub fn insert<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value.into());
        }
    }

    /// Looks up `name`, searching from the topmost scope down.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Returns the number of scopes on the stack, including the initial one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Returns whether variable output is escaped unless marked safe.
    pub fn autoescape(&self) -> bool {
        self.autoescape
    }

    /// Sets whether variable output is escaped unless marked safe.
    pub fn set_autoescape(&mut self, autoescape: bool) {
        self.autoescape = autoescape;
    }

    /// Returns whether node lists render in the incremental, tree-editing mode.
    pub fn is_mutating(&self) -> bool {
        self.mutating
    }

    /// Sets whether node lists render in the incremental, tree-editing mode.
    pub fn set_mutating(&mut self, mutating: bool) {
        self.mutating = mutating;
    }

    /// Records a media file referenced during this render pass.
    pub fn add_external_media<U, F>(&mut self, uri: U, file_name: F)
    where
        U: Into<String>,
        F: Into<String>,
    {
        self.external_media.push(ExternalMedia {
            uri: uri.into(),
            file_name: file_name.into(),
        });
    }

    /// Returns the media files recorded during this render pass, in the order they were referenced.
    pub fn external_media(&self) -> &[ExternalMedia] {
        &self.external_media
    }

    /// Forgets all recorded media files.
    pub fn clear_external_media(&mut self) {
        self.external_media.clear();
    }

    /// Returns the per-node render state.
    pub fn render_context(&mut self) -> &mut RenderContext {
        &mut self.render_context
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_scope(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
