//! Building node trees from tokens.

use std::{
    any::{Any, TypeId},
    collections::{HashMap, VecDeque},
    fmt,
    sync::{Arc, OnceLock},
};

use regex::Regex;
use tracing::{debug, warn};

use crate::{
    engine::Engine,
    error::TemplateError,
    filter::Filter,
    filter_expression::FilterExpression,
    lexer::{Token, TokenKind},
    library::NodeFactory,
    node::{NodeId, NodeList, TextNode, VariableNode},
};

/// Builds a node tree from a token stream.
///
/// The parser consumes its tokens front to back. Block tags are dispatched to the [`NodeFactory`] registered for
/// their command word; factories for paired tags call back into [`Parser::parse`] with their terminators, so nesting
/// depth follows call depth.
pub struct Parser<'e> {
    engine: &'e Engine,
    tokens: VecDeque<Token>,
    factories: HashMap<String, Arc<dyn NodeFactory>>,
    filters: HashMap<String, Arc<dyn Filter>>,
    recovered: Option<TemplateError>,
    next_id: u32,
    state: HashMap<TypeId, Box<dyn Any>>,
    line: usize,
}

impl<'e> Parser<'e> {
    /// Creates a parser over `tokens` with the engine's default libraries loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if a default library is not registered with the engine.
    pub fn new(engine: &'e Engine, tokens: Vec<Token>) -> Result<Self, TemplateError> {
        let mut parser = Self {
            engine,
            tokens: tokens.into(),
            factories: HashMap::new(),
            filters: HashMap::new(),
            recovered: None,
            next_id: 0,
            state: HashMap::new(),
            line: 1,
        };

        for name in engine.default_libraries() {
            parser.load_lib(name)?;
        }

        Ok(parser)
    }

    /// Returns the engine this parser was created for.
    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// Makes the tags and filters of the named library available to the rest of the template.
    ///
    /// Later libraries override earlier ones on name collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if no library with that name is registered.
    pub fn load_lib(&mut self, name: &str) -> Result<(), TemplateError> {
        let library = self.engine.library(name).ok_or_else(|| TemplateError::UnknownLibrary {
            name: name.to_string(),
        })?;

        let factories = library.node_factories();
        let filters = library.filters();
        debug!(library = name, tags = factories.len(), filters = filters.len(), "Loaded tag library.");

        self.factories.extend(factories);
        self.filters.extend(filters);
        Ok(())
    }

    /// Returns the filter registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no loaded library provides the filter.
    pub fn get_filter(&self, name: &str) -> Result<Arc<dyn Filter>, TemplateError> {
        self.filters
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownFilter { name: name.to_string() })
    }

    /// Parses tokens into nodes until a block tag whose command is in `stop_at`, or the end of input.
    ///
    /// The stopping tag is left unconsumed so the caller can inspect it with [`take_next_token`][Self::take_next_token].
    /// An unknown block tag is recorded, skipped, and parsing continues; the first such error is available from
    /// [`take_recovered_error`][Self::take_recovered_error].
    ///
    /// # Errors
    ///
    /// Returns an error for an empty variable or block tag, an invalid variable expression, a tag factory error, a
    /// tag that must come first appearing after another tag, or end of input while `stop_at` is not empty.
    pub fn parse(&mut self, stop_at: &[&str]) -> Result<NodeList, TemplateError> {
        let mut list = NodeList::new();

        while let Some(token) = self.tokens.pop_front() {
            self.line = token.line;
            match token.kind {
                TokenKind::Text => list.push(Box::new(TextNode::new(token.content))),
                TokenKind::Comment => {}
                TokenKind::Variable => {
                    if token.content.is_empty() {
                        let near = self
                            .tokens
                            .front()
                            .map(|next| next.content.chars().take(20).collect())
                            .unwrap_or_default();
                        return Err(TemplateError::EmptyVariable { near, line: token.line });
                    }

                    let expr = FilterExpression::parse(&token.content, self).map_err(|e| e.at_line(token.line))?;
                    list.push(Box::new(VariableNode::new(expr)));
                }
                TokenKind::Block => {
                    let command = token.command().to_string();
                    if command.is_empty() {
                        return Err(TemplateError::EmptyBlockTag { line: token.line });
                    }

                    if stop_at.contains(&command.as_str()) {
                        self.tokens.push_front(token);
                        return Ok(list);
                    }

                    let Some(factory) = self.factories.get(&command).cloned() else {
                        warn!(command = %command, line = token.line, "Skipping unknown block tag.");
                        self.recovered.get_or_insert(TemplateError::InvalidBlockTag {
                            command,
                            line: token.line,
                        });
                        continue;
                    };

                    let node = factory
                        .get_node(&token.content, self)
                        .map_err(|e| e.at_line(token.line))?;
                    if node.must_be_first() && list.contains_non_text() {
                        return Err(TemplateError::syntax(format!(
                            "'{}' must be the first tag in the template",
                            command
                        ))
                        .at_line(token.line));
                    }
                    list.push(node);
                }
            }
        }

        if !stop_at.is_empty() {
            return Err(TemplateError::UnclosedBlockTag {
                expected: stop_at.iter().map(|s| s.to_string()).collect(),
            });
        }

        Ok(list)
    }

    /// Discards tokens up to and including the block tag whose command is `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends first.
    pub fn skip_past(&mut self, tag: &str) -> Result<(), TemplateError> {
        while let Some(token) = self.tokens.pop_front() {
            if token.kind == TokenKind::Block && token.command() == tag {
                return Ok(());
            }
        }
        Err(TemplateError::UnclosedBlockTag {
            expected: vec![tag.to_string()],
        })
    }

    /// Returns `true` if any tokens remain.
    pub fn has_next_token(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Removes and returns the next token.
    pub fn take_next_token(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    /// Discards the next token, if any.
    pub fn remove_next_token(&mut self) {
        self.tokens.pop_front();
    }

    /// Pushes `token` back onto the front of the stream.
    pub fn prepend_token(&mut self, token: Token) {
        self.tokens.push_front(token);
    }

    /// Returns the line of the most recently consumed token.
    pub fn current_line(&self) -> usize {
        self.line
    }

    /// Allocates an identifier for a node that keeps per-render state.
    pub fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Returns parse-time state shared between tag factories for this template, keyed by type.
    pub fn state_mut<T>(&mut self) -> &mut T
    where
        T: Any + Default,
    {
        self.state
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .expect("state is keyed by its own type id")
    }

    /// Takes the first recoverable error recorded while parsing, if any.
    pub fn take_recovered_error(&mut self) -> Option<TemplateError> {
        self.recovered.take()
    }
}

impl fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("remaining_tokens", &self.tokens.len())
            .field("tags", &self.factories.len())
            .field("filters", &self.filters.len())
            .field("line", &self.line)
            .finish()
    }
}

fn smart_split_regex() -> &'static Regex {
    static SPLIT_RE: OnceLock<Regex> = OnceLock::new();
    SPLIT_RE.get_or_init(|| {
        Regex::new(r#"(?:[^\s'"]*(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')[^\s'"]*)+|\S+"#)
            .expect("smart split pattern should be valid")
    })
}

/// Splits tag content on whitespace, keeping quoted strings (and any text attached to them) together.
///
/// `with name="a b"|upper as x` gives `with`, `name="a b"|upper`, `as` and `x`.
pub fn smart_split(content: &str) -> Vec<String> {
    smart_split_regex()
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}
