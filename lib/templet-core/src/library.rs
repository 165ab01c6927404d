//! Tag and filter libraries.

use std::sync::Arc;

use crate::{error::TemplateError, filter::Filter, node::Node, parser::Parser};

/// Builds a node from a block tag.
///
/// Factories are registered under a tag name by a [`TagLibrary`]. When the parser meets a block tag whose first word
/// is that name, it hands the factory the full tag content and itself, so that block tags can consume their body with
/// [`Parser::parse`] up to their terminators.
pub trait NodeFactory: Send + Sync {
    /// Builds the node for `tag_content`, the trimmed text between `{%` and `%}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag's arguments are malformed or its body fails to parse.
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError>;
}

/// A named bundle of tags and filters.
///
/// Libraries are registered with an [`Engine`][crate::engine::Engine] and loaded into a parser either as defaults or
/// with `{% load %}`.
pub trait TagLibrary: Send + Sync {
    /// Returns the tag factories the library provides, keyed by tag name.
    fn node_factories(&self) -> Vec<(String, Arc<dyn NodeFactory>)> {
        Vec::new()
    }

    /// Returns the filters the library provides, keyed by filter name.
    fn filters(&self) -> Vec<(String, Arc<dyn Filter>)> {
        Vec::new()
    }
}
