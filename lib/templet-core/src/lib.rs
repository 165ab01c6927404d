//! Template compilation and rendering.
//!
//! Source text is split into tokens by the [lexer], parsed into a tree of [nodes][node] by the [`Parser`], and
//! rendered against a [`Context`] into an [`OutputStream`]. Tags and filters are not built in: they come from
//! [tag libraries][TagLibrary] registered with the [`Engine`].
#![deny(warnings)]
#![deny(missing_docs)]

pub mod context;
pub mod engine;
pub mod error;
pub mod filter;
pub mod filter_expression;
pub mod if_expr;
pub mod lexer;
pub mod library;
pub mod loader;
pub mod node;
pub mod output;
pub mod parser;
pub mod safe_string;
pub mod template;
pub mod value;
pub mod variable;

pub use self::{
    context::Context,
    engine::{Engine, EngineConfiguration},
    error::{ErrorKind, TemplateError},
    filter::Filter,
    filter_expression::FilterExpression,
    library::{NodeFactory, TagLibrary},
    node::{Node, NodeId, NodeList},
    output::OutputStream,
    parser::Parser,
    safe_string::SafeString,
    template::{MutableTemplate, Template},
    value::{Object, Value},
};
