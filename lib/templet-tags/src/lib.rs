//! Built-in tag and filter libraries.
//!
//! Three libraries are provided and registered under fixed names by [`register_builtins`]:
//!
//! - `default_tags`: control flow and structural tags such as `if`, `for`, `with` and `cycle`
//! - `default_filters`: string, sequence and logic filters such as `upper`, `join` and `default`
//! - `mutable_tags`: `raw` and `repeater`, for templates rendered in mutating mode
//!
//! An engine built from the default configuration loads the first two into every template. `mutable_tags` has to be
//! loaded explicitly, either with `{% load mutable_tags %}` or by adding it to the default libraries.

#![deny(warnings)]
#![deny(missing_docs)]

use std::sync::Arc;

use templet_core::{Engine, Filter, NodeFactory, TagLibrary};
use tracing::debug;

pub mod filters;
mod mutable;
pub mod tags;

#[cfg(test)]
mod tests;

/// Name of the built-in tag library.
pub const DEFAULT_TAGS: &str = "default_tags";

/// Name of the built-in filter library.
pub const DEFAULT_FILTERS: &str = "default_filters";

/// Name of the library holding the mutable-render tags.
pub const MUTABLE_TAGS: &str = "mutable_tags";

fn factory<F: NodeFactory + 'static>(name: &str, factory: F) -> (String, Arc<dyn NodeFactory>) {
    (name.to_string(), Arc::new(factory))
}

fn filter<F: Filter + 'static>(name: &str, filter: F) -> (String, Arc<dyn Filter>) {
    (name.to_string(), Arc::new(filter))
}

/// The built-in tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTags;

impl TagLibrary for DefaultTags {
    fn node_factories(&self) -> Vec<(String, Arc<dyn NodeFactory>)> {
        use self::tags::*;

        vec![
            factory("autoescape", AutoescapeFactory),
            factory("comment", CommentFactory),
            factory("cycle", CycleFactory),
            factory("filter", FilterFactory),
            factory("firstof", FirstOfFactory),
            factory("for", ForFactory),
            factory("if", IfFactory),
            factory("ifequal", IfEqualFactory::equal()),
            factory("ifnotequal", IfEqualFactory::not_equal()),
            factory("load", LoadFactory),
            factory("media_finder", MediaFinderFactory),
            factory("spaceless", SpacelessFactory),
            factory("templatetag", TemplateTagFactory),
            factory("with", WithFactory),
        ]
    }
}

/// The built-in filters.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFilters;

impl TagLibrary for DefaultFilters {
    fn filters(&self) -> Vec<(String, Arc<dyn Filter>)> {
        use self::filters::*;

        vec![
            filter("addslashes", AddSlashesFilter),
            filter("capfirst", CapFirstFilter),
            filter("cut", CutFilter),
            filter("default", DefaultFilter),
            filter("default_if_none", DefaultIfNoneFilter),
            filter("escape", EscapeFilter),
            filter("first", FirstFilter),
            filter("force_escape", ForceEscapeFilter),
            filter("join", JoinFilter),
            filter("last", LastFilter),
            filter("length", LengthFilter),
            filter("lower", LowerFilter),
            filter("safe", SafeFilter),
            filter("title", TitleFilter),
            filter("upper", UpperFilter),
            filter("yesno", YesNoFilter),
        ]
    }
}

/// Tags that control how a template behaves when rendered in mutating mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct MutableTags;

impl TagLibrary for MutableTags {
    fn node_factories(&self) -> Vec<(String, Arc<dyn NodeFactory>)> {
        vec![
            factory("raw", mutable::RawFactory),
            factory("repeater", mutable::RepeaterFactory),
        ]
    }
}

/// Registers the built-in libraries with `engine` under their standard names.
///
/// Default libraries are left as configured.
pub fn register_builtins(engine: &mut Engine) {
    engine.register_library(DEFAULT_TAGS, Arc::new(DefaultTags));
    engine.register_library(DEFAULT_FILTERS, Arc::new(DefaultFilters));
    engine.register_library(MUTABLE_TAGS, Arc::new(MutableTags));
    debug!(libraries = ?[DEFAULT_TAGS, DEFAULT_FILTERS, MUTABLE_TAGS], "Registered built-in libraries.");
}
