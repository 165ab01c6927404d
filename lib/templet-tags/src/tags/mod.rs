//! Tags of the `default_tags` library.

use templet_core::{lexer::Token, NodeList, Parser, TemplateError};

mod autoescape;
mod comment;
mod conditional;
mod cycle;
mod filter;
mod firstof;
mod for_loop;
mod ifequal;
mod load;
mod media_finder;
mod spaceless;
mod templatetag;
mod with;

pub use self::autoescape::{AutoescapeFactory, AutoescapeNode};
pub use self::comment::CommentFactory;
pub use self::conditional::{IfFactory, IfNode};
pub use self::cycle::{CycleFactory, CycleNode};
pub use self::filter::{FilterFactory, FilterNode};
pub use self::firstof::{FirstOfFactory, FirstOfNode};
pub use self::for_loop::{ForFactory, ForNode};
pub use self::ifequal::{IfEqualFactory, IfEqualNode};
pub use self::load::{LoadFactory, LoadNode};
pub use self::media_finder::{MediaFinderFactory, MediaFinderNode};
pub use self::spaceless::{SpacelessFactory, SpacelessNode};
pub use self::templatetag::{TemplateTagFactory, TemplateTagNode};
pub use self::with::{WithFactory, WithNode};

/// Parses a block body up to one of `stop_at`, consuming the tag that ended it.
///
/// Returns the body and the closing tag.
pub(crate) fn parse_until(parser: &mut Parser<'_>, stop_at: &[&str]) -> Result<(NodeList, Token), TemplateError> {
    let body = parser.parse(stop_at)?;
    let closing = parser.take_next_token().ok_or_else(|| TemplateError::UnclosedBlockTag {
        expected: stop_at.iter().map(|s| s.to_string()).collect(),
    })?;
    Ok((body, closing))
}

/// Parses a block body up to `end_tag`, consuming the end tag.
pub(crate) fn parse_body(parser: &mut Parser<'_>, end_tag: &str) -> Result<NodeList, TemplateError> {
    parse_until(parser, &[end_tag]).map(|(body, _)| body)
}
