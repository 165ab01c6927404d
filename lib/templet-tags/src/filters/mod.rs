//! Filters of the `default_filters` library.

use templet_core::{output::escape_html, SafeString};

mod lists;
mod logic;
mod strings;

pub use self::lists::{FirstFilter, JoinFilter, LastFilter, LengthFilter};
pub use self::logic::{DefaultFilter, DefaultIfNoneFilter, YesNoFilter};
pub use self::strings::{
    AddSlashesFilter, CapFirstFilter, CutFilter, EscapeFilter, ForceEscapeFilter, LowerFilter, SafeFilter,
    TitleFilter, UpperFilter,
};

// Escapes `s` for HTML unless it is already safe.
fn conditional_escape(s: &SafeString) -> String {
    if s.is_safe() {
        s.as_str().to_string()
    } else {
        escape_html(s.as_str())
    }
}
