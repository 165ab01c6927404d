//! The filter interface.

use crate::value::Value;

/// A named transformation applied to a resolved value in a filter chain.
///
/// Filters are registered by tag libraries and looked up by name while parsing. The same instance is shared by every
/// expression that uses it and may be called concurrently, so implementations should be stateless.
pub trait Filter: Send + Sync {
    /// Transforms `input`.
    ///
    /// `arg` is the resolved argument when the template supplied one. `autoescape` is the context's autoescape flag
    /// when [`needs_autoescape`][Self::needs_autoescape] returns `true`, and `false` otherwise.
    fn filter(&self, input: &Value, arg: Option<&Value>, autoescape: bool) -> Value;

    /// Returns `true` if the output can be trusted when the input was already safe.
    fn is_safe(&self) -> bool {
        false
    }

    /// Returns `true` if the filter wants the context's autoescape flag.
    fn needs_autoescape(&self) -> bool {
        false
    }
}
