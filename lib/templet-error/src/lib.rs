//! Error plumbing shared by the templet crates that touch the outside world.
//!
//! Template compilation and rendering use the typed errors in `templet-core`. Anything that reads files, parses
//! configuration or otherwise talks to the host goes through [`GenericError`] instead, so that callers can attach
//! context to an error without defining a new variant for every I/O call site.
#![deny(warnings)]
#![deny(missing_docs)]

use std::fmt::Display;

/// An opaque error carrying a chain of context messages.
pub type GenericError = anyhow::Error;

/// Builds a [`GenericError`].
///
/// Accepts a string literal, a format string with arguments, or any value that implements both `Debug` and
/// `Display`. Passing an existing `std::error::Error` keeps its source chain.
#[macro_export]
macro_rules! generic_error {
    ($msg:literal $(,)?) => { $crate::_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::_anyhow!($fmt, $($arg)*) };
}

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;

mod sealed {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

/// Attaches context to a fallible result, converting it into a [`GenericError`].
///
/// Named differently from `anyhow::Context` so it can be imported next to `snafu::ResultExt` without clashing.
pub trait ErrorContext<T, E>: sealed::Sealed {
    /// Wraps the error with `context`.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error with the context returned by `f`, which only runs on the error path.
    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        anyhow::Context::context(self, context)
    }

    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        anyhow::Context::with_context(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_wraps_message() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.error_context("Failed to open template.").unwrap_err();

        assert_eq!(err.to_string(), "Failed to open template.");
        assert_eq!(err.root_cause().to_string(), "gone");
    }

    #[test]
    fn test_with_error_context_is_lazy() {
        let ok: Result<u8, std::io::Error> = Ok(1);
        let value = ok
            .with_error_context(|| -> String { panic!("context must not be built on success") })
            .unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_generic_error_macro_formats() {
        let err = generic_error!("missing template '{}'", "base.html");
        assert_eq!(err.to_string(), "missing template 'base.html'");
    }
}
