//! Output sinks and escaping.

use std::{fmt, sync::Arc};

use crate::safe_string::SafeString;

/// Escaping strategy applied by an [`OutputStream`].
pub trait Escape: Send + Sync {
    /// Returns `input` escaped for the target format.
    fn escape(&self, input: &str) -> String;
}

/// HTML escaping of `&`, `<`, `>`, `'` and `"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlEscape;

impl Escape for HtmlEscape {
    fn escape(&self, input: &str) -> String {
        escape_html(input)
    }
}

/// Escapes the HTML special characters in `input`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Streaming sink that rendered output is written through.
///
/// Plain writes go straight to the underlying writer. [`SafeString`] writes are escaped when the string is marked as
/// needing it. A stream can be forked into an in-memory buffer sharing the same escaper, for tags that post-process
/// the output of their body.
pub struct OutputStream<'a> {
    sink: &'a mut dyn fmt::Write,
    escaper: Arc<dyn Escape>,
}

impl<'a> OutputStream<'a> {
    /// Creates a stream writing HTML-escaped output to `sink`.
    pub fn new(sink: &'a mut dyn fmt::Write) -> Self {
        Self::with_escaper(sink, Arc::new(HtmlEscape))
    }

    /// Creates a stream using a custom escaper.
    pub fn with_escaper(sink: &'a mut dyn fmt::Write, escaper: Arc<dyn Escape>) -> Self {
        Self { sink, escaper }
    }

    /// Writes `s` verbatim.
    pub fn write_raw(&mut self, s: &str) -> fmt::Result {
        self.sink.write_str(s)
    }

    /// Writes `s`, escaping it first if it is marked as needing escaping.
    pub fn write_safe_string(&mut self, s: &SafeString) -> fmt::Result {
        if s.needs_escape() {
            let escaped = self.escaper.escape(s.as_str());
            self.sink.write_str(&escaped)
        } else {
            self.sink.write_str(s.as_str())
        }
    }

    /// Escapes `input` with this stream's escaper.
    pub fn escape(&self, input: &str) -> String {
        self.escaper.escape(input)
    }

    /// Escapes `input` unless it is already safe.
    pub fn conditional_escape(&self, input: &SafeString) -> String {
        if input.is_safe() {
            input.as_str().to_string()
        } else {
            self.escape(input.as_str())
        }
    }

    /// Returns a stream writing into `buffer` with the same escaper.
    pub fn fork<'b>(&self, buffer: &'b mut String) -> OutputStream<'b> {
        OutputStream {
            sink: buffer,
            escaper: Arc::clone(&self.escaper),
        }
    }
}

impl fmt::Write for OutputStream<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_raw(s)
    }
}
