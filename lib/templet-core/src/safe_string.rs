//! Strings that carry their escaping state.

use std::{borrow::Borrow, fmt, ops::Deref};

/// A string carrying its escaping state.
///
/// `is_safe` means the text is trusted and must be written verbatim. `needs_escape` means the text must be escaped
/// when written, regardless of the autoescape setting. A string with neither flag is written according to the current
/// autoescape policy.
///
/// Equality and hashing only consider the text; two strings that differ only in their escaping state are equal.
#[derive(Clone, Default)]
pub struct SafeString {
    text: String,
    is_safe: bool,
    needs_escape: bool,
}

impl SafeString {
    /// Creates an untrusted string.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            is_safe: false,
            needs_escape: false,
        }
    }

    /// Creates a string that is trusted not to need escaping.
    pub fn safe<S: Into<String>>(text: S) -> Self {
        Self::new(text).mark_safe()
    }

    /// Marks the string as safe, clearing any pending escape.
    pub fn mark_safe(mut self) -> Self {
        self.is_safe = true;
        self.needs_escape = false;
        self
    }

    /// Marks the string for escaping on output. Safe strings are left untouched.
    pub fn mark_for_escaping(mut self) -> Self {
        if !self.is_safe {
            self.needs_escape = true;
        }
        self
    }

    /// Sets the needs-escape flag directly.
    pub fn set_needs_escape(&mut self, needs_escape: bool) {
        self.needs_escape = needs_escape;
    }

    /// Returns `true` if the string is trusted.
    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    /// Returns `true` if the string must be escaped on output.
    pub fn needs_escape(&self) -> bool {
        self.needs_escape
    }

    /// Returns the text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the wrapper, returning the text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Replaces the text, keeping the escaping state.
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(String) -> String,
    {
        Self {
            text: f(self.text),
            ..self
        }
    }
}

impl Deref for SafeString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for SafeString {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Borrow<str> for SafeString {
    fn borrow(&self) -> &str {
        &self.text
    }
}

impl PartialEq for SafeString {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for SafeString {}

impl std::hash::Hash for SafeString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialEq<str> for SafeString {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for SafeString {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Debug for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_tuple("SafeString");
        d.field(&self.text);
        if self.is_safe {
            d.field(&"safe");
        }
        if self.needs_escape {
            d.field(&"needs_escape");
        }
        d.finish()
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for SafeString {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for SafeString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<SafeString> for String {
    fn from(s: SafeString) -> Self {
        s.text
    }
}
