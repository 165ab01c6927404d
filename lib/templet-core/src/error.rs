//! Template errors.

use std::fmt;

use snafu::Snafu;

/// Broad classification of a [`TemplateError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Malformed tag arguments, unknown filter or library, or an invalid variable.
    TagSyntax,

    /// A `{{ }}` with no content.
    EmptyVariable,

    /// A `{% %}` with no content.
    EmptyBlockTag,

    /// A block tag whose command is not registered.
    InvalidBlockTag,

    /// End of input reached while a block tag still expected its terminator.
    UnclosedBlockTag,

    /// A loader could not find the requested template.
    TemplateNotFound,

    /// A node failed while rendering.
    Render,
}

/// Template compilation or rendering error.
#[derive(Clone, Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub))]
pub enum TemplateError {
    /// Malformed tag or variable syntax.
    #[snafu(display("{}", message))]
    TagSyntax {
        /// Description of the problem.
        message: String,
    },

    /// Filter name not provided by any loaded library.
    #[snafu(display("Unknown filter: '{}'", name))]
    UnknownFilter {
        /// Filter name as written in the template.
        name: String,
    },

    /// Library name not registered with the engine.
    #[snafu(display("'{}' is not a valid tag library.", name))]
    UnknownLibrary {
        /// Library name as written in the template or configuration.
        name: String,
    },

    /// Variable tag with nothing inside it.
    #[snafu(display("Empty variable before \"{}\", line {}.", near, line))]
    EmptyVariable {
        /// Up to the first few characters of source following the empty tag.
        near: String,

        /// Line of the empty tag.
        line: usize,
    },

    /// Block tag with nothing inside it.
    #[snafu(display("Empty block tag, line {}.", line))]
    EmptyBlockTag {
        /// Line of the empty tag.
        line: usize,
    },

    /// Block tag whose command has no registered factory.
    #[snafu(display("Invalid block tag on line {}: '{}'.", line, command))]
    InvalidBlockTag {
        /// Unrecognized command word.
        command: String,

        /// Line of the tag.
        line: usize,
    },

    /// Input ended while terminators were still expected.
    #[snafu(display("Unclosed tag in template. Expected one of: ({})", expected.join(" ")))]
    UnclosedBlockTag {
        /// Terminator tag names that would have closed the block.
        expected: Vec<String>,
    },

    /// No loader could provide the named template.
    #[snafu(display("Template not found: '{}'", name))]
    TemplateNotFound {
        /// Requested template name.
        name: String,
    },

    /// Error raised by a tag while parsing, annotated with the tag's line.
    #[snafu(display("{}, line {}", source, line))]
    Located {
        /// Underlying error.
        #[snafu(source(from(TemplateError, Box::new)))]
        source: Box<TemplateError>,

        /// Line of the tag being parsed.
        line: usize,
    },

    /// A node failed while rendering.
    #[snafu(display("{}", message))]
    Render {
        /// Description of the problem.
        message: String,
    },

    /// The output sink refused a write.
    #[snafu(display("Failed to write template output."))]
    Output {
        /// Error source.
        source: fmt::Error,
    },
}

impl TemplateError {
    /// Creates a syntax error with the given message.
    pub fn syntax<M: Into<String>>(message: M) -> Self {
        Self::TagSyntax {
            message: message.into(),
        }
    }

    /// Creates a render error with the given message.
    pub fn render<M: Into<String>>(message: M) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TagSyntax { .. } | Self::UnknownFilter { .. } | Self::UnknownLibrary { .. } => ErrorKind::TagSyntax,
            Self::EmptyVariable { .. } => ErrorKind::EmptyVariable,
            Self::EmptyBlockTag { .. } => ErrorKind::EmptyBlockTag,
            Self::InvalidBlockTag { .. } => ErrorKind::InvalidBlockTag,
            Self::UnclosedBlockTag { .. } => ErrorKind::UnclosedBlockTag,
            Self::TemplateNotFound { .. } => ErrorKind::TemplateNotFound,
            Self::Located { source, .. } => source.kind(),
            Self::Render { .. } | Self::Output { .. } => ErrorKind::Render,
        }
    }

    /// Attaches a source line, unless the error already names one.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Self::TagSyntax { .. } | Self::UnknownFilter { .. } | Self::UnknownLibrary { .. } => Self::Located {
                source: Box::new(self),
                line,
            },
            other => other,
        }
    }
}

impl From<fmt::Error> for TemplateError {
    fn from(source: fmt::Error) -> Self {
        Self::Output { source }
    }
}
