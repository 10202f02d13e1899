//! Error types for stylegrade operations.
//!
//! Structural problems (malformed CSS, selectors the matcher cannot honor,
//! broken resource chains, bad rubric input) are errors and abort a grading
//! run. A rubric assertion that simply does not hold is not an error; it is
//! reported as a failed [`AssertionResult`](crate::AssertionResult).

use thiserror::Error;

/// Errors that can occur while parsing, resolving or evaluating.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed stylesheet or style attribute. Line and column are 1-based.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    /// A selector uses a combinator or pseudo-class that cannot be matched
    /// faithfully against a static document.
    #[error("unsupported selector `{selector}`: {reason}")]
    UnsupportedSelector { selector: String, reason: String },

    /// Resource resolution failed (cyclic `@import`, unloadable link, ...).
    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid rubric: {0}")]
    Rubric(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Build a parse error from a cssparser location (0-based line, 1-based column).
    pub(crate) fn parse_at(location: cssparser::SourceLocation, message: impl Into<String>) -> Self {
        Error::Parse {
            line: location.line + 1,
            column: location.column,
            message: message.into(),
        }
    }

    /// Prefix a parse error with the source it came from; other errors pass through.
    pub fn in_source(self, label: &str) -> Self {
        match self {
            Error::Parse {
                line,
                column,
                message,
            } => Error::Parse {
                line,
                column,
                message: format!("{label}: {message}"),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_source_labels_parse_errors_only() {
        let err = Error::Parse {
            line: 2,
            column: 5,
            message: "empty value".into(),
        }
        .in_source("css/style.css");
        assert_eq!(err.to_string(), "parse error at 2:5: css/style.css: empty value");

        let err = Error::Resolution("cycle".into()).in_source("css/style.css");
        assert_eq!(err.to_string(), "resolution error: cycle");
    }
}
