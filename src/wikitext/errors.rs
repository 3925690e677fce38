//! Error types for the extraction pipeline.
//!
//! Two collaborator failures are fatal and surface to the caller unchanged:
//! - `PreprocessError` - the template preprocessor rejected the wikitext.
//! - `MalformedMarkupError` - the markup parser could not build a document
//!    from the conditioned intermediate markup.
//!
//! `ExtractError` unifies those with configuration and I/O failures so the
//! public API can return a single `Result<T>`. Table delimiter problems are
//! not errors; they are reported as diagnostics (see `diagnostics`).

use std::error::Error;
use std::fmt;

/// The canonical result type used across the crate.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// The template preprocessor rejected the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessError {
    pub msg: String,
    /// Byte offset in the wikitext where the problem was detected, if known.
    pub offset: Option<usize>,
}

impl PreprocessError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        PreprocessError {
            msg: msg.into(),
            offset: None,
        }
    }

    pub fn at<S: Into<String>>(msg: S, offset: usize) -> Self {
        PreprocessError {
            msg: msg.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(off) => write!(f, "Preprocess error at {}: {}", off, self.msg),
            None => write!(f, "Preprocess error: {}", self.msg),
        }
    }
}

impl Error for PreprocessError {}

/// The markup parser could not produce a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedMarkupError {
    pub msg: String,
    /// Byte offset in the conditioned markup, if known.
    pub offset: Option<usize>,
}

impl MalformedMarkupError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        MalformedMarkupError {
            msg: msg.into(),
            offset: None,
        }
    }

    pub fn at<S: Into<String>>(msg: S, offset: usize) -> Self {
        MalformedMarkupError {
            msg: msg.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for MalformedMarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(off) => write!(f, "Malformed markup at {}: {}", off, self.msg),
            None => write!(f, "Malformed markup: {}", self.msg),
        }
    }
}

impl Error for MalformedMarkupError {}

/// Top level error returned by the extractor.
///
/// - `Preprocess` - wraps `PreprocessError`.
/// - `MalformedMarkup` - wraps `MalformedMarkupError`.
/// - `Config` - the configuration was rejected (bad JSON, empty namespace
///    list, builder misuse).
/// - `Io` - reading input or configuration failed.
#[derive(Debug)]
pub enum ExtractError {
    Preprocess(PreprocessError),
    MalformedMarkup(MalformedMarkupError),
    Config {
        msg: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
    Io {
        msg: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl ExtractError {
    /// Construct a configuration error without an underlying cause.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ExtractError::Config {
            msg: msg.into(),
            source: None,
        }
    }

    /// Construct a configuration error wrapping `e`.
    pub fn config_err<E: Error + Send + Sync + 'static>(msg: impl Into<String>, e: E) -> Self {
        ExtractError::Config {
            msg: msg.into(),
            source: Some(Box::new(e)),
        }
    }

    /// Wrap a std::io::Error or similar as an Io variant.
    pub fn io_err<E: Error + Send + Sync + 'static>(msg: impl Into<String>, e: E) -> Self {
        ExtractError::Io {
            msg: msg.into(),
            source: Some(Box::new(e)),
        }
    }

    /// Returns a short description of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Preprocess(_) => "PreprocessError",
            ExtractError::MalformedMarkup(_) => "MalformedMarkupError",
            ExtractError::Config { .. } => "ConfigError",
            ExtractError::Io { .. } => "Io",
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Preprocess(e) => write!(f, "{}", e),
            ExtractError::MalformedMarkup(e) => write!(f, "{}", e),
            ExtractError::Config { msg, source } => {
                if let Some(s) = source {
                    write!(f, "Config error: {} (cause: {})", msg, s)
                } else {
                    write!(f, "Config error: {}", msg)
                }
            }
            ExtractError::Io { msg, source } => {
                if let Some(s) = source {
                    write!(f, "IO error: {} (cause: {})", msg, s)
                } else {
                    write!(f, "IO error: {}", msg)
                }
            }
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExtractError::Preprocess(e) => Some(e),
            ExtractError::MalformedMarkup(e) => Some(e),
            ExtractError::Config { source, .. } | ExtractError::Io { source, .. } => {
                source.as_ref().map(|b| b.as_ref() as &dyn Error)
            }
        }
    }
}

/* Conversions so `?` works across the pipeline. */

impl From<PreprocessError> for ExtractError {
    fn from(e: PreprocessError) -> Self {
        ExtractError::Preprocess(e)
    }
}

impl From<MalformedMarkupError> for ExtractError {
    fn from(e: MalformedMarkupError) -> Self {
        ExtractError::MalformedMarkup(e)
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::io_err("I/O error", e)
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        ExtractError::config_err("invalid JSON configuration", e)
    }
}

impl From<regex::Error> for ExtractError {
    fn from(e: regex::Error) -> Self {
        ExtractError::config_err("could not compile rewrite pattern", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_preprocess_error_with_offset() {
        let e = ExtractError::from(PreprocessError::at("templates nested too deeply", 42));
        let s = format!("{}", e);
        assert!(s.contains("42"));
        assert!(s.contains("nested too deeply"));
        assert_eq!(e.kind(), "PreprocessError");
    }

    #[test]
    fn malformed_markup_is_the_source() {
        let e: ExtractError = MalformedMarkupError::new("empty document").into();
        assert_eq!(e.kind(), "MalformedMarkupError");
        let src = e.source().expect("wrapped error is exposed as source");
        assert!(src.to_string().contains("empty document"));
    }

    #[test]
    fn io_conversion_has_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "oh no");
        let e: ExtractError = io_err.into();
        let s = format!("{}", e);
        assert!(s.contains("I/O error"));
        assert!(s.contains("oh no"));
    }
}
