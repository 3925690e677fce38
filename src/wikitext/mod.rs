//! Wikitext stripping stages.
//!
//! Each stage lives in its own submodule and is usable on its own:
//! - `preprocessor` - wikitext to intermediate markup (templates become elements)
//! - `conditioner` - repairs markup the parser would misread
//! - `markup` - parses the markup and flattens it to root text plus tails
//! - `tables` - removes nested `{| |}` tables
//! - `rewrite` - ordered wiki syntax rewrites
//! - `normalize` - whitespace and punctuation cleanup
//!
//! `crate::Extractor` chains them in that order.

pub mod conditioner;
pub mod diagnostics;
pub mod errors;
pub mod markup;
pub mod normalize;
pub mod preprocessor;
pub mod rewrite;
pub mod tables;

pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink};
pub use errors::{ExtractError, MalformedMarkupError, PreprocessError, Result};
pub use markup::{Element, MarkupParser, TagSoupParser};
pub use preprocessor::{TemplatePreprocessor, WikiPreprocessor};
pub use rewrite::{Rewriter, Stage};
