//! Extract plain body text from MediaWiki wikitext.
//!
//! ```
//! let body = mwtextextract::get_body_text("Alfa {{beta}} gamma").unwrap();
//! assert_eq!(body, "Alfa gamma");
//! ```

pub mod config;
mod extractor;
pub mod wikitext;

pub use config::{ExtractorConfig, ExtractorConfigBuilder};
pub use extractor::{Extractor, get_body_text};
pub use wikitext::{Diagnostic, DiagnosticSink, ExtractError, LogSink, Result};
