//! The extraction pipeline.
//!
//! `Extractor` runs the stages strictly in order:
//! preprocess -> condition -> parse and flatten -> strip tables -> rewrite
//! -> normalise. It holds no per-call state, so a single instance can serve
//! any number of threads.

use crate::config::ExtractorConfig;
use crate::wikitext::{
    conditioner::condition,
    diagnostics::{DiagnosticSink, LogSink},
    errors::Result,
    markup::{MarkupParser, TagSoupParser, flattened_text},
    normalize::normalize,
    preprocessor::{TemplatePreprocessor, WikiPreprocessor},
    rewrite::Rewriter,
    tables::strip_tables,
};

/// Converts wikitext to plain body text.
pub struct Extractor {
    config: ExtractorConfig,
    preprocessor: Box<dyn TemplatePreprocessor>,
    parser: Box<dyn MarkupParser>,
    rewriter: Rewriter,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("rewriter", &self.rewriter)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    /// Build an extractor with the default preprocessor and parser, limited
    /// by the depths in `config`.
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let preprocessor = Box::new(WikiPreprocessor::new(config.max_template_depth));
        let parser = Box::new(TagSoupParser::new(config.max_markup_depth));
        Self::with_collaborators(config, preprocessor, parser)
    }

    /// Build an extractor around caller supplied collaborators.
    pub fn with_collaborators(
        config: ExtractorConfig,
        preprocessor: Box<dyn TemplatePreprocessor>,
        parser: Box<dyn MarkupParser>,
    ) -> Result<Self> {
        let rewriter = Rewriter::new(&config)?;
        Ok(Extractor {
            config,
            preprocessor,
            parser,
            rewriter,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract body text, logging diagnostics through `log`.
    pub fn extract(&self, wikitext: &str) -> Result<String> {
        self.extract_with(wikitext, &mut LogSink)
    }

    /// Extract body text, sending diagnostics to `sink`.
    pub fn extract_with(&self, wikitext: &str, sink: &mut dyn DiagnosticSink) -> Result<String> {
        let markup = self.preprocessor.preprocess(wikitext)?;
        log::debug!(
            "preprocessed {} bytes of wikitext into {} bytes of markup",
            wikitext.len(),
            markup.len()
        );

        let conditioned = condition(&markup);
        let flat = flattened_text(self.parser.as_ref(), &conditioned)?;
        log::debug!("flattened markup to {} bytes", flat.len());

        let without_tables = strip_tables(&flat, sink);
        let rewritten = self.rewriter.rewrite(&without_tables);
        let body = normalize(&rewritten, &self.config);
        log::debug!("extracted {} bytes of body text", body.len());
        Ok(body)
    }
}

/// Extract body text from `wikitext` with the default configuration.
pub fn get_body_text(wikitext: &str) -> Result<String> {
    Extractor::new(ExtractorConfig::default())?.extract(wikitext)
}
