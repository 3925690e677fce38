//! Extractor configuration.
//!
//! `ExtractorConfig` holds the locale-dependent namespace names and the
//! output policies of the pipeline. It can be built in code through
//! `ExtractorConfigBuilder` or loaded from a JSON file; fields missing from
//! the JSON take their defaults.

use std::{fs, path::Path};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::wikitext::errors::{ExtractError, Result};

/// Default nesting limit for `{{ }}` constructs.
pub const DEFAULT_MAX_TEMPLATE_DEPTH: usize = 40;
/// Default nesting limit for elements in the intermediate markup.
pub const DEFAULT_MAX_MARKUP_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ExtractorConfig {
    /// Namespaces whose links are removed as categories (`[[Kategori:X]]`).
    pub category_namespaces: Vec<String>,
    /// Namespaces whose links are reduced to their caption (`[[File:x|caption]]`).
    pub file_namespaces: Vec<String>,
    /// Collapse every whitespace run in the output to a single space.
    pub collapse_whitespace: bool,
    /// Drop whitespace separated tokens made only of punctuation.
    pub drop_punctuation_tokens: bool,
    pub max_template_depth: usize,
    pub max_markup_depth: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            category_namespaces: vec!["Kategori".to_string(), "Category".to_string()],
            file_namespaces: vec![
                "Fil".to_string(),
                "File".to_string(),
                "Image".to_string(),
                "Bilde".to_string(),
            ],
            collapse_whitespace: true,
            drop_punctuation_tokens: false,
            max_template_depth: DEFAULT_MAX_TEMPLATE_DEPTH,
            max_markup_depth: DEFAULT_MAX_MARKUP_DEPTH,
        }
    }
}

impl ExtractorConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ExtractorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| ExtractError::io_err(format!("reading config {:?}", path), e))?;
        Self::from_json_str(&raw)
    }

    /// Check the invariants the rewriter relies on.
    pub fn validate(&self) -> Result<()> {
        check_namespaces("category_namespaces", &self.category_namespaces)
            .and_then(|_| check_namespaces("file_namespaces", &self.file_namespaces))
            .map_err(ExtractError::config)?;
        if self.max_template_depth == 0 || self.max_markup_depth == 0 {
            return Err(ExtractError::config("depth limits must be at least 1"));
        }
        Ok(())
    }
}

impl ExtractorConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ns) = &self.category_namespaces {
            check_namespaces("category_namespaces", ns)?;
        }
        if let Some(ns) = &self.file_namespaces {
            check_namespaces("file_namespaces", ns)?;
        }
        if self.max_template_depth == Some(0) || self.max_markup_depth == Some(0) {
            return Err("depth limits must be at least 1".to_string());
        }
        Ok(())
    }
}

impl From<ExtractorConfigBuilderError> for ExtractError {
    fn from(e: ExtractorConfigBuilderError) -> Self {
        ExtractError::config_err("invalid extractor configuration", e)
    }
}

fn check_namespaces(field: &str, names: &[String]) -> std::result::Result<(), String> {
    if names.is_empty() {
        return Err(format!("{} must name at least one namespace", field));
    }
    if let Some(bad) = names
        .iter()
        .find(|n| n.trim().is_empty() || n.contains(':'))
    {
        return Err(format!("{} contains an invalid namespace {:?}", field, bad));
    }
    Ok(())
}
