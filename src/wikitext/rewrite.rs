//! Wiki syntax rewriting.
//!
//! The rewrites run as an explicit, ordered list of named stages. The order
//! is part of the contract:
//! - `Categories` runs before the link stages because a category link is
//!   also a link.
//! - `InternalLinks` runs before `FileLinks`: internal links nested in a
//!   caption (`[[File:x.jpg|thumb|A [[y]] z]]`) must already be plain text
//!   for the caption pattern to see the whole caption.
//! - `InterwikiLinks` deletes whatever namespaced link is left, and
//!   `ResidualLinks` finally reduces links the earlier stages could not
//!   classify (targets containing `:`) to their display text.
//!
//! Every pattern compiles to a finite automaton (`regex` crate), so each
//! stage is linear in the length of its input.

use std::borrow::Cow;
use std::fmt;

use itertools::Itertools;
use lazy_regex::{regex, regex_replace_all};
use regex::{Captures, Regex};
use url::Url;

use crate::config::ExtractorConfig;
use crate::wikitext::errors::Result;

/// One step of the rewriter, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `== Title ==` -> ` Title `
    Headers,
    /// `'''bold'''` -> `bold`
    Emphasis,
    /// Lines starting with `#` or `*` are removed.
    Lists,
    /// `[[Category:X]]` is removed.
    Categories,
    /// `[http://example.org label]` is removed.
    ExternalLinks,
    /// `[[target|label]]` -> `label`, `[[target]]` -> `target`.
    InternalLinks,
    /// `[[File:x.jpg|thumb|caption]]` -> `caption`.
    FileLinks,
    /// `[[en:Foo]]` is removed.
    InterwikiLinks,
    /// Any other `[[...]]` -> its last segment.
    ResidualLinks,
}

impl Stage {
    pub const ORDER: [Stage; 9] = [
        Stage::Headers,
        Stage::Emphasis,
        Stage::Lists,
        Stage::Categories,
        Stage::ExternalLinks,
        Stage::InternalLinks,
        Stage::FileLinks,
        Stage::InterwikiLinks,
        Stage::ResidualLinks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Headers => "headers",
            Stage::Emphasis => "emphasis",
            Stage::Lists => "lists",
            Stage::Categories => "categories",
            Stage::ExternalLinks => "external_links",
            Stage::InternalLinks => "internal_links",
            Stage::FileLinks => "file_links",
            Stage::InterwikiLinks => "interwiki_links",
            Stage::ResidualLinks => "residual_links",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Applies the stages in `Stage::ORDER`. Namespace dependent patterns are
/// compiled once from the configuration.
#[derive(Debug, Clone)]
pub struct Rewriter {
    categories: Regex,
    file_links: Regex,
}

impl Rewriter {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        config.validate()?;
        let categories = Regex::new(&format!(
            r"\[\[[ \t]*(?i:{})[ \t]*:[^\]]*\]\]",
            namespace_alternation(&config.category_namespaces)
        ))?;
        let file_links = Regex::new(&format!(
            r"\[\[[ \t]*(?i:{})[ \t]*:[^\]]+\|([^\]]+)\]\]",
            namespace_alternation(&config.file_namespaces)
        ))?;
        Ok(Rewriter {
            categories,
            file_links,
        })
    }

    /// Run every stage in order.
    pub fn rewrite(&self, text: &str) -> String {
        let mut current = text.to_string();
        for stage in Stage::ORDER {
            if let Cow::Owned(next) = self.apply(stage, &current) {
                log::trace!("{}: {} -> {} bytes", stage, current.len(), next.len());
                current = next;
            }
        }
        current
    }

    /// Run a single stage.
    pub fn apply<'t>(&self, stage: Stage, text: &'t str) -> Cow<'t, str> {
        match stage {
            Stage::Headers => regex_replace_all!(r"={2,}", text, ""),
            Stage::Emphasis => regex_replace_all!(r"'{2,}", text, ""),
            Stage::Lists => regex_replace_all!(r"(?m)^[#*].*$", text, ""),
            Stage::Categories => self.categories.replace_all(text, ""),
            Stage::ExternalLinks => strip_external_links(text),
            Stage::InternalLinks => {
                regex_replace_all!(r"\[\[(?:[^:|\]]+\|)?([^:\]]+)\]\]", text, |_, label: &str| {
                    label.to_string()
                })
            }
            Stage::FileLinks => self.file_links.replace_all(text, "$1"),
            Stage::InterwikiLinks => {
                regex_replace_all!(r"\[\[[A-Za-z][A-Za-z\-]*:[^\]]+\]\]", text, "")
            }
            Stage::ResidualLinks => {
                regex_replace_all!(r"\[\[:?(?:[^\[\]|]*\|)*([^\[\]|]*)\]\]", text, |_, last: &str| {
                    last.to_string()
                })
            }
        }
    }
}

fn namespace_alternation(names: &[String]) -> String {
    names.iter().map(|n| regex::escape(n.trim())).join("|")
}

/// Remove `[url]` and `[url label]` spans. A bracket directly preceded by
/// another `[` belongs to an internal link and is left alone.
fn strip_external_links(text: &str) -> Cow<'_, str> {
    let re = regex!(
        r"\[((?:[A-Za-z][A-Za-z0-9+.\-]*:)?//[^\[\]\s]+|mailto:[^\[\]\s]+)(?:[ \t][^\]\n]*)?\]"
    );
    re.replace_all(text, |caps: &Captures| {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        let inside_internal = start > 0 && text.as_bytes()[start - 1] == b'[';
        if inside_internal || !is_url_like(&caps[1]) {
            whole.to_string()
        } else {
            String::new()
        }
    })
}

fn is_url_like(candidate: &str) -> bool {
    candidate.starts_with("//") || Url::parse(candidate).is_ok()
}
