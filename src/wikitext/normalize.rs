//! Output normalisation.
//!
//! The result is always trimmed. Two independent policies follow the
//! configuration:
//! - `collapse_whitespace` (default on): every whitespace run becomes one
//!   space.
//! - `drop_punctuation_tokens` (default off): whitespace separated tokens
//!   made only of punctuation or symbols (`.`, `–`, `<`) are removed. Off by
//!   default because it also removes meaningful tokens such as `%,`.
//!   The catch is text where a removed tag sat before punctuation:
//!   `ja <math>…</math>. Eudoksoksen` keeps the lone `.` unless dropping is
//!   on, and only then yields `ja Eudoksoksen`.
//!
//! Normalising an already normalised string returns it unchanged.

use itertools::Itertools;
use lazy_regex::{regex_is_match, regex_replace_all};

use crate::config::ExtractorConfig;

pub fn normalize(text: &str, config: &ExtractorConfig) -> String {
    match (config.collapse_whitespace, config.drop_punctuation_tokens) {
        (true, false) => text.split_whitespace().join(" "),
        (true, true) => text
            .split_whitespace()
            .filter(|token| !is_punctuation_token(token))
            .join(" "),
        (false, false) => text.trim().to_string(),
        (false, true) => {
            let dropped = regex_replace_all!(r"\S+", text, |token: &str| {
                if is_punctuation_token(token) {
                    String::new()
                } else {
                    token.to_string()
                }
            });
            dropped.trim().to_string()
        }
    }
}

fn is_punctuation_token(token: &str) -> bool {
    regex_is_match!(r"^[\p{P}\p{S}]+$", token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(collapse: bool, drop: bool) -> ExtractorConfig {
        ExtractorConfig {
            collapse_whitespace: collapse,
            drop_punctuation_tokens: drop,
            ..Default::default()
        }
    }

    #[test]
    fn default_collapses_and_keeps_punctuation() {
        let c = ExtractorConfig::default();
        assert_eq!(normalize("  It's  20 %, but \n\n really ", &c), "It's 20 %, but really");
        assert_eq!(normalize("ja . Eudoksoksen", &c), "ja . Eudoksoksen");
    }

    #[test]
    fn dropping_punctuation_tokens() {
        let c = config(true, true);
        assert_eq!(
            normalize("on alkuperäinen suure ja . Eudoksoksen oppilas", &c),
            "on alkuperäinen suure ja Eudoksoksen oppilas"
        );
        assert_eq!(normalize("a – b < c", &c), "a b c");
        assert_eq!(normalize("It's 20%", &c), "It's 20%");
    }

    #[test]
    fn trim_only() {
        let c = config(false, false);
        assert_eq!(normalize("\n a\n\nb  \n", &c), "a\n\nb");
    }

    #[test]
    fn drop_without_collapse_keeps_layout() {
        let c = config(false, true);
        assert_eq!(normalize(". a .\nb", &c), "a \nb");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize("   ", &ExtractorConfig::default()), "");
    }

    proptest! {
        #[test]
        fn normalizing_twice_changes_nothing(
            text in "[a-zæøå .,%<–\n\t]{0,40}",
            collapse in any::<bool>(),
            drop in any::<bool>(),
        ) {
            let c = config(collapse, drop);
            let once = normalize(&text, &c);
            prop_assert_eq!(normalize(&once, &c), once.clone());
        }
    }
}
