use std::sync::Arc;
use std::time::{Duration, Instant};

use mwtextextract::{
    Diagnostic, Extractor, ExtractorConfig, ExtractorConfigBuilder, get_body_text,
};
use proptest::prelude::*;

const MATH: &str = "on alkuperäinen suure ja <math>1/2 \\le r<1 < 2<3</math>. Eudoksoksen oppilas";

fn extractor(config: ExtractorConfig) -> Extractor {
    Extractor::new(config).unwrap()
}

#[test]
fn simple_template() {
    assert_eq!(get_body_text("Alfa {{beta}} gamma").unwrap(), "Alfa gamma");
}

#[test]
fn recursive_tables() {
    let body = get_body_text("Alfa {| \n|beta \n{| \n|gamma \n|} \n|} delta").unwrap();
    assert_eq!(body.split_whitespace().count(), 2);
    assert_eq!(body, "Alfa delta");
}

#[test]
fn math_is_removed_with_its_expression() {
    let body = get_body_text(MATH).unwrap();
    assert!(body.starts_with("on alkuperäinen suure ja"));
    assert!(body.ends_with("Eudoksoksen oppilas"));
    assert!(!body.contains("math"));
    assert!(!body.contains("1/2"));
    assert!(!body.contains('<'));
}

#[test]
fn math_with_punctuation_tokens_dropped() {
    let config = ExtractorConfig::from_json_str(r#"{"drop_punctuation_tokens": true}"#).unwrap();
    assert_eq!(
        extractor(config).extract(MATH).unwrap(),
        "on alkuperäinen suure ja Eudoksoksen oppilas"
    );
}

#[test]
fn comparison_and_ref() {
    assert_eq!(
        get_body_text("It's < 20 %, but <ref>not small</ref> really").unwrap(),
        "It's 20 %, but really"
    );
}

#[test]
fn internal_link_label() {
    assert_eq!(get_body_text("[[Artikkel 1|artikkelen]]").unwrap(), "artikkelen");
    assert_eq!(get_body_text("Bor i [[Oslo]].").unwrap(), "Bor i Oslo.");
}

#[test]
fn headers_emphasis_and_lists() {
    let text = "== Historie ==\n'''Oslo''' er en by.\n* punkt en\n# punkt to\nSlutt";
    assert_eq!(get_body_text(text).unwrap(), "Historie Oslo er en by. Slutt");
}

#[test]
fn categories_and_external_links_are_removed() {
    let text = "Se [http://example.org nettsiden] her. [[Kategori:Byer i Norge]]";
    assert_eq!(get_body_text(text).unwrap(), "Se her.");
}

#[test]
fn mixed_links_resolve_in_order() {
    let text = "[[File:a.jpg|thumb|cap]] [[en:Foo]] [[Bar|baz]]";
    assert_eq!(get_body_text(text).unwrap(), "cap baz");
}

#[test]
fn caption_with_nested_link() {
    let text = "[[Fil:Oslo.jpg|thumb|Utsikt over [[Oslo]]]] Tekst";
    assert_eq!(get_body_text(text).unwrap(), "Utsikt over Oslo Tekst");
}

#[test]
fn comments_and_includeonly_are_dropped() {
    let text = "Synlig<!-- skjult --> tekst<includeonly>{{mal}}</includeonly> her";
    assert_eq!(get_body_text(text).unwrap(), "Synlig tekst her");
}

#[test]
fn entities_are_decoded() {
    assert_eq!(get_body_text("Tom &amp; Jerry").unwrap(), "Tom & Jerry");
}

#[test]
fn empty_input_gives_empty_output() {
    assert_eq!(get_body_text("").unwrap(), "");
    assert_eq!(get_body_text("  \n ").unwrap(), "");
}

#[test]
fn file_namespaces_come_from_config() {
    let text = "[[Tiedosto:a.jpg|kuvateksti]]";
    // unknown namespace: removed as an interwiki-style link
    assert_eq!(get_body_text(text).unwrap(), "");

    let config = ExtractorConfigBuilder::default()
        .file_namespaces(vec!["Tiedosto".to_string()])
        .category_namespaces(vec!["Luokka".to_string()])
        .build()
        .unwrap();
    assert_eq!(extractor(config).extract(text).unwrap(), "kuvateksti");
}

#[test]
fn whitespace_is_kept_when_collapsing_is_off() {
    let config = ExtractorConfig {
        collapse_whitespace: false,
        ..Default::default()
    };
    let body = extractor(config).extract(" Alfa  beta\ngamma \n").unwrap();
    assert_eq!(body, "Alfa  beta\ngamma");
}

#[test]
fn table_diagnostics_are_collected() {
    let ex = extractor(ExtractorConfig::default());
    let mut diags: Vec<Diagnostic> = Vec::new();
    let body = ex.extract_with("Alfa |} beta {| gamma", &mut diags).unwrap();
    assert_eq!(body, "Alfa beta");
    assert_eq!(diags.len(), 2);
    assert!(matches!(diags[0], Diagnostic::UnmatchedTableClose { .. }));
    assert!(matches!(diags[1], Diagnostic::UnterminatedTable { depth: 1, .. }));
}

#[test]
fn deep_template_nesting_is_fatal() {
    let text = format!("{}x{}", "{{a|".repeat(50), "}}".repeat(50));
    let err = get_body_text(&text).unwrap_err();
    assert_eq!(err.kind(), "PreprocessError");
}

#[test]
fn deep_element_nesting_is_fatal() {
    let text = format!("{}x", "<span>".repeat(600));
    let err = get_body_text(&text).unwrap_err();
    assert_eq!(err.kind(), "MalformedMarkupError");
}

#[test]
fn invalid_config_json() {
    let err = ExtractorConfig::from_json_str(r#"{"file_namespaces": []}"#).unwrap_err();
    assert_eq!(err.kind(), "ConfigError");
    let err = ExtractorConfig::from_json_str("{not json").unwrap_err();
    assert_eq!(err.kind(), "ConfigError");
}

#[test]
fn adversarial_brackets_finish() {
    let text = format!("{} tekst {}", "[[".repeat(20_000), "{{".repeat(20_000));
    let body = get_body_text(&text).unwrap();
    assert!(body.contains("tekst"));
}

#[test]
fn unclosed_argument_runs_with_a_later_close_finish() {
    let text = "{{{x".repeat(40) + "}} tekst";
    let started = Instant::now();
    let body = get_body_text(&text).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(body.ends_with("tekst"));
    assert!(!body.contains("<template>"));
}

#[test]
fn repeated_unclosed_refs_finish() {
    let text = "<ref>a </x ".repeat(20_000);
    let started = Instant::now();
    let body = get_body_text(&text).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(body.split_whitespace().count(), 40_000);
    assert!(body.starts_with("a /x a /x"));
}

#[test]
fn colon_prefixed_category_link_stays_visible() {
    assert_eq!(
        get_body_text("Se [[:Kategori:Byer]] og [[Kategori:Norge]]").unwrap(),
        "Se Kategori:Byer og"
    );
}

#[test]
fn one_extractor_serves_many_threads() {
    let ex = Arc::new(extractor(ExtractorConfig::default()));
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let ex = Arc::clone(&ex);
            std::thread::spawn(move || ex.extract(&format!("Alfa {{{{beta}}}} {}", n)).unwrap())
        })
        .collect();
    for (n, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), format!("Alfa {}", n));
    }
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zæøå]{1,8}",
        Just("[[Foo]]".to_string()),
        Just("[[Foo|bar]]".to_string()),
        Just("[[Kategori:Y]]".to_string()),
        Just("[[File:a.png|thumb|cap]]".to_string()),
        Just("[[en:Foo]]".to_string()),
        Just("== Tittel ==".to_string()),
        Just("'''fet'''".to_string()),
        Just("''kursiv''".to_string()),
        Just("{|\n|celle\n|}".to_string()),
        Just("{{mal|x=1}}".to_string()),
        Just("<ref>kilde</ref>".to_string()),
    ]
}

proptest! {
    #[test]
    fn markup_tokens_never_survive(parts in prop::collection::vec(fragment(), 0..12)) {
        let text = parts.join(" ");
        let body = get_body_text(&text).unwrap();
        for token in ["[[", "]]", "{|", "|}", "==", "'''", "{{", "}}"] {
            prop_assert!(!body.contains(token), "{:?} left in {:?}", token, body);
        }
    }
}
