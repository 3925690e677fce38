//! Tag conditioning: make intermediate markup safe for the markup parser.
//!
//! Rewrites, in order:
//! 1. `<ref name=XYZ/>` becomes `<ref name="XYZ" />`. An unquoted value
//!    glued to `/>` is otherwise read as `XYZ/`, the tag is never seen as
//!    self-closing and it swallows the rest of the page.
//! 2. Stray `<` characters are left alone. The parser drops any `<` that
//!    does not start a tag, so `It's < 20 %` loses the `<`, and comparison
//!    operators inside `<math>` never open elements.
//! 3. Whitespace directly after a newline is removed, so table delimiters
//!    always sit at the start of their line.

use lazy_regex::regex_replace_all;

/// Apply the conditioning rules to `text`. Total and side-effect free.
pub fn condition(text: &str) -> String {
    let text = regex_replace_all!(
        r#"<([A-Za-z][A-Za-z0-9]*)(\s[^<>]*?)=\s?([^"'\s<>]+)/>"#,
        text,
        |_, name: &str, attrs: &str, value: &str| format!(r#"<{}{}="{}" />"#, name, attrs, value),
    );
    let text = regex_replace_all!(r"\n\s+", &text, "\n");
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_unquoted_self_closing_value() {
        assert_eq!(
            condition("<ref name=XYZ/>Mer tekst her"),
            r#"<ref name="XYZ" />Mer tekst her"#
        );
    }

    #[test]
    fn quotes_last_attribute_only() {
        assert_eq!(
            condition(r#"<ref name="a b" group=note/>x"#),
            r#"<ref name="a b" group="note" />x"#
        );
    }

    #[test]
    fn leaves_quoted_and_spaced_tags_alone() {
        let s = r#"<ref name="XYZ"/> and <ref name=XYZ /> and <br/>"#;
        assert_eq!(condition(s), s);
    }

    #[test]
    fn leaves_stray_angle_brackets() {
        assert_eq!(condition("It's < 20 %"), "It's < 20 %");
        assert_eq!(condition("<math>r<1 < 2<3</math>"), "<math>r<1 < 2<3</math>");
    }

    #[test]
    fn strips_leading_whitespace_on_lines() {
        assert_eq!(condition("a\n   {|\n\t|b\n\n |}"), "a\n{|\n|b\n|}");
    }
}
