//! Template preprocessing: wikitext to intermediate markup.
//!
//! The pipeline never expands templates. It only needs every `{{ }}`
//! construct, comment and `<includeonly>` block turned into an element so
//! that the markup parser can drop it as a whole. `WikiPreprocessor` emits
//! markup shaped like the MediaWiki preprocessor tree:
//!
//! ```text
//! Alfa {{beta|x=1}} gamma
//! <root>Alfa <template><title>beta</title><part>x=1</part></template> gamma</root>
//! ```
//!
//! Everything else, including raw `<`, `>` and `&`, passes through
//! untouched; extension tag bodies (`<math>`, `<ref>`, `<nowiki>`, ...) are
//! copied without looking for templates inside them.
//!
//! Braces are matched in one pass with a stack of open runs, the way the
//! MediaWiki preprocessor does it: a closing run pairs with the innermost
//! open run, unused opening braces stay on the stack, and runs never closed
//! are written back as literal text at the end.

use std::collections::HashMap;

use html_escape::encode_text;

use crate::config::DEFAULT_MAX_TEMPLATE_DEPTH;
use crate::wikitext::errors::PreprocessError;

/// Tags whose content is opaque to the preprocessor.
const EXTENSION_TAGS: &[&str] = &[
    "ref",
    "references",
    "math",
    "chem",
    "ce",
    "nowiki",
    "pre",
    "gallery",
    "source",
    "syntaxhighlight",
    "score",
    "timeline",
    "poem",
    "graph",
    "templatedata",
];

/// Turns wikitext into intermediate markup.
pub trait TemplatePreprocessor: Send + Sync {
    fn preprocess(&self, wikitext: &str) -> Result<String, PreprocessError>;
}

/// Default preprocessor. Recognises templates, template arguments, comments,
/// inclusion control tags and extension tags.
#[derive(Debug, Clone)]
pub struct WikiPreprocessor {
    max_depth: usize,
}

impl Default for WikiPreprocessor {
    fn default() -> Self {
        WikiPreprocessor::new(DEFAULT_MAX_TEMPLATE_DEPTH)
    }
}

impl TemplatePreprocessor for WikiPreprocessor {
    fn preprocess(&self, wikitext: &str) -> Result<String, PreprocessError> {
        let mut scan = Scan::new(wikitext, self.max_depth);
        scan.run()?;
        Ok(scan.finish())
    }
}

impl WikiPreprocessor {
    /// `max_depth` limits how many `{{ }}` constructs may be open at once
    /// before the input is rejected.
    pub fn new(max_depth: usize) -> Self {
        WikiPreprocessor { max_depth }
    }
}

/// An open run of `{` waiting for its closing braces.
#[derive(Debug, Clone, Copy)]
struct BraceRun {
    /// Offset of the first brace of the run in the input.
    start: usize,
    /// Braces of the run not yet matched. Matches consume from the end.
    count: usize,
    /// Length of the output when the run was opened. Everything written
    /// after it is replaced once the run closes.
    out_mark: usize,
}

/// Single left to right pass over the wikitext. Open brace runs live on a
/// stack; a closing run matches the innermost open one, so no offset is
/// scanned twice. Runs still open at the end of input become literal text.
struct Scan<'a> {
    s: &'a str,
    out: String,
    stack: Vec<BraceRun>,
    max_depth: usize,
    /// Earliest offset from which `</name>` is known to be absent.
    missing_close: HashMap<String, usize>,
}

impl<'a> Scan<'a> {
    fn new(s: &'a str, max_depth: usize) -> Self {
        let mut out = String::with_capacity(s.len() + 16);
        out.push_str("<root>");
        Scan {
            s,
            out,
            stack: Vec::new(),
            max_depth,
            missing_close: HashMap::new(),
        }
    }

    fn run(&mut self) -> Result<(), PreprocessError> {
        let s = self.s;
        let bytes = s.as_bytes();
        // No template can close after the last "}}".
        let last_close = s.rfind("}}");
        let mut i = 0usize;

        while i < bytes.len() {
            match bytes[i] {
                b'<' => {
                    if s[i..].starts_with("<!--") {
                        let end = comment_end(s, i);
                        push_element(&mut self.out, "comment", &s[i + 4..end.inner]);
                        i = end.outer;
                    } else if let Some(tag) = tag_at(s, i) {
                        i = self.emit_tag(i, &tag);
                    } else {
                        self.out.push('<');
                        i += 1;
                    }
                }
                b'{' => {
                    let run = run_len(bytes, i, b'{');
                    let can_close = last_close.is_some_and(|c| c >= i + run);
                    if run >= 2 && can_close {
                        self.open(i, run)?;
                    } else {
                        self.out.push_str(&s[i..i + run]);
                    }
                    i += run;
                }
                b'}' => {
                    let run = run_len(bytes, i, b'}');
                    i += self.close(i, run);
                }
                _ => {
                    let ch = s_char_at(s, i);
                    self.out.push(ch);
                    i += ch.len_utf8();
                }
            }
        }

        Ok(())
    }

    fn open(&mut self, start: usize, count: usize) -> Result<(), PreprocessError> {
        if self.stack.len() >= self.max_depth {
            return Err(PreprocessError::at(
                format!("templates nested deeper than {}", self.max_depth),
                start,
            ));
        }
        self.stack.push(BraceRun {
            start,
            count,
            out_mark: self.out.len(),
        });
        Ok(())
    }

    /// Handle the run of `run` closing braces at `i`. Returns how many of
    /// them were consumed; the rest are looked at again by the caller.
    fn close(&mut self, i: usize, run: usize) -> usize {
        let s = self.s;
        let Some(top) = self.stack.last_mut() else {
            self.out.push_str(&s[i..i + run]);
            return run;
        };
        let matched = run.min(top.count);
        if matched < 2 {
            self.out.push_str(&s[i..i + run]);
            return run;
        }
        // three braces open a template argument, two a template
        let matched = matched.min(3);
        let kind = if matched == 3 { "tplarg" } else { "template" };
        let body = &s[top.start + top.count..i];

        top.count -= matched;
        let BraceRun { count, out_mark, .. } = *top;
        self.out.truncate(out_mark);
        if count < 2 {
            self.stack.pop();
            self.out.push_str(&"{".repeat(count));
        }
        emit_construct(&mut self.out, kind, body);
        matched
    }

    /// Emit the markup for the tag found at `i`, returning where to resume.
    fn emit_tag(&mut self, i: usize, tag: &TagSpan) -> usize {
        let s = self.s;
        match tag.name.as_str() {
            "includeonly" if !tag.closing => {
                let end = if tag.self_closing {
                    tag.end
                } else {
                    self.close_tag(tag.end, &tag.name).map_or(s.len(), |(_, e)| e)
                };
                push_element(&mut self.out, "ignore", &s[i..end]);
                end
            }
            "noinclude" | "onlyinclude" | "includeonly" => {
                push_element(&mut self.out, "ignore", &s[i..tag.end]);
                tag.end
            }
            name if EXTENSION_TAGS.contains(&name) && !tag.closing => {
                if tag.self_closing {
                    self.out.push_str(&s[i..tag.end]);
                    return tag.end;
                }
                match self.close_tag(tag.end, &tag.name) {
                    Some((_, end)) => {
                        self.out.push_str(&s[i..end]);
                        end
                    }
                    None => {
                        // an unclosed extension tag would swallow the rest of
                        // the page; drop the tag and keep the text after it
                        log::debug!("dropping unclosed <{}> at {}", name, i);
                        tag.end
                    }
                }
            }
            name if EXTENSION_TAGS.contains(&name) => {
                log::debug!("dropping stray </{}> at {}", name, i);
                tag.end
            }
            _ => {
                self.out.push_str(&s[i..tag.end]);
                tag.end
            }
        }
    }

    /// `find_close_tag`, remembering failures. Once `</name>` is missing
    /// after some offset it is missing after every later one too.
    fn close_tag(&mut self, from: usize, name: &str) -> Option<(usize, usize)> {
        if self.missing_close.get(name).is_some_and(|&m| from >= m) {
            return None;
        }
        let found = find_close_tag(self.s, from, name);
        if found.is_none() {
            self.missing_close.insert(name.to_string(), from);
        }
        found
    }

    /// Turn runs that never closed back into literal braces and close the
    /// root element.
    fn finish(mut self) -> String {
        while let Some(run) = self.stack.pop() {
            self.out.insert_str(run.out_mark, &"{".repeat(run.count));
        }
        self.out.push_str("</root>");
        self.out
    }
}

struct CommentEnd {
    inner: usize,
    outer: usize,
}

/// Locate the end of the comment opening at `start`. An unterminated comment
/// runs to the end of the input.
fn comment_end(s: &str, start: usize) -> CommentEnd {
    match s[start + 4..].find("-->") {
        Some(rel) => CommentEnd {
            inner: start + 4 + rel,
            outer: start + 4 + rel + 3,
        },
        None => CommentEnd {
            inner: s.len(),
            outer: s.len(),
        },
    }
}

/// A start or end tag found in the wikitext.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagSpan {
    /// Lowercased tag name.
    name: String,
    /// Offset just past the `>`.
    end: usize,
    closing: bool,
    self_closing: bool,
}

/// Recognise `<name ...>`, `</name>` or `<name .../>` at `i`.
fn tag_at(s: &str, i: usize) -> Option<TagSpan> {
    let bytes = s.as_bytes();
    let mut j = i + 1;
    let closing = bytes.get(j) == Some(&b'/');
    if closing {
        j += 1;
    }
    let name_start = j;
    while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
        j += 1;
    }
    if j == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }
    let name = s[name_start..j].to_ascii_lowercase();
    while j < bytes.len() && bytes[j] != b'>' && bytes[j] != b'<' {
        j += 1;
    }
    if j >= bytes.len() || bytes[j] != b'>' {
        return None;
    }
    Some(TagSpan {
        name,
        end: j + 1,
        closing,
        self_closing: !closing && bytes[j - 1] == b'/',
    })
}

/// Find `</name>` (ASCII case-insensitive, optional whitespace before `>`)
/// at or after `from`. Returns the (start, end) offsets of the close tag.
fn find_close_tag(s: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    for (rel, _) in s[from..].match_indices("</") {
        let start = from + rel;
        let name_start = start + 2;
        let name_end = name_start + name.len();
        if name_end > bytes.len() || !bytes[name_start..name_end].eq_ignore_ascii_case(name.as_bytes())
        {
            continue;
        }
        let mut j = name_end;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'>' {
            return Some((start, j + 1));
        }
    }
    None
}

/// Emit `<kind><title>..</title><part>..</part>..</kind>` for a template or
/// template argument body.
fn emit_construct(out: &mut String, kind: &str, body: &str) {
    let mut parts = split_top_level_pipes(body).into_iter();
    out.push('<');
    out.push_str(kind);
    out.push('>');
    if let Some(title) = parts.next() {
        push_element(out, "title", title.trim());
    }
    for part in parts {
        push_element(out, "part", &part);
    }
    out.push_str("</");
    out.push_str(kind);
    out.push('>');
}

fn push_element(out: &mut String, name: &str, content: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&encode_text(content));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Split on top-level '|' characters, ignoring pipes inside nested templates
/// or links.
fn split_top_level_pipes(s: &str) -> Vec<String> {
    let bytes = s.as_bytes();
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut i = 0usize;
    let mut brace_depth = 0usize;
    let mut bracket_depth = 0usize;

    while i < bytes.len() {
        if i + 1 < bytes.len() && bytes[i] == b'{' && bytes[i + 1] == b'{' {
            brace_depth += 1;
            buf.push_str("{{");
            i += 2;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i] == b'}' && bytes[i + 1] == b'}' {
            brace_depth = brace_depth.saturating_sub(1);
            buf.push_str("}}");
            i += 2;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i] == b'[' && bytes[i + 1] == b'[' {
            bracket_depth += 1;
            buf.push_str("[[");
            i += 2;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i] == b']' && bytes[i + 1] == b']' {
            bracket_depth = bracket_depth.saturating_sub(1);
            buf.push_str("]]");
            i += 2;
            continue;
        }
        if bytes[i] == b'|' && brace_depth == 0 && bracket_depth == 0 {
            out.push(std::mem::take(&mut buf));
            i += 1;
            continue;
        }

        let ch = s_char_at(s, i);
        buf.push(ch);
        i += ch.len_utf8();
    }

    out.push(buf);
    out
}

fn run_len(bytes: &[u8], start: usize, b: u8) -> usize {
    bytes[start..].iter().take_while(|&&c| c == b).count()
}

/// Read the char at byte index i. `i` must be a char boundary inside `s`.
fn s_char_at(s: &str, i: usize) -> char {
    s[i..].chars().next().unwrap_or('\u{FFFD}')
}
