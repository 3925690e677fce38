//! Markup parsing and text flattening.
//!
//! The intermediate markup is parsed into an `Element` tree that follows the
//! text/tail model: `text` is what appears inside an element before its
//! first child, `tail` is what follows the element's end before the next
//! sibling. Flattening keeps the root's text and the tail of each direct
//! child, so any element at the top level disappears together with its
//! content (`<ref>`, `<math>`, `<template>`) while the prose around it stays.
//!
//! `TagSoupParser` is a permissive builder for that tree. It is not an HTML
//! parser: it knows start, end and self-closing tags, void elements,
//! comments and declarations, and recovers from everything else:
//! - a `<` that does not begin one of those constructs is dropped,
//! - an end tag closes the nearest open element with the same name,
//! - an end tag without an open element is ignored,
//! - elements still open at the end of input are closed there.

use html_escape::decode_html_entities;

use crate::config::DEFAULT_MAX_MARKUP_DEPTH;
use crate::wikitext::errors::MalformedMarkupError;

/// Name of the synthetic element wrapping a document with several top-level nodes.
pub const DOCUMENT: &str = "#document";
pub const COMMENT: &str = "#comment";
pub const DECLARATION: &str = "#declaration";

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// A node of the parsed markup tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name, or one of `DOCUMENT`, `COMMENT`, `DECLARATION`.
    pub name: String,
    pub text: String,
    pub tail: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builds an `Element` tree from intermediate markup.
pub trait MarkupParser: Send + Sync {
    fn parse(&self, markup: &str) -> Result<Element, MalformedMarkupError>;
}

/// The root's own text followed by the tail of every direct child, in
/// document order.
pub fn flatten(root: &Element) -> String {
    let mut out = root.text.clone();
    for child in &root.children {
        out.push_str(&child.tail);
    }
    out
}

/// Parse `markup` with `parser` and flatten the result.
pub fn flattened_text(
    parser: &dyn MarkupParser,
    markup: &str,
) -> Result<String, MalformedMarkupError> {
    let root = parser.parse(markup)?;
    Ok(flatten(&root))
}

/// Permissive tag-soup parser. See the module docs for its recovery rules.
#[derive(Debug, Clone)]
pub struct TagSoupParser {
    max_depth: usize,
}

impl Default for TagSoupParser {
    fn default() -> Self {
        TagSoupParser::new(DEFAULT_MAX_MARKUP_DEPTH)
    }
}

impl TagSoupParser {
    pub fn new(max_depth: usize) -> Self {
        TagSoupParser { max_depth }
    }
}

impl MarkupParser for TagSoupParser {
    fn parse(&self, markup: &str) -> Result<Element, MalformedMarkupError> {
        if markup.trim().is_empty() {
            return Err(MalformedMarkupError::new("document is empty"));
        }

        let mut builder = TreeBuilder::new(self.max_depth);
        let mut buf = String::new();
        let mut i = 0usize;

        while i < markup.len() {
            let next = markup[i..].find('<').map_or(markup.len(), |r| i + r);
            buf.push_str(&markup[i..next]);
            i = next;
            if i >= markup.len() {
                break;
            }
            match lex_markup(markup, i) {
                Some((token, end)) => {
                    builder.text(&buf);
                    buf.clear();
                    builder.token(token, i)?;
                    i = end;
                }
                // stray '<'
                None => i += 1,
            }
        }
        builder.text(&buf);

        Ok(builder.finish())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Start { name: String, self_closing: bool },
    End { name: String },
    Comment,
    Declaration,
}

/// Recognise the construct starting with the `<` at `i`. Returns the token
/// and the offset just past it, or `None` for a stray `<`.
fn lex_markup(s: &str, i: usize) -> Option<(Token, usize)> {
    let rest = &s[i..];
    if rest.starts_with("<!--") {
        let end = rest[4..].find("-->").map_or(s.len(), |r| i + 4 + r + 3);
        return Some((Token::Comment, end));
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        return rest.find('>').map(|r| (Token::Declaration, i + r + 1));
    }

    let bytes = s.as_bytes();
    let mut j = i + 1;
    let closing = bytes.get(j) == Some(&b'/');
    if closing {
        j += 1;
    }
    if !bytes.get(j).is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let name_start = j;
    while j < bytes.len() && is_name_byte(bytes[j]) {
        j += 1;
    }
    let name = s[name_start..j].to_ascii_lowercase();
    let name_end = j;

    // attributes; quotes only count directly after '='
    let mut quote: Option<u8> = None;
    let mut after_eq = false;
    while j < bytes.len() {
        let b = bytes[j];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            j += 1;
            continue;
        }
        match b {
            b'>' => break,
            b'<' => return None,
            b'=' => after_eq = true,
            b'"' | b'\'' if after_eq => {
                quote = Some(b);
                after_eq = false;
            }
            b if b.is_ascii_whitespace() => {}
            _ => after_eq = false,
        }
        j += 1;
    }
    if j >= bytes.len() {
        return None;
    }

    let token = if closing {
        Token::End { name }
    } else {
        let self_closing = s[name_end..j].trim_end().ends_with('/');
        Token::Start { name, self_closing }
    };
    Some((token, j + 1))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Stack of open elements; index 0 is the synthetic document.
struct TreeBuilder {
    stack: Vec<Element>,
    max_depth: usize,
}

impl TreeBuilder {
    fn new(max_depth: usize) -> Self {
        TreeBuilder {
            stack: vec![Element::new(DOCUMENT)],
            max_depth,
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let decoded = decode_html_entities(raw);
        if let Some(top) = self.stack.last_mut() {
            match top.children.last_mut() {
                Some(last) => last.tail.push_str(&decoded),
                None => top.text.push_str(&decoded),
            }
        }
    }

    fn token(&mut self, token: Token, offset: usize) -> Result<(), MalformedMarkupError> {
        match token {
            Token::Start { name, self_closing } => {
                if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    self.append(Element::new(name));
                } else {
                    if self.stack.len() > self.max_depth {
                        return Err(MalformedMarkupError::at(
                            format!("elements nested deeper than {}", self.max_depth),
                            offset,
                        ));
                    }
                    self.stack.push(Element::new(name));
                }
            }
            Token::End { name } => {
                match self.stack.iter().rposition(|e| e.name == name) {
                    Some(k) if k > 0 => self.close_to(k),
                    _ => log::trace!("ignoring unmatched </{}> at {}", name, offset),
                }
            }
            Token::Comment => self.append(Element::new(COMMENT)),
            Token::Declaration => self.append(Element::new(DECLARATION)),
        }
        Ok(())
    }

    fn append(&mut self, el: Element) {
        if let Some(top) = self.stack.last_mut() {
            top.children.push(el);
        }
    }

    /// Close open elements until only `len` remain on the stack.
    fn close_to(&mut self, len: usize) {
        while self.stack.len() > len {
            if let Some(el) = self.stack.pop() {
                self.append(el);
            }
        }
    }

    /// Close everything and pick the root: the single top-level element when
    /// the markup is one element, otherwise the synthetic document.
    fn finish(mut self) -> Element {
        self.close_to(1);
        let mut doc = self.stack.pop().unwrap_or_else(|| Element::new(DOCUMENT));
        let single = doc.children.len() == 1
            && doc.text.trim().is_empty()
            && doc.children[0].tail.trim().is_empty()
            && !doc.children[0].name.starts_with('#');
        if single && let Some(mut root) = doc.children.pop() {
            root.tail.clear();
            return root;
        }
        doc
    }
}
