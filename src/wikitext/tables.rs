//! Nested table removal.
//!
//! Tables are delimited by `{|` and `|}` and may nest. A single left to
//! right scan keeps a depth counter; only text seen at depth 0 reaches the
//! output, so a table and every table inside it vanish together.
//!
//! Malformed input is recovered, never rejected:
//! - a `|}` at depth 0 keeps the text before it, drops the delimiter and
//!   reports `Diagnostic::UnmatchedTableClose`;
//! - a table still open at the end of input swallows the rest of the text
//!   and reports `Diagnostic::UnterminatedTable`.

use crate::wikitext::diagnostics::{Diagnostic, DiagnosticSink};

pub const TABLE_OPEN: &str = "{|";
pub const TABLE_CLOSE: &str = "|}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Open,
    Close,
}

/// A delimiter found by the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occurrence {
    kind: Delimiter,
    position: usize,
}

/// Yields delimiters left to right. The next position of each marker is
/// cached and only searched again once the cursor has passed it, so the
/// whole scan reads the text a bounded number of times.
struct DelimiterScanner<'a> {
    text: &'a str,
    next_open: Option<usize>,
    next_close: Option<usize>,
}

impl<'a> DelimiterScanner<'a> {
    fn new(text: &'a str) -> Self {
        DelimiterScanner {
            text,
            next_open: text.find(TABLE_OPEN),
            next_close: text.find(TABLE_CLOSE),
        }
    }

    /// The first delimiter starting at or after `cursor`. On a tie ("{|}"
    /// read from the brace) the open wins.
    fn next_from(&mut self, cursor: usize) -> Option<Occurrence> {
        if self.next_open.is_some_and(|p| p < cursor) {
            self.next_open = self.text[cursor..].find(TABLE_OPEN).map(|p| cursor + p);
        }
        if self.next_close.is_some_and(|p| p < cursor) {
            self.next_close = self.text[cursor..].find(TABLE_CLOSE).map(|p| cursor + p);
        }
        let (kind, position) = match (self.next_open, self.next_close) {
            (None, None) => return None,
            (Some(o), None) => (Delimiter::Open, o),
            (None, Some(c)) => (Delimiter::Close, c),
            (Some(o), Some(c)) if o <= c => (Delimiter::Open, o),
            (_, Some(c)) => (Delimiter::Close, c),
        };
        Some(Occurrence { kind, position })
    }
}

/// Remove every balanced `{|` ... `|}` span from `text`, at any depth.
pub fn strip_tables(text: &str, sink: &mut dyn DiagnosticSink) -> String {
    let mut buf = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut cursor = 0usize;
    let mut outermost_open = 0usize;
    let mut scanner = DelimiterScanner::new(text);

    while let Some(Occurrence { kind, position: pos }) = scanner.next_from(cursor) {
        match kind {
            Delimiter::Open => {
                if depth == 0 {
                    buf.push_str(&text[cursor..pos]);
                    outermost_open = pos;
                }
                depth += 1;
                cursor = pos + TABLE_OPEN.len();
            }
            Delimiter::Close => {
                if depth > 0 {
                    depth -= 1;
                } else {
                    buf.push_str(&text[cursor..pos]);
                    sink.report(Diagnostic::UnmatchedTableClose { offset: pos });
                }
                cursor = pos + TABLE_CLOSE.len();
            }
        }
    }

    if depth == 0 {
        buf.push_str(&text[cursor..]);
    } else {
        sink.report(Diagnostic::UnterminatedTable {
            offset: outermost_open,
            depth,
        });
    }
    buf
}
