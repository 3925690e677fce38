//! Non-fatal events raised while stripping markup.
//!
//! Stages that recover from malformed input report what they did through a
//! `DiagnosticSink` passed in by the caller. `LogSink` forwards everything
//! to `log::warn!`; a `Vec<Diagnostic>` collects the events so tests and
//! callers can inspect them.

use std::fmt;

use serde::Serialize;

/// A recoverable problem found in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `|}` with no open table. The text before it was kept.
    UnmatchedTableClose { offset: usize },
    /// Input ended while `depth` tables were still open; everything after
    /// the outermost `{|` at `offset` was dropped.
    UnterminatedTable { offset: usize, depth: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedTableClose { offset } => {
                write!(f, "unmatched table close '|}}' at {}", offset)
            }
            Diagnostic::UnterminatedTable { offset, depth } => write!(
                f,
                "table opened at {} never closed ({} level(s) open at end of input)",
                offset, depth
            ),
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Sink that writes every diagnostic to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic::UnmatchedTableClose { offset: 3 });
        sink.report(Diagnostic::UnterminatedTable {
            offset: 10,
            depth: 2,
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0], Diagnostic::UnmatchedTableClose { offset: 3 });
    }

    #[test]
    fn display_mentions_offset() {
        let d = Diagnostic::UnmatchedTableClose { offset: 17 };
        assert!(d.to_string().contains("17"));
        assert!(d.to_string().contains("|}"));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let d = Diagnostic::UnterminatedTable {
            offset: 4,
            depth: 1,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"kind":"unterminated_table","offset":4,"depth":1}"#);
    }
}
