//! Compiler diagnostics: raw transform-failure text and its normalized form
//!
//! Every failure is first rendered in the classic transform-failure format
//!
//! ```text
//! Transform failed with 1 error:
//! <stdin>:3:14: ERROR: Unterminated string
//! ```
//!
//! which is what callers historically parse. [`normalize`] then extracts the
//! `line:column:` position into [`ErrorMeta`] and strips the standard-input
//! markers for display.

use std::sync::OnceLock;

use oxc_diagnostics::OxcDiagnostic;
use regex::Regex;

use crate::result::{CompileFailure, ErrorMeta, MessageId};

/// Marker the transform-failure format uses in place of a file name.
pub const STDIN_MARKER: &str = "<stdin>:";

/// Escaped newline some compilers leave in quoted tokens.
const ESCAPED_NEWLINE: &str = "\"\\x0A\"";

/// Position of a diagnostic inside the snippet, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Render OXC diagnostics in the transform-failure format.
pub fn render_failure(source: &str, errors: &[OxcDiagnostic]) -> String {
    let count = errors.len();
    let mut out = format!(
        "Transform failed with {} error{}:",
        count,
        if count == 1 { "" } else { "s" }
    );
    for error in errors {
        let position = error
            .labels
            .as_ref()
            .and_then(|labels| {
                labels
                    .iter()
                    .find(|label| label.primary())
                    .or_else(|| labels.first())
            })
            .map(|label| offset_to_position(source, label.offset()))
            .unwrap_or(Position { line: 1, column: 1 });
        out.push_str(&format!(
            "\n{}{}:{}: ERROR: {}",
            STDIN_MARKER, position.line, position.column, error.message
        ));
        if let Some(help) = &error.help {
            out.push_str(&format!(" ({})", help));
        }
    }
    out
}

/// Extract the first `<stdin>:line:column:` position from a raw message.
pub fn parse_position(raw: &str) -> Option<Position> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PATTERN
        .get_or_init(|| Regex::new(r"<stdin>:(\d+):(\d+):").ok())
        .as_ref()?;
    let captures = re.captures(raw)?;
    Some(Position {
        line: captures.get(1)?.as_str().parse().ok()?,
        column: captures.get(2)?.as_str().parse().ok()?,
    })
}

/// Strip standard-input markers and escaped newlines for display.
pub fn format_error(raw: &str) -> String {
    raw.replace(STDIN_MARKER, "").replace(ESCAPED_NEWLINE, "")
}

/// Turn a raw failure message into the error result delivered to callers.
pub fn normalize(raw: &str, message_id: MessageId) -> CompileFailure {
    CompileFailure {
        error: format_error(raw),
        message_id,
        meta: parse_position(raw).map(|position| ErrorMeta::CompilationError {
            line: position.line,
        }),
    }
}

/// Convert a byte offset into a 1-based line and column.
pub fn offset_to_position(source: &str, offset: usize) -> Position {
    let offset = offset.min(source.len());
    let mut line = 1u32;
    let mut line_start = 0usize;
    for (index, byte) in source.bytes().enumerate().take(offset) {
        if byte == b'\n' {
            line += 1;
            line_start = index + 1;
        }
    }
    let column = source
        .get(line_start..offset)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(offset - line_start);
    Position {
        line,
        column: column as u32 + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "Transform failed with 1 error:\n<stdin>:3:14: ERROR: Unterminated string";

    #[test]
    fn parses_first_position() {
        assert_eq!(parse_position(RAW), Some(Position { line: 3, column: 14 }));
        assert_eq!(parse_position("no position here"), None);
    }

    #[test]
    fn strips_markers() {
        let formatted = format_error(RAW);
        assert!(!formatted.contains("<stdin>"));
        assert!(formatted.contains("3:14: ERROR: Unterminated string"));
        assert_eq!(format_error("Expected \"\\x0A\" here"), "Expected  here");
    }

    #[test]
    fn normalize_keeps_message_and_line() {
        let failure = normalize(RAW, 9);
        assert_eq!(failure.message_id, 9);
        assert_eq!(failure.line(), Some(3));
        assert!(failure.error.starts_with("Transform failed with 1 error:"));

        let failure = normalize("worker exploded", 1);
        assert_eq!(failure.meta, None);
        assert_eq!(failure.error, "worker exploded");
    }

    #[test]
    fn offsets_map_to_lines() {
        let source = "a\nbc\ndef";
        assert_eq!(offset_to_position(source, 0), Position { line: 1, column: 1 });
        assert_eq!(offset_to_position(source, 3), Position { line: 2, column: 2 });
        assert_eq!(offset_to_position(source, 5), Position { line: 3, column: 1 });
        assert_eq!(offset_to_position(source, 100), Position { line: 3, column: 4 });
    }
}
