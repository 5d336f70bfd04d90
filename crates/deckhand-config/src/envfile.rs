//! `.env` file syntax.
//!
//! Values are taken literally: `$VAR` and `${VAR}` are never expanded, so a
//! file reads the same no matter what the surrounding process environment
//! holds. Supported forms:
//!
//! ```text
//! # comment
//! KEY=unquoted value   # trailing comment
//! export KEY=value
//! KEY='single quoted, only \\ and \' are escapes'
//! KEY="double quoted\nwith escapes"
//! KEY='values may
//! span lines inside quotes'
//! ```

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

// Whitespace followed by `#` starts a comment in an unquoted value.
static INLINE_COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+#.*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvFileError {
    #[error("line {line}: expected KEY=VALUE")]
    MissingAssignment { line: usize },

    #[error("line {line}: invalid key {key:?}")]
    InvalidKey { line: usize, key: String },

    #[error("line {line}: unterminated quoted value")]
    Unterminated { line: usize },

    #[error("line {line}: unexpected characters after quoted value")]
    TrailingCharacters { line: usize },
}

pub fn is_valid_key(key: &str) -> bool {
    KEY_REGEX.is_match(key)
}

/// Parse `content` into one result per statement, in file order.
///
/// A malformed statement yields an error for that statement only; parsing
/// continues with the next line.
pub fn parse(content: &str) -> Vec<Result<(String, String), EnvFileError>> {
    let mut statements = Vec::new();
    let mut lines = content.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line = index + 1;
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let statement = trimmed
            .strip_prefix("export ")
            .map(str::trim_start)
            .unwrap_or(trimmed);

        let Some((key, rest)) = statement.split_once('=') else {
            statements.push(Err(EnvFileError::MissingAssignment { line }));
            continue;
        };
        let key = key.trim();
        if !is_valid_key(key) {
            statements.push(Err(EnvFileError::InvalidKey {
                line,
                key: key.to_string(),
            }));
            continue;
        }

        let rest = rest.trim_start_matches([' ', '\t']);
        let value = match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let mut body = rest[1..].to_string();
                loop {
                    if let Some((value, tail)) = unquote(&body, quote) {
                        let tail = tail.trim_start();
                        break if tail.is_empty() || tail.starts_with('#') {
                            Ok(value)
                        } else {
                            Err(EnvFileError::TrailingCharacters { line })
                        };
                    }
                    match lines.next() {
                        Some((_, next)) => {
                            body.push('\n');
                            body.push_str(next);
                        }
                        None => break Err(EnvFileError::Unterminated { line }),
                    }
                }
            }
            _ => Ok(INLINE_COMMENT_REGEX.replace(rest, "").trim_end().to_string()),
        };

        statements.push(value.map(|value| (key.to_string(), value)));
    }

    statements
}

/// Decode a quoted body up to its closing `quote`.
///
/// Returns the value and whatever follows the closing quote, or `None` when
/// the quote is not closed in `body`.
fn unquote(body: &str, quote: char) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = body.char_indices();

    while let Some((index, c)) = chars.next() {
        if c == quote {
            return Some((value, &body[index + c.len_utf8()..]));
        }
        if c != '\\' {
            value.push(c);
            continue;
        }

        let (_, escaped) = chars.next()?;
        match (quote, escaped) {
            (_, '\\') => value.push('\\'),
            (_, q) if q == quote => value.push(q),
            ('"', 'n') => value.push('\n'),
            ('"', 't') => value.push('\t'),
            ('"', 'r') => value.push('\r'),
            ('"', '\'' | '$') => value.push(escaped),
            (_, other) => {
                value.push('\\');
                value.push(other);
            }
        }
    }

    None
}

/// Render one `KEY='value'` statement that [`parse`] reads back verbatim.
pub fn quote_statement(key: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("{key}='{escaped}'")
}
