//! Value parsers shared by settings resolution and plugin configuration.
//!
//! Every setting and every plugin variable names one [`ValueParser`]; raw
//! environment strings are turned into a typed [`Value`] through it, so the
//! same grammar applies no matter which source produced the string.

use deckhand_core::BasicAuthUser;
use derive_more::Display;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

// A `user:pass` token. Neither half may contain a colon or whitespace.
static BASIC_AUTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^:\s]+:[^:\s]+").unwrap());

const BOOL_TRUE: &[&str] = &["1", "on", "t", "true", "y", "yes"];
const BOOL_FALSE: &[&str] = &["0", "off", "f", "false", "n", "no"];

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent optional value.
    Null,
    Text(String),
    Bool(bool),
    Int(i64),
    List(Vec<String>),
    Credentials(Vec<BasicAuthUser>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

/// Parser failure for a single raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected an integer, got {0:?}")]
    Int(String),

    #[error("expected a boolean, got {0:?}")]
    Bool(String),
}

/// Options that apply to every parser in one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Interpret backslash escapes in text and list items.
    pub unescape: bool,
}

/// The registry of conversion functions, keyed by type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ValueParser {
    #[display("string")]
    Text,
    #[display("bool")]
    Bool,
    #[display("int")]
    Int,
    #[display("list")]
    List,
    #[display("basic-auth")]
    BasicAuth,
}

impl ValueParser {
    /// Convert a raw environment string into a typed value.
    pub fn parse(self, raw: &str, options: ParseOptions) -> Result<Value, ParseError> {
        match self {
            ValueParser::Text if options.unescape => Ok(Value::Text(unescape(raw))),
            ValueParser::Text => Ok(Value::Text(raw.to_string())),
            ValueParser::Bool => parse_bool(raw).map(Value::Bool),
            ValueParser::Int => parse_int(raw).map(Value::Int),
            ValueParser::List => {
                let items = parse_list(raw);
                if options.unescape {
                    Ok(Value::List(items.iter().map(|s| unescape(s)).collect()))
                } else {
                    Ok(Value::List(items))
                }
            }
            ValueParser::BasicAuth => Ok(Value::Credentials(parse_basic_auth(raw))),
        }
    }
}

/// Parse a boolean flag. Accepts the usual yes/no spellings, case-insensitively.
pub fn parse_bool(raw: &str) -> Result<bool, ParseError> {
    let lowered = raw.trim().to_ascii_lowercase();
    if BOOL_TRUE.contains(&lowered.as_str()) {
        Ok(true)
    } else if BOOL_FALSE.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(ParseError::Bool(raw.to_string()))
    }
}

pub fn parse_int(raw: &str) -> Result<i64, ParseError> {
    raw.trim()
        .parse()
        .map_err(|_| ParseError::Int(raw.to_string()))
}

/// Split a comma separated list, trimming items and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract whitespace separated `user:pass` pairs. Malformed tokens are skipped.
pub fn parse_basic_auth(raw: &str) -> Vec<BasicAuthUser> {
    BASIC_AUTH_REGEX
        .find_iter(raw)
        .filter_map(|m| BasicAuthUser::from_colon_string(m.as_str()))
        .collect()
}

/// Interpret backslash escape sequences.
///
/// Unknown or truncated sequences are kept verbatim, backslash included.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(&next) = chars.peek() else {
            out.push('\\');
            break;
        };

        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            '0' => Some('\0'),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'v' => Some('\x0b'),
            _ => None,
        };
        if let Some(replacement) = simple {
            chars.next();
            out.push(replacement);
            continue;
        }

        let width = match next {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => 0,
        };
        if width > 0 {
            let digits: String = chars.clone().skip(1).take(width).collect();
            let decoded = (digits.len() == width)
                .then(|| u32::from_str_radix(&digits, 16).ok())
                .flatten()
                .and_then(char::from_u32);
            if let Some(decoded) = decoded {
                for _ in 0..=width {
                    chars.next();
                }
                out.push(decoded);
                continue;
            }
        }

        out.push('\\');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: ValueParser, raw: &str) -> Result<Value, ParseError> {
        parser.parse(raw, ParseOptions::default())
    }

    #[test]
    fn test_parse_bool() {
        for raw in ["0", "No", "n", "False", "off"] {
            assert_eq!(parse(ValueParser::Bool, raw), Ok(Value::Bool(false)), "{raw}");
        }
        for raw in ["1", "Yes", "Y", "True", "ON"] {
            assert_eq!(parse(ValueParser::Bool, raw), Ok(Value::Bool(true)), "{raw}");
        }
        assert!(parse(ValueParser::Bool, "").is_err());
        assert!(parse(ValueParser::Bool, "2").is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse(ValueParser::Int, "9001"), Ok(Value::Int(9001)));
        assert_eq!(parse(ValueParser::Int, "-1"), Ok(Value::Int(-1)));
        assert_eq!(parse(ValueParser::Int, "0"), Ok(Value::Int(0)));
        assert_eq!(
            parse(ValueParser::Int, ""),
            Err(ParseError::Int(String::new()))
        );
        assert!(parse(ValueParser::Int, "not an int").is_err());
        assert!(parse(ValueParser::Int, "123.4").is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(""), Vec::<String>::new());
        assert_eq!(parse_list("foo"), vec!["foo"]);
        assert_eq!(parse_list("foo, bar,,"), vec!["foo", "bar"]);
        assert_eq!(parse_list(r#"["foo", "bar"]"#), vec![r#"["foo""#, r#""bar"]"#]);
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        assert_eq!(parse(ValueParser::Text, ""), Ok(Value::from("")));
        assert_eq!(parse(ValueParser::Text, "foo,bar"), Ok(Value::from("foo,bar")));
        assert_eq!(parse(ValueParser::Text, r"a\nb"), Ok(Value::from(r"a\nb")));
    }

    #[test]
    fn test_parse_basic_auth() {
        assert_eq!(
            parse_basic_auth("test:test"),
            vec![BasicAuthUser::new("test", "test")]
        );
        assert_eq!(
            parse_basic_auth("test:test, testing:testing"),
            vec![
                BasicAuthUser::new("test", "test,"),
                BasicAuthUser::new("testing", "testing"),
            ]
        );
        assert_eq!(
            parse_basic_auth("test:test testing::testing"),
            vec![BasicAuthUser::new("test", "test")]
        );
        assert_eq!(
            parse_basic_auth("aja899€#:()Jtr4ng83"),
            vec![BasicAuthUser::new("aja899€#", "()Jtr4ng83")]
        );
        assert_eq!(
            parse_basic_auth("username:firstpart:only"),
            vec![BasicAuthUser::new("username", "firstpart")]
        );
    }

    #[test]
    fn test_parse_basic_auth_skips_malformed_input() {
        assert!(parse_basic_auth("").is_empty());
        assert!(parse_basic_auth("username").is_empty());
        assert!(parse_basic_auth("test test").is_empty());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"Hello\nworld!"), "Hello\nworld!");
        assert_eq!(unescape(r"foo\tbar"), "foo\tbar");
        assert_eq!(unescape(r"fizz\\buzz"), "fizz\\buzz");
        assert_eq!(unescape(r"\x41\u00e9"), "Aé");
        assert_eq!(unescape("plain ünïcode"), "plain ünïcode");
    }

    #[test]
    fn test_unescape_keeps_unknown_sequences() {
        assert_eq!(unescape(r"C:\path"), r"C:\path");
        assert_eq!(unescape(r"trailing\"), r"trailing\");
        assert_eq!(unescape(r"\xZZ"), r"\xZZ");
    }

    #[test]
    fn test_unescape_applies_to_list_items() {
        let options = ParseOptions { unescape: true };
        assert_eq!(
            ValueParser::List.parse(r"foo\tbar,fizz\\buzz", options),
            Ok(Value::List(vec!["foo\tbar".into(), "fizz\\buzz".into()]))
        );
    }
}
