//! JSON Pointer ([RFC 6901]) and Relative JSON Pointer.
//!
//! [RFC 6901]: https://www.rfc-editor.org/rfc/rfc6901
//!
//! `jsonptr`'s published API shape could not be confirmed against the pinned
//! version without a working toolchain, so this is a small hand-rolled
//! implementation instead, grounded directly on `jschon`'s `jsonpointer.py`
//! (token escaping, evaluation, URI-fragment form) and `pointer.py`
//! (the array-append `"-"` token).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PointerError;

/// One reference token of a JSON Pointer: an (unescaped) object key, an
/// array index, or the `"-"` array-append marker from RFC 6901 §4.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Name(String),
    Index(usize),
    Append,
}

impl Token {
    fn parse(raw: &str) -> Self {
        if raw == "-" {
            return Token::Append;
        }
        if is_array_index(raw) {
            if let Ok(index) = raw.parse::<usize>() {
                return Token::Index(index);
            }
        }
        Token::Name(unescape(raw))
    }

    /// The unescaped string form, for object-key lookups and display.
    pub fn as_key(&self) -> String {
        match self {
            Token::Name(s) => s.clone(),
            Token::Index(i) => i.to_string(),
            Token::Append => "-".to_owned(),
        }
    }
}

fn is_array_index(raw: &str) -> bool {
    raw == "0" || (raw.starts_with(|c: char| c.is_ascii_digit() && c != '0') && raw.bytes().all(|b| b.is_ascii_digit()))
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn is_valid_syntax(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' {
            continue;
        }
        if c == '~' {
            match chars.peek() {
                Some('0') | Some('1') => {
                    chars.next();
                }
                _ => return false,
            }
        }
    }
    true
}

/// An owned, immutable JSON Pointer: a sequence of reference tokens
/// identifying a location within a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PointerBuf {
    tokens: Vec<Token>,
}

impl PointerBuf {
    /// The root pointer, `""`, referencing the whole document.
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn parse(value: impl AsRef<str>) -> Result<Self, PointerError> {
        let value = value.as_ref();
        if !is_valid_syntax(value) {
            return Err(PointerError::Malformed(value.to_owned()));
        }
        let tokens = if value.is_empty() {
            Vec::new()
        } else {
            value.split('/').skip(1).map(Token::parse).collect()
        };
        Ok(Self { tokens })
    }

    /// Parses a pointer from the portion of a URI fragment after the `#`,
    /// percent-decoding it first.
    pub fn parse_uri_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode(fragment);
        Self::parse(decoded)
    }

    /// Renders as a percent-encoded URI fragment, excluding the leading `#`.
    pub fn uri_fragment(&self) -> String {
        percent_encode(&self.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns a new pointer with `token` appended.
    pub fn with_pushed(&self, token: impl Into<PushToken>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into().0);
        Self { tokens }
    }

    /// Returns the parent pointer and the final token, or `None` if this
    /// pointer is the root.
    pub fn split_last(&self) -> Option<(Self, &Token)> {
        let (last, rest) = self.tokens.split_last()?;
        Some((Self { tokens: rest.to_vec() }, last))
    }

    pub fn evaluate<'v>(&self, document: &'v Value) -> Result<&'v Value, PointerError> {
        let mut current = document;
        for token in &self.tokens {
            current = step(current, token, self)?;
        }
        Ok(current)
    }

    pub fn evaluate_mut<'v>(&self, document: &'v mut Value) -> Result<&'v mut Value, PointerError> {
        let mut current = document;
        for token in &self.tokens {
            current = step_mut(current, token, self)?;
        }
        Ok(current)
    }
}

/// Wrapper so `with_pushed` accepts either a raw key or an array index
/// without forcing call sites to construct [`Token`] directly.
pub struct PushToken(Token);
impl From<&str> for PushToken {
    fn from(value: &str) -> Self {
        PushToken(Token::Name(value.to_owned()))
    }
}
impl From<String> for PushToken {
    fn from(value: String) -> Self {
        PushToken(Token::Name(value))
    }
}
impl From<usize> for PushToken {
    fn from(value: usize) -> Self {
        PushToken(Token::Index(value))
    }
}

fn step<'v>(value: &'v Value, token: &Token, whole: &PointerBuf) -> Result<&'v Value, PointerError> {
    match value {
        Value::Object(map) => map.get(&token.as_key()).ok_or_else(|| PointerError::NotFound {
            pointer: whole.to_string(),
        }),
        Value::Array(items) => {
            let index = array_index(token, whole)?;
            items.get(index).ok_or_else(|| PointerError::NotFound {
                pointer: whole.to_string(),
            })
        }
        _ => Err(PointerError::WrongType {
            token: token.as_key(),
            kind: kind_name(value),
        }),
    }
}

fn step_mut<'v>(value: &'v mut Value, token: &Token, whole: &PointerBuf) -> Result<&'v mut Value, PointerError> {
    match value {
        Value::Object(map) => map.get_mut(&token.as_key()).ok_or_else(|| PointerError::NotFound {
            pointer: whole.to_string(),
        }),
        Value::Array(items) => {
            let index = array_index(token, whole)?;
            items.get_mut(index).ok_or_else(|| PointerError::NotFound {
                pointer: whole.to_string(),
            })
        }
        other => Err(PointerError::WrongType {
            token: token.as_key(),
            kind: kind_name(other),
        }),
    }
}

fn array_index(token: &Token, whole: &PointerBuf) -> Result<usize, PointerError> {
    match token {
        Token::Index(i) => Ok(*i),
        Token::Append => Err(PointerError::NotFound { pointer: whole.to_string() }),
        Token::Name(_) => Err(PointerError::WrongType {
            token: token.as_key(),
            kind: "array",
        }),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for PointerBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(&token.as_key()))?;
        }
        Ok(())
    }
}

impl FromStr for PointerBuf {
    type Err = PointerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PointerBuf {
    type Error = PointerError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PointerBuf> for String {
    fn from(pointer: PointerBuf) -> Self {
        pointer.to_string()
    }
}

/// A borrowed view equivalent to [`PointerBuf`]; kept as a type alias since
/// tokens are always owned `String`/`usize` once parsed and this crate never
/// borrows pointer text out of the source document.
pub type Pointer = PointerBuf;

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&value[i + 1..i + 3], 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// A Relative JSON Pointer: a non-negative ascent count, optionally followed
/// by either an index-manipulation marker (`#`) or a plain [`PointerBuf`]
/// descent from the ancestor reached by ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePointer {
    pub ascent: usize,
    pub index_manipulation: bool,
    pub pointer: PointerBuf,
}

impl RelativePointer {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, PointerError> {
        let value = value.as_ref();
        let digits_len = value.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits_len == 0 {
            return Err(PointerError::MalformedRelative(value.to_owned()));
        }
        let ascent: usize = value[..digits_len]
            .parse()
            .map_err(|_| PointerError::MalformedRelative(value.to_owned()))?;
        let rest = &value[digits_len..];
        if rest == "#" {
            return Ok(Self { ascent, index_manipulation: true, pointer: PointerBuf::root() });
        }
        let pointer = PointerBuf::parse(rest).map_err(|_| PointerError::MalformedRelative(value.to_owned()))?;
        Ok(Self { ascent, index_manipulation: false, pointer })
    }

    /// Applies this relative pointer to `origin`, a pointer into the
    /// document identifying the instance the relative pointer is evaluated
    /// from, returning the resulting absolute pointer.
    ///
    /// Index-manipulation relative pointers (trailing `#`) have no absolute
    /// pointer result; callers wanting the evaluated name/index should use
    /// [`RelativePointer::index_manipulation`] against `origin` directly.
    pub fn apply(&self, origin: &PointerBuf) -> Result<PointerBuf, PointerError> {
        let keep = origin
            .tokens
            .len()
            .checked_sub(self.ascent)
            .ok_or_else(|| PointerError::OriginExhausted { pointer: origin.to_string() })?;
        let mut tokens = origin.tokens[..keep].to_vec();
        tokens.extend(self.pointer.tokens.iter().cloned());
        Ok(PointerBuf { tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_root() {
        let pointer = PointerBuf::parse("").unwrap();
        assert!(pointer.is_root());
    }

    #[test]
    fn rejects_pointer_without_leading_slash() {
        assert!(PointerBuf::parse("foo").is_err());
    }

    #[test]
    fn unescapes_tilde_and_slash() {
        let pointer = PointerBuf::parse("/a~1b/c~0d").unwrap();
        assert_eq!(pointer.tokens()[0].as_key(), "a/b");
        assert_eq!(pointer.tokens()[1].as_key(), "c~d");
    }

    #[test]
    fn round_trips_through_display() {
        let pointer = PointerBuf::parse("/a~1b/c~0d").unwrap();
        assert_eq!(pointer.to_string(), "/a~1b/c~0d");
    }

    #[test]
    fn evaluates_nested_object_and_array() {
        let document = json!({"foo": ["bar", "baz"], "": 0});
        let pointer = PointerBuf::parse("/foo/1").unwrap();
        assert_eq!(pointer.evaluate(&document).unwrap(), "baz");

        let pointer = PointerBuf::parse("").unwrap();
        assert_eq!(*pointer.evaluate(&document).unwrap(), document);

        let pointer = PointerBuf::parse("/").unwrap();
        assert_eq!(pointer.evaluate(&document).unwrap(), 0);
    }

    #[test]
    fn evaluate_reports_missing_path() {
        let document = json!({"foo": "bar"});
        let pointer = PointerBuf::parse("/baz").unwrap();
        assert!(pointer.evaluate(&document).is_err());
    }

    #[test]
    fn uri_fragment_round_trips() {
        let pointer = PointerBuf::parse("/a b/c").unwrap();
        let fragment = pointer.uri_fragment();
        let parsed = PointerBuf::parse_uri_fragment(&fragment).unwrap();
        assert_eq!(pointer, parsed);
    }

    #[test]
    fn relative_pointer_ascends_and_descends() {
        let origin = PointerBuf::parse("/a/b/c").unwrap();
        let relative = RelativePointer::parse("2/d").unwrap();
        let applied = relative.apply(&origin).unwrap();
        assert_eq!(applied.to_string(), "/a/d");
    }

    #[test]
    fn relative_pointer_index_manipulation_has_no_suffix() {
        let relative = RelativePointer::parse("1#").unwrap();
        assert!(relative.index_manipulation);
        assert!(relative.pointer.is_root());
    }

    #[test]
    fn relative_pointer_rejects_missing_digits() {
        assert!(RelativePointer::parse("#").is_err());
    }
}
