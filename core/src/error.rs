//! Error types shared by the URI, JSON Pointer, and number primitives.

use thiserror::Error;

/// Failure to parse or resolve a [`crate::uri::Uri`] / [`crate::uri::AbsoluteUri`].
#[derive(Debug, Error)]
pub enum UriError {
    #[error("failed to parse URI reference \"{value}\": {reason}")]
    Parse { value: String, reason: String },

    #[error("\"{value}\" is not an absolute URI (missing scheme)")]
    NotAbsolute { value: String },

    #[error("failed to resolve reference \"{reference}\" against base \"{base}\": {reason}")]
    Resolve {
        base: String,
        reference: String,
        reason: String,
    },

    #[error("URI component \"{component}\" is not valid: {value}")]
    InvalidComponent { component: &'static str, value: String },
}

/// Failure to parse or evaluate a [`crate::pointer::Pointer`] against a JSON
/// document.
#[derive(Debug, Error)]
pub enum PointerError {
    #[error("JSON pointer must be empty or start with \"/\": \"{0}\"")]
    Malformed(String),

    #[error("invalid percent-encoding or \"~\" escape in token \"{0}\"")]
    InvalidEscape(String),

    #[error("pointer \"{pointer}\" does not reference a value in the document")]
    NotFound { pointer: String },

    #[error("token \"{token}\" cannot index into a {kind}")]
    WrongType { token: String, kind: &'static str },

    #[error("relative JSON pointer \"{0}\" is malformed")]
    MalformedRelative(String),

    #[error("relative JSON pointer \"{pointer}\" ascends past the document root")]
    OriginExhausted { pointer: String },
}

/// Failure to parse a JSON number as an exact decimal, or an overflow while
/// converting between integer widths.
#[derive(Debug, Error)]
pub enum NumberError {
    #[error("unexpected character '{character}' at index {index} in numeric literal \"{value}\"")]
    UnexpectedChar {
        value: String,
        character: char,
        index: usize,
    },

    #[error("failed to parse exponent in numeric literal \"{value}\": {source}")]
    Exponent {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("numeric literal \"{0}\" is empty")]
    Empty(String),
}
