//! Error types for compilation, catalog operations, and evaluation.

use schema_core::{NumberError, PointerError, UriError};
use serde_json::Value;
use snafu::{Backtrace, Snafu};

/// An error that aborts schema compilation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(Ctx)))]
pub enum CompileError {
    #[snafu(display("schema at \"{uri}\" is invalid against its metaschema: {detail}"))]
    InvalidSchema {
        uri: String,
        detail: String,
        backtrace: Backtrace,
    },

    #[snafu(display("\"$id\" value \"{value}\" could not be resolved to an absolute URI: {source}"))]
    InvalidId {
        value: String,
        #[snafu(backtrace)]
        source: UriError,
    },

    #[snafu(display("vocabulary \"{uri}\" required by metaschema \"{metaschema_uri}\" is not registered"))]
    UnknownVocabulary { uri: String, metaschema_uri: String },

    #[snafu(display("metaschema \"{uri}\" does not declare a core vocabulary"))]
    MissingCoreVocabulary { uri: String },

    #[snafu(transparent)]
    Catalog {
        #[snafu(backtrace)]
        source: CatalogError,
    },

    #[snafu(transparent)]
    Uri {
        #[snafu(backtrace)]
        source: UriError,
    },

    #[snafu(transparent)]
    Pointer {
        #[snafu(backtrace)]
        source: PointerError,
    },
}

/// An error raised by catalog operations (`add_source`, `get_schema`, session
/// management).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(Ctx)))]
pub enum CatalogError {
    #[snafu(display("no schema or source is registered for \"{uri}\""))]
    UnknownUri { uri: String, backtrace: Backtrace },

    #[snafu(display("\"{uri}\" resolves to a JSON value that is not a schema"))]
    NotASchema { uri: String, backtrace: Backtrace },

    #[snafu(display("source for prefix \"{prefix}\" is invalid: {reason}"))]
    InvalidSource { prefix: String, reason: String },

    #[snafu(display("format \"{format}\" was requested but is not enabled"))]
    FormatNotEnabled { format: String },

    #[snafu(display("session \"{session}\" is already in use"))]
    SessionInUse { session: String },

    #[snafu(transparent)]
    Pointer {
        #[snafu(backtrace)]
        source: PointerError,
    },

    #[snafu(transparent)]
    Uri {
        #[snafu(backtrace)]
        source: UriError,
    },
}

/// An evaluation-time fault unrelated to ordinary instance invalidity (a
/// lazily-discovered reference failure, or a format validator itself
/// erroring). Captured on the nearest scope rather than propagated.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(Ctx)))]
pub enum EvaluateError {
    #[snafu(display("failed to resolve reference \"{uri}\": {source}"))]
    ReferenceUnresolved {
        uri: String,
        #[snafu(backtrace)]
        source: CatalogError,
    },

    #[snafu(display("numeric keyword could not parse its operand: {source}"))]
    Number {
        #[snafu(backtrace)]
        source: NumberError,
    },

    #[snafu(display("format validator \"{format}\" raised an error: {reason}"))]
    FormatValidator { format: String, reason: String },

    #[snafu(display("value at \"{path}\" is not a valid schema: {value}"))]
    NotASchema { path: String, value: Value },
}
