//! URI, JSON Pointer, and exact-decimal number primitives shared by the
//! JSON Schema compiler and evaluation engine.
//!
//! This crate has no knowledge of JSON Schema itself; it exists so that
//! `jsonschema-evaluator` can build the catalog, compiler, and keyword
//! implementations on top of a small set of correctly-specified leaf types.

pub mod error;
pub mod number;
pub mod pointer;
pub mod uri;

pub use error::{NumberError, PointerError, UriError};
pub use pointer::{PointerBuf, RelativePointer, Token};
pub use uri::{AbsoluteUri, Uri};
