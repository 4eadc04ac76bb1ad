//! A JSON Schema evaluator for drafts 2019-09 and 2020-12.
//!
//! The public surface is small: build a [`Catalog`], feed it schema
//! documents via [`Catalog::add_source`] or [`Catalog::get_schema`], then
//! [`evaluate`] an instance against a compiled schema and render the result
//! with [`output::format`].

pub mod catalog;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod format;
pub mod keyword;
pub mod metaschema;
pub mod output;
pub mod schema;
pub mod scope;
pub mod value;
pub mod vocabulary;

pub use catalog::{Catalog, Session, DEFAULT_SESSION, META_SESSION};
pub use engine::evaluate;
pub use error::{CatalogError, CompileError, EvaluateError};
pub use format::FormatValidator;
pub use output::{format as format_output, OutputFormat};
pub use schema::{CompiledSchema, SchemaKey};
pub use scope::{Scope, ScopeArena, ScopeKey, State};
pub use vocabulary::{Draft, Vocabulary};

/// Builds a [`Catalog`] with both dialects' vocabularies, metaschemas, and
/// builtin format checks already registered — the state every fresh
/// evaluation session starts from.
pub fn new_catalog() -> Result<Catalog, CompileError> {
    let mut catalog = Catalog::new();
    metaschema::bootstrap(&mut catalog)?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// `#[instrument]` spans only print with a subscriber installed; this
    /// makes `cargo test -- --nocapture` show them without every test
    /// needing its own setup.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn evaluates_a_trivial_schema() {
        init_tracing();
        let mut catalog = new_catalog().unwrap();
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "string",
            "minLength": 3
        });
        let uri = schema_core::AbsoluteUri::parse("https://example.com/trivial.json").unwrap();
        catalog.add_source(uri.clone(), schema).unwrap();
        let key = catalog.get_schema(&uri, None, DEFAULT_SESSION).unwrap();

        let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!("ok!"));
        assert!(scopes.get(root).is_valid());

        let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!("no"));
        assert!(!scopes.get(root).is_valid());
    }
}
