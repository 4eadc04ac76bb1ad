//! Bootstraps the two built-in dialects: registers their vocabularies,
//! compiles their metaschema documents into the `__meta__` cache partition,
//! and registers the builtin format checks.
//!
//! Grounded on jschon's `create_catalog` (`catalog/__init__.py`), which does
//! exactly this three-step bootstrap before a caller can compile anything
//! against "https://json-schema.org/draft/2020-12/schema".

use schema_core::AbsoluteUri;
use serde_json::{json, Value};

use crate::catalog::{Catalog, META_SESSION};
use crate::compiler::{self, CompileArgs};
use crate::error::CompileError;
use crate::format;
use crate::vocabulary::{self, Draft};

/// Registers both dialects' vocabularies and metaschemas, and the builtin
/// format validators (disabled by default; see [`crate::format`]).
pub fn bootstrap(catalog: &mut Catalog) -> Result<(), CompileError> {
    for draft in [Draft::Dialect201909, Draft::Dialect202012] {
        for vocab in vocabulary::default_vocabularies(draft) {
            catalog.create_vocabulary(vocab);
        }
    }
    compile_metaschema(catalog, Draft::Dialect201909, metaschema_2019_09())?;
    compile_metaschema(catalog, Draft::Dialect202012, metaschema_2020_12())?;
    format::register_defaults(catalog);
    Ok(())
}

fn compile_metaschema(catalog: &mut Catalog, draft: Draft, document: Value) -> Result<(), CompileError> {
    let uri = AbsoluteUri::parse(draft.metaschema_uri()).expect("builtin metaschema URI is well-formed");
    let key = compiler::compile(
        catalog,
        CompileArgs {
            value: document,
            uri: Some(uri.clone()),
            metaschema_uri: Some(uri.clone()),
            parent: None,
            pointer: schema_core::PointerBuf::root(),
            session: META_SESSION.to_owned(),
        },
    )?;
    catalog.insert_schema(META_SESSION, uri.clone(), key);
    catalog.register_metaschema(uri, key);
    Ok(())
}

/// A deliberately minimal rendition of the 2019-09 metaschema: enough for
/// `$vocabulary` resolution and dialect bootstrap. Self-validation of
/// schemas against the full upstream metaschema text is out of scope (see
/// DESIGN.md's "metaschema self-validation" decision).
fn metaschema_2019_09() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://json-schema.org/draft/2019-09/schema",
        "$recursiveAnchor": true,
        "title": "Core and Validation specifications meta-schema",
        "$vocabulary": {
            "https://json-schema.org/draft/2019-09/vocab/core": true,
            "https://json-schema.org/draft/2019-09/vocab/applicator": true,
            "https://json-schema.org/draft/2019-09/vocab/validation": true,
            "https://json-schema.org/draft/2019-09/vocab/meta-data": true,
            "https://json-schema.org/draft/2019-09/vocab/format": false,
            "https://json-schema.org/draft/2019-09/vocab/content": true
        },
        "type": ["object", "boolean"]
    })
}

fn metaschema_2020_12() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://json-schema.org/draft/2020-12/schema",
        "$dynamicAnchor": "meta",
        "title": "Core and Validation specifications meta-schema",
        "$vocabulary": {
            "https://json-schema.org/draft/2020-12/vocab/core": true,
            "https://json-schema.org/draft/2020-12/vocab/applicator": true,
            "https://json-schema.org/draft/2020-12/vocab/unevaluated": true,
            "https://json-schema.org/draft/2020-12/vocab/validation": true,
            "https://json-schema.org/draft/2020-12/vocab/meta-data": true,
            "https://json-schema.org/draft/2020-12/vocab/format-annotation": true,
            "https://json-schema.org/draft/2020-12/vocab/content": true
        },
        "type": ["object", "boolean"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_both_dialects() {
        let mut catalog = Catalog::new();
        bootstrap(&mut catalog).unwrap();
        let uri_2020 = AbsoluteUri::parse(Draft::Dialect202012.metaschema_uri()).unwrap();
        let uri_2019 = AbsoluteUri::parse(Draft::Dialect201909.metaschema_uri()).unwrap();
        assert!(catalog.metaschema(&uri_2020).is_some());
        assert!(catalog.metaschema(&uri_2019).is_some());
    }
}
