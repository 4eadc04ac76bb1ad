//! Compiled schema representation: the output of [`crate::compiler`], the
//! input to [`crate::engine`]'s evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use schema_core::{AbsoluteUri, PointerBuf};
use serde_json::Value;
use slotmap::new_key_type;

use crate::keyword::Keyword;

new_key_type! {
    /// Index of one compiled (sub)schema in a [`crate::catalog::Catalog`]'s
    /// arena. Stable for the lifetime of the catalog.
    pub struct SchemaKey;
}

/// A compiled (sub)schema: either trivially boolean, or an object schema
/// carrying its compiled keywords in dependency-respecting evaluation order.
#[derive(Debug)]
pub enum CompiledSchema {
    Boolean {
        value: bool,
        uri: AbsoluteUri,
    },
    Object(ObjectSchema),
}

impl CompiledSchema {
    pub fn uri(&self) -> &AbsoluteUri {
        match self {
            CompiledSchema::Boolean { uri, .. } => uri,
            CompiledSchema::Object(o) => &o.uri,
        }
    }

    pub fn pointer(&self) -> &PointerBuf {
        match self {
            CompiledSchema::Boolean { .. } => {
                static ROOT: once_cell::sync::Lazy<PointerBuf> = once_cell::sync::Lazy::new(PointerBuf::root);
                &ROOT
            }
            CompiledSchema::Object(o) => &o.pointer,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            CompiledSchema::Object(o) => Some(o),
            CompiledSchema::Boolean { .. } => None,
        }
    }
}

/// A compiled object-form schema.
#[derive(Debug)]
pub struct ObjectSchema {
    pub raw: Arc<Value>,
    pub uri: AbsoluteUri,
    pub metaschema_uri: AbsoluteUri,
    pub keywords: IndexMap<String, CompiledKeyword>,
    /// Present keyword names in dependency-respecting evaluation order
    /// Static/identity keywords are excluded; they have no
    /// evaluation-time behavior.
    pub evaluation_order: Vec<String>,
    pub parent: Option<SchemaKey>,
    /// Location of this schema relative to the schema document root it was
    /// compiled from.
    pub pointer: PointerBuf,
    /// `$anchor` names declared directly on this schema, resolved to their
    /// owning schema (always `self`, but kept for uniform lookup).
    pub anchors: HashMap<String, SchemaKey>,
    /// `$dynamicAnchor` (2020-12) name, if this schema declares one.
    pub dynamic_anchor: Option<String>,
    /// `$recursiveAnchor: true` (2019-09), if declared.
    pub recursive_anchor: bool,
}

/// One compiled keyword within a schema: its location, its raw value (or
/// the subschema tree it applies, for applicators), and the dispatchable
/// [`Keyword`] tag carrying any precompiled data.
#[derive(Debug)]
pub struct CompiledKeyword {
    pub parent: SchemaKey,
    pub name: String,
    pub location: PointerBuf,
    pub keyword: Keyword,
}
