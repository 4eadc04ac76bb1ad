//! Compiles raw schema JSON into the [`crate::schema`] arena representation.
//!
//! Grounded on jschon's `JSONObjectSchema.__init__`/`_resolve_keyword_dependencies`
//! (`jsonschema.py`) for the keyword-instantiation-in-dependency-order
//! algorithm, and `vocabulary/core.py`'s `IdKeyword`/`AnchorKeyword` for how
//! `$id`/`$anchor` shift the base URI new subschemas are resolved against.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use schema_core::number;
use schema_core::{AbsoluteUri, PointerBuf, Uri};
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::{CompileError, InvalidSchemaCtx, MissingCoreVocabularyCtx, UnknownVocabularyCtx};
use crate::keyword::{self, Keyword};
use crate::schema::{CompiledKeyword, CompiledSchema, ObjectSchema, SchemaKey};
use crate::value::InstanceType;
use crate::vocabulary::{self, Draft, Vocabulary};
use tracing::instrument;

/// Arguments to [`compile`]: everything the caller already knows about the
/// schema document before any of its own keywords are read.
pub struct CompileArgs {
    pub value: Value,
    /// Retrieval URI of the document, if known (absent for inline/anonymous
    /// schemas, which get a synthetic one).
    pub uri: Option<AbsoluteUri>,
    /// Dialect to assume when the document carries no `$schema` of its own.
    pub metaschema_uri: Option<AbsoluteUri>,
    pub parent: Option<SchemaKey>,
    /// Location of this document's root relative to whatever contains it
    /// (root for a freshly retrieved document; non-root when compiling an
    /// embedded resource discovered mid-walk).
    pub pointer: PointerBuf,
    pub session: String,
}

/// Compiles `args.value`, recursively compiling every subschema it embeds,
/// and returns the key of the resulting root node.
#[instrument(skip(catalog, args), fields(uri = ?args.uri.as_ref().map(AbsoluteUri::as_str)), level = "trace")]
pub fn compile(catalog: &mut Catalog, args: CompileArgs) -> Result<SchemaKey, CompileError> {
    let base_uri = args.uri.unwrap_or_else(synthetic_uri);
    compile_node(
        catalog,
        &args.session,
        base_uri,
        args.pointer,
        args.metaschema_uri,
        args.parent,
        args.value,
    )
}

fn synthetic_uri() -> AbsoluteUri {
    AbsoluteUri::parse(format!("urn:uuid:{}", new_uuid_like())).expect("synthetic schema URI is well-formed")
}

fn new_uuid_like() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("{nanos:032x}")
}

/// Recursively compiles one schema node.
///
/// `base_uri` and `pointer` describe the nearest enclosing "pointer root":
/// either the document's own retrieval URI, or the URI of the closest
/// ancestor that declared `$id`, which resets `pointer` back to the schema
/// root. [`Catalog::index_pointer`] is keyed on exactly this pair, so that a
/// `$ref` carrying a JSON-pointer fragment against either URI resolves
/// without re-walking the raw JSON.
#[allow(clippy::too_many_arguments)]
fn compile_node(
    catalog: &mut Catalog,
    session: &str,
    base_uri: AbsoluteUri,
    pointer: PointerBuf,
    metaschema_uri_hint: Option<AbsoluteUri>,
    parent: Option<SchemaKey>,
    value: Value,
) -> Result<SchemaKey, CompileError> {
    if let Value::Bool(b) = value {
        let uri = schema_uri(&base_uri, &pointer);
        let key = catalog.schemas.insert(CompiledSchema::Boolean { value: b, uri: uri.clone() });
        catalog.index_pointer(base_uri.clone(), pointer.to_string(), key);
        if parent.is_none() {
            catalog.insert_schema(session, uri, key);
        }
        return Ok(key);
    }

    let Value::Object(object) = &value else {
        return InvalidSchemaCtx {
            uri: base_uri.as_str(),
            detail: "a schema must be a JSON object or boolean".to_owned(),
        }
        .fail();
    };

    // `$id` rebases both URI resolution and JSON-pointer-fragment indexing
    // for this node and everything beneath it.
    let (new_base_uri, new_pointer) = match object.get("$id").and_then(Value::as_str) {
        Some(id) => {
            let id_uri = Uri::parse(id).map_err(|source| CompileError::InvalidId { value: id.to_owned(), source })?;
            let resolved = id_uri.resolve(&base_uri).map_err(|source| CompileError::InvalidId { value: id.to_owned(), source })?;
            (resolved, PointerBuf::root())
        }
        None => (base_uri, pointer),
    };

    let metaschema_uri = match object.get("$schema").and_then(Value::as_str) {
        Some(s) => AbsoluteUri::parse(s).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?,
        None => metaschema_uri_hint.ok_or_else(|| CompileError::InvalidSchema {
            uri: new_base_uri.as_str().to_owned(),
            detail: "no \"$schema\" present and no dialect could be inherited".to_owned(),
        })?,
    };

    let vocabularies = resolve_vocabularies(catalog, object, &metaschema_uri)?;
    let allowed: std::collections::HashSet<&str> = vocabularies.iter().flat_map(|v| v.keywords.iter().copied()).collect();
    if !vocabularies.iter().any(|v| v.is_core) {
        return MissingCoreVocabularyCtx { uri: metaschema_uri.as_str() }.fail();
    }

    // A keyword the global table knows but this dialect's vocabulary bundle
    // doesn't declare is dropped along with the static/identity keywords
    // (handled separately in `compile_static_keywords`). A keyword the table
    // has never heard of is not dropped: it is preserved verbatim as an
    // unknown-keyword annotation.
    let present: Vec<&String> = object
        .keys()
        .filter(|k| match keyword::info(k) {
            Some(info) => !info.is_static && allowed.contains(k.as_str()),
            None => true,
        })
        .collect();
    let evaluation_order = topological_order(&present);

    // reserve a key up front so applicator keywords can record `parent`
    // while compiling their own subschemas.
    let placeholder_uri = schema_uri(&new_base_uri, &new_pointer);
    let key = catalog.schemas.insert(CompiledSchema::Object(ObjectSchema {
        raw: Arc::new(value.clone()),
        uri: placeholder_uri.clone(),
        metaschema_uri: metaschema_uri.clone(),
        keywords: IndexMap::new(),
        evaluation_order: evaluation_order.clone(),
        parent,
        pointer: new_pointer.clone(),
        anchors: HashMap::new(),
        dynamic_anchor: None,
        recursive_anchor: false,
    }));

    let mut ctx = Ctx { catalog, session, base_uri: new_base_uri.clone(), metaschema_uri: metaschema_uri.clone(), parent: key };

    let mut compiled: IndexMap<String, CompiledKeyword> = IndexMap::new();
    // static / identity keywords run first for their compile-time side effects.
    compile_static_keywords(&mut ctx, object, &mut compiled)?;
    for name in &present {
        let raw = object.get(name.as_str()).expect("present keyword exists in object");
        let location = new_pointer.with_pushed(name.as_str());
        let compiled_keyword = compile_keyword(&mut ctx, name, raw, &new_pointer)?;
        compiled.insert((*name).clone(), CompiledKeyword { parent: key, name: (*name).clone(), location, keyword: compiled_keyword });
    }

    let dynamic_anchor = object.get("$dynamicAnchor").and_then(Value::as_str).map(str::to_owned);
    let recursive_anchor = matches!(object.get("$recursiveAnchor"), Some(Value::Bool(true)));

    if let CompiledSchema::Object(schema) = &mut catalog.schemas[key] {
        schema.keywords = compiled;
        schema.dynamic_anchor = dynamic_anchor.clone();
        schema.recursive_anchor = recursive_anchor;
        schema.anchors.insert(String::new(), key);
    }

    catalog.index_pointer(new_base_uri.clone(), new_pointer.to_string(), key);
    let id_changed = new_pointer.is_root() && new_base_uri.as_str() != placeholder_uri.as_str();
    if parent.is_none() || id_changed {
        catalog.insert_schema(session, new_base_uri.clone(), key);
    }
    if let Some(anchor) = object.get("$anchor").and_then(Value::as_str) {
        let anchor_uri = new_base_uri.with_fragment(anchor).map_err(CompileError::from)?;
        catalog.register_alias(session, anchor_uri, key);
        if let CompiledSchema::Object(schema) = &mut catalog.schemas[key] {
            schema.anchors.insert(anchor.to_owned(), key);
        }
    }
    if let Some(anchor) = dynamic_anchor {
        let anchor_uri = new_base_uri.with_fragment(&anchor).map_err(CompileError::from)?;
        catalog.register_alias(session, anchor_uri, key);
    }

    Ok(key)
}

fn schema_uri(base: &AbsoluteUri, pointer: &PointerBuf) -> AbsoluteUri {
    if pointer.is_root() {
        base.clone()
    } else {
        base.with_fragment(&pointer.uri_fragment()).expect("pointer fragment is valid URI syntax")
    }
}

/// Picks the vocabulary set for a node: either its own `$vocabulary` map
/// (when compiling a metaschema), or the standard bundle for whichever
/// draft `metaschema_uri` names.
fn resolve_vocabularies(
    catalog: &Catalog,
    object: &serde_json::Map<String, Value>,
    metaschema_uri: &AbsoluteUri,
) -> Result<Vec<Vocabulary>, CompileError> {
    if let Some(Value::Object(declared)) = object.get("$vocabulary") {
        let mut out = Vec::with_capacity(declared.len());
        for (uri, required) in declared {
            let vocab_uri = AbsoluteUri::parse(uri).map_err(|source| CompileError::InvalidId { value: uri.clone(), source })?;
            match catalog.vocabulary(&vocab_uri) {
                Some(v) => out.push(v.clone()),
                None if matches!(required, Value::Bool(true)) => {
                    return UnknownVocabularyCtx { uri: uri.clone(), metaschema_uri: metaschema_uri.as_str() }.fail()
                }
                None => {}
            }
        }
        return Ok(out);
    }
    if catalog.metaschema(metaschema_uri).is_some() {
        if let Some(draft) = Draft::from_metaschema_uri(metaschema_uri.as_str()) {
            return Ok(vocabulary::default_vocabularies(draft));
        }
    }
    match Draft::from_metaschema_uri(metaschema_uri.as_str()) {
        Some(draft) => Ok(vocabulary::default_vocabularies(draft)),
        None => UnknownVocabularyCtx { uri: metaschema_uri.as_str(), metaschema_uri: metaschema_uri.as_str() }.fail(),
    }
}

/// Kahn's algorithm restricted to the keywords actually present, mirroring
/// jschon's `_resolve_keyword_dependencies` generator.
fn topological_order(present: &[&String]) -> Vec<String> {
    let names: std::collections::HashSet<&str> = present.iter().map(|s| s.as_str()).collect();
    let mut deps: HashMap<&str, Vec<&str>> = present
        .iter()
        .map(|name| {
            let depends_on = keyword::info(name)
                .map(|info| info.depends_on.iter().copied().filter(|d| names.contains(d)).collect())
                .unwrap_or_default();
            (name.as_str(), depends_on)
        })
        .collect();
    let mut order = Vec::with_capacity(present.len());
    while !deps.is_empty() {
        // Iterate `present`'s declaration order, not the `HashMap`'s, so
        // that keywords with no mutual dependency keep a stable relative
        // order across runs: ties break by insertion order.
        let ready: Vec<&str> = present
            .iter()
            .map(|name| name.as_str())
            .filter(|name| deps.get(name).is_some_and(|d| d.is_empty()))
            .collect();
        if ready.is_empty() {
            // cyclic dependency table: fall back to declaration order rather
            // than panicking on a malformed KEYWORDS table.
            order.extend(present.iter().map(|name| name.as_str()).filter(|name| deps.contains_key(name)).map(str::to_owned));
            break;
        }
        for name in &ready {
            deps.remove(name);
        }
        for remaining in deps.values_mut() {
            remaining.retain(|d| !ready.contains(d));
        }
        order.extend(ready.into_iter().map(str::to_owned));
    }
    order
}

/// Threaded through every `compile_*` helper: the catalog, and the resolved
/// identity of the schema currently being built.
pub(crate) struct Ctx<'a> {
    pub catalog: &'a mut Catalog,
    pub session: &'a str,
    pub base_uri: AbsoluteUri,
    pub metaschema_uri: AbsoluteUri,
    pub parent: SchemaKey,
}

impl<'a> Ctx<'a> {
    /// Compiles a subschema located at `pointer` (relative to this node's
    /// pointer-root), inheriting this node's base URI and dialect.
    pub fn child(&mut self, pointer: PointerBuf, value: Value) -> Result<SchemaKey, CompileError> {
        compile_node(
            self.catalog,
            self.session,
            self.base_uri.clone(),
            pointer,
            Some(self.metaschema_uri.clone()),
            Some(self.parent),
            value,
        )
    }
}

fn compile_static_keywords(
    ctx: &mut Ctx,
    object: &serde_json::Map<String, Value>,
    out: &mut IndexMap<String, CompiledKeyword>,
) -> Result<(), CompileError> {
    let parent = ctx.parent;
    let pointer = PointerBuf::root();
    let mut push = |name: &str, kw: Keyword, loc: PointerBuf| {
        out.insert(name.to_owned(), CompiledKeyword { parent, name: name.to_owned(), location: loc, keyword: kw });
    };

    if let Some(Value::String(s)) = object.get("$id") {
        push("$id", Keyword::Id(ctx.base_uri.clone()), pointer.with_pushed("$id"));
        let _ = s;
    }
    if let Some(Value::String(s)) = object.get("$schema") {
        push("$schema", Keyword::Schema(ctx.metaschema_uri.clone()), pointer.with_pushed("$schema"));
        let _ = s;
    }
    if let Some(Value::Object(v)) = object.get("$vocabulary") {
        let map: IndexMap<AbsoluteUri, bool> = v
            .iter()
            .filter_map(|(k, b)| AbsoluteUri::parse(k).ok().map(|u| (u, matches!(b, Value::Bool(true)))))
            .collect();
        push("$vocabulary", Keyword::Vocabulary(map), pointer.with_pushed("$vocabulary"));
    }
    if let Some(Value::String(s)) = object.get("$anchor") {
        push("$anchor", Keyword::Anchor(s.clone()), pointer.with_pushed("$anchor"));
    }
    if let Some(Value::String(s)) = object.get("$dynamicAnchor") {
        push("$dynamicAnchor", Keyword::DynamicAnchor(s.clone()), pointer.with_pushed("$dynamicAnchor"));
    }
    if let Some(Value::Bool(b)) = object.get("$recursiveAnchor") {
        push("$recursiveAnchor", Keyword::RecursiveAnchor(*b), pointer.with_pushed("$recursiveAnchor"));
    }
    if let Some(Value::String(s)) = object.get("$comment") {
        push("$comment", Keyword::Comment(s.clone()), pointer.with_pushed("$comment"));
    }
    if let Some(Value::Object(defs)) = object.get("$defs").or_else(|| object.get("definitions")) {
        let name = if object.contains_key("$defs") { "$defs" } else { "definitions" };
        let mut map = IndexMap::new();
        for (k, v) in defs {
            let key = ctx.child(pointer.with_pushed(name).with_pushed(k.as_str()), v.clone())?;
            map.insert(k.clone(), key);
        }
        push(name, Keyword::Defs(map), pointer.with_pushed(name));
    }
    Ok(())
}

fn compile_keyword(ctx: &mut Ctx, name: &str, raw: &Value, base_pointer: &PointerBuf) -> Result<Keyword, CompileError> {
    let loc = |suffix: &str| base_pointer.with_pushed(name).with_pushed(suffix);
    let at = base_pointer.with_pushed(name);
    match name {
        "$ref" => {
            let s = raw.as_str().unwrap_or_default();
            let uri = Uri::parse(s).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?;
            let resolved = uri.resolve(&ctx.base_uri).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?;
            Ok(Keyword::Ref(resolved))
        }
        "$dynamicRef" => {
            let s = raw.as_str().unwrap_or_default();
            let uri = Uri::parse(s).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?;
            let resolved = uri.resolve(&ctx.base_uri).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?;
            let anchor = resolved.fragment().unwrap_or_default();
            Ok(Keyword::DynamicRef { base: resolved.without_fragment(), anchor })
        }
        "$recursiveRef" => {
            let s = raw.as_str().unwrap_or_default();
            let uri = Uri::parse(s).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?;
            let resolved = uri.resolve(&ctx.base_uri).map_err(|source| CompileError::InvalidId { value: s.to_owned(), source })?;
            Ok(Keyword::RecursiveRef(resolved))
        }
        "type" => {
            let types = match raw {
                Value::String(s) => vec![InstanceType::parse(s).ok_or_else(|| invalid(ctx, &at, format!("unknown type \"{s}\"")))?],
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().and_then(InstanceType::parse).ok_or_else(|| invalid(ctx, &at, "type array must contain type name strings".into())))
                    .collect::<Result<_, _>>()?,
                _ => return Err(invalid(ctx, &at, "\"type\" must be a string or array of strings".into())),
            };
            Ok(Keyword::Type(types))
        }
        "enum" => Ok(Keyword::Enum(raw.as_array().cloned().unwrap_or_default())),
        "const" => Ok(Keyword::Const(raw.clone())),
        "multipleOf" => Ok(Keyword::MultipleOf(parse_number(ctx, &at, raw)?)),
        "maximum" => Ok(Keyword::Maximum(parse_number(ctx, &at, raw)?)),
        "exclusiveMaximum" => Ok(Keyword::ExclusiveMaximum(parse_number(ctx, &at, raw)?)),
        "minimum" => Ok(Keyword::Minimum(parse_number(ctx, &at, raw)?)),
        "exclusiveMinimum" => Ok(Keyword::ExclusiveMinimum(parse_number(ctx, &at, raw)?)),
        "maxLength" => Ok(Keyword::MaxLength(parse_u64(ctx, &at, raw)?)),
        "minLength" => Ok(Keyword::MinLength(parse_u64(ctx, &at, raw)?)),
        "pattern" => {
            let s = raw.as_str().unwrap_or_default();
            let re = Regex::new(s).map_err(|e| invalid(ctx, &at, format!("invalid regular expression: {e}")))?;
            Ok(Keyword::Pattern(re))
        }
        "maxItems" => Ok(Keyword::MaxItems(parse_u64(ctx, &at, raw)?)),
        "minItems" => Ok(Keyword::MinItems(parse_u64(ctx, &at, raw)?)),
        "uniqueItems" => Ok(Keyword::UniqueItems(matches!(raw, Value::Bool(true)))),
        "maxContains" => Ok(Keyword::MaxContains(parse_u64(ctx, &at, raw)?)),
        "minContains" => Ok(Keyword::MinContains(parse_u64(ctx, &at, raw)?)),
        "maxProperties" => Ok(Keyword::MaxProperties(parse_u64(ctx, &at, raw)?)),
        "minProperties" => Ok(Keyword::MinProperties(parse_u64(ctx, &at, raw)?)),
        "required" => Ok(Keyword::Required(string_array(raw))),
        "dependentRequired" => {
            let mut map = IndexMap::new();
            if let Value::Object(o) = raw {
                for (k, v) in o {
                    map.insert(k.clone(), string_array(v));
                }
            }
            Ok(Keyword::DependentRequired(map))
        }
        "allOf" | "anyOf" | "oneOf" | "prefixItems" => {
            let items = raw.as_array().cloned().unwrap_or_default();
            let mut keys = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                keys.push(ctx.child(loc(&i.to_string()), item)?);
            }
            Ok(match name {
                "allOf" => Keyword::AllOf(keys),
                "anyOf" => Keyword::AnyOf(keys),
                "oneOf" => Keyword::OneOf(keys),
                _ => Keyword::PrefixItems(keys),
            })
        }
        "not" => Ok(Keyword::Not(ctx.child(at, raw.clone())?)),
        "if" => Ok(Keyword::If(ctx.child(at, raw.clone())?)),
        "then" => Ok(Keyword::Then(ctx.child(at, raw.clone())?)),
        "else" => Ok(Keyword::Else(ctx.child(at, raw.clone())?)),
        "dependentSchemas" => Ok(Keyword::DependentSchemas(compile_map(ctx, &at, raw)?)),
        "items" => {
            if raw.is_array() {
                let mut keys = Vec::new();
                for (i, item) in raw.as_array().unwrap().iter().enumerate() {
                    keys.push(ctx.child(loc(&i.to_string()), item.clone())?);
                }
                Ok(Keyword::LegacyItemsTuple(keys))
            } else {
                Ok(Keyword::Items(ctx.child(at, raw.clone())?))
            }
        }
        "additionalItems" => Ok(Keyword::LegacyAdditionalItems(ctx.child(at, raw.clone())?)),
        "contains" => Ok(Keyword::Contains(ctx.child(at, raw.clone())?)),
        "unevaluatedItems" => Ok(Keyword::UnevaluatedItems(ctx.child(at, raw.clone())?)),
        "properties" => Ok(Keyword::Properties(compile_map(ctx, &at, raw)?)),
        "patternProperties" => {
            let mut out = Vec::new();
            if let Value::Object(o) = raw {
                for (pattern, schema) in o {
                    let re = Regex::new(pattern).map_err(|e| invalid(ctx, &at, format!("invalid regular expression: {e}")))?;
                    let key = ctx.child(loc(pattern), schema.clone())?;
                    out.push((re, key));
                }
            }
            Ok(Keyword::PatternProperties(out))
        }
        "additionalProperties" => Ok(Keyword::AdditionalProperties(ctx.child(at, raw.clone())?)),
        "unevaluatedProperties" => Ok(Keyword::UnevaluatedProperties(ctx.child(at, raw.clone())?)),
        "propertyNames" => Ok(Keyword::PropertyNames(ctx.child(at, raw.clone())?)),
        "contentEncoding" => Ok(Keyword::ContentEncoding(raw.as_str().unwrap_or_default().to_owned())),
        "contentMediaType" => Ok(Keyword::ContentMediaType(raw.as_str().unwrap_or_default().to_owned())),
        "contentSchema" => Ok(Keyword::ContentSchema(ctx.child(at, raw.clone())?)),
        "format" => Ok(Keyword::Format(raw.as_str().unwrap_or_default().to_owned())),
        "title" => Ok(Keyword::Title(raw.clone())),
        "description" => Ok(Keyword::Description(raw.clone())),
        "default" => Ok(Keyword::Default(raw.clone())),
        "deprecated" => Ok(Keyword::Deprecated(matches!(raw, Value::Bool(true)))),
        "examples" => Ok(Keyword::Examples(raw.clone())),
        "readOnly" => Ok(Keyword::ReadOnly(matches!(raw, Value::Bool(true)))),
        "writeOnly" => Ok(Keyword::WriteOnly(matches!(raw, Value::Bool(true)))),
        _ => Ok(Keyword::Unknown(raw.clone())),
    }
}

fn compile_map(ctx: &mut Ctx, at: &PointerBuf, raw: &Value) -> Result<IndexMap<String, SchemaKey>, CompileError> {
    let mut map = IndexMap::new();
    if let Value::Object(o) = raw {
        for (name, schema) in o {
            let key = ctx.child(at.with_pushed(name.as_str()), schema.clone())?;
            map.insert(name.clone(), key);
        }
    }
    Ok(map)
}

fn string_array(value: &Value) -> Vec<String> {
    value.as_array().map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect()).unwrap_or_default()
}

fn parse_number(ctx: &Ctx, at: &PointerBuf, value: &Value) -> Result<number::BigRational, CompileError> {
    let Value::Number(n) = value else {
        return Err(invalid(ctx, at, "expected a JSON number".to_owned()));
    };
    number::from_json_number(n).map_err(|e| invalid(ctx, at, e.to_string()))
}

fn parse_u64(ctx: &Ctx, at: &PointerBuf, value: &Value) -> Result<u64, CompileError> {
    value.as_u64().ok_or_else(|| invalid(ctx, at, "expected a non-negative integer".to_owned()))
}

fn invalid(ctx: &Ctx, at: &PointerBuf, detail: String) -> CompileError {
    CompileError::InvalidSchema { uri: format!("{}#{}", ctx.base_uri.as_str(), at.uri_fragment()), detail, backtrace: snafu::Backtrace::capture() }
}
