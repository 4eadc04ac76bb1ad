//! The evaluation engine: walks a compiled schema against an instance,
//! building a [`ScopeArena`] of pass/fail/discard results.
//!
//! Grounded on jschon's `JSONSchema.evaluate`/`JSONObjectSchema.evaluate`
//! (`jsonschema.py`) for the per-keyword dispatch and instance-type
//! filtering, and `vocabulary/applicator.py`/`vocabulary/validation.py` for
//! each keyword's pass/fail/annotate behavior. `$ref` resolution may compile
//! a not-yet-seen document on demand, so evaluation holds the catalog
//! mutably throughout, same as jschon's `Catalogue.get_schema`.

use schema_core::PointerBuf;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::keyword::Keyword;
use crate::schema::{CompiledSchema, SchemaKey};
use crate::scope::{DynamicScope, ScopeArena, ScopeKey};
use crate::value::{self, InstanceType};
use tracing::instrument;

/// Evaluates `instance` against the schema at `schema_key`, returning the
/// full result-scope tree and the key of its root scope.
#[instrument(skip(catalog, instance), level = "trace")]
pub fn evaluate(catalog: &mut Catalog, session: &str, schema_key: SchemaKey, instance: &Value) -> (ScopeArena, ScopeKey) {
    let mut scopes = ScopeArena::new();
    let mut dynamic = DynamicScope::default();
    let root = evaluate_node(catalog, session, &mut scopes, &mut dynamic, schema_key, instance, PointerBuf::root(), None, None);
    (scopes, root)
}

fn absolute_location(catalog: &Catalog, schema_key: SchemaKey, suffix: Option<&str>) -> String {
    let schema = catalog.schema(schema_key);
    match suffix {
        Some(s) => format!("{}#{}{}", schema.uri().without_fragment().as_str(), schema.pointer().uri_fragment(), s),
        None => schema.uri().as_str().to_owned(),
    }
}

#[allow(clippy::too_many_arguments)]
fn evaluate_node(
    catalog: &mut Catalog,
    session: &str,
    scopes: &mut ScopeArena,
    dynamic: &mut DynamicScope,
    schema_key: SchemaKey,
    instance: &Value,
    instance_location: PointerBuf,
    parent: Option<ScopeKey>,
    edge_name: Option<String>,
) -> ScopeKey {
    let location = absolute_location(catalog, schema_key, None);
    let scope = match parent {
        None => scopes.root(schema_key, location, true),
        Some(p) => scopes.child(p, edge_name.unwrap_or_default(), schema_key, instance_location.clone(), location, true),
    };

    let is_boolean_true = matches!(catalog.schema(schema_key), CompiledSchema::Boolean { value: true, .. });
    let is_boolean_false = matches!(catalog.schema(schema_key), CompiledSchema::Boolean { value: false, .. });
    if is_boolean_true {
        scopes.get_mut(scope).pass(None);
        return scope;
    }
    if is_boolean_false {
        scopes.get_mut(scope).fail(Some("boolean schema false never validates".to_owned()));
        return scope;
    }

    dynamic.push(schema_key);
    let instance_type = InstanceType::of(instance);
    let names: Vec<String> = match catalog.schema(schema_key) {
        CompiledSchema::Object(object) => object.evaluation_order.clone(),
        CompiledSchema::Boolean { .. } => Vec::new(),
    };
    for name in &names {
        let keyword = match catalog.schema(schema_key) {
            CompiledSchema::Object(object) => {
                let applies = match crate::keyword::info(name).and_then(|i| i.types) {
                    Some(types) => types.contains(&instance_type),
                    None => true,
                };
                applies.then(|| object.keywords[name].keyword.clone())
            }
            CompiledSchema::Boolean { .. } => None,
        };
        if let Some(keyword) = keyword {
            evaluate_keyword(catalog, session, scopes, dynamic, scope, schema_key, name, &keyword, instance, &instance_location);
        }
    }
    dynamic.pop();

    scopes.aggregate(scope);
    scope
}

#[allow(clippy::too_many_arguments)]
fn evaluate_keyword(
    catalog: &mut Catalog,
    session: &str,
    scopes: &mut ScopeArena,
    dynamic: &mut DynamicScope,
    parent_scope: ScopeKey,
    parent_schema: SchemaKey,
    name: &str,
    keyword: &Keyword,
    instance: &Value,
    instance_location: &PointerBuf,
) {
    let location = absolute_location(catalog, parent_schema, Some(&PointerBuf::root().with_pushed(name).uri_fragment()));
    macro_rules! run {
        ($asserts:expr) => {
            scopes.child(parent_scope, name.to_owned(), parent_schema, instance_location.clone(), location.clone(), $asserts)
        };
    }

    match keyword {
        Keyword::Ref(_) | Keyword::DynamicRef { .. } | Keyword::RecursiveRef(_) => {
            let kid = run!(true);
            let resolved = resolve_reference(catalog, session, keyword, dynamic);
            match resolved {
                Some(target) => {
                    let child = evaluate_node(catalog, session, scopes, dynamic, target, instance, instance_location.clone(), Some(kid), Some(String::new()));
                    let valid = scopes.get(child).is_valid();
                    finish(scopes, kid, valid, None, "instance is invalid against the referenced schema");
                }
                None => scopes.get_mut(kid).fail(Some(format!("\"{name}\" could not be resolved"))),
            }
        }

        Keyword::AllOf(keys) => {
            let kid = run!(true);
            let mut all_valid = true;
            for (i, key) in keys.iter().enumerate() {
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(i.to_string()));
                all_valid &= scopes.get(child).is_valid();
            }
            finish(scopes, kid, all_valid, None, "instance failed one or more subschemas of \"allOf\"");
        }
        Keyword::AnyOf(keys) => {
            let kid = run!(true);
            let mut any_valid = false;
            for (i, key) in keys.iter().enumerate() {
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(i.to_string()));
                any_valid |= scopes.get(child).is_valid();
            }
            finish(scopes, kid, any_valid, None, "instance did not match any subschema of \"anyOf\"");
        }
        Keyword::OneOf(keys) => {
            let kid = run!(true);
            let mut valid_count = 0;
            for (i, key) in keys.iter().enumerate() {
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(i.to_string()));
                if scopes.get(child).is_valid() {
                    valid_count += 1;
                }
            }
            finish(scopes, kid, valid_count == 1, None, "instance must match exactly one subschema of \"oneOf\"");
        }
        Keyword::Not(key) => {
            let kid = run!(true);
            let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(String::new()));
            finish(scopes, kid, !scopes.get(child).is_valid(), None, "instance must not be valid against the \"not\" subschema");
        }
        Keyword::If(key) => {
            let kid = run!(false);
            evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(String::new()));
            scopes.get_mut(kid).pass(None);
        }
        Keyword::Then(key) => {
            if sibling_valid(scopes, parent_scope, "if") == Some(true) {
                let kid = run!(true);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(String::new()));
                let valid = scopes.get(child).is_valid();
                finish(scopes, kid, valid, None, "instance does not match the \"then\" subschema");
            } else {
                let kid = run!(false);
                scopes.get_mut(kid).discard();
            }
        }
        Keyword::Else(key) => {
            if sibling_valid(scopes, parent_scope, "if") == Some(false) {
                let kid = run!(true);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(String::new()));
                let valid = scopes.get(child).is_valid();
                finish(scopes, kid, valid, None, "instance does not match the \"else\" subschema");
            } else {
                let kid = run!(false);
                scopes.get_mut(kid).discard();
            }
        }
        Keyword::DependentSchemas(map) => {
            let kid = run!(true);
            let mut failed = false;
            if let Value::Object(o) = instance {
                for (prop, key) in map {
                    if o.contains_key(prop) {
                        let child = evaluate_node(catalog, session, scopes, dynamic, *key, instance, instance_location.clone(), Some(kid), Some(prop.clone()));
                        if !scopes.get(child).is_valid() {
                            failed = true;
                        }
                    }
                }
            }
            finish(scopes, kid, !failed, None, "a dependent schema was not satisfied");
        }

        Keyword::PrefixItems(keys) => {
            let kid = run!(true);
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut ok = true;
            let mut last = None;
            for (i, key) in keys.iter().enumerate() {
                let Some(item) = items.get(i) else { break };
                last = Some(i);
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                ok &= scopes.get(child).is_valid();
            }
            let annotation = last.map(|i| if i + 1 == items.len() { Value::Bool(true) } else { Value::from(i) });
            finish(scopes, kid, ok, annotation, "array elements are invalid against \"prefixItems\"");
        }
        Keyword::Items(key) => {
            let kid = run!(true);
            match scopes_prefix_annotation(scopes, parent_scope, "prefixItems") {
                Some(Value::Bool(true)) => {
                    scopes.get_mut(kid).discard();
                    return;
                }
                _ => {}
            }
            let start = match scopes_prefix_annotation(scopes, parent_scope, "prefixItems") {
                Some(Value::Number(n)) => n.as_u64().map(|n| n as usize + 1).unwrap_or(0),
                _ => 0,
            };
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut ok = true;
            let mut any = false;
            for (i, item) in items.iter().enumerate().skip(start) {
                any = true;
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                ok &= scopes.get(child).is_valid();
            }
            finish(scopes, kid, ok, any.then_some(Value::Bool(true)), "array elements are invalid against \"items\"");
        }
        Keyword::LegacyItemsSingle(key) => {
            let kid = run!(true);
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                ok &= scopes.get(child).is_valid();
            }
            finish(scopes, kid, ok, (!items.is_empty()).then_some(Value::Bool(true)), "array elements are invalid against \"items\"");
        }
        Keyword::LegacyItemsTuple(keys) => {
            let kid = run!(true);
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut ok = true;
            let mut last = None;
            for (i, key) in keys.iter().enumerate() {
                let Some(item) = items.get(i) else { break };
                last = Some(i);
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                ok &= scopes.get(child).is_valid();
            }
            finish(scopes, kid, ok, last.map(Value::from), "array elements are invalid against \"items\"");
        }
        Keyword::LegacyAdditionalItems(key) => {
            let kid = run!(true);
            let start = match scopes_prefix_annotation(scopes, parent_scope, "items") {
                Some(Value::Number(n)) => n.as_u64().map(|n| n as usize + 1),
                _ => None,
            };
            let Some(start) = start else {
                scopes.get_mut(kid).discard();
                return;
            };
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut ok = true;
            let mut any = false;
            for (i, item) in items.iter().enumerate().skip(start) {
                any = true;
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                ok &= scopes.get(child).is_valid();
            }
            finish(scopes, kid, ok, any.then_some(Value::Bool(true)), "array elements are invalid against \"additionalItems\"");
        }
        Keyword::Contains(key) => {
            let kid = run!(true);
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut matches = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                if scopes.get(child).is_valid() {
                    matches.push(Value::from(i as u64));
                }
            }
            let valid = !matches.is_empty();
            finish(scopes, kid, valid, Some(Value::Array(matches)), "array does not contain a matching element");
        }
        Keyword::UnevaluatedItems(key) => {
            let kid = run!(true);
            let last = last_evaluated_item(scopes, kid);
            if last == Some(usize::MAX) {
                scopes.get_mut(kid).discard();
                return;
            }
            let start = last.map(|i| i + 1).unwrap_or(0);
            let items = instance.as_array().cloned().unwrap_or_default();
            let mut ok = true;
            let mut any = false;
            for (i, item) in items.iter().enumerate().skip(start) {
                any = true;
                let item_loc = instance_location.with_pushed(i);
                let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(i.to_string()));
                ok &= scopes.get(child).is_valid();
            }
            finish(scopes, kid, ok, any.then_some(Value::Bool(true)), "array elements are invalid against \"unevaluatedItems\"");
        }

        Keyword::Properties(map) => {
            let kid = run!(true);
            let mut ok = true;
            let mut matched = Vec::new();
            if let Value::Object(o) = instance {
                for (prop, key) in map {
                    if let Some(item) = o.get(prop) {
                        let item_loc = instance_location.with_pushed(prop.as_str());
                        let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(prop.clone()));
                        if scopes.get(child).is_valid() {
                            matched.push(Value::String(prop.clone()));
                        } else {
                            ok = false;
                        }
                    }
                }
            }
            finish(scopes, kid, ok, Some(Value::Array(matched)), "object properties are invalid");
        }
        Keyword::PatternProperties(patterns) => {
            let kid = run!(true);
            let mut ok = true;
            let mut matched = std::collections::BTreeSet::new();
            if let Value::Object(o) = instance {
                for (prop, item) in o {
                    for (re, key) in patterns {
                        if re.is_match(prop) {
                            let item_loc = instance_location.with_pushed(prop.as_str());
                            let edge = format!("{}/{}", re.as_str(), prop);
                            let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(edge));
                            if scopes.get(child).is_valid() {
                                matched.insert(prop.clone());
                            } else {
                                ok = false;
                            }
                        }
                    }
                }
            }
            let annotation = Value::Array(matched.into_iter().map(Value::String).collect());
            finish(scopes, kid, ok, Some(annotation), "object properties are invalid against \"patternProperties\"");
        }
        Keyword::AdditionalProperties(key) => {
            let kid = run!(true);
            let evaluated = sibling_string_set(scopes, parent_scope, &["properties", "patternProperties"]);
            let mut ok = true;
            let mut matched = Vec::new();
            if let Value::Object(o) = instance {
                for (prop, item) in o {
                    if evaluated.contains(prop) {
                        continue;
                    }
                    let item_loc = instance_location.with_pushed(prop.as_str());
                    let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(prop.clone()));
                    if scopes.get(child).is_valid() {
                        matched.push(Value::String(prop.clone()));
                    } else {
                        ok = false;
                    }
                }
            }
            finish(scopes, kid, ok, Some(Value::Array(matched)), "additional object properties are invalid");
        }
        Keyword::UnevaluatedProperties(key) => {
            let kid = run!(true);
            let evaluated = collected_string_set(scopes, kid, &["properties", "patternProperties", "additionalProperties", "unevaluatedProperties"]);
            let mut ok = true;
            let mut matched = Vec::new();
            if let Value::Object(o) = instance {
                for (prop, item) in o {
                    if evaluated.contains(prop) {
                        continue;
                    }
                    let item_loc = instance_location.with_pushed(prop.as_str());
                    let child = evaluate_node(catalog, session, scopes, dynamic, *key, item, item_loc, Some(kid), Some(prop.clone()));
                    if scopes.get(child).is_valid() {
                        matched.push(Value::String(prop.clone()));
                    } else {
                        ok = false;
                    }
                }
            }
            finish(scopes, kid, ok, Some(Value::Array(matched)), "unevaluated object properties are invalid");
        }
        Keyword::PropertyNames(key) => {
            let kid = run!(true);
            let mut ok = true;
            if let Value::Object(o) = instance {
                for prop in o.keys() {
                    let child = evaluate_node(catalog, session, scopes, dynamic, *key, &Value::String(prop.clone()), instance_location.clone(), Some(kid), Some(prop.clone()));
                    ok &= scopes.get(child).is_valid();
                }
            }
            finish(scopes, kid, ok, None, "one or more property names are invalid");
        }

        Keyword::Type(types) => {
            let kid = run!(true);
            let valid = types.iter().any(|t| value::instance_type_matches(instance, *t));
            finish(scopes, kid, valid, None, "instance is not of the expected type");
        }
        Keyword::Enum(values) => {
            let kid = run!(true);
            let valid = values.iter().any(|v| value::schema_equal(v, instance));
            finish(scopes, kid, valid, None, "instance does not equal any enumerated value");
        }
        Keyword::Const(expected) => {
            let kid = run!(true);
            finish(scopes, kid, value::schema_equal(expected, instance), None, "instance does not equal the constant value");
        }
        Keyword::MultipleOf(of) => {
            let kid = run!(true);
            let valid = match instance.as_number().map(schema_core::number::from_json_number) {
                Some(Ok(n)) => schema_core::number::is_multiple_of(&n, of),
                _ => true,
            };
            finish(scopes, kid, valid, None, "instance is not a multiple of the given value");
        }
        Keyword::Maximum(max) => {
            let kid = run!(true);
            numeric_compare(scopes, kid, instance, max, |a, b| a <= b, "instance exceeds the maximum");
        }
        Keyword::ExclusiveMaximum(max) => {
            let kid = run!(true);
            numeric_compare(scopes, kid, instance, max, |a, b| a < b, "instance is not strictly less than the exclusive maximum");
        }
        Keyword::Minimum(min) => {
            let kid = run!(true);
            numeric_compare(scopes, kid, instance, min, |a, b| a >= b, "instance is below the minimum");
        }
        Keyword::ExclusiveMinimum(min) => {
            let kid = run!(true);
            numeric_compare(scopes, kid, instance, min, |a, b| a > b, "instance is not strictly greater than the exclusive minimum");
        }
        Keyword::MaxLength(max) => {
            let kid = run!(true);
            let valid = instance.as_str().map(|s| value::code_point_len(s) as u64 <= *max).unwrap_or(true);
            finish(scopes, kid, valid, None, "string is too long");
        }
        Keyword::MinLength(min) => {
            let kid = run!(true);
            let valid = instance.as_str().map(|s| value::code_point_len(s) as u64 >= *min).unwrap_or(true);
            finish(scopes, kid, valid, None, "string is too short");
        }
        Keyword::Pattern(re) => {
            let kid = run!(true);
            let valid = instance.as_str().map(|s| re.is_match(s)).unwrap_or(true);
            finish(scopes, kid, valid, None, "string does not match the pattern");
        }
        Keyword::MaxItems(max) => {
            let kid = run!(true);
            let valid = instance.as_array().map(|a| a.len() as u64 <= *max).unwrap_or(true);
            finish(scopes, kid, valid, None, "array has too many elements");
        }
        Keyword::MinItems(min) => {
            let kid = run!(true);
            let valid = instance.as_array().map(|a| a.len() as u64 >= *min).unwrap_or(true);
            finish(scopes, kid, valid, None, "array has too few elements");
        }
        Keyword::UniqueItems(require) => {
            let kid = run!(*require);
            if *require {
                let valid = instance
                    .as_array()
                    .map(|a| {
                        let mut seen: Vec<&Value> = Vec::new();
                        a.iter().all(|item| {
                            if seen.iter().any(|s| value::schema_equal(s, item)) {
                                false
                            } else {
                                seen.push(item);
                                true
                            }
                        })
                    })
                    .unwrap_or(true);
                finish(scopes, kid, valid, None, "array elements are not all unique");
            } else {
                scopes.get_mut(kid).pass(None);
            }
        }
        Keyword::MaxContains(max) => {
            let kid = run!(true);
            let count = match sibling_annotation(scopes, parent_scope, "contains") {
                Some(Value::Array(items)) => items.len() as u64,
                _ => 0,
            };
            finish(scopes, kid, count <= *max, None, "too many elements match \"contains\"");
        }
        Keyword::MinContains(min) => {
            let kid = run!(true);
            let count = match sibling_annotation(scopes, parent_scope, "contains") {
                Some(Value::Array(items)) => items.len() as u64,
                _ => 0,
            };
            let valid = count >= *min;
            if valid {
                if let Some(s) = sibling_scope(scopes, parent_scope, "contains") {
                    if !scopes.get(s).is_valid() {
                        let annotation = scopes.get(s).annotation.clone();
                        scopes.get_mut(s).pass(annotation);
                    }
                }
            }
            finish(scopes, kid, valid, None, "too few elements match \"contains\"");
        }
        Keyword::MaxProperties(max) => {
            let kid = run!(true);
            let valid = instance.as_object().map(|o| o.len() as u64 <= *max).unwrap_or(true);
            finish(scopes, kid, valid, None, "object has too many properties");
        }
        Keyword::MinProperties(min) => {
            let kid = run!(true);
            let valid = instance.as_object().map(|o| o.len() as u64 >= *min).unwrap_or(true);
            finish(scopes, kid, valid, None, "object has too few properties");
        }
        Keyword::Required(names) => {
            let kid = run!(true);
            let valid = instance.as_object().map(|o| names.iter().all(|n| o.contains_key(n))).unwrap_or(true);
            finish(scopes, kid, valid, None, "object is missing required properties");
        }
        Keyword::DependentRequired(map) => {
            let kid = run!(true);
            let valid = instance
                .as_object()
                .map(|o| map.iter().all(|(k, deps)| !o.contains_key(k) || deps.iter().all(|d| o.contains_key(d))))
                .unwrap_or(true);
            finish(scopes, kid, valid, None, "dependent required properties are missing");
        }

        Keyword::ContentEncoding(v) => {
            let kid = run!(false);
            scopes.get_mut(kid).pass(Some(Value::String(v.clone())));
        }
        Keyword::ContentMediaType(v) => {
            let kid = run!(false);
            scopes.get_mut(kid).pass(Some(Value::String(v.clone())));
        }
        Keyword::ContentSchema(_) => {
            let kid = run!(false);
            scopes.get_mut(kid).discard();
        }

        Keyword::Format(fmt) => {
            let enabled = catalog.is_format_enabled(fmt);
            let kid = run!(enabled);
            let valid = match catalog.format_validator(fmt) {
                Ok(validator) => validator.validate(instance),
                Err(_) => {
                    tracing::warn!(format = %fmt, "format validator requested but not enabled");
                    true
                }
            };
            finish(scopes, kid, valid, Some(Value::String(fmt.clone())), "instance does not match the declared format");
        }

        Keyword::Title(v) | Keyword::Description(v) | Keyword::Default(v) | Keyword::Examples(v) => {
            let kid = run!(false);
            scopes.get_mut(kid).pass(Some(v.clone()));
        }
        Keyword::Deprecated(v) | Keyword::ReadOnly(v) | Keyword::WriteOnly(v) => {
            let kid = run!(false);
            scopes.get_mut(kid).pass(Some(Value::Bool(*v)));
        }
        Keyword::Unknown(v) => {
            tracing::warn!(keyword = %name, "unrecognized keyword preserved as passthrough annotation");
            let kid = run!(false);
            scopes.get_mut(kid).pass(Some(v.clone()));
        }

        Keyword::Id(_) | Keyword::Schema(_) | Keyword::Vocabulary(_) | Keyword::Anchor(_)
        | Keyword::DynamicAnchor(_) | Keyword::RecursiveAnchor(_) | Keyword::Defs(_) | Keyword::Comment(_) => {
            let kid = run!(false);
            scopes.get_mut(kid).discard();
        }
    }
}

fn finish(scopes: &mut ScopeArena, scope: ScopeKey, valid: bool, annotation: Option<Value>, message: &str) {
    if valid {
        scopes.get_mut(scope).pass(annotation);
    } else {
        scopes.get_mut(scope).fail(Some(message.to_owned()));
    }
}

fn numeric_compare(
    scopes: &mut ScopeArena,
    scope: ScopeKey,
    instance: &Value,
    bound: &schema_core::number::BigRational,
    cmp: impl Fn(&schema_core::number::BigRational, &schema_core::number::BigRational) -> bool,
    message: &str,
) {
    let valid = match instance.as_number().map(schema_core::number::from_json_number) {
        Some(Ok(n)) => cmp(&n, bound),
        _ => true,
    };
    finish(scopes, scope, valid, None, message);
}

fn sibling_scope(scopes: &ScopeArena, parent_scope: ScopeKey, name: &str) -> Option<ScopeKey> {
    scopes.get(parent_scope).children.get(name).copied()
}

/// "if"'s own scope always passes (it never asserts); what "then"/"else"
/// need is whether the nested condition subschema it wraps held, which
/// lives one level down as that scope's only child.
fn sibling_valid(scopes: &ScopeArena, parent_scope: ScopeKey, name: &str) -> Option<bool> {
    let kw_scope = sibling_scope(scopes, parent_scope, name)?;
    let condition = scopes.get(kw_scope).children.get("").copied()?;
    Some(scopes.get(condition).is_valid())
}

fn sibling_annotation(scopes: &ScopeArena, parent_scope: ScopeKey, name: &str) -> Option<Value> {
    sibling_scope(scopes, parent_scope, name).and_then(|s| scopes.get(s).annotation.clone())
}

fn scopes_prefix_annotation(scopes: &ScopeArena, parent_scope: ScopeKey, name: &str) -> Option<Value> {
    sibling_annotation(scopes, parent_scope, name)
}

fn sibling_string_set(scopes: &ScopeArena, parent_scope: ScopeKey, names: &[&str]) -> std::collections::BTreeSet<String> {
    let mut out = std::collections::BTreeSet::new();
    for name in names {
        if let Some(Value::Array(items)) = sibling_annotation(scopes, parent_scope, name) {
            for item in items {
                if let Value::String(s) = item {
                    out.insert(s);
                }
            }
        }
    }
    out
}

fn collected_string_set(scopes: &ScopeArena, parent_scope: ScopeKey, names: &[&str]) -> std::collections::BTreeSet<String> {
    let mut out = std::collections::BTreeSet::new();
    for name in names {
        for annotation in scopes.collect_annotations(parent_scope, name) {
            if let Value::Array(items) = annotation {
                for item in items {
                    if let Value::String(s) = item {
                        out.insert(s);
                    }
                }
            }
        }
    }
    out
}

/// The highest index already covered by `items`/`prefixItems`/`additionalItems`
/// annotations, collected through in-place applicators, or `usize::MAX` as a
/// sentinel meaning "every index already evaluated" (an annotation of `true`).
fn last_evaluated_item(scopes: &ScopeArena, parent_scope: ScopeKey) -> Option<usize> {
    let mut last = None;
    for name in ["items", "prefixItems", "additionalItems", "unevaluatedItems"] {
        for annotation in scopes.collect_annotations(parent_scope, name) {
            match annotation {
                Value::Bool(true) => return Some(usize::MAX),
                Value::Number(n) => {
                    if let Some(i) = n.as_u64() {
                        last = Some(last.map_or(i as usize, |l: usize| l.max(i as usize)));
                    }
                }
                _ => {}
            }
        }
    }
    last
}

/// Resolves `$ref`/`$dynamicRef`/`$recursiveRef` against the current dynamic
/// scope. `$dynamicRef`/`$recursiveRef` first resolve their lexical target
/// the same way `$ref` would; only if that target itself declares a
/// matching `$dynamicAnchor`/`$recursiveAnchor: true` do they then walk the
/// dynamic scope outermost-first for a frame declaring the same anchor,
/// falling back to the lexical target if none is found. A lexical target
/// that doesn't declare the anchor is used directly, with no dynamic walk.
fn resolve_reference(catalog: &mut Catalog, session: &str, keyword: &Keyword, dynamic: &DynamicScope) -> Option<SchemaKey> {
    match keyword {
        Keyword::Ref(uri) => catalog.get_schema(uri, None, session).ok(),
        Keyword::DynamicRef { base, anchor } => {
            let target = base.with_fragment(anchor).ok()?;
            let lexical = catalog.get_schema(&target, None, session).ok()?;
            let declares_anchor = matches!(
                catalog.schema(lexical),
                CompiledSchema::Object(o) if o.dynamic_anchor.as_deref() == Some(anchor.as_str())
            );
            if !declares_anchor {
                return Some(lexical);
            }
            for frame in dynamic.outermost_first() {
                if let CompiledSchema::Object(o) = catalog.schema(frame.schema) {
                    if o.dynamic_anchor.as_deref() == Some(anchor.as_str()) {
                        return Some(frame.schema);
                    }
                }
            }
            Some(lexical)
        }
        Keyword::RecursiveRef(uri) => {
            let lexical = catalog.get_schema(uri, None, session).ok()?;
            let declares_anchor = matches!(catalog.schema(lexical), CompiledSchema::Object(o) if o.recursive_anchor);
            if !declares_anchor {
                return Some(lexical);
            }
            for frame in dynamic.outermost_first() {
                if let CompiledSchema::Object(o) = catalog.schema(frame.schema) {
                    if o.recursive_anchor {
                        return Some(frame.schema);
                    }
                }
            }
            Some(lexical)
        }
        _ => None,
    }
}
