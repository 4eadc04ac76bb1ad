//! End-to-end scenarios exercising the evaluator's public surface:
//! `Catalog::add_source`/`get_schema`, `evaluate`, and `format_output`.

use jsonschema::{evaluate, format_output, new_catalog, OutputFormat, DEFAULT_SESSION};
use schema_core::AbsoluteUri;
use serde_json::{json, Value};

fn uri(s: &str) -> AbsoluteUri {
    AbsoluteUri::parse(s).unwrap()
}

/// Scenario A: a plain `properties` + `pattern` schema.
#[test]
fn basic_validation_passes_and_fails_on_pattern() {
    let mut catalog = new_catalog().unwrap();
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "greeting": { "type": "string", "pattern": "^Hello, .+!$" }
        }
    });
    let schema_uri = uri("https://example.com/a");
    catalog.add_source(schema_uri.clone(), schema).unwrap();
    let key = catalog.get_schema(&schema_uri, None, DEFAULT_SESSION).unwrap();

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!({"greeting": "Hello, world!"}));
    assert!(scopes.get(root).is_valid());

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!({"greeting": "nope"}));
    assert!(!scopes.get(root).is_valid());
    let basic = format_output(&scopes, root, OutputFormat::Basic);
    let errors = basic["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["instanceLocation"] == "/greeting"));
}

/// Scenario B: `if`/`then`/`else` gated on `prefixItems`, with `contains` in
/// each branch. `contains`'s annotation is the array of matching indices.
#[test]
fn conditional_contains_selects_the_matching_branch() {
    let mut catalog = new_catalog().unwrap();
    let schema = json!({
        "$id": "http://example.com",
        "if": { "prefixItems": [ { "const": 1 } ] },
        "then": { "contains": { "multipleOf": 2 } },
        "else": { "contains": { "multipleOf": 3 } }
    });
    let schema_uri = uri("http://example.com");
    let dialect = uri("https://json-schema.org/draft/2020-12/schema");
    catalog.add_source(schema_uri.clone(), schema).unwrap();
    let key = catalog.get_schema(&schema_uri, Some(&dialect), DEFAULT_SESSION).unwrap();

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!([1, 2]));
    assert!(scopes.get(root).is_valid());
    let if_scope = *scopes.get(root).children.get("if").unwrap();
    let if_condition = *scopes.get(if_scope).children.get("").unwrap();
    let prefix_items = scopes.get(if_condition).children.get("prefixItems").unwrap();
    assert_eq!(scopes.get(*prefix_items).annotation, Some(json!(0)));
    let then_scope = *scopes.get(root).children.get("then").unwrap();
    let then_condition = *scopes.get(then_scope).children.get("").unwrap();
    let contains = scopes.get(then_condition).children.get("contains").unwrap();
    assert_eq!(scopes.get(*contains).annotation, Some(json!([1])));

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!([1, 3]));
    assert!(!scopes.get(root).is_valid());

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!([2, 3]));
    assert!(scopes.get(root).is_valid());
    let else_scope = *scopes.get(root).children.get("else").unwrap();
    let else_condition = *scopes.get(else_scope).children.get("").unwrap();
    let contains = scopes.get(else_condition).children.get("contains").unwrap();
    assert_eq!(scopes.get(*contains).annotation, Some(json!([1])));
}

/// Scenario C: an unrecognized keyword is preserved verbatim as an
/// annotation rather than rejected or silently dropped.
#[test]
fn unknown_keyword_is_preserved_as_an_annotation() {
    let mut catalog = new_catalog().unwrap();
    let foo_value = json!({"need": "to", "test": ["nested"]});
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "foo": foo_value
    });
    let schema_uri = uri("https://example.com/c");
    catalog.add_source(schema_uri.clone(), schema).unwrap();
    let key = catalog.get_schema(&schema_uri, None, DEFAULT_SESSION).unwrap();

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!({}));
    assert!(scopes.get(root).is_valid());
    let basic = format_output(&scopes, root, OutputFormat::Basic);
    assert_eq!(basic["valid"], json!(true));
    let annotations = basic["annotations"].as_array().unwrap();
    assert!(annotations.iter().any(|a| a["annotation"] == foo_value));
}

/// Scenario D: `$dynamicRef`/`$dynamicAnchor` recursion. A plain "tree"
/// schema accepts unknown child properties; a "strict-tree" schema that
/// `$ref`s it and adds `unevaluatedProperties: false` does not, and the
/// restriction recurses through every level of the tree because
/// `$dynamicRef` finds the outermost matching `$dynamicAnchor`.
#[test]
fn dynamic_ref_extends_recursively_through_unevaluated_properties() {
    let mut catalog = new_catalog().unwrap();
    let tree = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://example.com/tree",
        "$dynamicAnchor": "node",
        "type": "object",
        "properties": {
            "children": {
                "type": "array",
                "items": { "$dynamicRef": "#node" }
            }
        }
    });
    let strict_tree = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://example.com/strict-tree",
        "$dynamicAnchor": "node",
        "$ref": "tree",
        "unevaluatedProperties": false
    });
    let tree_uri = uri("https://example.com/tree");
    let strict_uri = uri("https://example.com/strict-tree");
    catalog.add_source(tree_uri.clone(), tree).unwrap();
    catalog.add_source(strict_uri.clone(), strict_tree).unwrap();

    let tree_key = catalog.get_schema(&tree_uri, None, DEFAULT_SESSION).unwrap();
    let strict_key = catalog.get_schema(&strict_uri, None, DEFAULT_SESSION).unwrap();

    let instance = json!({"children": [{"daat": 1}]});

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, tree_key, &instance);
    assert!(scopes.get(root).is_valid());

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, strict_key, &instance);
    assert!(!scopes.get(root).is_valid());
    let basic = format_output(&scopes, root, OutputFormat::Basic);
    let errors = basic["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["instanceLocation"] == "/children/0/daat"));
}

/// Scenario E: `unevaluatedProperties` must see annotations contributed by
/// sibling `allOf` branches, not just its own schema's direct `properties`.
#[test]
fn unevaluated_properties_sees_annotations_from_allof_siblings() {
    let mut catalog = new_catalog().unwrap();
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "allOf": [ { "properties": { "a": true } } ],
        "properties": { "b": true },
        "unevaluatedProperties": false
    });
    let schema_uri = uri("https://example.com/e");
    catalog.add_source(schema_uri.clone(), schema).unwrap();
    let key = catalog.get_schema(&schema_uri, None, DEFAULT_SESSION).unwrap();

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!({"a": 1, "b": 2}));
    assert!(scopes.get(root).is_valid());

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!({"a": 1, "b": 2, "c": 3}));
    assert!(!scopes.get(root).is_valid());
    let basic = format_output(&scopes, root, OutputFormat::Basic);
    let errors = basic["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["instanceLocation"] == "/c"));
}

/// Scenario F: `uniqueItems` uses exact schema-equality, not float/bool
/// coercion: `1` and `1.0` are duplicates, `1` and `true` are not.
#[test]
fn unique_items_uses_exact_numeric_equality() {
    let mut catalog = new_catalog().unwrap();
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "uniqueItems": true
    });
    let schema_uri = uri("https://example.com/f");
    catalog.add_source(schema_uri.clone(), schema).unwrap();
    let key = catalog.get_schema(&schema_uri, None, DEFAULT_SESSION).unwrap();

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!([1, 1.0]));
    assert!(!scopes.get(root).is_valid());

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, key, &json!([1, true]));
    assert!(scopes.get(root).is_valid());
}

/// Invariant: a `$ref` carrying a JSON-pointer fragment into `$defs`
/// resolves to the very same compiled schema the compiler produced for
/// that subschema, without re-walking the raw document.
#[test]
fn json_pointer_fragment_resolves_to_the_compiled_subschema() {
    let mut catalog = new_catalog().unwrap();
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$defs": {
            "positive": { "type": "integer", "exclusiveMinimum": 0 }
        },
        "$ref": "#/$defs/positive"
    });
    let schema_uri = uri("https://example.com/pointer");
    catalog.add_source(schema_uri.clone(), schema).unwrap();
    let root_key = catalog.get_schema(&schema_uri, None, DEFAULT_SESSION).unwrap();

    let fragment_uri = schema_uri.with_fragment("/$defs/positive").unwrap();
    let def_key = catalog.get_schema(&fragment_uri, None, DEFAULT_SESSION).unwrap();

    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, def_key, &json!(5));
    assert!(scopes.get(root).is_valid());
    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, def_key, &json!(-1));
    assert!(!scopes.get(root).is_valid());

    // The root schema's own `$ref` resolves to the identical schema key.
    let (scopes, root) = evaluate(&mut catalog, DEFAULT_SESSION, root_key, &json!(5));
    assert!(scopes.get(root).is_valid());
}

/// Invariant: object key ordering in the raw JSON must not affect whether a
/// schema compiles or how it evaluates — only keyword dependencies (and the
/// global table's declared order) determine evaluation order.
#[test]
fn evaluation_is_independent_of_source_key_order() {
    let mut first = new_catalog().unwrap();
    let mut second = new_catalog().unwrap();

    let forward = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "properties": { "x": { "type": "number" } },
        "additionalProperties": false,
        "unevaluatedProperties": false
    });
    // Same keys, different textual order (serde_json's Map preserves
    // insertion order under the `preserve_order` feature).
    let mut reordered = serde_json::Map::new();
    reordered.insert("unevaluatedProperties".to_owned(), json!(false));
    reordered.insert("additionalProperties".to_owned(), json!(false));
    reordered.insert("properties".to_owned(), json!({ "x": { "type": "number" } }));
    reordered.insert("$schema".to_owned(), json!("https://json-schema.org/draft/2020-12/schema"));
    let reordered = Value::Object(reordered);

    let forward_uri = uri("https://example.com/order-a");
    let reordered_uri = uri("https://example.com/order-b");
    first.add_source(forward_uri.clone(), forward).unwrap();
    second.add_source(reordered_uri.clone(), reordered).unwrap();
    let forward_key = first.get_schema(&forward_uri, None, DEFAULT_SESSION).unwrap();
    let reordered_key = second.get_schema(&reordered_uri, None, DEFAULT_SESSION).unwrap();

    for instance in [json!({"x": 1}), json!({"x": "no"}), json!({"y": 1})] {
        let (a_scopes, a_root) = evaluate(&mut first, DEFAULT_SESSION, forward_key, &instance);
        let (b_scopes, b_root) = evaluate(&mut second, DEFAULT_SESSION, reordered_key, &instance);
        assert_eq!(a_scopes.get(a_root).is_valid(), b_scopes.get(b_root).is_valid());
    }
}

/// Invariant: sessions are isolated. Compiling the same URI under two
/// different sessions produces distinct schema keys, and ending one
/// session's scope does not disturb the other's cached schema.
#[test]
fn sessions_cache_schemas_independently() {
    let mut catalog = new_catalog().unwrap();
    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "string"
    });
    let schema_uri = uri("https://example.com/session-scoped");
    catalog.add_source(schema_uri.clone(), schema).unwrap();

    let session_a = catalog.start_session(Some("session-a".to_owned())).unwrap();
    let session_b = catalog.start_session(Some("session-b".to_owned())).unwrap();

    let key_a = catalog.get_schema(&schema_uri, None, session_a.id()).unwrap();
    let key_b = catalog.get_schema(&schema_uri, None, session_b.id()).unwrap();
    assert_ne!(key_a, key_b);

    catalog.end_session(session_a);
    // session-b's cached schema is unaffected by session-a ending.
    let key_b_again = catalog.get_schema(&schema_uri, None, session_b.id()).unwrap();
    assert_eq!(key_b, key_b_again);
}
