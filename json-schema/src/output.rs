//! Standardized output formatting: flag, basic, hierarchical ("detailed"),
//! and verbose. Grounded on jschon's `output/__init__.py` (`OutputFormatter`
//! + its four registered formats).

use serde_json::{json, Map, Value};

use crate::scope::{ScopeArena, ScopeKey, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Flag,
    Basic,
    Hierarchical,
    Verbose,
}

/// Renders the result-scope tree rooted at `root` as `format`.
pub fn format(scopes: &ScopeArena, root: ScopeKey, format: OutputFormat) -> Value {
    match format {
        OutputFormat::Flag => flag(scopes, root),
        OutputFormat::Basic => basic(scopes, root),
        OutputFormat::Hierarchical => hierarchical(scopes, root, false),
        OutputFormat::Verbose => hierarchical(scopes, root, true),
    }
}

fn flag(scopes: &ScopeArena, root: ScopeKey) -> Value {
    json!({ "valid": scopes.get(root).is_valid() })
}

/// A flat list of every failing (or, if the root passed, annotating) leaf,
/// mirroring the "basic" structure of the 2020-12 output specification.
fn basic(scopes: &ScopeArena, root: ScopeKey) -> Value {
    let valid = scopes.get(root).is_valid();
    let mut leaves = Vec::new();
    if valid {
        collect_leaves(scopes, root, true, &mut leaves);
        json!({ "valid": true, "annotations": leaves })
    } else {
        collect_leaves(scopes, root, false, &mut leaves);
        json!({ "valid": false, "errors": leaves })
    }
}

fn collect_leaves(scopes: &ScopeArena, node: ScopeKey, want_passed: bool, out: &mut Vec<Value>) {
    let scope = scopes.get(node);
    let mut children = scope.children_in_order().peekable();
    if children.peek().is_none() {
        if want_passed {
            if matches!(scope.state, State::Passed) && scope.annotation.is_some() {
                out.push(leaf_entry(scopes, node, "annotation"));
            }
        } else if matches!(scope.state, State::Failed) {
            out.push(leaf_entry(scopes, node, "error"));
        }
        return;
    }
    for child in scope.children_in_order().collect::<Vec<_>>() {
        let ok = scopes.get(*child).is_valid();
        if want_passed == ok || (!want_passed && !ok) {
            collect_leaves(scopes, *child, want_passed, out);
        }
    }
}

fn leaf_entry(scopes: &ScopeArena, node: ScopeKey, kind: &str) -> Value {
    let scope = scopes.get(node);
    let mut entry = Map::new();
    entry.insert("keywordLocation".to_owned(), Value::String(scope.evaluation_path.to_string()));
    entry.insert("absoluteKeywordLocation".to_owned(), Value::String(scope.absolute_keyword_location.clone()));
    entry.insert("instanceLocation".to_owned(), Value::String(scope.instance_location.to_string()));
    if kind == "error" {
        entry.insert("error".to_owned(), Value::String(scope.error.clone().unwrap_or_else(|| "instance is invalid".to_owned())));
    } else if let Some(annotation) = &scope.annotation {
        entry.insert("annotation".to_owned(), annotation.clone());
    }
    Value::Object(entry)
}

/// The nested tree format. In non-verbose ("detailed") mode, only the
/// branches that disagree with the root's overall validity are descended
/// into; in verbose mode every node is included.
fn hierarchical(scopes: &ScopeArena, node: ScopeKey, verbose: bool) -> Value {
    let scope = scopes.get(node);
    let valid = scope.is_valid();
    let mut entry = Map::new();
    entry.insert("valid".to_owned(), Value::Bool(valid));
    entry.insert("keywordLocation".to_owned(), Value::String(scope.evaluation_path.to_string()));
    entry.insert("absoluteKeywordLocation".to_owned(), Value::String(scope.absolute_keyword_location.clone()));
    entry.insert("instanceLocation".to_owned(), Value::String(scope.instance_location.to_string()));
    if !valid {
        if let Some(error) = &scope.error {
            entry.insert("error".to_owned(), Value::String(error.clone()));
        }
    } else if let Some(annotation) = &scope.annotation {
        entry.insert("annotation".to_owned(), annotation.clone());
    }

    let children: Vec<ScopeKey> = scope.children_in_order().copied().collect();
    let relevant: Vec<ScopeKey> = children
        .into_iter()
        .filter(|c| verbose || !scopes.get(*c).is_valid() == !valid)
        .collect();
    if !relevant.is_empty() {
        let key = if valid { "annotations" } else { "errors" };
        let nested: Vec<Value> = relevant.into_iter().map(|c| hierarchical(scopes, c, verbose)).collect();
        entry.insert(key.to_owned(), Value::Array(nested));
    }
    Value::Object(entry)
}
