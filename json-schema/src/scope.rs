//! The result-scope tree: an arena of evaluation nodes mirroring a compiled
//! schema's keyword structure, kept as a flat arena indexed by integer key
//! rather than a tree of owned boxes.

use std::collections::BTreeMap;

use schema_core::PointerBuf;
use serde_json::Value;
use slotmap::{new_key_type, SlotMap};

use crate::schema::SchemaKey;

new_key_type! {
    /// Index of one node in a [`ScopeArena`].
    pub struct ScopeKey;
}

/// The validity state of one scope node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unknown,
    Passed,
    Failed,
    Discarded,
}

/// One node of the result-scope tree: one keyword's (or applicator child's)
/// application to one instance location.
#[derive(Debug, Clone)]
pub struct Scope {
    pub schema: SchemaKey,
    pub parent: Option<ScopeKey>,
    /// Instance location this node evaluated, as a JSON pointer into the
    /// original instance document.
    pub instance_location: PointerBuf,
    /// Evaluation path: JSON pointer of keyword names / applicator indices
    /// from the evaluation root.
    pub evaluation_path: PointerBuf,
    /// Resolved absolute URI + fragment identifying the keyword that
    /// produced this node.
    pub absolute_keyword_location: String,
    pub state: State,
    /// `false` for annotation-only keywords and `if`; such nodes never
    /// invalidate their parent regardless of `state`.
    pub asserts: bool,
    pub annotation: Option<Value>,
    pub error: Option<String>,
    /// Children keyed by edge name (keyword name, or an applicator index
    /// rendered as a string) in insertion order.
    pub children: BTreeMap<String, ScopeKey>,
    child_order: Vec<String>,
}

impl Scope {
    fn new(
        schema: SchemaKey,
        parent: Option<ScopeKey>,
        instance_location: PointerBuf,
        evaluation_path: PointerBuf,
        absolute_keyword_location: String,
        asserts: bool,
    ) -> Self {
        Self {
            schema,
            parent,
            instance_location,
            evaluation_path,
            absolute_keyword_location,
            state: State::Unknown,
            asserts,
            annotation: None,
            error: None,
            children: BTreeMap::new(),
            child_order: Vec::new(),
        }
    }

    pub fn pass(&mut self, annotation: Option<Value>) {
        self.state = State::Passed;
        self.annotation = annotation;
    }

    pub fn fail(&mut self, error: Option<String>) {
        self.state = State::Failed;
        self.error = error;
    }

    pub fn discard(&mut self) {
        self.state = State::Discarded;
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, State::Passed | State::Discarded) || !self.asserts
    }

    /// Children in the order they were created (not sorted by key).
    pub fn children_in_order(&self) -> impl Iterator<Item = &ScopeKey> {
        self.child_order.iter().filter_map(move |name| self.children.get(name))
    }
}

/// The arena backing a single `evaluate` call's result-scope tree.
#[derive(Debug, Default)]
pub struct ScopeArena {
    nodes: SlotMap<ScopeKey, Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key() }
    }

    pub fn root(
        &mut self,
        schema: SchemaKey,
        absolute_keyword_location: String,
        asserts: bool,
    ) -> ScopeKey {
        self.nodes.insert(Scope::new(
            schema,
            None,
            PointerBuf::root(),
            PointerBuf::root(),
            absolute_keyword_location,
            asserts,
        ))
    }

    /// Creates a child of `parent` under edge `name`, at `instance_location`
    /// (which may equal the parent's, for in-place applicators).
    #[allow(clippy::too_many_arguments)]
    pub fn child(
        &mut self,
        parent: ScopeKey,
        name: impl Into<String>,
        schema: SchemaKey,
        instance_location: PointerBuf,
        absolute_keyword_location: String,
        asserts: bool,
    ) -> ScopeKey {
        let name = name.into();
        let evaluation_path = self.nodes[parent].evaluation_path.with_pushed(name.clone());
        let key = self.nodes.insert(Scope::new(
            schema,
            Some(parent),
            instance_location,
            evaluation_path,
            absolute_keyword_location,
            asserts,
        ));
        let parent_node = &mut self.nodes[parent];
        parent_node.children.insert(name.clone(), key);
        parent_node.child_order.push(name);
        key
    }

    pub fn get(&self, key: ScopeKey) -> &Scope {
        &self.nodes[key]
    }

    pub fn get_mut(&mut self, key: ScopeKey) -> &mut Scope {
        &mut self.nodes[key]
    }

    /// Aggregates validity bottom-up: `scope` passes iff every asserting
    /// child is `Passed` or `Discarded`.
    pub fn aggregate(&mut self, scope: ScopeKey) {
        let children: Vec<ScopeKey> = self.nodes[scope].children_in_order().copied().collect();
        let all_valid = children.iter().all(|c| self.nodes[*c].is_valid());
        if matches!(self.nodes[scope].state, State::Unknown) {
            if all_valid {
                self.nodes[scope].state = State::Passed;
            } else {
                self.nodes[scope].state = State::Failed;
            }
        }
    }

    /// Collects annotation values produced by `keyword_name` under the same
    /// instance location as `scope`, including contributions made through
    /// in-place applicators (`allOf`/`anyOf`/`oneOf`/`if`-branches/`$ref`/
    /// `$dynamicRef`). Only
    /// passing branches contribute.
    pub fn collect_annotations(&self, scope: ScopeKey, keyword_name: &str) -> Vec<Value> {
        let mut out = Vec::new();
        let Some(parent) = self.nodes[scope].parent else { return out };
        let instance_location = &self.nodes[scope].instance_location;
        self.collect_from(parent, instance_location, keyword_name, &mut out, true);
        out
    }

    fn collect_from(
        &self,
        scope: ScopeKey,
        instance_location: &PointerBuf,
        keyword_name: &str,
        out: &mut Vec<Value>,
        is_top: bool,
    ) {
        const IN_PLACE: &[&str] = &["allOf", "anyOf", "oneOf", "if", "then", "else", "$ref", "$dynamicRef", "$recursiveRef"];
        let node = &self.nodes[scope];
        for name in &node.child_order {
            let Some(&child_key) = node.children.get(name) else { continue };
            let child = &self.nodes[child_key];
            if !matches!(child.state, State::Passed) {
                continue;
            }
            if child.instance_location != *instance_location && !is_top {
                continue;
            }
            if name == keyword_name && child.instance_location == *instance_location {
                if let Some(annotation) = &child.annotation {
                    out.push(annotation.clone());
                }
            }
            // An empty edge name is the single wrapped subschema of a
            // not/if/then/else/$ref-family keyword: always a transparent
            // continuation of the same in-place context, never a keyword
            // in its own right.
            let base = name.split('/').next().unwrap_or(name.as_str());
            if name.is_empty() || IN_PLACE.contains(&base) || name.parse::<usize>().is_ok() {
                self.collect_from(child_key, instance_location, keyword_name, out, false);
            }
        }
    }
}

/// A frame of the dynamic scope stack: the chain of
/// enclosing schema evaluations (not lexical parents) consulted when
/// resolving `$dynamicRef`/`$recursiveRef`.
#[derive(Debug, Clone)]
pub struct DynamicFrame {
    pub schema: SchemaKey,
}

/// Growable stack of [`DynamicFrame`]s threaded down the recursion, per the
/// engine's "one piece of contextual state beyond the result tree" note.
#[derive(Debug, Clone, Default)]
pub struct DynamicScope {
    frames: Vec<DynamicFrame>,
}

impl DynamicScope {
    pub fn push(&mut self, schema: SchemaKey) {
        self.frames.push(DynamicFrame { schema });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn frames(&self) -> &[DynamicFrame] {
        &self.frames
    }

    /// Outermost-first iterator, as `$dynamicRef` resolution requires
    /// walking from the outermost enclosing schema inward.
    pub fn outermost_first(&self) -> impl Iterator<Item = &DynamicFrame> {
        self.frames.iter()
    }
}
