//! Keyword implementations as a tagged variant (sum type). The keyword set
//! is closed and known up front, so a single enum with a dispatch function
//! switching on the tag is simpler than trait objects while staying just as
//! open to adding new keyword variants later.

use indexmap::IndexMap;
use regex::Regex;
use schema_core::number::BigRational;
use schema_core::AbsoluteUri;
use serde_json::Value;

use crate::schema::SchemaKey;
use crate::value::InstanceType;

/// Static metadata about a keyword class: the instance types it applies to,
/// the sibling keywords it depends on for evaluation order, and whether it
/// is an applicator or a compile-time-only ("static") keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub name: &'static str,
    /// `None` means "applies to every instance type".
    pub types: Option<&'static [InstanceTypeTag]>,
    pub depends_on: &'static [&'static str],
    pub is_applicator: bool,
    pub is_static: bool,
}

/// `InstanceType` is not `const`-constructible as a slice literal (it is a
/// plain enum, which is fine, but spelling it out keeps the metadata table
/// below readable without `InstanceType::` repeated everywhere).
pub type InstanceTypeTag = InstanceType;

macro_rules! info {
    ($name:expr, types: $types:expr, depends_on: $deps:expr, applicator: $app:expr, static: $stat:expr) => {
        KeywordInfo {
            name: $name,
            types: $types,
            depends_on: $deps,
            is_applicator: $app,
            is_static: $stat,
        }
    };
}

const OBJ: &[InstanceTypeTag] = &[InstanceType::Object];
const ARR: &[InstanceTypeTag] = &[InstanceType::Array];
const STR: &[InstanceTypeTag] = &[InstanceType::String];
const NUM: &[InstanceTypeTag] = &[InstanceType::Number, InstanceType::Integer];

/// The full table of keyword metadata, covering both the 2019-09 and
/// 2020-12 vocabularies. Drives the compiler's dependency-respecting
/// evaluation order and the per-keyword instance-type filter.
pub const KEYWORDS: &[KeywordInfo] = &[
    info!("$id", types: None, depends_on: &[], applicator: false, static: true),
    info!("$schema", types: None, depends_on: &[], applicator: false, static: true),
    info!("$vocabulary", types: None, depends_on: &[], applicator: false, static: true),
    info!("$anchor", types: None, depends_on: &[], applicator: false, static: true),
    info!("$dynamicAnchor", types: None, depends_on: &[], applicator: false, static: true),
    info!("$recursiveAnchor", types: None, depends_on: &[], applicator: false, static: true),
    info!("$defs", types: None, depends_on: &[], applicator: false, static: true),
    info!("definitions", types: None, depends_on: &[], applicator: false, static: true),
    info!("$comment", types: None, depends_on: &[], applicator: false, static: true),
    info!("$ref", types: None, depends_on: &[], applicator: true, static: false),
    info!("$dynamicRef", types: None, depends_on: &[], applicator: true, static: false),
    info!("$recursiveRef", types: None, depends_on: &[], applicator: true, static: false),
    info!("type", types: None, depends_on: &[], applicator: false, static: false),
    info!("enum", types: None, depends_on: &[], applicator: false, static: false),
    info!("const", types: None, depends_on: &[], applicator: false, static: false),
    info!("multipleOf", types: NUM, depends_on: &[], applicator: false, static: false),
    info!("maximum", types: NUM, depends_on: &[], applicator: false, static: false),
    info!("exclusiveMaximum", types: NUM, depends_on: &[], applicator: false, static: false),
    info!("minimum", types: NUM, depends_on: &[], applicator: false, static: false),
    info!("exclusiveMinimum", types: NUM, depends_on: &[], applicator: false, static: false),
    info!("maxLength", types: STR, depends_on: &[], applicator: false, static: false),
    info!("minLength", types: STR, depends_on: &[], applicator: false, static: false),
    info!("pattern", types: STR, depends_on: &[], applicator: false, static: false),
    info!("maxItems", types: ARR, depends_on: &[], applicator: false, static: false),
    info!("minItems", types: ARR, depends_on: &[], applicator: false, static: false),
    info!("uniqueItems", types: ARR, depends_on: &[], applicator: false, static: false),
    info!("maxContains", types: ARR, depends_on: &["contains"], applicator: false, static: false),
    info!("minContains", types: ARR, depends_on: &["contains", "maxContains"], applicator: false, static: false),
    info!("maxProperties", types: OBJ, depends_on: &[], applicator: false, static: false),
    info!("minProperties", types: OBJ, depends_on: &[], applicator: false, static: false),
    info!("required", types: OBJ, depends_on: &[], applicator: false, static: false),
    info!("dependentRequired", types: OBJ, depends_on: &[], applicator: false, static: false),
    info!("allOf", types: None, depends_on: &[], applicator: true, static: false),
    info!("anyOf", types: None, depends_on: &[], applicator: true, static: false),
    info!("oneOf", types: None, depends_on: &[], applicator: true, static: false),
    info!("not", types: None, depends_on: &[], applicator: true, static: false),
    info!("if", types: None, depends_on: &[], applicator: true, static: false),
    info!("then", types: None, depends_on: &["if"], applicator: true, static: false),
    info!("else", types: None, depends_on: &["if"], applicator: true, static: false),
    info!("dependentSchemas", types: OBJ, depends_on: &[], applicator: true, static: false),
    info!("prefixItems", types: ARR, depends_on: &[], applicator: true, static: false),
    info!("items", types: ARR, depends_on: &["prefixItems"], applicator: true, static: false),
    info!("additionalItems", types: ARR, depends_on: &["items"], applicator: true, static: false),
    info!("contains", types: ARR, depends_on: &[], applicator: true, static: false),
    info!(
        "unevaluatedItems",
        types: ARR,
        depends_on: &[
            "items", "additionalItems", "contains",
            "not", "if", "then", "else", "allOf", "anyOf", "oneOf", "dependentSchemas",
            "$ref", "$dynamicRef", "$recursiveRef"
        ],
        applicator: true,
        static: false
    ),
    info!("properties", types: OBJ, depends_on: &[], applicator: true, static: false),
    info!("patternProperties", types: OBJ, depends_on: &[], applicator: true, static: false),
    info!(
        "additionalProperties",
        types: OBJ,
        depends_on: &["properties", "patternProperties"],
        applicator: true,
        static: false
    ),
    info!(
        "unevaluatedProperties",
        types: OBJ,
        depends_on: &[
            "properties", "patternProperties", "additionalProperties",
            "not", "if", "then", "else", "allOf", "anyOf", "oneOf", "dependentSchemas",
            "$ref", "$dynamicRef", "$recursiveRef"
        ],
        applicator: true,
        static: false
    ),
    info!("propertyNames", types: OBJ, depends_on: &[], applicator: true, static: false),
    info!("contentEncoding", types: STR, depends_on: &[], applicator: false, static: false),
    info!("contentMediaType", types: STR, depends_on: &[], applicator: false, static: false),
    info!("contentSchema", types: STR, depends_on: &["contentMediaType"], applicator: true, static: false),
    info!("format", types: None, depends_on: &[], applicator: false, static: false),
    info!("title", types: None, depends_on: &[], applicator: false, static: false),
    info!("description", types: None, depends_on: &[], applicator: false, static: false),
    info!("default", types: None, depends_on: &[], applicator: false, static: false),
    info!("deprecated", types: None, depends_on: &[], applicator: false, static: false),
    info!("examples", types: None, depends_on: &[], applicator: false, static: false),
    info!("readOnly", types: None, depends_on: &[], applicator: false, static: false),
    info!("writeOnly", types: None, depends_on: &[], applicator: false, static: false),
];

pub fn info(name: &str) -> Option<&'static KeywordInfo> {
    KEYWORDS.iter().find(|k| k.name == name)
}

/// The tagged variant over every supported keyword. Applicator variants
/// hold [`SchemaKey`]s into the owning [`crate::catalog::Catalog`]'s schema
/// arena rather than owned subschemas directly, since subschemas are
/// themselves arena entries rather than inline trees.
#[derive(Debug, Clone)]
pub enum Keyword {
    // --- core / identity (static; side effects already applied at compile time) ---
    Id(AbsoluteUri),
    Schema(AbsoluteUri),
    Vocabulary(IndexMap<AbsoluteUri, bool>),
    Anchor(String),
    DynamicAnchor(String),
    RecursiveAnchor(bool),
    Defs(IndexMap<String, SchemaKey>),
    Comment(String),

    // --- references ---
    Ref(AbsoluteUri),
    DynamicRef { base: AbsoluteUri, anchor: String },
    /// Carries the lexically resolved target (almost always `"#"` resolved
    /// against the enclosing schema's base), consulted first before any
    /// dynamic-scope walk.
    RecursiveRef(AbsoluteUri),

    // --- in-place applicators ---
    AllOf(Vec<SchemaKey>),
    AnyOf(Vec<SchemaKey>),
    OneOf(Vec<SchemaKey>),
    Not(SchemaKey),
    If(SchemaKey),
    Then(SchemaKey),
    Else(SchemaKey),
    DependentSchemas(IndexMap<String, SchemaKey>),

    // --- array applicators ---
    PrefixItems(Vec<SchemaKey>),
    Items(SchemaKey),
    LegacyItemsSingle(SchemaKey),
    LegacyItemsTuple(Vec<SchemaKey>),
    LegacyAdditionalItems(SchemaKey),
    Contains(SchemaKey),
    UnevaluatedItems(SchemaKey),

    // --- object applicators ---
    Properties(IndexMap<String, SchemaKey>),
    PatternProperties(Vec<(Regex, SchemaKey)>),
    AdditionalProperties(SchemaKey),
    UnevaluatedProperties(SchemaKey),
    PropertyNames(SchemaKey),

    // --- validation ---
    Type(Vec<InstanceType>),
    Enum(Vec<Value>),
    Const(Value),
    MultipleOf(BigRational),
    Maximum(BigRational),
    ExclusiveMaximum(BigRational),
    Minimum(BigRational),
    ExclusiveMinimum(BigRational),
    MaxLength(u64),
    MinLength(u64),
    Pattern(Regex),
    MaxItems(u64),
    MinItems(u64),
    UniqueItems(bool),
    MaxContains(u64),
    MinContains(u64),
    MaxProperties(u64),
    MinProperties(u64),
    Required(Vec<String>),
    DependentRequired(IndexMap<String, Vec<String>>),

    // --- content ---
    ContentEncoding(String),
    ContentMediaType(String),
    ContentSchema(SchemaKey),

    // --- format ---
    Format(String),

    // --- annotation passthrough ---
    Title(Value),
    Description(Value),
    Default(Value),
    Deprecated(bool),
    Examples(Value),
    ReadOnly(bool),
    WriteOnly(bool),

    /// A keyword not recognized by any registered vocabulary, preserved
    /// verbatim so downstream consumers may still inspect it ("every
    /// unrecognized keyword is preserved as an unknown-keyword annotation").
    Unknown(Value),
}

impl Keyword {
    /// Applicator keyword variants contribute child scopes under one or
    /// more edges; this enumerates the subschema keys an applicator holds,
    /// in the order they should be evaluated.
    pub fn subschemas(&self) -> Vec<(String, SchemaKey)> {
        use Keyword::*;
        match self {
            AllOf(v) | AnyOf(v) | OneOf(v) | PrefixItems(v) | LegacyItemsTuple(v) => {
                v.iter().enumerate().map(|(i, k)| (i.to_string(), *k)).collect()
            }
            Not(k) | If(k) | Then(k) | Else(k) | Items(k) | LegacyItemsSingle(k)
            | LegacyAdditionalItems(k) | Contains(k) | UnevaluatedItems(k)
            | AdditionalProperties(k) | UnevaluatedProperties(k) | PropertyNames(k)
            | ContentSchema(k) => vec![(String::new(), *k)],
            DependentSchemas(m) | Defs(m) => m.iter().map(|(name, k)| (name.clone(), *k)).collect(),
            Properties(m) => m.iter().map(|(name, k)| (name.clone(), *k)).collect(),
            PatternProperties(v) => v.iter().map(|(re, k)| (re.as_str().to_owned(), *k)).collect(),
            _ => Vec::new(),
        }
    }
}
