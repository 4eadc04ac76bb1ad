//! Vocabulary registry: a named bundle of keyword classes identified by a
//! URI.

use std::collections::HashSet;

use schema_core::AbsoluteUri;

/// A vocabulary: the set of keyword names it contributes. The keyword
/// classes themselves (instance-type filter, dependencies, applicator/
/// static flags) live in the global [`crate::keyword::KEYWORDS`] table,
/// since the keyword set is closed —
/// a vocabulary only needs to say *which* of those names it brings in.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub uri: AbsoluteUri,
    pub keywords: HashSet<&'static str>,
    /// Whether this is a "core" vocabulary: every metaschema must declare
    /// at least one.
    pub is_core: bool,
}

impl Vocabulary {
    pub fn new(uri: AbsoluteUri, keywords: impl IntoIterator<Item = &'static str>, is_core: bool) -> Self {
        Self { uri, keywords: keywords.into_iter().collect(), is_core }
    }
}

const CORE_2020_12: &[&str] = &[
    "$id", "$schema", "$anchor", "$ref", "$dynamicRef", "$dynamicAnchor", "$defs", "$vocabulary", "$comment",
];
const CORE_2019_09: &[&str] = &[
    "$id", "$schema", "$anchor", "$ref", "$recursiveRef", "$recursiveAnchor", "$defs", "$vocabulary", "$comment",
];
const APPLICATOR_2020_12: &[&str] = &[
    "allOf", "anyOf", "oneOf", "not", "if", "then", "else", "dependentSchemas", "prefixItems", "items",
    "contains", "properties", "patternProperties", "additionalProperties", "propertyNames",
];
const APPLICATOR_2019_09: &[&str] = &[
    "allOf", "anyOf", "oneOf", "not", "if", "then", "else", "dependentSchemas", "items", "additionalItems",
    "contains", "properties", "patternProperties", "additionalProperties", "propertyNames",
];
const UNEVALUATED_2020_12: &[&str] = &["unevaluatedItems", "unevaluatedProperties"];
const VALIDATION: &[&str] = &[
    "type", "enum", "const", "multipleOf", "maximum", "exclusiveMaximum", "minimum", "exclusiveMinimum",
    "maxLength", "minLength", "pattern", "maxItems", "minItems", "uniqueItems", "maxContains", "minContains",
    "maxProperties", "minProperties", "required", "dependentRequired",
];
const META_DATA: &[&str] = &["title", "description", "default", "deprecated", "examples", "readOnly", "writeOnly"];
const FORMAT_ANNOTATION: &[&str] = &["format"];
const CONTENT: &[&str] = &["contentEncoding", "contentMediaType", "contentSchema"];

/// Builds the standard set of vocabularies for `draft`, mirroring the
/// default bundle every metaschema of that draft declares.
pub fn default_vocabularies(draft: Draft) -> Vec<Vocabulary> {
    match draft {
        Draft::Dialect201909 => vec![
            Vocabulary::new(uri("https://json-schema.org/draft/2019-09/vocab/core"), CORE_2019_09.iter().copied(), true),
            Vocabulary::new(uri("https://json-schema.org/draft/2019-09/vocab/applicator"), APPLICATOR_2019_09.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2019-09/vocab/validation"), VALIDATION.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2019-09/vocab/meta-data"), META_DATA.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2019-09/vocab/format"), FORMAT_ANNOTATION.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2019-09/vocab/content"), CONTENT.iter().copied(), false),
        ],
        Draft::Dialect202012 => vec![
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/core"), CORE_2020_12.iter().copied(), true),
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/applicator"), APPLICATOR_2020_12.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/unevaluated"), UNEVALUATED_2020_12.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/validation"), VALIDATION.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/meta-data"), META_DATA.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/format-annotation"), FORMAT_ANNOTATION.iter().copied(), false),
            Vocabulary::new(uri("https://json-schema.org/draft/2020-12/vocab/content"), CONTENT.iter().copied(), false),
        ],
    }
}

fn uri(s: &str) -> AbsoluteUri {
    AbsoluteUri::parse(s).expect("static vocabulary URI is well-formed")
}

/// The two drafts this evaluator supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draft {
    Dialect201909,
    Dialect202012,
}

impl Draft {
    pub fn metaschema_uri(self) -> &'static str {
        match self {
            Draft::Dialect201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Dialect202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    pub fn from_metaschema_uri(uri: &str) -> Option<Self> {
        if uri.contains("2019-09") {
            Some(Draft::Dialect201909)
        } else if uri.contains("2020-12") {
            Some(Draft::Dialect202012)
        } else {
            None
        }
    }
}
