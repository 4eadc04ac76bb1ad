//! RFC 3986 URI references and absolute URIs.
//!
//! Built atop [`fluent_uri`], which already handles percent-encoding,
//! normalization and reference resolution correctly; this module adds the
//! absolute/relative distinction JSON Schema's `$id`/`$ref`/`$anchor`
//! machinery leans on and a couple of copy-with-replaced-component helpers.

use std::fmt;
use std::str::FromStr;

use fluent_uri::Uri as FluentUri;
use fluent_uri::UriRef;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::UriError;

/// Fallback base used to resolve a relative reference when the caller has
/// not registered any base URI of their own (mirrors the synthetic
/// `json-schema:///` root other JSON Schema implementations use so that a
/// schema without an `$id` still has *some* absolute identity).
static DEFAULT_BASE: Lazy<FluentUri<String>> =
    Lazy::new(|| FluentUri::parse("json-schema:///".to_string()).expect("valid default base"));

/// A URI reference, RFC 3986 §4.1: absolute, or relative to some base.
///
/// Used for `$ref`, `$dynamicRef`, and any place a schema document embeds a
/// URI that is not guaranteed to carry a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri {
    value: String,
}

impl Uri {
    /// Parses `value` as a URI reference.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, UriError> {
        let value = value.as_ref();
        let normalized = UriRef::parse(value)
            .map_err(|reason| UriError::Parse {
                value: value.to_owned(),
                reason: reason.to_string(),
            })?
            .normalize();
        Ok(Self { value: normalized.into_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    fn as_fluent(&self) -> UriRef<&str> {
        UriRef::parse(self.value.as_str()).expect("Uri invariant: always holds a valid URI reference")
    }

    pub fn has_scheme(&self) -> bool {
        self.as_fluent().scheme().is_some()
    }

    pub fn fragment(&self) -> Option<String> {
        self.as_fluent().fragment().map(|f| f.as_str().to_owned())
    }

    /// Resolves this reference against `base`, returning a new
    /// [`AbsoluteUri`]. Per RFC 3986 §5.3.
    pub fn resolve(&self, base: &AbsoluteUri) -> Result<AbsoluteUri, UriError> {
        let resolved = self
            .as_fluent()
            .resolve_against(&base.as_fluent().borrow())
            .map_err(|reason| UriError::Resolve {
                base: base.as_str().to_owned(),
                reference: self.value.clone(),
                reason: reason.to_string(),
            })?
            .normalize();
        Ok(AbsoluteUri { value: resolved.into_string() })
    }

    /// Resolves this reference against the synthetic default root, for
    /// references that appear with no enclosing base at all.
    pub fn resolve_default(&self) -> Result<AbsoluteUri, UriError> {
        if self.has_scheme() {
            return Ok(AbsoluteUri { value: self.value.clone() });
        }
        let resolved = self
            .as_fluent()
            .resolve_against(&DEFAULT_BASE.borrow())
            .map_err(|reason| UriError::Resolve {
                base: DEFAULT_BASE.as_str().to_owned(),
                reference: self.value.clone(),
                reason: reason.to_string(),
            })?
            .normalize();
        Ok(AbsoluteUri { value: resolved.into_string() })
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Uri {
    type Err = UriError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.value
    }
}

impl From<AbsoluteUri> for Uri {
    fn from(uri: AbsoluteUri) -> Self {
        Self { value: uri.value }
    }
}

/// A URI guaranteed to carry a scheme (RFC 3986 §4.3).
///
/// Schema resources, catalog cache keys, and `metaschema_uri` fields are all
/// `AbsoluteUri`: the one place a bare reference is allowed is inside an
/// unresolved `$ref` value, which is a [`Uri`] until it is resolved against a
/// base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AbsoluteUri {
    value: String,
}

impl AbsoluteUri {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, UriError> {
        let value = value.as_ref();
        let parsed = FluentUri::parse(value.to_owned()).map_err(|reason| UriError::Parse {
            value: value.to_owned(),
            reason: reason.to_string(),
        })?;
        Ok(Self { value: parsed.normalize().into_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    fn as_fluent(&self) -> FluentUri<&str> {
        FluentUri::parse(self.value.as_str()).expect("AbsoluteUri invariant: always holds a valid URI")
    }

    pub fn scheme(&self) -> String {
        self.as_fluent().scheme().as_str().to_owned()
    }

    pub fn authority(&self) -> Option<String> {
        self.as_fluent().authority().map(|a| a.as_str().to_owned())
    }

    pub fn path(&self) -> String {
        self.as_fluent().path().as_str().to_owned()
    }

    pub fn query(&self) -> Option<String> {
        self.as_fluent().query().map(|q| q.as_str().to_owned())
    }

    pub fn fragment(&self) -> Option<String> {
        self.as_fluent().fragment().map(|f| f.as_str().to_owned())
    }

    pub fn has_fragment(&self) -> bool {
        self.fragment().is_some()
    }

    /// Returns a copy with the fragment removed. Used when partitioning the
    /// schema cache: the base schema and its anchors/sub-schemas all share
    /// one fragment-less cache key derived this way.
    pub fn without_fragment(&self) -> Self {
        match self.value.split_once('#') {
            Some((base, _)) => Self { value: base.to_owned() },
            None => self.clone(),
        }
    }

    /// Returns a copy with the fragment replaced by `fragment` (a JSON
    /// Pointer, percent-encoded as needed, or a plain-name `$anchor`).
    pub fn with_fragment(&self, fragment: &str) -> Result<Self, UriError> {
        let base = self.without_fragment();
        if fragment.is_empty() {
            return Ok(base);
        }
        Ok(Self { value: format!("{}#{}", base.value, fragment) })
    }

    pub fn resolve(&self, reference: &Uri) -> Result<Self, UriError> {
        reference.resolve(self)
    }
}

impl fmt::Display for AbsoluteUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for AbsoluteUri {
    type Err = UriError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AbsoluteUri {
    type Error = UriError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AbsoluteUri> for String {
    fn from(uri: AbsoluteUri) -> Self {
        uri.value
    }
}

impl TryFrom<Uri> for AbsoluteUri {
    type Error = UriError;
    fn try_from(uri: Uri) -> Result<Self, Self::Error> {
        if !uri.has_scheme() {
            return Err(UriError::NotAbsolute { value: uri.value });
        }
        Ok(Self { value: uri.value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn parses_absolute() {
        init_tracing();
        let uri = AbsoluteUri::parse("https://example.com/schema.json").unwrap();
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.path(), "/schema.json");
        assert!(uri.fragment().is_none());
    }

    #[test]
    fn rejects_relative_as_absolute() {
        assert!(AbsoluteUri::parse("schema.json").is_err());
    }

    #[test]
    fn resolves_relative_reference() {
        let base = AbsoluteUri::parse("https://example.com/a/b.json").unwrap();
        let reference = Uri::parse("c.json").unwrap();
        let resolved = reference.resolve(&base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a/c.json");
    }

    #[test]
    fn resolves_fragment_only_reference() {
        let base = AbsoluteUri::parse("https://example.com/a.json").unwrap();
        let reference = Uri::parse("#/properties/foo").unwrap();
        let resolved = reference.resolve(&base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a.json#/properties/foo");
    }

    #[test]
    fn without_fragment_strips_tail() {
        let uri = AbsoluteUri::parse("https://example.com/a.json#/definitions/x").unwrap();
        assert_eq!(uri.without_fragment().as_str(), "https://example.com/a.json");
    }

    #[test]
    fn with_fragment_replaces_existing() {
        let uri = AbsoluteUri::parse("https://example.com/a.json#/old").unwrap();
        let replaced = uri.with_fragment("/new").unwrap();
        assert_eq!(replaced.as_str(), "https://example.com/a.json#/new");
    }

    #[test]
    fn default_resolution_for_bare_anchor() {
        let reference = Uri::parse("#foo").unwrap();
        let resolved = reference.resolve_default().unwrap();
        assert_eq!(resolved.as_str(), "json-schema:///#foo");
    }
}
