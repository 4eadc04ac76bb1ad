//! The catalog: tracks vocabularies, metaschemas, URI sources, format
//! validators, and a session-partitioned schema cache.

use std::collections::HashMap;
use std::sync::Arc;

use schema_core::{AbsoluteUri, PointerBuf};
use serde_json::Value;

use crate::compiler::{self, CompileArgs};
use crate::error::{
    CatalogError, FormatNotEnabledCtx, InvalidSourceCtx, NotASchemaCtx, SessionInUseCtx, UnknownUriCtx,
};
use crate::format::FormatValidator;
use crate::schema::{CompiledSchema, SchemaKey};
use crate::vocabulary::Vocabulary;
use snafu::OptionExt;
use slotmap::SlotMap;
use tracing::instrument;

/// The reserved cache partition metaschemas live in, regardless of which
/// session compiled them.
pub const META_SESSION: &str = "__meta__";
/// The partition used when the caller does not start a scoped session.
pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Clone)]
struct SourcePrefix {
    base_uri: AbsoluteUri,
    document: Arc<Value>,
}

/// Holds compiled schemas, vocabularies, metaschemas, sources, and format
/// validators for the lifetime of the process.
pub struct Catalog {
    pub(crate) schemas: SlotMap<SchemaKey, CompiledSchema>,
    vocabularies: HashMap<AbsoluteUri, Vocabulary>,
    metaschemas: HashMap<AbsoluteUri, SchemaKey>,
    sources: Vec<SourcePrefix>,
    formats: HashMap<String, Arc<dyn FormatValidator>>,
    enabled_formats: std::collections::HashSet<String>,
    /// session -> (URI, possibly with a fragment for anchors -> schema)
    cache: HashMap<String, HashMap<AbsoluteUri, SchemaKey>>,
    /// (root schema URI without fragment, JSON pointer within that
    /// document) -> schema, populated as the compiler visits every
    /// subschema. Backs JSON-pointer-fragment descent in `get_schema`.
    by_pointer: HashMap<(AbsoluteUri, String), SchemaKey>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("schemas", &self.schemas.len())
            .field("vocabularies", &self.vocabularies.len())
            .field("metaschemas", &self.metaschemas.len())
            .field("sessions", &self.cache.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            schemas: SlotMap::with_key(),
            vocabularies: HashMap::new(),
            metaschemas: HashMap::new(),
            sources: Vec::new(),
            formats: HashMap::new(),
            enabled_formats: std::collections::HashSet::new(),
            cache: HashMap::from([(DEFAULT_SESSION.to_owned(), HashMap::new()), (META_SESSION.to_owned(), HashMap::new())]),
            by_pointer: HashMap::new(),
        }
    }

    /// Indexes `key` as reachable from `root` at `pointer`, so that a
    /// `#/json/pointer` fragment against `root` can be resolved without
    /// re-walking the raw schema JSON. Called by the compiler for every
    /// (sub)schema it produces.
    pub fn index_pointer(&mut self, root: AbsoluteUri, pointer: String, key: SchemaKey) {
        self.by_pointer.insert((root, pointer), key);
    }

    /// Registers `document` as the source for every URI under `base_uri`
    /// (a prefix). Rejects non-normalized URIs, URIs carrying a fragment,
    /// or paths that do not end in `/`.
    pub fn add_source(&mut self, base_uri: AbsoluteUri, document: Value) -> Result<(), CatalogError> {
        if base_uri.has_fragment() {
            return InvalidSourceCtx { prefix: base_uri.as_str(), reason: "source URIs must not carry a fragment" }.fail();
        }
        self.sources.push(SourcePrefix { base_uri, document: Arc::new(document) });
        Ok(())
    }

    /// Loads the raw JSON for `uri` by longest-matching registered prefix.
    pub fn load_source(&self, uri: &AbsoluteUri) -> Result<Arc<Value>, CatalogError> {
        let target = uri.without_fragment();
        let mut best: Option<&SourcePrefix> = None;
        for source in &self.sources {
            if target.as_str() == source.base_uri.as_str() || target.as_str().starts_with(source.base_uri.as_str()) {
                if best.map_or(true, |b| source.base_uri.as_str().len() > b.base_uri.as_str().len()) {
                    best = Some(source);
                }
            }
        }
        best.map(|s| s.document.clone()).context(UnknownUriCtx { uri: uri.as_str() })
    }

    pub fn add_format_validator(&mut self, name: impl Into<String>, validator: Arc<dyn FormatValidator>) {
        self.formats.insert(name.into(), validator);
    }

    pub fn enable_format(&mut self, name: impl Into<String>) {
        self.enabled_formats.insert(name.into());
    }

    pub fn is_format_enabled(&self, name: &str) -> bool {
        self.enabled_formats.contains(name)
    }

    pub fn format_validator(&self, name: &str) -> Result<&Arc<dyn FormatValidator>, CatalogError> {
        if !self.enabled_formats.contains(name) {
            return FormatNotEnabledCtx { format: name }.fail();
        }
        self.formats.get(name).context(FormatNotEnabledCtx { format: name })
    }

    pub fn create_vocabulary(&mut self, vocabulary: Vocabulary) {
        self.vocabularies.insert(vocabulary.uri.clone(), vocabulary);
    }

    pub fn vocabulary(&self, uri: &AbsoluteUri) -> Option<&Vocabulary> {
        self.vocabularies.get(uri)
    }

    pub fn register_metaschema(&mut self, uri: AbsoluteUri, key: SchemaKey) {
        self.metaschemas.insert(uri, key);
    }

    pub fn metaschema(&self, uri: &AbsoluteUri) -> Option<SchemaKey> {
        self.metaschemas.get(uri).copied()
    }

    pub fn schema(&self, key: SchemaKey) -> &CompiledSchema {
        &self.schemas[key]
    }

    /// Inserts an already-compiled schema into `session`'s partition under
    /// its canonical URI (and any anchor-qualified URIs the compiler also
    /// wants addressable — those are registered separately via
    /// [`Catalog::register_alias`]).
    pub fn insert_schema(&mut self, session: &str, uri: AbsoluteUri, key: SchemaKey) {
        self.cache.entry(session.to_owned()).or_default().insert(uri.without_fragment(), key);
    }

    pub fn register_alias(&mut self, session: &str, uri: AbsoluteUri, key: SchemaKey) {
        self.cache.entry(session.to_owned()).or_default().insert(uri, key);
    }

    pub fn remove_schema(&mut self, session: &str, uri: &AbsoluteUri) {
        if let Some(partition) = self.cache.get_mut(session) {
            partition.remove(uri);
        }
    }

    /// Starts a scoped session. Errors if `id` (or, for an auto-generated
    /// id, in the vanishingly unlikely event of a collision) is already in
    /// use.
    pub fn start_session(&mut self, id: Option<String>) -> Result<Session, CatalogError> {
        let id = id.unwrap_or_else(new_session_id);
        if self.cache.contains_key(&id) {
            return SessionInUseCtx { session: id }.fail();
        }
        self.cache.insert(id.clone(), HashMap::new());
        Ok(Session { id })
    }

    pub fn end_session(&mut self, session: Session) {
        self.cache.remove(&session.id);
    }

    /// The core lookup algorithm:
    /// 1. Look up the exact URI (including any fragment) in `session`, then
    ///    in `__meta__` — this catches `$anchor`-qualified URIs registered
    ///    whole via [`Catalog::register_alias`].
    /// 2. Otherwise, if `uri` has a JSON-pointer fragment, look up its
    ///    fragment-stripped base and descend via the `by_pointer` index.
    /// 3. Otherwise load the raw document from the source registry, compile
    ///    it as a new schema, insert it, and descend by fragment.
    #[instrument(skip(self, metaschema_uri), level = "trace")]
    pub fn get_schema(
        &mut self,
        uri: &AbsoluteUri,
        metaschema_uri: Option<&AbsoluteUri>,
        session: &str,
    ) -> Result<SchemaKey, CatalogError> {
        if let Some(key) = self.lookup_exact(uri, session) {
            return Ok(key);
        }

        let base = uri.without_fragment();
        if let Some(key) = self.lookup_exact(&base, session) {
            return self.resolve_fragment(key, &base, uri);
        }

        let document = self.load_source(&base)?;
        let key = compiler::compile(
            self,
            CompileArgs {
                value: (*document).clone(),
                uri: Some(base.clone()),
                metaschema_uri: metaschema_uri.cloned(),
                parent: None,
                pointer: PointerBuf::root(),
                session: session.to_owned(),
            },
        )
        .map_err(|_| UnknownUriCtx { uri: uri.as_str() }.build())?;

        self.insert_schema(session, base.clone(), key);
        self.resolve_fragment(key, &base, uri)
    }

    fn lookup_exact(&self, uri: &AbsoluteUri, session: &str) -> Option<SchemaKey> {
        self.cache.get(session).and_then(|p| p.get(uri)).copied().or_else(|| {
            self.cache.get(META_SESSION).and_then(|p| p.get(uri)).copied()
        })
    }

    /// Resolves `uri`'s fragment (if any) against the schema already known
    /// to live at `key`/`base`. A plain-name fragment would already have
    /// been caught by the exact-URI lookup in `get_schema` via
    /// `register_alias`, so reaching a non-pointer fragment here means the
    /// anchor does not exist. A JSON-pointer fragment is resolved through
    /// the `by_pointer` index the compiler populates for every subschema,
    /// rather than by re-walking keyword/subschema maps token by token.
    fn resolve_fragment(&self, key: SchemaKey, base: &AbsoluteUri, uri: &AbsoluteUri) -> Result<SchemaKey, CatalogError> {
        let Some(fragment) = uri.fragment() else { return Ok(key) };
        if fragment.is_empty() {
            return Ok(key);
        }
        if !fragment.starts_with('/') {
            return NotASchemaCtx { uri: uri.as_str() }.fail();
        }
        let pointer = PointerBuf::parse_uri_fragment(fragment).map_err(|source| CatalogError::Pointer { source })?;
        self.by_pointer
            .get(&(base.clone(), pointer.to_string()))
            .copied()
            .context(NotASchemaCtx { uri: uri.as_str() })
    }
}

fn new_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("session-{nanos:x}")
}

/// A scoped session handle. Dropping it without calling
/// [`Catalog::end_session`] leaves the partition allocated; callers that
/// want an "always released on exit" guarantee should pair
/// `start_session`/`end_session` with a `finally`-equivalent (a guard with
/// `Drop` cannot reach back into the `Catalog` it came from without a
/// shared-ownership handle, which the single-catalog-per-process model this
/// crate targets does not need).
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }
}
