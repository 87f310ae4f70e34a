use std::collections::BTreeMap;

/// Map with case-insensitive string keys. Keys are lowercased on every
/// access; the original casing is not retained, callers that need it store
/// it in the value.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveMap<V> {
    inner: BTreeMap<String, V>,
}

// Manual impl: an empty map needs no `V: Default`, which the derive would
// demand.
impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        CaseInsensitiveMap {
            inner: BTreeMap::new(),
        }
    }
}

impl<V> CaseInsensitiveMap<V> {
    pub fn new() -> Self {
        CaseInsensitiveMap {
            inner: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.inner.get(&key.to_lowercase())
    }

    pub fn insert(&mut self, key: &str, value: V) {
        self.inner.insert(key.to_lowercase(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A retired package name together with where it was declared.
#[derive(Debug, Clone)]
pub struct PreviousName {
    /// The previous name with its exact casing.
    pub exact: String,
    /// File or URL the declaration came from.
    pub include: String,
    /// Current name of the package that declared it.
    pub owner: String,
}

/// Names seen so far in one validation run. Package names, dependency names
/// and previous names share a single global namespace: a name registered in
/// one map must not appear in any of the three. Created fresh per run and
/// threaded through the traversal, never shared between runs.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    /// name -> include it first occurred in
    pub package_names: CaseInsensitiveMap<String>,
    /// name -> include it first occurred in
    pub dependency_names: CaseInsensitiveMap<String>,
    pub previous_package_names: CaseInsensitiveMap<PreviousName>,
}

impl NameRegistry {
    pub fn new() -> Self {
        NameRegistry::default()
    }
}
