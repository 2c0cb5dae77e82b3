//! Single-dataset session state.
//!
//! A [`Session`] owns at most one [`Dataset`] together with its provenance
//! metadata and a memo of derived results. `set` is the only mutation point:
//! it bumps the generation counter, swaps dataset and metadata, and clears
//! the memo in a single `&mut self` call, so no result computed against an
//! older dataset can ever be returned.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AnalystError, Result};
use crate::models::{Dataset, SourceMetadata};

/// Identity of a memoized result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Operation name, e.g. `profile`
    pub operation: &'static str,
    /// Canonical JSON of the operation parameters
    pub params: String,
    /// Dataset generation the result was computed against
    pub generation: u64,
}

/// Memo of derived results keyed by operation, parameters and generation.
#[derive(Default)]
pub struct ResultCache {
    entries: HashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
    hits: u64,
    misses: u64,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored result of type `T`, counting the hit or miss.
    pub fn get<T: Any + Send + Sync>(&mut self, key: &CacheKey) -> Option<Arc<T>> {
        let found = self
            .entries
            .get(key)
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok());
        if found.is_some() {
            self.hits = self.hits.saturating_add(1);
        } else {
            self.misses = self.misses.saturating_add(1);
        }
        found
    }

    /// Stores a result.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: CacheKey, value: Arc<T>) {
        self.entries.insert(key, value);
    }

    /// Drops every entry computed against a generation other than `generation`.
    pub fn retain_generation(&mut self, generation: u64) {
        self.entries.retain(|key, _| key.generation == generation);
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to compute.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// Holder of the current dataset, its metadata and derived results.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    dataset: Option<Arc<Dataset>>,
    metadata: SourceMetadata,
    generation: u64,
    cache: ResultCache,
    cache_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session with memoization enabled.
    pub fn new() -> Self {
        Self::with_cache(true)
    }

    /// Creates an empty session, choosing whether results are memoized.
    pub fn with_cache(cache_enabled: bool) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, cache_enabled, "Created session");
        Self {
            id,
            dataset: None,
            metadata: SourceMetadata::new(),
            generation: 0,
            cache: ResultCache::new(),
            cache_enabled,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Generation of the current dataset; 0 before the first `set`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Provenance metadata of the current dataset.
    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    /// Whether a dataset is loaded.
    pub fn has_dataset(&self) -> bool {
        self.dataset.is_some()
    }

    /// Memo statistics and contents.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Replaces the dataset and metadata and clears derived results.
    ///
    /// Returns the new generation.
    pub fn set(&mut self, dataset: Dataset, metadata: SourceMetadata) -> u64 {
        self.generation = self.generation.saturating_add(1);
        self.dataset = Some(Arc::new(dataset));
        self.metadata = metadata;
        self.cache.clear();

        tracing::info!(
            session_id = %self.id,
            generation = self.generation,
            "Dataset replaced"
        );
        self.generation
    }

    /// Returns the current dataset.
    ///
    /// # Errors
    /// `NoDatasetLoaded` if nothing has been set since creation or the last
    /// [`clear`](Self::clear).
    pub fn require(&self) -> Result<Arc<Dataset>> {
        self.dataset.clone().ok_or(AnalystError::NoDatasetLoaded)
    }

    /// Drops the dataset, metadata and derived results.
    pub fn clear(&mut self) {
        self.generation = self.generation.saturating_add(1);
        self.dataset = None;
        self.metadata = SourceMetadata::new();
        self.cache.clear();
    }

    /// Returns the memoized result of `operation` for `params`, computing it
    /// against the current dataset on a miss.
    ///
    /// # Errors
    /// `NoDatasetLoaded` if no dataset is held, or whatever `compute` returns.
    /// Failed computations are not stored.
    pub fn memoize<T, P, F>(&mut self, operation: &'static str, params: &P, compute: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        P: Serialize + ?Sized,
        F: FnOnce(&Dataset) -> Result<T>,
    {
        let dataset = self.require()?;

        if !self.cache_enabled {
            return compute(dataset.as_ref()).map(Arc::new);
        }

        let key = CacheKey {
            operation,
            params: serde_json::to_string(params)
                .map_err(|e| AnalystError::invalid_argument(format!("unserializable parameters: {}", e)))?,
            generation: self.generation,
        };

        if let Some(hit) = self.cache.get::<T>(&key) {
            tracing::trace!(operation, generation = self.generation, "Cache hit");
            return Ok(hit);
        }

        let value = Arc::new(compute(dataset.as_ref())?);
        self.cache.retain_generation(self.generation);
        self.cache.insert(key, Arc::clone(&value));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    fn dataset(values: Vec<Option<i64>>) -> Dataset {
        Dataset::from_columns(vec![Column::integer("x", values)]).unwrap()
    }

    #[test]
    fn test_require_before_set() {
        let session = Session::new();
        assert!(matches!(session.require(), Err(AnalystError::NoDatasetLoaded)));
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_set_replaces_dataset_and_metadata() {
        let mut session = Session::new();
        let mut meta = SourceMetadata::new();
        meta.insert("type".to_string(), serde_json::json!("local"));

        let generation = session.set(dataset(vec![Some(1)]), meta);
        assert_eq!(generation, 1);
        assert_eq!(session.require().unwrap().column_names(), vec!["x"]);
        assert_eq!(session.metadata()["type"], "local");

        session.set(dataset(vec![Some(2)]), SourceMetadata::new());
        assert_eq!(session.generation(), 2);
        assert!(session.metadata().is_empty());
    }

    #[test]
    fn test_memoize_hits_within_generation() {
        let mut session = Session::new();
        session.set(dataset(vec![Some(1), Some(2)]), SourceMetadata::new());

        let mut calls = 0;
        let first = session
            .memoize("rows", &(), |d| {
                calls += 1;
                Ok(d.row_count())
            })
            .unwrap();
        let second = session
            .memoize("rows", &(), |d| {
                calls += 1;
                Ok(d.row_count())
            })
            .unwrap();

        assert_eq!((*first, *second), (2, 2));
        assert_eq!(calls, 1);
        assert_eq!(session.cache().hits(), 1);
    }

    #[test]
    fn test_cache_counters_saturate() {
        let mut cache = ResultCache::new();
        cache.hits = u64::MAX;
        cache.misses = u64::MAX;
        let key = CacheKey {
            operation: "rows",
            params: "null".to_string(),
            generation: 1,
        };

        assert!(cache.get::<usize>(&key).is_none());
        cache.insert(key.clone(), Arc::new(3usize));
        assert_eq!(cache.get::<usize>(&key).as_deref(), Some(&3));
        assert_eq!((cache.hits(), cache.misses()), (u64::MAX, u64::MAX));
    }

    #[test]
    fn test_set_invalidates_memo() {
        let mut session = Session::new();
        session.set(dataset(vec![Some(1), Some(2)]), SourceMetadata::new());
        let before = session.memoize("rows", &(), |d| Ok(d.row_count())).unwrap();
        assert_eq!(*before, 2);

        session.set(dataset(vec![Some(1), Some(2), Some(3)]), SourceMetadata::new());
        assert!(session.cache().is_empty());
        let after = session.memoize("rows", &(), |d| Ok(d.row_count())).unwrap();
        assert_eq!(*after, 3);
    }

    #[test]
    fn test_params_distinguish_entries() {
        let mut session = Session::new();
        session.set(dataset(vec![Some(1)]), SourceMetadata::new());
        let a = session.memoize("echo", "a", |_| Ok("a".to_string())).unwrap();
        let b = session.memoize("echo", "b", |_| Ok("b".to_string())).unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("a", "b"));
        assert_eq!(session.cache().len(), 2);
    }

    #[test]
    fn test_failed_computation_not_cached() {
        let mut session = Session::new();
        session.set(dataset(vec![Some(1)]), SourceMetadata::new());
        let result: Result<Arc<usize>> = session.memoize("boom", &(), |_| {
            Err(AnalystError::column_not_found("y"))
        });
        assert!(result.is_err());
        assert!(session.cache().is_empty());
    }

    #[test]
    fn test_cache_disabled() {
        let mut session = Session::with_cache(false);
        session.set(dataset(vec![Some(1)]), SourceMetadata::new());
        let mut calls = 0;
        for _ in 0..2 {
            session
                .memoize("rows", &(), |d| {
                    calls += 1;
                    Ok(d.row_count())
                })
                .unwrap();
        }
        assert_eq!(calls, 2);
        assert!(session.cache().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut session = Session::new();
        session.set(dataset(vec![Some(1)]), SourceMetadata::new());
        session.clear();
        assert!(!session.has_dataset());
        assert!(matches!(session.require(), Err(AnalystError::NoDatasetLoaded)));
    }
}
