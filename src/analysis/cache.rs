use crate::analysis::error::QueryError;
use crate::analysis::facade::QueryResult;
use crate::types::query::Query;
use log::debug;
use std::collections::{hash_map::Entry, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Number of results kept by [`QueryCache::new`].
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct CacheState {
    /// Generation of the data set the stored results were computed on.
    generation: u64,
    results: HashMap<Query, Arc<QueryResult>>,
    /// Insertion order, oldest first.
    order: VecDeque<Query>,
}

impl CacheState {
    /// Moves to `generation` if it is newer, dropping every stored result.
    fn advance(&mut self, generation: u64) {
        if generation > self.generation {
            self.generation = generation;
            self.results.clear();
            self.order.clear();
        }
    }
}

/// Memoized query results of the current data set generation.
///
/// Results are only reused for the generation they were computed on, so a cached
/// entry can never outlive the data it was derived from. At most `capacity` results
/// are kept; the oldest one is evicted first.
#[derive(Debug)]
pub struct QueryCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUERY_CACHE_CAPACITY)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` results. A capacity of `0` disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
        }
    }

    /// Returns the cached result for `query` on `generation`, computing it with `compute` on a miss.
    ///
    /// A result computed on a generation that has been superseded meanwhile is returned
    /// but not stored. Errors are not cached.
    pub fn get_or_compute<F>(
        &self,
        generation: u64,
        query: &Query,
        compute: F,
    ) -> Result<Arc<QueryResult>, QueryError>
    where
        F: FnOnce() -> Result<QueryResult, QueryError>,
    {
        // --- Fast path: already computed ---
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.advance(generation);
            if state.generation == generation {
                if let Some(cached) = state.results.get(query) {
                    return Ok(Arc::clone(cached));
                }
            }
        }

        // --- Slow path: compute without holding the lock ---
        let computed = Arc::new(compute()?);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.advance(generation);
        if state.generation != generation || self.capacity == 0 {
            debug!("Not caching result of {} from superseded generation {}", query, generation);
            return Ok(computed);
        }
        let CacheState { results, order, .. } = &mut *state;
        match results.entry(*query) {
            // Computed concurrently by another caller; keep theirs.
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&computed));
                order.push_back(*query);
                while order.len() > self.capacity {
                    if let Some(oldest) = order.pop_front() {
                        results.remove(&oldest);
                    }
                }
                Ok(computed)
            }
        }
    }

    /// Moves the cache to `generation`, dropping every result computed on an older one.
    ///
    /// Results of older generations that finish computing afterwards are not stored.
    pub fn retain_generation(&self, generation: u64) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advance(generation);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::facade::QueryFacade;
    use crate::config::AnalysisConfig;
    use crate::dataset::Dataset;
    use crate::types::query::Selection;
    use std::cell::Cell;

    #[test]
    fn test_memoizes_per_generation() {
        let dataset = Dataset::default();
        let config = AnalysisConfig::default();
        let facade = QueryFacade::new(&dataset, &config);
        let cache = QueryCache::new();
        let calls = Cell::new(0);
        let compute = |query: &Query| {
            calls.set(calls.get() + 1);
            facade.run(query)
        };

        let query = Query::default();
        let first = cache.get_or_compute(1, &query, || compute(&query)).unwrap();
        let second = cache.get_or_compute(1, &query, || compute(&query)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);

        cache.get_or_compute(2, &query, || compute(&query)).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 1);

        cache.retain_generation(3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_superseded_generation_is_not_stored() {
        let dataset = Dataset::default();
        let config = AnalysisConfig::default();
        let facade = QueryFacade::new(&dataset, &config);
        let cache = QueryCache::new();
        let query = Query::default();

        cache.retain_generation(1);
        // A newer data set is installed while the generation 1 query is computing.
        let result = cache
            .get_or_compute(1, &query, || {
                cache.retain_generation(2);
                facade.run(&query)
            })
            .unwrap();
        assert_eq!(result.query, query);
        assert!(cache.is_empty());

        // Late lookups for the old generation do not repopulate the cache either.
        cache.get_or_compute(1, &query, || facade.run(&query)).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let dataset = Dataset::default();
        let config = AnalysisConfig::default();
        let facade = QueryFacade::new(&dataset, &config);
        let cache = QueryCache::with_capacity(2);
        let calls = Cell::new(0);
        let compute = |query: &Query| {
            calls.set(calls.get() + 1);
            facade.run(query)
        };

        let queries: Vec<Query> = (1..=3)
            .map(|month| Query::new(Selection::All, Selection::Only(month), None))
            .collect();
        for query in &queries {
            cache.get_or_compute(1, query, || compute(query)).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(calls.get(), 3);

        // The newest two are still cached, the first was evicted.
        cache.get_or_compute(1, &queries[2], || compute(&queries[2])).unwrap();
        cache.get_or_compute(1, &queries[1], || compute(&queries[1])).unwrap();
        assert_eq!(calls.get(), 3);
        cache.get_or_compute(1, &queries[0], || compute(&queries[0])).unwrap();
        assert_eq!(calls.get(), 4);
        assert_eq!(cache.len(), 2);

        assert!(QueryCache::with_capacity(0).is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let dataset = Dataset::default();
        let config = AnalysisConfig::default();
        let facade = QueryFacade::new(&dataset, &config);
        let cache = QueryCache::new();

        let invalid = Query::new(Selection::All, Selection::Only(0), None);
        assert_eq!(
            cache.get_or_compute(1, &invalid, || facade.run(&invalid)),
            Err(QueryError::InvalidMonth(0))
        );
        assert!(cache.is_empty());
    }
}
