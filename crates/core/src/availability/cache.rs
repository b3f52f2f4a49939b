//! Bounded-staleness cache over an actual spend source.
//!
//! Cached figures may lag postings made outside the engine by up to the TTL.
//! Postings the engine makes itself invalidate the affected scope at once.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use rust_decimal::Decimal;

use super::sources::ActualSpendSource;
use crate::dimension::BudgetScope;

/// Default cache capacity (number of scopes).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Actual spend source with a TTL cache in front of it.
///
/// A TTL of zero disables caching and every read goes to the inner source.
#[derive(Clone)]
pub struct CachedActuals {
    inner: Arc<dyn ActualSpendSource>,
    cache: Option<Cache<BudgetScope, Decimal>>,
}

impl CachedActuals {
    /// Wraps `inner` with a cache holding figures for `ttl`.
    #[must_use]
    pub fn new(inner: Arc<dyn ActualSpendSource>, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CACHE_CAPACITY)
    }

    /// Wraps `inner` with a cache of the given capacity.
    #[must_use]
    pub fn with_capacity(inner: Arc<dyn ActualSpendSource>, ttl: Duration, max_capacity: u64) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { inner, cache }
    }

    /// Returns true if figures are cached at all.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of scopes currently cached.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.as_ref().map_or(0, |cache| {
            cache.run_pending_tasks();
            cache.entry_count()
        })
    }
}

impl ActualSpendSource for CachedActuals {
    fn actual(&self, scope: &BudgetScope) -> Decimal {
        match &self.cache {
            Some(cache) => cache.get_with(scope.clone(), || self.inner.actual(scope)),
            None => self.inner.actual(scope),
        }
    }

    fn invalidate(&self, scope: &BudgetScope) {
        if let Some(cache) = &self.cache {
            cache.invalidate(scope);
        }
        self.inner.invalidate(scope);
    }

    fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
        self.inner.invalidate_all();
    }
}
