//! Caching decorator for [`MarketData`] to avoid repeated collaborator reads

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::data::MarketData;
use crate::error::Result;
use crate::model::PriceBar;

/// Cache key for collaborator reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Series {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    Day(NaiveDate),
    Dates,
    Symbols(Option<NaiveDate>),
}

#[derive(Debug, Clone)]
enum CachedValue {
    Bars(Arc<Vec<PriceBar>>),
    Dates(Arc<Vec<NaiveDate>>),
    Symbols(Arc<Vec<String>>),
}

/// [`MarketData`] wrapper that memoizes every read for a fixed TTL
pub struct CachedStore {
    inner: Arc<dyn MarketData>,
    cache: Arc<RwLock<TimedCache<CacheKey, CachedValue>>>,
}

impl CachedStore {
    /// Wrap `inner` with a cache whose entries live for `ttl`
    pub fn new(inner: Arc<dyn MarketData>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    async fn insert(&self, key: CacheKey, value: CachedValue) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value for `key`, or fetch and cache it
    async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return Ok(value);
        }

        tracing::debug!("Cache miss for key: {:?}", key);
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop every cached entry
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for CachedStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cache: Arc::clone(&self.cache),
        }
    }
}

#[async_trait]
impl MarketData for CachedStore {
    async fn load_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let key = CacheKey::Series {
            symbol: symbol.to_string(),
            start,
            end,
        };
        let value = self
            .get_or_fetch(key, || async move {
                let bars = self.inner.load_series(symbol, start, end).await?;
                Ok(CachedValue::Bars(Arc::new(bars)))
            })
            .await?;
        Ok(match value {
            CachedValue::Bars(bars) => bars.as_ref().clone(),
            _ => Vec::new(),
        })
    }

    async fn load_day(&self, date: NaiveDate) -> Result<Vec<PriceBar>> {
        let value = self
            .get_or_fetch(CacheKey::Day(date), || async move {
                let bars = self.inner.load_day(date).await?;
                Ok(CachedValue::Bars(Arc::new(bars)))
            })
            .await?;
        Ok(match value {
            CachedValue::Bars(bars) => bars.as_ref().clone(),
            _ => Vec::new(),
        })
    }

    async fn list_available_dates(&self) -> Result<Vec<NaiveDate>> {
        let value = self
            .get_or_fetch(CacheKey::Dates, || async move {
                let dates = self.inner.list_available_dates().await?;
                Ok(CachedValue::Dates(Arc::new(dates)))
            })
            .await?;
        Ok(match value {
            CachedValue::Dates(dates) => dates.as_ref().clone(),
            _ => Vec::new(),
        })
    }

    async fn list_catalog_symbols(&self, date: Option<NaiveDate>) -> Result<Vec<String>> {
        let value = self
            .get_or_fetch(CacheKey::Symbols(date), || async move {
                let symbols = self.inner.list_catalog_symbols(date).await?;
                Ok(CachedValue::Symbols(Arc::new(symbols)))
            })
            .await?;
        Ok(match value {
            CachedValue::Symbols(symbols) => symbols.as_ref().clone(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockMarketData;
    use crate::error::QueryError;
    use crate::model::parse_date;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[tokio::test]
    async fn test_series_is_fetched_once() {
        let mut mock = MockMarketData::new();
        mock.expect_load_series()
            .times(1)
            .returning(|symbol, start, _| Ok(vec![PriceBar::flat(symbol, start, 10.0, 1)]));

        let store = CachedStore::new(Arc::new(mock), Duration::from_secs(60));
        let (start, end) = (day("2024-03-01"), day("2024-03-15"));

        let first = store.load_series("TCS.NS", start, end).await.unwrap();
        let second = store.load_series("TCS.NS", start, end).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let mut mock = MockMarketData::new();
        mock.expect_list_available_dates()
            .times(2)
            .returning(|| Err(QueryError::DataSource("offline".to_string())));

        let store = CachedStore::new(Arc::new(mock), Duration::from_secs(60));
        assert!(store.list_available_dates().await.is_err());
        assert!(store.list_available_dates().await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear() {
        let mut mock = MockMarketData::new();
        mock.expect_list_catalog_symbols()
            .returning(|_| Ok(vec!["TCS.NS".to_string()]));

        let store = CachedStore::new(Arc::new(mock), Duration::from_secs(60));
        store.list_catalog_symbols(None).await.unwrap();
        store.list_catalog_symbols(Some(day("2024-03-15"))).await.unwrap();
        assert_eq!(store.len().await, 2);

        store.clear().await;
        assert!(store.is_empty().await);
    }
}
