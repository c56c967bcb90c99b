use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use risk_core::{CompanyIdentity, FinancialStatementSet, MarketSnapshot, Overview};

/// Default TTL for all market-data lookups.
pub const CACHE_TTL_SECS: i64 = 300; // 5 minutes

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// In-process TTL cache. Entries past their TTL are treated as absent and
/// dropped on the next lookup; there is no other eviction policy, capacity
/// is bounded by request volume.
pub struct TtlCache<T: Clone> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(CACHE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.entries.get(key) {
            if Utc::now() - entry.cached_at < self.ttl {
                return Some(entry.data.clone());
            }
        }
        // Stale or missing; drop a stale entry so the map does not grow.
        self.entries.remove_if(key, |_, e| Utc::now() - e.cached_at >= self.ttl);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data: value,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The single shared cache instance for the process, one typed map per
/// lookup kind. Keys are additionally namespaced (`ticker:`, `overview:`,
/// `financials:`, `price:`) so dumps and logs can never confuse kinds.
pub struct MarketCache {
    pub identities: TtlCache<CompanyIdentity>,
    pub overviews: TtlCache<Overview>,
    pub financials: TtlCache<FinancialStatementSet>,
    pub prices: TtlCache<MarketSnapshot>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(CACHE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            identities: TtlCache::with_ttl(ttl),
            overviews: TtlCache::with_ttl(ttl),
            financials: TtlCache::with_ttl(ttl),
            prices: TtlCache::with_ttl(ttl),
        }
    }

    pub fn identity_key(normalized_input: &str) -> String {
        format!("ticker:{normalized_input}")
    }

    pub fn overview_key(ticker: &str) -> String {
        format!("overview:{}", ticker.to_uppercase())
    }

    pub fn financials_key(ticker: &str) -> String {
        format!("financials:{}", ticker.to_uppercase())
    }

    pub fn price_key(ticker: &str) -> String {
        format!("price:{}", ticker.to_uppercase())
    }
}

impl Default for MarketCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let cache: TtlCache<i64> = TtlCache::new();
        cache.set("price:AAPL", 42);
        assert_eq!(cache.get("price:AAPL"), Some(42));
        assert_eq!(cache.get("price:MSFT"), None);
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let cache: TtlCache<i64> = TtlCache::with_ttl(Duration::seconds(0));
        cache.set("k", 1);
        assert_eq!(cache.get("k"), None);
        // Expired entry was dropped on lookup
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_refreshes_value() {
        let cache: TtlCache<&'static str> = TtlCache::new();
        cache.set("k", "old");
        cache.set("k", "new");
        assert_eq!(cache.get("k"), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_namespaced_keys_do_not_collide() {
        assert_ne!(MarketCache::overview_key("aapl"), MarketCache::price_key("aapl"));
        assert_eq!(MarketCache::financials_key("aapl"), "financials:AAPL");
    }

    #[test]
    fn test_concurrent_get_set() {
        use std::sync::Arc;
        let cache: Arc<TtlCache<u64>> = Arc::new(TtlCache::new());
        let mut handles = Vec::new();
        for i in 0..8u64 {
            let c = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for j in 0..100u64 {
                    c.set(format!("k{}", j % 10), i * 1000 + j);
                    let _ = c.get(&format!("k{}", j % 10));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
    }
}
