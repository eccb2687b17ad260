//! Signed Receipt Cache
//!
//! Identical receipt requests within the TTL reuse the signed token.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::entity::ReceiptFlavour;

type CacheKey = (u64, Option<ReceiptFlavour>);

pub struct ReceiptCache {
    entries: DashMap<CacheKey, (String, Instant)>,
    ttl: Duration,
}

impl ReceiptCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, installed_id: u64, flavour: Option<ReceiptFlavour>) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let key = (installed_id, flavour);
        if let Some(entry) = self.entries.get(&key) {
            let (token, stored_at) = entry.value();
            if stored_at.elapsed() < self.ttl {
                return Some(token.clone());
            }
        }
        self.entries
            .remove_if(&key, |_, (_, stored_at)| stored_at.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, installed_id: u64, flavour: Option<ReceiptFlavour>, token: String) {
        if self.is_enabled() {
            self.evict_expired();
            self.entries.insert((installed_id, flavour), (token, Instant::now()));
        }
    }

    /// Drop every entry older than the TTL.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
    }

    pub fn invalidate(&self, installed_id: u64) {
        self.entries.retain(|(id, _), _| *id != installed_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ReceiptCache::new(Duration::from_secs(600));
        cache.insert(1, None, "token".into());
        assert_eq!(cache.get(1, None).as_deref(), Some("token"));
        assert_eq!(cache.get(1, Some(ReceiptFlavour::Reviewer)), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = ReceiptCache::new(Duration::from_millis(1));
        cache.insert(1, None, "token".into());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(1, None), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_keys() {
        let cache = ReceiptCache::new(Duration::from_millis(1));
        for id in 0..1000 {
            cache.insert(id, None, format!("token-{id}"));
        }
        std::thread::sleep(Duration::from_millis(10));
        cache.insert(5000, Some(ReceiptFlavour::Developer), "fresh".into());
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(5000, Some(ReceiptFlavour::Developer)).as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn test_zero_ttl_disables() {
        let cache = ReceiptCache::new(Duration::ZERO);
        cache.insert(1, None, "token".into());
        assert_eq!(cache.get(1, None), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache = ReceiptCache::new(Duration::from_secs(600));
        cache.insert(1, None, "a".into());
        cache.insert(1, Some(ReceiptFlavour::Developer), "b".into());
        cache.insert(2, None, "c".into());
        cache.invalidate(1);
        assert_eq!(cache.len(), 1);
    }
}
