use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// Lazily-refreshed cache for short-lived capability values, keyed by the
/// arguments that distinguish one issuance from another.
///
/// A cached value is served only while it is younger than the caller's
/// refresh interval; otherwise the supplied issuance function runs and its
/// result replaces the entry. The issuance function runs without any lock
/// held, so two callers racing on the same key may both issue. That is
/// accepted: the contract is "at least fresh", not "at most one issuance".
pub struct RefreshCache<K, V> {
    entries: RwLock<HashMap<K, CachedValue<V>>>,
}

struct CachedValue<V> {
    value: V,
    issued_at: DateTime<Utc>,
}

impl<K, V> RefreshCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if it is younger than
    /// `refresh_interval`, otherwise issue a fresh one and cache it.
    ///
    /// `issue` returns the fresh value together with its issuance instant.
    /// On issuance failure the existing entry is left untouched and the
    /// error propagates; an expired value is never served as a fallback.
    pub fn get_or_refresh<E>(
        &self,
        key: K,
        refresh_interval: Duration,
        issue: impl FnOnce() -> Result<(V, DateTime<Utc>), E>,
    ) -> Result<V, E> {
        self.get_or_refresh_at(key, refresh_interval, Utc::now(), issue)
    }

    pub(crate) fn get_or_refresh_at<E>(
        &self,
        key: K,
        refresh_interval: Duration,
        now: DateTime<Utc>,
        issue: impl FnOnce() -> Result<(V, DateTime<Utc>), E>,
    ) -> Result<V, E> {
        {
            let entries = self.entries.read().expect("token cache lock poisoned");
            if let Some(entry) = entries.get(&key)
                && now - entry.issued_at < refresh_interval
            {
                return Ok(entry.value.clone());
            }
        }

        let (value, issued_at) = issue()?;

        let mut entries = self.entries.write().expect("token cache lock poisoned");
        entries.insert(
            key,
            CachedValue {
                value: value.clone(),
                issued_at,
            },
        );

        Ok(value)
    }
}

impl<K, V> Default for RefreshCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn serves_cached_value_within_interval() {
        let cache: RefreshCache<&str, u32> = RefreshCache::new();
        let issued = Cell::new(0u32);

        let interval = Duration::minutes(15);
        let first = cache
            .get_or_refresh_at("photos", interval, at(0), || {
                issued.set(issued.get() + 1);
                Ok::<_, String>((issued.get(), at(0)))
            })
            .unwrap();
        let second = cache
            .get_or_refresh_at("photos", interval, at(60), || {
                issued.set(issued.get() + 1);
                Ok::<_, String>((issued.get(), at(60)))
            })
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1, "second call within the interval must hit");
        assert_eq!(issued.get(), 1);
    }

    #[test]
    fn reissues_once_interval_elapses() {
        let cache: RefreshCache<&str, u32> = RefreshCache::new();
        let issued = Cell::new(0u32);
        let interval = Duration::minutes(15);

        for (call, now) in [at(0), at(15 * 60), at(15 * 60 + 30)].into_iter().enumerate() {
            let value = cache
                .get_or_refresh_at("photos", interval, now, || {
                    issued.set(issued.get() + 1);
                    Ok::<_, String>((issued.get(), now))
                })
                .unwrap();
            let expected = if call < 1 { 1 } else { 2 };
            assert_eq!(value, expected);
        }

        assert_eq!(issued.get(), 2, "exactly one refresh after expiry");
    }

    #[test]
    fn zero_interval_forces_reissuance_every_call() {
        let cache: RefreshCache<&str, u32> = RefreshCache::new();
        let issued = Cell::new(0u32);

        for _ in 0..3 {
            cache
                .get_or_refresh_at("videos", Duration::zero(), at(0), || {
                    issued.set(issued.get() + 1);
                    Ok::<_, String>((issued.get(), at(0)))
                })
                .unwrap();
        }

        assert_eq!(issued.get(), 3);
    }

    #[test]
    fn keys_are_cached_independently() {
        let cache: RefreshCache<String, u32> = RefreshCache::new();
        let interval = Duration::minutes(15);

        let photos = cache
            .get_or_refresh_at("photos".to_string(), interval, at(0), || {
                Ok::<_, String>((1, at(0)))
            })
            .unwrap();
        let videos = cache
            .get_or_refresh_at("videos".to_string(), interval, at(0), || {
                Ok::<_, String>((2, at(0)))
            })
            .unwrap();

        assert_eq!(photos, 1);
        assert_eq!(videos, 2);
    }

    #[test]
    fn failed_issuance_propagates_and_leaves_entry_untouched() {
        let cache: RefreshCache<&str, u32> = RefreshCache::new();
        let interval = Duration::minutes(15);

        cache
            .get_or_refresh_at("photos", interval, at(0), || {
                Ok::<_, String>((7, at(0)))
            })
            .unwrap();

        // Expired entry plus a failing issuer: the error must surface rather
        // than the stale value.
        let result = cache.get_or_refresh_at("photos", interval, at(16 * 60), || {
            Err::<(u32, DateTime<Utc>), String>("issuer unreachable".to_string())
        });
        assert_eq!(result.unwrap_err(), "issuer unreachable");

        // The old entry was not clobbered: a pre-expiry call still hits it.
        let value = cache
            .get_or_refresh_at("photos", interval, at(60), || {
                Err::<(u32, DateTime<Utc>), String>("should not be called".to_string())
            })
            .unwrap();
        assert_eq!(value, 7);
    }
}
