use crate::config::ClientConfig;
use crate::models::Secret;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

const KEY_PREFIX: &str = "vault_secret_";

/// Key-value storage with TTL expiry fronting every secret read.
///
/// Hosts can plug in their own store; [`MemoryCache`] is the default.
pub trait SecretCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Secret>;

    fn put(&self, key: &str, value: Secret, ttl: Duration);

    fn forget(&self, key: &str);
}

struct CachedSecret {
    value: Secret,
    expires_at: Instant,
}

/// In-process cache.
///
/// Expired entries are evicted on lookup, and every insert sweeps the rest,
/// so keys that are never read again do not accumulate.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CachedSecret>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SecretCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Secret> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        }
        None
    }

    fn put(&self, key: &str, value: Secret, ttl: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);

        let expires_at = now + ttl;
        self.entries
            .insert(key.to_string(), CachedSecret { value, expires_at });
    }

    fn forget(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Deterministic digest of everything that decides what a read returns
pub fn cache_key(
    full_path: &str,
    config: &ClientConfig,
    engine_override: Option<&str>,
    path_override: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(full_path);
    hasher.update([0u8]);
    // Serializing plain strings, integers and durations cannot fail
    hasher.update(serde_json::to_vec(config).unwrap_or_default());
    hasher.update([0u8]);
    hasher.update(engine_override.map(str::as_bytes).unwrap_or(&b"\x01none"[..]));
    hasher.update([0u8]);
    hasher.update(path_override.map(str::as_bytes).unwrap_or(&b"\x01none"[..]));
    format!("{}{:x}", KEY_PREFIX, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .address("http://vault:8200")
            .build_from(&Default::default())
            .unwrap()
    }

    fn secret(key: &str, value: &str) -> Secret {
        let mut secret = Secret::new();
        secret.insert(key.to_string(), serde_json::json!(value));
        secret
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let config = config();
        let key1 = cache_key("app/db", &config, None, None);
        let key2 = cache_key("app/db", &config, None, None);
        assert_eq!(key1, key2);
        assert!(key1.starts_with("vault_secret_"));
    }

    #[test]
    fn test_cache_key_differs_for_different_inputs() {
        let config = config();
        let base = cache_key("app/db", &config, None, None);

        assert_ne!(base, cache_key("app/cache", &config, None, None));
        assert_ne!(base, cache_key("app/db", &config, Some("kv2"), None));
        assert_ne!(base, cache_key("app/db", &config, None, Some("apps")));

        let other = ClientConfig {
            engine: "kv".to_string(),
            ..config.clone()
        };
        assert_ne!(base, cache_key("app/db", &other, None, None));
    }

    #[test]
    fn test_engine_and_path_overrides_do_not_collide() {
        let config = config();
        assert_ne!(
            cache_key("x", &config, Some("a"), None),
            cache_key("x", &config, None, Some("a"))
        );
    }

    #[test]
    fn test_put_and_get() {
        let cache = MemoryCache::new();
        cache.put("k", secret("user", "admin"), Duration::from_secs(60));

        assert_eq!(cache.get("k"), Some(secret("user", "admin")));
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = MemoryCache::new();
        cache.put("k", secret("user", "admin"), Duration::ZERO);

        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_sweeps_expired_entries() {
        let cache = MemoryCache::new();
        cache.put("stale-1", secret("user", "a"), Duration::ZERO);
        cache.put("stale-2", secret("user", "b"), Duration::ZERO);
        assert_eq!(cache.len(), 1);

        cache.put("fresh", secret("user", "c"), Duration::from_secs(60));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(secret("user", "c")));
    }

    #[test]
    fn test_forget_removes_entry() {
        let cache = MemoryCache::new();
        cache.put("k", secret("user", "admin"), Duration::from_secs(60));

        cache.forget("k");

        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }
}
