// lib/vault-sync/src/target.rs
use std::collections::HashMap;

/// Host-side key/value tree that fetched secrets are written into
pub trait SettingsTarget {
    /// `None` when the key is not declared at all
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    /// Target name for logging
    fn name(&self) -> &'static str;
}

/// In-memory target, e.g. a host's flattened configuration tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapTarget {
    values: HashMap<String, String>,
}

impl MapTarget {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.values
    }
}

impl SettingsTarget for MapTarget {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

/// The process environment.
///
/// Writes go through `std::env::set_var`; only use this during single-threaded
/// startup, before worker threads read the environment.
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl SettingsTarget for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: String) {
        // SAFETY: only called from the startup bootstrap, before worker
        // threads that read the environment exist. The call is unsafe from
        // edition 2024 on.
        #[allow(unused_unsafe)]
        unsafe {
            std::env::set_var(key, value)
        };
    }

    fn name(&self) -> &'static str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_target() {
        let mut target = MapTarget::default();
        assert!(target.get("DB_HOST").is_none());

        target.set("DB_HOST", "db.internal".to_string());
        assert_eq!(target.get("DB_HOST").as_deref(), Some("db.internal"));
        assert_eq!(target.values().len(), 1);
    }

    #[test]
    fn test_process_env_target() {
        let mut target = ProcessEnv;
        let key = "VAULT_SYNC_TARGET_TEST_KEY";

        target.set(key, "value".to_string());
        assert_eq!(target.get(key).as_deref(), Some("value"));
        #[allow(unused_unsafe)]
        unsafe {
            std::env::remove_var(key)
        };
        assert!(target.get(key).is_none());
    }
}
