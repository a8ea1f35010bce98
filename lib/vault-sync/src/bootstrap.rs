// lib/vault-sync/src/bootstrap.rs
//! One-shot startup fetch that copies a Vault secret into host settings.

use crate::path::{as_request_path, bootstrap_secret_path};
use crate::settings::{SyncMode, SyncSettings};
use crate::target::SettingsTarget;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use vault_kv::{Secret, SecretClient};

/// Secret keys that always land in the host configuration when present
const BUILTIN_CONFIG_MAPPINGS: [(&str, &str); 5] = [
    ("DB_PASSWORD", "database.connections.mysql.password"),
    ("DB_USER", "database.connections.mysql.username"),
    ("DB_HOST", "database.connections.mysql.host"),
    ("DB_DATABASE", "database.connections.mysql.database"),
    ("VAULT_TEST", "vault.test"),
];

/// What a bootstrap run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub secret_path: String,
    pub env_applied: Vec<String>,
    pub config_applied: Vec<String>,
    /// Set when the run did nothing because an earlier run already applied
    pub already_applied: bool,
}

impl SyncReport {
    pub fn applied_count(&self) -> usize {
        self.env_applied.len() + self.config_applied.len()
    }
}

/// Startup secret sync, applied at most once per value.
///
/// Never fails: every problem is logged as a warning and yields an empty
/// report, so a Vault outage cannot prevent the host from starting.
pub struct Bootstrap {
    settings: SyncSettings,
    applied: AtomicBool,
}

impl Bootstrap {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            applied: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_applied(&self) -> bool {
        self.applied.load(Ordering::Acquire)
    }

    pub async fn run(
        &self,
        client: &SecretClient,
        env: &mut dyn SettingsTarget,
        config: &mut dyn SettingsTarget,
    ) -> SyncReport {
        if self.is_applied() {
            tracing::debug!("Vault bootstrap already applied, skipping");
            return SyncReport {
                already_applied: true,
                ..SyncReport::default()
            };
        }

        let secret_path = bootstrap_secret_path(&client.config().base_path, &self.settings.secret);
        if secret_path.is_empty() {
            tracing::debug!("Vault bootstrap secret path is empty, skipping fetch");
            return SyncReport::default();
        }

        // The base path is already folded into `secret_path`
        let scope = client.scope().with_path("");
        let secret = match scope.read(&as_request_path(&secret_path)).await {
            Some(secret) => secret,
            None => {
                tracing::warn!(path = %secret_path, "Vault bootstrap found no secret");
                return SyncReport {
                    secret_path,
                    ..SyncReport::default()
                };
            }
        };

        let mut report = self.apply(&secret, env, config);
        report.secret_path = secret_path;
        self.applied.store(true, Ordering::Release);

        tracing::info!(
            path = %report.secret_path,
            env_keys = report.env_applied.len(),
            config_keys = report.config_applied.len(),
            "Applied Vault secret at startup"
        );
        report
    }

    /// Reconcile `secret` into the targets according to the sync settings
    pub fn apply(
        &self,
        secret: &Secret,
        env: &mut dyn SettingsTarget,
        config: &mut dyn SettingsTarget,
    ) -> SyncReport {
        let secret = upper_keys(secret);
        let mut report = SyncReport::default();

        if self.settings.update_env {
            for (key, value) in &secret {
                let current = env.get(key);
                let fill = match self.settings.sync_mode {
                    SyncMode::Env => current.as_deref() == Some(""),
                    SyncMode::Vault => is_blank(current.as_deref()),
                };
                if fill {
                    env.set(key, value.clone());
                    report.env_applied.push(key.clone());
                }
            }
        }

        if self.settings.update_config {
            for (key, config_path) in self.config_mappings() {
                let Some(value) = secret.get(&key) else {
                    continue;
                };
                if is_blank(config.get(&config_path).as_deref()) {
                    config.set(&config_path, value.clone());
                    report.config_applied.push(config_path);
                }
            }
        }

        tracing::debug!(
            env_target = env.name(),
            config_target = config.name(),
            applied = report.applied_count(),
            "Reconciled Vault secret"
        );
        report
    }

    fn config_mappings(&self) -> BTreeMap<String, String> {
        let mut mappings: BTreeMap<String, String> = BUILTIN_CONFIG_MAPPINGS
            .iter()
            .map(|(key, path)| (key.to_string(), path.to_string()))
            .collect();
        mappings.extend(self.settings.config_mappings.clone());
        mappings
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.is_empty())
}

/// Upper-case keys and render values the way an env file would hold them
fn upper_keys(secret: &Secret) -> BTreeMap<String, String> {
    secret
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.to_uppercase(), rendered)
        })
        .collect()
}
