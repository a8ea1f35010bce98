// lib/vault-sync/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync mode: {value} (expected \"env\" or \"vault\")")]
    InvalidSyncMode { value: String },

    #[error("Invalid config mapping: {mapping} (expected ENV_KEY=config.path)")]
    InvalidMapping { mapping: String },

    #[error("Vault error: {0}")]
    Vault(#[from] vault_kv::VaultError),
}
