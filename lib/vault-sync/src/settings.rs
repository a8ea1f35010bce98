// lib/vault-sync/src/settings.rs
//! Settings governing how fetched secrets are reconciled into the host.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::str::FromStr;
use vault_kv::parse_flag;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Fill only keys the environment already declares with an empty value
    #[default]
    Env,
    /// Fill every secret key whose target is missing or empty
    Vault,
}

impl FromStr for SyncMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(SyncMode::Env),
            "vault" => Ok(SyncMode::Vault),
            _ => Err(SyncError::InvalidSyncMode {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub update_env: bool,
    pub update_config: bool,
    pub sync_mode: SyncMode,
    /// Secret name appended to the base path at startup
    pub secret: String,
    /// ENV_KEY => config.path
    pub config_mappings: BTreeMap<String, String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            update_env: true,
            update_config: true,
            sync_mode: SyncMode::default(),
            secret: String::new(),
            config_mappings: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    /// Create with actual OS environment
    pub fn from_env() -> Result<Self, SyncError> {
        let environ: HashMap<String, String> = std::env::vars().collect();
        Self::from_environ(&environ)
    }

    /// Create with custom environment (for testing)
    pub fn from_environ(environ: &HashMap<String, String>) -> Result<Self, SyncError> {
        let var = |name: &str| environ.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config_mappings = match var("VAULT_CONFIG_MAPPINGS") {
            Some(raw) => parse_mappings(raw)?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            update_env: var("VAULT_UPDATE_ENV").map_or(defaults.update_env, parse_flag),
            update_config: var("VAULT_UPDATE_CONFIG").map_or(defaults.update_config, parse_flag),
            sync_mode: var("VAULT_SYNC_MODE")
                .map(SyncMode::from_str)
                .transpose()?
                .unwrap_or_default(),
            secret: var("VAULT_SECRET").unwrap_or_default().to_string(),
            config_mappings,
        })
    }
}

/// Parse `KEY=config.path` pairs separated by commas
fn parse_mappings(raw: &str) -> Result<BTreeMap<String, String>, SyncError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, path)) if !key.trim().is_empty() && !path.trim().is_empty() => {
                Ok((key.trim().to_uppercase(), path.trim().to_string()))
            }
            _ => Err(SyncError::InvalidMapping {
                mapping: pair.to_string(),
            }),
        })
        .collect()
}
