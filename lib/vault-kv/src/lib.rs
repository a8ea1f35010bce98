//! vault-kv - cache-fronted reader for Vault KV secrets
//!
//! Token resolution order:
//! 1. VAULT_TOKEN → static token
//! 2. VAULT_TOKEN_FILE → token read from file on every request
//! 3. Otherwise → unauthenticated request

mod address;
pub mod auth;
pub mod cache;
mod client;
mod config;
mod error;
mod models;

pub use address::normalize_address;
pub use cache::{MemoryCache, SecretCache};
pub use client::{RequestOverride, Scope, SecretClient, SecretClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, parse_flag};
pub use error::VaultError;
pub use models::{KvVersion, Secret, SecretData, parse_envelope};
