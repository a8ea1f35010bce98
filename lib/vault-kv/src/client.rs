use crate::address::has_http_scheme;
use crate::auth::TokenChain;
use crate::cache::{MemoryCache, SecretCache, cache_key};
use crate::config::{ClientConfig, DEFAULT_ENGINE};
use crate::error::VaultError;
use crate::models::{Secret, SecretData};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;

const API_VERSION: &str = "v1";
const TOKEN_HEADER: &str = "X-Vault-Token";

pub struct SecretClientBuilder {
    config: Option<ClientConfig>,
    cache: Option<Arc<dyn SecretCache>>,
    auth: Option<TokenChain>,
    application_name: Option<String>,
}

impl Default for SecretClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            cache: None,
            auth: None,
            application_name: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a cache between clients or plug in a host-provided store
    pub fn cache(mut self, cache: Arc<dyn SecretCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the token sources derived from the config
    pub fn auth(mut self, auth: TokenChain) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<SecretClient, VaultError> {
        let config = match self.config {
            Some(config) => config,
            None => ClientConfig::from_env()?,
        };

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let auth = self
            .auth
            .unwrap_or_else(|| TokenChain::from_config(&config));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));

        Ok(SecretClient {
            config,
            http,
            auth,
            cache,
            application_name: self.application_name,
        })
    }
}

/// Per-call engine and base path overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOverride {
    pub engine: Option<String>,
    pub path: Option<String>,
}

impl RequestOverride {
    pub fn is_active(&self) -> bool {
        self.engine.is_some() || self.path.is_some()
    }
}

/// Cache-fronted KV reader.
///
/// The client itself is immutable and can be shared behind an `Arc`; engine
/// and path overrides live in a [`Scope`] owned by a single call site.
pub struct SecretClient {
    config: ClientConfig,
    http: reqwest::Client,
    auth: TokenChain,
    cache: Arc<dyn SecretCache>,
    application_name: Option<String>,
}

impl SecretClient {
    pub fn from_env() -> Result<Self, VaultError> {
        SecretClientBuilder::new().build()
    }

    pub fn new(config: ClientConfig) -> Result<Self, VaultError> {
        SecretClientBuilder::new().config(config).build()
    }

    pub fn builder() -> SecretClientBuilder {
        SecretClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A scope without overrides; set engine or path on it before reading
    pub fn scope(&self) -> Scope<'_> {
        Scope {
            client: self,
            overrides: RequestOverride::default(),
        }
    }

    pub fn scope_with(&self, overrides: RequestOverride) -> Scope<'_> {
        Scope {
            client: self,
            overrides,
        }
    }

    pub async fn read(&self, path: &str) -> Option<Secret> {
        self.scope().read(path).await
    }

    pub async fn try_read(&self, path: &str) -> Result<Secret, VaultError> {
        self.scope().try_read(path).await
    }

    pub async fn read_with(&self, path: &str, overrides: &RequestOverride) -> Option<Secret> {
        self.scope_with(overrides.clone()).read(path).await
    }

    pub async fn read_versioned(&self, path: &str) -> Option<SecretData> {
        self.scope().read_versioned(path).await
    }

    pub fn clear_cache(&self, path: &str) {
        self.scope().clear_cache(path)
    }

    pub fn build_request_path(&self, path: &str) -> String {
        self.scope().build_request_path(path)
    }
}

/// Engine and base path overrides for one logical unit of work.
///
/// Resetting an override falls back to the client configuration, which is
/// never modified.
pub struct Scope<'a> {
    client: &'a SecretClient,
    overrides: RequestOverride,
}

impl<'a> Scope<'a> {
    pub fn set_engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.overrides.engine = Some(engine.into());
        self
    }

    pub fn reset_engine(&mut self) -> &mut Self {
        self.overrides.engine = None;
        self
    }

    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.overrides.path = Some(path.into());
        self
    }

    pub fn reset_path(&mut self) -> &mut Self {
        self.overrides.path = None;
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.set_engine(engine);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.set_path(path);
        self
    }

    pub fn overrides(&self) -> &RequestOverride {
        &self.overrides
    }

    /// Active engine: override, then configured engine, then `secret`
    pub fn engine(&self) -> &str {
        self.overrides
            .engine
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| Some(self.client.config.engine.as_str()).filter(|e| !e.trim().is_empty()))
            .unwrap_or(DEFAULT_ENGINE)
    }

    /// Active base path: override, then configured base path
    pub fn path(&self) -> &str {
        self.overrides
            .path
            .as_deref()
            .unwrap_or(&self.client.config.base_path)
    }

    pub fn full_path(&self, path: &str) -> String {
        join_base_path(self.path(), path)
    }

    pub fn cache_key(&self, path: &str) -> String {
        cache_key(
            &self.full_path(path),
            &self.client.config,
            self.overrides.engine.as_deref(),
            self.overrides.path.as_deref(),
        )
    }

    /// Turn a logical path into a request path relative to the store address.
    ///
    /// Absolute URLs and paths already under `v1/` pass through with any
    /// leading slash stripped; everything else is a KV v2 path under the
    /// active engine.
    pub fn build_request_path(&self, path: &str) -> String {
        let p = path.trim();
        if p.is_empty() {
            return String::new();
        }

        if is_api_path(p) {
            return p.trim_start_matches('/').to_string();
        }

        let engine = self.engine().trim_matches('/');
        format!(
            "{}/{}/data/{}",
            API_VERSION,
            engine,
            p.trim_start_matches('/')
        )
    }

    pub async fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(ref app_name) = self.client.application_name {
            if let Ok(value) = HeaderValue::from_str(app_name) {
                headers.insert(USER_AGENT, value);
            }
        }

        if let Some(token) = self.client.auth.resolve().await {
            match HeaderValue::from_str(&token) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(TOKEN_HEADER, value);
                }
                Err(_) => {
                    tracing::warn!("Vault token contains invalid header characters, sending request without it");
                }
            }
        }

        headers
    }

    /// Cached read with the failure reason preserved
    pub async fn try_read(&self, path: &str) -> Result<Secret, VaultError> {
        let full_path = self.full_path(path);
        let key = self.cache_key(path);

        if let Some(cached) = self.client.cache.get(&key) {
            tracing::debug!(path = %full_path, "Vault secret served from cache");
            return Ok(cached);
        }

        let data = self.fetch(&full_path).await?;
        self.client
            .cache
            .put(&key, data.data.clone(), self.client.config.cache_ttl);
        Ok(data.data)
    }

    /// Cached read; every failure is logged and becomes `None`
    pub async fn read(&self, path: &str) -> Option<Secret> {
        match self.try_read(path).await {
            Ok(secret) => Some(secret),
            Err(e) => {
                log_read_failure(path, &e);
                None
            }
        }
    }

    /// Uncached read that keeps KV v2 version metadata
    pub async fn read_versioned(&self, path: &str) -> Option<SecretData> {
        match self.fetch(&self.full_path(path)).await {
            Ok(data) => Some(data),
            Err(e) => {
                log_read_failure(path, &e);
                None
            }
        }
    }

    /// Drop the default-scope entry and, with overrides active, this scope's entry
    pub fn clear_cache(&self, path: &str) {
        let config = &self.client.config;
        let default_key = cache_key(&join_base_path(&config.base_path, path), config, None, None);
        self.client.cache.forget(&default_key);

        if self.overrides.is_active() {
            self.client.cache.forget(&self.cache_key(path));
        }
    }

    async fn fetch(&self, full_path: &str) -> Result<SecretData, VaultError> {
        let request_path = self.build_request_path(full_path);
        if request_path.is_empty() {
            return Err(VaultError::EmptyPath);
        }

        let url = self.url_for(&request_path)?;
        let headers = self.build_headers().await;

        let response = self.client.http.get(&url).headers(headers).send().await?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(VaultError::NotFound { path: request_path });
        }
        if status >= 400 {
            if !self.client.config.lenient_errors {
                return Err(VaultError::Upstream {
                    status,
                    path: request_path,
                });
            }
            tracing::warn!(status, path = %request_path, "Vault returned error status, parsing body anyway");
        }

        let bytes = response.bytes().await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        let data = SecretData::from_envelope(&body);

        if let Some(ref metadata) = data.metadata {
            tracing::debug!(
                path = %request_path,
                version = metadata.version,
                destroyed = metadata.destroyed,
                "Fetched Vault secret"
            );
        } else {
            tracing::debug!(path = %request_path, keys = data.data.len(), "Fetched Vault secret");
        }

        Ok(data)
    }

    fn url_for(&self, request_path: &str) -> Result<String, VaultError> {
        if has_http_scheme(request_path) {
            return Ok(request_path.to_string());
        }
        let address = &self.client.config.address;
        if address.is_empty() {
            return Err(VaultError::AddressNotSet);
        }
        Ok(format!("{}/{}", address, request_path))
    }
}

/// Absolute URLs and paths already under the API version prefix
fn is_api_path(path: &str) -> bool {
    has_http_scheme(path) || path.starts_with("/v1/") || path.starts_with("v1/")
}

fn join_base_path(base: &str, path: &str) -> String {
    let base = base.trim().trim_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    if is_api_path(path.trim()) {
        return path.trim().to_string();
    }
    format!("{}/{}", base, path.trim().trim_start_matches('/'))
}

fn log_read_failure(path: &str, error: &VaultError) {
    match error {
        VaultError::NotFound { path: request_path } => {
            tracing::warn!(path, request_path = %request_path, "Vault secret not found");
        }
        VaultError::Upstream { status, .. } => {
            tracing::warn!(path, status, error = %error, "Vault read failed");
        }
        _ => {
            tracing::warn!(path, error = %error, "Vault read failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn client(engine: &str, base_path: &str) -> SecretClient {
        let config = ClientConfig::builder()
            .address("http://vault:8200")
            .engine(engine)
            .base_path(base_path)
            .build_from(&HashMap::new())
            .unwrap();
        SecretClient::new(config).unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let builder = SecretClientBuilder::new();
        assert!(builder.config.is_none());
        assert!(builder.cache.is_none());
        assert!(builder.application_name.is_none());
    }

    #[test]
    fn test_logical_path_becomes_kv2_path() {
        let client = client("secret", "");
        assert_eq!(client.build_request_path("myapp/prod"), "v1/secret/data/myapp/prod");
        assert_eq!(client.build_request_path("  /myapp/prod "), "v1/secret/data/myapp/prod");
    }

    #[test]
    fn test_api_paths_pass_through() {
        let client = client("secret", "");
        assert_eq!(
            client.build_request_path("/v1/secret/data/myapp/prod"),
            "v1/secret/data/myapp/prod"
        );
        assert_eq!(client.build_request_path("v1/kv/myapp"), "v1/kv/myapp");
        assert_eq!(
            client.build_request_path("https://other:8200/v1/secret/data/x"),
            "https://other:8200/v1/secret/data/x"
        );
    }

    #[test]
    fn test_empty_path() {
        let client = client("secret", "");
        assert_eq!(client.build_request_path("   "), "");
    }

    #[test]
    fn test_engine_is_trimmed_of_slashes() {
        let client = client("/kv/", "");
        assert_eq!(client.build_request_path("app"), "v1/kv/data/app");
    }

    #[test]
    fn test_engine_override_and_reset() {
        let client = client("secret", "");
        let mut scope = client.scope();

        scope.set_engine("kv2");
        assert_eq!(scope.engine(), "kv2");
        assert_eq!(scope.build_request_path("x"), "v1/kv2/data/x");

        scope.reset_engine();
        assert_eq!(scope.engine(), "secret");
        assert_eq!(client.config().engine, "secret");
    }

    #[test]
    fn test_empty_engine_falls_back_to_default() {
        let client = client("", "");
        assert_eq!(client.scope().engine(), "secret");
    }

    #[test]
    fn test_path_override_and_reset() {
        let client = client("secret", "apps");
        let mut scope = client.scope();
        assert_eq!(scope.full_path("db"), "apps/db");

        scope.set_path("/teams/billing/");
        assert_eq!(scope.path(), "/teams/billing/");
        assert_eq!(scope.full_path("/db"), "teams/billing/db");

        scope.reset_path();
        assert_eq!(scope.path(), "apps");
    }

    #[test]
    fn test_base_path_is_not_applied_to_api_paths() {
        let client = client("secret", "apps");
        let scope = client.scope();
        assert_eq!(scope.full_path(" /v1/secret/data/x "), "/v1/secret/data/x");
        assert_eq!(scope.full_path("v1/kv/x"), "v1/kv/x");
        assert_eq!(
            scope.full_path("https://other:8200/v1/secret/data/x"),
            "https://other:8200/v1/secret/data/x"
        );
        assert_eq!(scope.full_path("x"), "apps/x");
    }

    #[test]
    fn test_no_base_path_keeps_logical_path_verbatim() {
        let client = client("secret", "");
        assert_eq!(client.scope().full_path("/v1/secret/data/x"), "/v1/secret/data/x");
    }

    #[test]
    fn test_cache_key_tracks_overrides() {
        let client = client("secret", "");
        let plain = client.scope().cache_key("x");

        assert_eq!(plain, client.scope().cache_key("x"));
        assert_ne!(plain, client.scope().with_engine("kv2").cache_key("x"));

        let mut scope = client.scope();
        scope.set_engine("kv2").reset_engine();
        assert_eq!(plain, scope.cache_key("x"));
    }

    #[tokio::test]
    async fn test_headers_without_token() {
        let client = client("secret", "");
        let headers = client.scope().build_headers().await;
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert!(headers.get(TOKEN_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_headers_with_static_token() {
        let config = ClientConfig::builder()
            .address("http://vault:8200")
            .token("s.static")
            .build_from(&HashMap::new())
            .unwrap();
        let client = SecretClient::builder()
            .config(config)
            .application_name("billing")
            .build()
            .unwrap();

        let headers = client.scope().build_headers().await;
        assert_eq!(headers.get(TOKEN_HEADER).unwrap(), "s.static");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "billing");
    }
}
