use crate::address::normalize_address;
use crate::error::VaultError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ADDR: &str = "http://127.0.0.1";
pub const DEFAULT_PORT: u16 = 8200;
pub const DEFAULT_ENGINE: &str = "secret";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Immutable client configuration.
///
/// Serialized into the cache key digest, so every field that changes what a
/// read returns must live here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    pub address: String,
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub engine: String,
    pub base_path: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    /// Parse bodies of non-404 error responses instead of returning nothing
    pub lenient_errors: bool,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Configuration taken entirely from the process environment
    pub fn from_env() -> Result<Self, VaultError> {
        ClientConfigBuilder::new().build()
    }

    /// Configuration taken from an explicit environment (for testing)
    pub fn from_environ(environ: &HashMap<String, String>) -> Result<Self, VaultError> {
        ClientConfigBuilder::new().build_from(environ)
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    address: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
    port: Option<u16>,
    engine: Option<String>,
    base_path: Option<String>,
    timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    lenient_errors: Option<bool>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn lenient_errors(mut self, lenient: bool) -> Self {
        self.lenient_errors = Some(lenient);
        self
    }

    /// Resolve against the process environment
    pub fn build(self) -> Result<ClientConfig, VaultError> {
        let environ: HashMap<String, String> = std::env::vars().collect();
        self.build_from(&environ)
    }

    /// Resolve against `environ`; explicitly set values always win
    pub fn build_from(self, environ: &HashMap<String, String>) -> Result<ClientConfig, VaultError> {
        let var = |name: &str| environ.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let port = match self.port {
            Some(port) => Some(port),
            None => match var("VAULT_PORT") {
                Some(raw) => Some(parse_var::<u16>("VAULT_PORT", raw)?),
                None => Some(DEFAULT_PORT),
            },
        };

        let raw_address = self
            .address
            .or_else(|| var("VAULT_ADDR").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let token = self
            .token
            .or_else(|| var("VAULT_TOKEN").map(str::to_string))
            .filter(|t| !t.trim().is_empty());

        let token_file = self
            .token_file
            .or_else(|| var("VAULT_TOKEN_FILE").map(PathBuf::from))
            .filter(|p| !p.as_os_str().is_empty());

        let engine = self
            .engine
            .or_else(|| var("VAULT_ENGINE").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_ENGINE.to_string());

        let base_path = self
            .base_path
            .or_else(|| var("VAULT_PATH").map(str::to_string))
            .unwrap_or_default();

        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => var("VAULT_TIMEOUT")
                .map(|raw| parse_var::<u64>("VAULT_TIMEOUT", raw).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        let cache_ttl = match self.cache_ttl {
            Some(ttl) => ttl,
            None => var("VAULT_CACHE_TTL")
                .map(|raw| parse_var::<u64>("VAULT_CACHE_TTL", raw).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(DEFAULT_CACHE_TTL),
        };

        let lenient_errors = match self.lenient_errors {
            Some(lenient) => lenient,
            None => var("VAULT_LENIENT_ERRORS").map(parse_flag).unwrap_or(false),
        };

        Ok(ClientConfig {
            address: normalize_address(&raw_address, port),
            token,
            token_file,
            port,
            engine,
            base_path,
            timeout,
            cache_ttl,
            lenient_errors,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, VaultError> {
    raw.parse()
        .map_err(|_| VaultError::InvalidConfig(format!("{} has invalid value {:?}", name, raw)))
}

/// Boolean flag in the forms commonly found in env files
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
