use super::{AuthMethod, StaticTokenAuth, TokenFileAuth};
use crate::VaultError;
use crate::config::ClientConfig;
use std::sync::Arc;

/// Ordered list of token sources; the first non-empty token wins.
///
/// Failures never abort the request: they are logged and the next source is
/// tried, and when nothing yields a token the request goes out unauthenticated.
#[derive(Clone, Default)]
pub struct TokenChain {
    methods: Vec<Arc<dyn AuthMethod>>,
}

impl TokenChain {
    pub fn new(methods: Vec<Arc<dyn AuthMethod>>) -> Self {
        Self { methods }
    }

    /// Static token first, then the token file
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut methods: Vec<Arc<dyn AuthMethod>> = Vec::new();
        if let Some(token) = config.token.as_ref().filter(|t| !t.trim().is_empty()) {
            methods.push(Arc::new(StaticTokenAuth::new(token.clone())));
        }
        if let Some(path) = &config.token_file {
            methods.push(Arc::new(TokenFileAuth::new(path.clone())));
        }
        Self { methods }
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub async fn resolve(&self) -> Option<String> {
        for method in &self.methods {
            match method.token().await {
                Ok(token) if !token.is_empty() => {
                    tracing::debug!(source = method.name(), "Using Vault token");
                    return Some(token);
                }
                Ok(_) => {
                    tracing::debug!(source = method.name(), "Vault token source is empty");
                }
                Err(e @ VaultError::CredentialUnavailable(_)) => {
                    tracing::warn!(source = method.name(), error = %e, "Vault token source failed");
                }
                Err(e) => {
                    tracing::warn!(source = method.name(), error = %e, "Unexpected token source error");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config(token: Option<&str>, token_file: Option<&std::path::Path>) -> ClientConfig {
        let mut builder = ClientConfig::builder();
        if let Some(token) = token {
            builder = builder.token(token);
        }
        if let Some(path) = token_file {
            builder = builder.token_file(path);
        }
        builder.build_from(&Default::default()).unwrap()
    }

    #[tokio::test]
    async fn test_static_token_wins() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "from-file").unwrap();

        let chain = TokenChain::from_config(&config(Some("static"), Some(file.path())));
        assert_eq!(chain.resolve().await.as_deref(), Some("static"));
    }

    #[tokio::test]
    async fn test_falls_back_to_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "s.abcdef\n").unwrap();

        let chain = TokenChain::from_config(&config(None, Some(file.path())));
        assert_eq!(chain.resolve().await.as_deref(), Some("s.abcdef"));
    }

    #[tokio::test]
    async fn test_unreadable_file_yields_no_token() {
        let chain = TokenChain::from_config(&config(
            None,
            Some(std::path::Path::new("/nonexistent/vault/token")),
        ));
        assert!(!chain.is_empty());
        assert!(chain.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_file_yields_no_token() {
        let file = NamedTempFile::new().unwrap();

        let chain = TokenChain::from_config(&config(None, Some(file.path())));
        assert!(chain.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let chain = TokenChain::from_config(&config(None, None));
        assert!(chain.is_empty());
        assert!(chain.resolve().await.is_none());
    }
}
