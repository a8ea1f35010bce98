use super::AuthMethod;
use crate::VaultError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Token read from a file written by a co-located agent (e.g. Vault Agent).
///
/// The file is read on every call so a rotated token is picked up without
/// restarting the host.
pub struct TokenFileAuth {
    path: PathBuf,
}

impl TokenFileAuth {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_token(&self) -> Result<String, VaultError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map(|s| s.trim().to_string())
            .map_err(|e| {
                VaultError::CredentialUnavailable(format!(
                    "failed to read token from {}: {}",
                    self.path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl AuthMethod for TokenFileAuth {
    async fn token(&self) -> Result<String, VaultError> {
        self.read_token().await
    }

    fn name(&self) -> &'static str {
        "token_file"
    }
}
