use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault address is not set")]
    AddressNotSet,

    #[error("Secret path is empty")]
    EmptyPath,

    #[error("Secret not found: {path}")]
    NotFound { path: String },

    #[error("Vault returned HTTP {status} for {path}")]
    Upstream { status: u16, path: String },

    #[error("Vault request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid Vault response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Vault token unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("Invalid Vault configuration: {0}")]
    InvalidConfig(String),
}

impl VaultError {
    /// Whether the error means the secret is simply absent upstream
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound { .. })
    }
}
