mod chain;
mod token;
mod token_file;

pub use chain::TokenChain;
pub use token::StaticTokenAuth;
pub use token_file::TokenFileAuth;

use crate::VaultError;
use async_trait::async_trait;

/// Source of the `X-Vault-Token` credential
#[async_trait]
pub trait AuthMethod: Send + Sync {
    /// Resolve the token; an empty string means the source has nothing to offer
    async fn token(&self) -> Result<String, VaultError>;

    /// Short name used in log records
    fn name(&self) -> &'static str;
}
