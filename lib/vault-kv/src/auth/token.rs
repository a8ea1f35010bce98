use super::AuthMethod;
use crate::VaultError;
use async_trait::async_trait;

/// Static token authentication
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthMethod for StaticTokenAuth {
    async fn token(&self) -> Result<String, VaultError> {
        Ok(self.token.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_auth() {
        let auth = StaticTokenAuth::new("my-token".to_string());
        assert_eq!(auth.token().await.unwrap(), "my-token");
        assert_eq!(auth.name(), "token");
    }
}
