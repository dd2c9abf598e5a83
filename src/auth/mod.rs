/// Token lifecycle
///
/// Issues access/refresh token pairs, validates access tokens and rotates
/// refresh tokens. The signing keys are built once from `JwtSettings` and
/// shared by every component; all other state lives in the `TokenStore`.

mod claims;
mod jwt;
mod minter;
mod refresh_token;
mod rotator;
mod verifier;

pub use claims::AccessClaims;
pub use jwt::{Expiry, TokenSigner};
pub use minter::TokenMinter;
pub use refresh_token::{generate_refresh_token, RefreshTokenHasher};
pub use rotator::TokenRotator;
pub use verifier::TokenVerifier;

use std::sync::Arc;

use serde::Serialize;

use crate::configuration::JwtSettings;
use crate::error::TokenError;
use crate::storage::TokenStore;

/// Credentials returned to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Minter, verifier and rotator wired to one signer and one store
#[derive(Clone)]
pub struct TokenService {
    minter: TokenMinter,
    verifier: TokenVerifier,
    rotator: TokenRotator,
}

impl TokenService {
    pub fn new(config: &JwtSettings, store: Arc<dyn TokenStore>) -> Self {
        let signer = Arc::new(TokenSigner::new(config));
        let minter = TokenMinter::new(
            signer.clone(),
            RefreshTokenHasher::new(config.bcrypt_cost),
            store,
        );
        Self {
            verifier: TokenVerifier::new(signer),
            rotator: TokenRotator::new(minter.clone()),
            minter,
        }
    }

    pub async fn issue_pair(
        &self,
        subject: &str,
        client_address: &str,
    ) -> Result<TokenPair, TokenError> {
        self.minter.issue_pair(subject, client_address).await
    }

    pub fn validate(&self, access_token: &str) -> Result<AccessClaims, TokenError> {
        self.verifier.validate(access_token)
    }

    pub fn is_valid(&self, access_token: &str) -> bool {
        self.verifier.is_valid(access_token)
    }

    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, TokenError> {
        self.rotator.rotate(access_token, refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryTokenStore;

    fn service() -> TokenService {
        let config = JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            bcrypt_cost: 4,
        };
        TokenService::new(&config, Arc::new(InMemoryTokenStore::new()))
    }

    #[tokio::test]
    async fn test_issued_token_validates() {
        let service = service();
        let pair = service.issue_pair("u1", "127.0.0.1").await.unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert!(service.is_valid(&pair.access_token));
        assert!(!service.is_valid("invalid.token.here"));
    }

    #[tokio::test]
    async fn test_rotated_token_validates() {
        let service = service();
        let first = service.issue_pair("u1", "127.0.0.1").await.unwrap();
        let second = service
            .rotate(&first.access_token, &first.refresh_token)
            .await
            .unwrap();

        let before = service.validate(&first.access_token).unwrap();
        let after = service.validate(&second.access_token).unwrap();

        assert_eq!(before.jti, after.jti);
        assert!(after.generation > before.generation);
    }

    #[test]
    fn test_pair_serializes_camel_case() {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let json = serde_json::to_value(&pair).unwrap();

        assert_eq!(json, serde_json::json!({"accessToken": "a", "refreshToken": "r"}));
    }
}
