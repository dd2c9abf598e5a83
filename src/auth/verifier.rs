use std::sync::Arc;

use crate::auth::claims::AccessClaims;
use crate::auth::jwt::{Expiry, TokenSigner};
use crate::error::TokenError;

/// Stateless access token validation; never touches storage
#[derive(Clone)]
pub struct TokenVerifier {
    signer: Arc<TokenSigner>,
}

impl TokenVerifier {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }

    /// Check signature, structure and expiry of `token`.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.signer.read(token, Expiry::Enforce)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        match self.validate(token) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Access token rejected");
                false
            }
        }
    }
}
