/// Access token signing and verification
///
/// Access tokens are HS512 JWTs. The keys are derived once from
/// `JwtSettings` and shared read-only by every component that signs or
/// reads tokens.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::AccessClaims;
use crate::configuration::JwtSettings;
use crate::error::{InvalidTokenReason, TokenError};

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Whether reading a token should reject it once `exp` has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Enforce,
    Ignore,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
}

impl TokenSigner {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry: config.access_token_expiry,
        }
    }

    /// Lifetime of a freshly signed access token, in seconds
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    pub fn sign(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the signature of `token` and parse its claims.
    ///
    /// The payload is first decoded untyped so that signature and structure
    /// failures are reported apart from claims that are present but wrong.
    pub fn read(&self, token: &str, expiry: Expiry) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation.validate_exp = expiry == Expiry::Enforce;

        let payload = decode::<serde_json::Value>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidAccessToken(InvalidTokenReason::BadSignature)
                }
                _ => {
                    tracing::debug!(error = %e, "Access token could not be decoded");
                    TokenError::InvalidAccessToken(InvalidTokenReason::Malformed)
                }
            })?;

        AccessClaims::from_value(payload.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            bcrypt_cost: 4,
        }
    }

    fn claims(expiry_seconds: i64) -> AccessClaims {
        AccessClaims::new("u1", "127.0.0.1", Uuid::new_v4(), expiry_seconds).unwrap()
    }

    #[test]
    fn test_sign_and_read_token() {
        let signer = TokenSigner::new(&get_test_config());
        let claims = claims(900);

        let token = signer.sign(&claims).expect("Failed to sign token");
        let read = signer.read(&token, Expiry::Enforce).expect("Failed to read token");

        assert_eq!(read, claims);
    }

    #[test]
    fn test_invalid_token() {
        let signer = TokenSigner::new(&get_test_config());
        let result = signer.read("invalid.token.here", Expiry::Ignore);

        assert!(matches!(result, Err(TokenError::InvalidAccessToken(_))));
    }

    #[test]
    fn test_tampered_token() {
        let signer = TokenSigner::new(&get_test_config());
        let token = signer.sign(&claims(900)).unwrap();

        let tampered = format!("{}X", token);
        let result = signer.read(&tampered, Expiry::Ignore);

        assert!(matches!(result, Err(TokenError::InvalidAccessToken(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let signer = TokenSigner::new(&get_test_config());
        let token = signer.sign(&claims(900)).unwrap();

        let mut other = get_test_config();
        other.secret = "another-secret-key-at-least-32-characters".to_string();
        let result = TokenSigner::new(&other).read(&token, Expiry::Ignore);

        assert!(matches!(
            result,
            Err(TokenError::InvalidAccessToken(InvalidTokenReason::BadSignature))
        ));
    }

    #[test]
    fn test_expired_token_only_rejected_when_enforced() {
        let signer = TokenSigner::new(&get_test_config());
        let token = signer.sign(&claims(-120)).unwrap();

        assert!(matches!(
            signer.read(&token, Expiry::Enforce),
            Err(TokenError::TokenExpired)
        ));
        assert!(signer.read(&token, Expiry::Ignore).is_ok());
    }

    #[test]
    fn test_signed_payload_without_family_is_malformed() {
        let config = get_test_config();
        let signer = TokenSigner::new(&config);
        let payload = serde_json::json!({"sub": "u1", "exp": chrono::Utc::now().timestamp() + 900});
        let token = encode(
            &Header::new(ALGORITHM),
            &payload,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            signer.read(&token, Expiry::Ignore),
            Err(TokenError::MalformedClaims(_))
        ));
    }
}
