/// Access token claims
///
/// Fixed-shape payload of an access token. Claims are parsed into this
/// struct when a token is read, so a token that verifies but lacks a field
/// is rejected before any of its values are used.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (opaque user identifier)
    pub sub: String,
    /// Client address the token family was issued to
    pub ip: String,
    /// Token family identifier, fixed for the life of the family
    pub jti: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Number of rotations the family has gone through
    #[serde(rename = "gen")]
    pub generation: u32,
}

impl AccessClaims {
    /// Claims for the first access token of a new family.
    pub fn new(
        subject: &str,
        client_address: &str,
        jti: Uuid,
        expiry_seconds: i64,
    ) -> Result<Self, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::MalformedClaims("subject is empty".to_string()));
        }
        let now = chrono::Utc::now().timestamp();
        Ok(Self {
            sub: subject.to_string(),
            ip: client_address.to_string(),
            jti,
            exp: now + expiry_seconds,
            iat: now,
            generation: 0,
        })
    }

    /// Claims for the access token that replaces `self` on rotation.
    ///
    /// Subject, address and family are carried over unchanged.
    pub fn rotated(&self, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: self.sub.clone(),
            ip: self.ip.clone(),
            jti: self.jti,
            exp: now + expiry_seconds,
            iat: now,
            generation: self.generation.wrapping_add(1),
        }
    }

    /// Build claims from a verified but untyped payload.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TokenError> {
        let claims: AccessClaims = serde_json::from_value(value)
            .map_err(|e| TokenError::MalformedClaims(e.to_string()))?;
        if claims.sub.trim().is_empty() {
            return Err(TokenError::MalformedClaims("subject is empty".to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claims_creation() {
        let jti = Uuid::new_v4();
        let claims = AccessClaims::new("u1", "127.0.0.1", jti, 900).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.ip, "127.0.0.1");
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.generation, 0);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_empty_subject_rejected() {
        let result = AccessClaims::new("", "127.0.0.1", Uuid::new_v4(), 900);
        assert!(matches!(result, Err(TokenError::MalformedClaims(_))));
    }

    #[test]
    fn test_rotation_keeps_family() {
        let claims = AccessClaims::new("u1", "10.0.0.1", Uuid::new_v4(), -60).unwrap();
        assert!(claims.exp < claims.iat);

        let next = claims.rotated(900);
        assert_eq!(next.jti, claims.jti);
        assert_eq!(next.sub, claims.sub);
        assert_eq!(next.ip, claims.ip);
        assert_eq!(next.generation, 1);
        assert_eq!(next.exp - next.iat, 900);
        assert!(next.iat >= claims.iat);
    }

    #[test]
    fn test_missing_jti_is_malformed() {
        let value = json!({"sub": "u1", "ip": "127.0.0.1", "exp": 0, "iat": 0, "gen": 0});
        let result = AccessClaims::from_value(value);
        assert!(matches!(result, Err(TokenError::MalformedClaims(_))));
    }

    #[test]
    fn test_non_uuid_jti_is_malformed() {
        let value = json!({
            "sub": "u1", "ip": "127.0.0.1", "jti": "not-a-uuid",
            "exp": 0, "iat": 0, "gen": 0
        });
        assert!(AccessClaims::from_value(value).is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let claims = AccessClaims::new("u1", "127.0.0.1", Uuid::new_v4(), 900).unwrap();
        let value = serde_json::to_value(&claims).unwrap();

        assert!(value.get("gen").is_some());
        assert_eq!(AccessClaims::from_value(value).unwrap(), claims);
    }
}
