/// Refresh Token Generation and Hashing
///
/// Refresh tokens are:
/// - SHA-256 digests of 32 bytes from the OS random source, hex encoded
/// - Handed to the client once and never stored in plaintext
/// - Stored only as a bcrypt hash, so a leaked table cannot be replayed

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::TokenError;

const ENTROPY_BYTES: usize = 32;

/// Generate a new refresh token for `subject`.
///
/// The subject only separates the digest input per user; all of the
/// token's entropy comes from the OS random source.
pub fn generate_refresh_token(subject: &str) -> String {
    let mut seed = [0u8; ENTROPY_BYTES];
    OsRng.fill_bytes(&mut seed);

    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update([0u8]);
    hasher.update(seed);
    format!("{:x}", hasher.finalize())
}

/// bcrypt hashing of refresh tokens with a tunable cost factor
///
/// Both operations run on the blocking pool so request handlers keep
/// serving while a hash is computed.
#[derive(Debug, Clone, Copy)]
pub struct RefreshTokenHasher {
    cost: u32,
}

impl RefreshTokenHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, token: &str) -> Result<String, TokenError> {
        let token = token.to_owned();
        let cost = self.cost;
        run_blocking(move || bcrypt::hash(token, cost)).await
    }

    /// Check `token` against a stored hash.
    ///
    /// A stored value that is not a bcrypt hash is an error, not a mismatch.
    pub async fn verify(&self, token: &str, hash: &str) -> Result<bool, TokenError> {
        let token = token.to_owned();
        let hash = hash.to_owned();
        run_blocking(move || bcrypt::verify(token, &hash)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, TokenError>
where
    F: FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TokenError::Hashing(e.to_string()))?
        .map_err(|e| TokenError::Hashing(e.to_string()))
}
