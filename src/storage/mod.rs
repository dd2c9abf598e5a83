/// Token Storage
///
/// Persistence contract for token records. A record maps a token family
/// (`jti`) to the bcrypt hash of the family's current refresh token.

mod memory;
mod postgres;

pub use memory::InMemoryTokenStore;
pub use postgres::PgTokenStore;

use uuid::Uuid;

use crate::error::StoreError;

#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Create the record for a new family. Fails with `Duplicate` if `jti`
    /// is already present.
    async fn insert(&self, jti: Uuid, token_hash: &str) -> Result<(), StoreError>;

    /// Current hash for `jti`, or `NotFound`.
    async fn fetch_hash(&self, jti: Uuid) -> Result<String, StoreError>;

    /// Unconditionally overwrite the hash for `jti`, or `NotFound`.
    async fn update_hash(&self, jti: Uuid, new_hash: &str) -> Result<(), StoreError>;

    /// Overwrite the hash for `jti` only if it still equals `expected_hash`.
    ///
    /// Fails with `Conflict` when another writer got there first and with
    /// `NotFound` when the record is gone.
    async fn replace_hash(
        &self,
        jti: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<(), StoreError>;
}
