use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::TokenStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct TokenRecord {
    token_hash: String,
    created_at: DateTime<Utc>,
    rotated_at: Option<DateTime<Utc>>,
}

/// Process-local token store
///
/// Used by the test suites and for running the service without Postgres.
/// Each operation holds the lock for its whole read-modify-write, so
/// `replace_hash` is atomic.
#[derive(Default)]
pub struct InMemoryTokenStore {
    records: Mutex<HashMap<Uuid, TokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<Uuid, TokenRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("token map lock poisoned".to_string()))
    }

    /// When the family was issued.
    pub fn created_at(&self, jti: Uuid) -> Result<DateTime<Utc>, StoreError> {
        self.records()?
            .get(&jti)
            .map(|record| record.created_at)
            .ok_or(StoreError::NotFound(jti))
    }

    /// When the family was last rotated, if ever.
    pub fn rotated_at(&self, jti: Uuid) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.records()?
            .get(&jti)
            .map(|record| record.rotated_at)
            .ok_or(StoreError::NotFound(jti))
    }

    pub fn len(&self) -> usize {
        self.records().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, jti: Uuid, token_hash: &str) -> Result<(), StoreError> {
        let mut records = self.records()?;
        if records.contains_key(&jti) {
            return Err(StoreError::Duplicate(jti));
        }
        records.insert(
            jti,
            TokenRecord {
                token_hash: token_hash.to_string(),
                created_at: Utc::now(),
                rotated_at: None,
            },
        );
        Ok(())
    }

    async fn fetch_hash(&self, jti: Uuid) -> Result<String, StoreError> {
        self.records()?
            .get(&jti)
            .map(|record| record.token_hash.clone())
            .ok_or(StoreError::NotFound(jti))
    }

    async fn update_hash(&self, jti: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let mut records = self.records()?;
        let record = records.get_mut(&jti).ok_or(StoreError::NotFound(jti))?;
        record.token_hash = new_hash.to_string();
        record.rotated_at = Some(Utc::now());
        Ok(())
    }

    async fn replace_hash(
        &self,
        jti: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<(), StoreError> {
        let mut records = self.records()?;
        let record = records.get_mut(&jti).ok_or(StoreError::NotFound(jti))?;
        if record.token_hash != expected_hash {
            return Err(StoreError::Conflict(jti));
        }
        record.token_hash = new_hash.to_string();
        record.rotated_at = Some(Utc::now());
        Ok(())
    }
}
