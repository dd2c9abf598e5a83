use sqlx::PgPool;
use uuid::Uuid;

use super::TokenStore;
use crate::error::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Token store backed by the `refresh_tokens` table
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create or upgrade the `refresh_tokens` table.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {}", e)))
    }

    async fn exists(&self, jti: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM refresh_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait::async_trait]
impl TokenStore for PgTokenStore {
    #[tracing::instrument(name = "Insert token record", skip(self, token_hash))]
    async fn insert(&self, jti: Uuid, token_hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (jti, token_hash, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(jti)
        .bind(token_hash)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let unique_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .map_or(false, |code| code == UNIQUE_VIOLATION);
            if unique_violation {
                StoreError::Duplicate(jti)
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetch token hash", skip(self))]
    async fn fetch_hash(&self, jti: Uuid) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT token_hash FROM refresh_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(jti))
    }

    #[tracing::instrument(name = "Update token hash", skip(self, new_hash))]
    async fn update_hash(&self, jti: Uuid, new_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET token_hash = $2, rotated_at = $3
            WHERE jti = $1
            "#,
        )
        .bind(jti)
        .bind(new_hash)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(jti));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Replace token hash", skip(self, expected_hash, new_hash))]
    async fn replace_hash(
        &self,
        jti: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET token_hash = $3, rotated_at = $4
            WHERE jti = $1 AND token_hash = $2
            "#,
        )
        .bind(jti)
        .bind(expected_hash)
        .bind(new_hash)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return if self.exists(jti).await? {
                Err(StoreError::Conflict(jti))
            } else {
                Err(StoreError::NotFound(jti))
            };
        }
        Ok(())
    }
}
