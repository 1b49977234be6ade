//! Durable token storage.
//!
//! Persists the access token, refresh token, and cached user profile as
//! three encrypted rows in the session database. Save and clear are
//! transactional: either both tokens are present or neither is.

use std::sync::Arc;

use thiserror::Error;

use crate::crypto::{CryptoError, CryptoService};
use crate::db::Database;
use crate::session::types::{AuthResponse, User};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub struct TokenStore {
    db: Arc<Database>,
    crypto: CryptoService,
}

impl TokenStore {
    pub fn new(db: Arc<Database>, crypto: CryptoService) -> Self {
        Self { db, crypto }
    }

    /// Persist a credential bundle. All three rows are written in one
    /// transaction.
    pub async fn save(&self, auth: &AuthResponse) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(&auth.user)?;
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.db.pool().begin().await?;
        for (key, value) in [
            (ACCESS_TOKEN_KEY, auth.access_token.as_str()),
            (REFRESH_TOKEN_KEY, auth.refresh_token.as_str()),
            (USER_KEY, user_json.as_str()),
        ] {
            let encrypted = self.crypto.encrypt_string(value)?;
            sqlx::query(
                "INSERT INTO credentials (id, encrypted_data, created_at, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET encrypted_data = ?, updated_at = ?",
            )
            .bind(key)
            .bind(&encrypted)
            .bind(now)
            .bind(now)
            .bind(&encrypted)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!("Saved session credentials");
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.read(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    /// Last persisted user profile, if any.
    pub async fn user(&self) -> Result<Option<User>, StoreError> {
        match self.read(USER_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Remove all three rows in one transaction.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await?;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            sqlx::query("DELETE FROM credentials WHERE id = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Cleared session credentials");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT encrypted_data FROM credentials WHERE id = ?")
                .bind(key)
                .fetch_optional(self.db.pool())
                .await?;

        match row {
            Some((encrypted,)) => Ok(Some(self.crypto.decrypt_string(&encrypted)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn test_store() -> TokenStore {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let crypto = CryptoService::from_key([1u8; 32]).unwrap();
        TokenStore::new(db, crypto)
    }

    fn sample_auth() -> AuthResponse {
        AuthResponse {
            access_token: "access-abc".into(),
            refresh_token: "refresh-xyz".into(),
            expires_at: Utc::now(),
            user: User {
                id: "u1".into(),
                email: "anna@example.com".into(),
                full_name: Some("Anna Svensson".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let store = test_store().await;
        store.save(&sample_auth()).await.unwrap();

        assert_eq!(store.access_token().await.unwrap().unwrap(), "access-abc");
        assert_eq!(store.refresh_token().await.unwrap().unwrap(), "refresh-xyz");

        let user = store.user().await.unwrap().unwrap();
        assert_eq!(user.email, "anna@example.com");
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_bundle() {
        let store = test_store().await;
        store.save(&sample_auth()).await.unwrap();

        let mut updated = sample_auth();
        updated.access_token = "access-2".into();
        updated.refresh_token = "refresh-2".into();
        store.save(&updated).await.unwrap();

        assert_eq!(store.access_token().await.unwrap().unwrap(), "access-2");
        assert_eq!(store.refresh_token().await.unwrap().unwrap(), "refresh-2");
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = test_store().await;
        store.save(&sample_auth()).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
        assert!(store.user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_store_reads_none() {
        let store = test_store().await;
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_are_encrypted_at_rest() {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let crypto = CryptoService::from_key([1u8; 32]).unwrap();
        let store = TokenStore::new(db.clone(), crypto);
        store.save(&sample_auth()).await.unwrap();

        let rows: Vec<(String,)> = sqlx::query_as("SELECT encrypted_data FROM credentials")
            .fetch_all(db.pool())
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        for (data,) in rows {
            assert!(!data.contains("access-abc"));
            assert!(!data.contains("anna@example.com"));
        }
    }
}
