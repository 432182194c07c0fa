// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations on the `users` collection.
//!
//! Change delivery: every write made through this client republishes the
//! collection, and a background poller re-reads it to pick up changes made
//! elsewhere (other server instances, console edits, deletions).

use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreResult, FirestoreWritePrecondition};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::db::{collections, DocumentStore, SnapshotHub, Subscription};
use crate::error::AppError;
use crate::models::{User, UserDoc, UserId, UserPatch};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    hub: Arc<SnapshotHub>,
    /// Serialises read-then-publish so an older read never overwrites a newer one
    publish_lock: Arc<Mutex<()>>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::from_client(Some(client)))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::from_client(Some(client)))
    }

    /// Offline client: every operation fails with [`AppError::Database`].
    pub fn new_mock() -> Self {
        Self::from_client(None)
    }

    fn from_client(client: Option<firestore::FirestoreDb>) -> Self {
        Self {
            client,
            hub: Arc::new(SnapshotHub::new()),
            publish_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Re-read the collection and publish it to subscribers.
    pub async fn refresh_snapshot(&self) -> Result<bool, AppError> {
        let _guard = self.publish_lock.lock().await;
        let users = self.list_records().await?;
        Ok(self.hub.publish(users))
    }

    /// Best-effort refresh after a local write; the write itself already succeeded.
    async fn republish(&self) {
        if let Err(e) = self.refresh_snapshot().await {
            tracing::warn!(error = %e, "Failed to republish users snapshot after write");
        }
    }

    /// Periodically re-read the collection while anyone is subscribed.
    pub fn spawn_snapshot_poller(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let db = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if db.hub.subscriber_count() == 0 {
                    continue;
                }
                match db.refresh_snapshot().await {
                    Ok(true) => tracing::debug!("Users collection changed"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(error = %e, "Snapshot poll failed"),
                }
            }
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn subscribe(&self) -> Result<Subscription, AppError> {
        // Subscribers must start from the current contents, not the last poll
        self.refresh_snapshot().await?;
        Ok(self.hub.subscribe())
    }

    async fn list_records(&self) -> Result<Vec<User>, AppError> {
        // Each document is decoded on its own so one bad record cannot fail the read
        let docs: Vec<FirestoreResult<UserDoc>> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj::<UserDoc>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .collect()
            .await;

        let mut users = Vec::with_capacity(docs.len());
        for doc in docs {
            match doc {
                Ok(doc) => match doc.into_user(None) {
                    Ok(user) => users.push(user),
                    Err(e) => tracing::warn!(error = %e, "Skipping malformed user record"),
                },
                Err(FirestoreError::DeserializeError(e)) => {
                    tracing::warn!(error = %e, "Skipping unreadable user record");
                }
                // A partial read would look like deleted accounts; fail the whole read
                Err(e) => return Err(AppError::Database(e.to_string())),
            }
        }
        Ok(users)
    }

    async fn get_record(&self, id: &UserId) -> Result<Option<User>, AppError> {
        let doc: Option<UserDoc> = match self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id.as_str())
            .await
        {
            Ok(doc) => doc,
            Err(FirestoreError::DeserializeError(e)) => {
                tracing::warn!(uid = %id, error = %e, "Stored user record is unreadable");
                None
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        };

        Ok(doc.and_then(|doc| match doc.into_user(Some(id)) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(uid = %id, error = %e, "Stored user record is malformed");
                None
            }
        }))
    }

    async fn set_record(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.as_str())
            .object(&UserDoc::from(user))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(uid = %user.id, "User record written");
        self.republish().await;
        Ok(())
    }

    async fn update_fields(&self, id: &UserId, patch: &UserPatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }

        // Exists(true) turns a write to a vanished record into NOT_FOUND
        // instead of silently recreating it.
        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .fields(patch.field_paths())
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id.as_str())
            .object(patch)
            .execute()
            .await;

        match result {
            Ok(()) => {}
            Err(FirestoreError::DataNotFoundError(_)) => {
                return Err(AppError::Write(format!("record {} no longer exists", id)));
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        tracing::debug!(uid = %id, fields = ?patch.field_paths(), "User record updated");
        self.republish().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_reports_database_errors() {
        let db = FirestoreDb::new_mock();

        let err = db
            .update_fields(&"u1".into(), &UserPatch::points(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        assert!(matches!(db.list_records().await, Err(AppError::Database(_))));
        assert!(matches!(db.subscribe().await, Err(AppError::Database(_))));
        assert!(db.refresh_snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_patch_is_a_no_op_offline() {
        let db = FirestoreDb::new_mock();
        db.update_fields(&"u1".into(), &UserPatch::default())
            .await
            .unwrap();
    }
}
