//! Database layer: the document store seam and its implementations.

pub mod firestore;
pub mod memory;
pub mod snapshot;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotHub, Subscription};

use crate::error::AppError;
use crate::models::{User, UserId, UserPatch};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Typed access to the `users` collection.
///
/// Implementations validate records at this boundary; callers only ever see
/// well-formed [`User`] values.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to the whole collection.
    ///
    /// The returned subscription yields the current snapshot first and then
    /// one snapshot per change until it is dropped.
    async fn subscribe(&self) -> Result<Subscription, AppError>;

    /// Point-in-time read of every valid record.
    async fn list_records(&self) -> Result<Vec<User>, AppError>;

    /// Read a single record. `None` when absent or malformed.
    async fn get_record(&self, id: &UserId) -> Result<Option<User>, AppError>;

    /// Full replace of a record (account creation).
    async fn set_record(&self, user: &User) -> Result<(), AppError>;

    /// Update only the fields present in `patch`.
    ///
    /// Fails with [`AppError::Write`] when the record no longer exists; never
    /// creates a record.
    async fn update_fields(&self, id: &UserId, patch: &UserPatch) -> Result<(), AppError>;
}
