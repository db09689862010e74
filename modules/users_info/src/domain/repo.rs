use crate::contract::model::User;
use crate::domain::error::StorageError;
use async_trait::async_trait;

/// Port for the domain layer: the collection is loaded and persisted as a whole.
///
/// Implementations do not coordinate concurrent callers. Two overlapping
/// load → mutate → persist cycles race and the last `persist` wins.
#[async_trait]
pub trait UsersStore: Send + Sync {
    /// Read the full collection, in stored order.
    async fn load(&self) -> Result<Vec<User>, StorageError>;
    /// Replace the stored collection with `users`.
    async fn persist(&self, users: &[User]) -> Result<(), StorageError>;
}
