// ==================== REPOSITORIES ====================
// Storage seam for the follow / capacity workflow.
// `mongo` backs the running service, `memory` backs the unit tests.

#[cfg(test)]
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::{ApprovalState, BatchState, Follow, Permission, PaymentState, RequestType};

#[cfg(test)]
pub use memory::{InMemoryFollowRepository, InMemoryPermissionRepository};
pub use mongo::{is_duplicate_key, MongoFollowRepository, MongoPermissionRepository};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness rule was violated (duplicate follow, second open batch)
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("database: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Insert a follow; `Duplicate` when the (student, staff) pair exists.
    async fn insert(&self, follow: Follow) -> Result<Follow>;
    async fn find(&self, staff_id: &str, student_id: &str) -> Result<Option<Follow>>;
    async fn delete(&self, staff_id: &str, student_id: &str) -> Result<bool>;
    async fn count_for_staff(&self, staff_id: &str) -> Result<u64>;
    async fn list_for_staff(&self, staff_id: &str) -> Result<Vec<Follow>>;
    async fn list_for_student(&self, student_id: &str) -> Result<Vec<Follow>>;
}

/// Filter for listing permission requests; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct PermissionFilter {
    pub staff_id: Option<String>,
    pub status: Option<crate::models::ApprovalStatus>,
    pub request_type: Option<RequestType>,
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn insert(&self, permission: Permission) -> Result<Permission>;
    async fn find(&self, id: ObjectId) -> Result<Option<Permission>>;
    /// Newest first
    async fn list(&self, filter: PermissionFilter) -> Result<Vec<Permission>>;
    async fn delete(&self, id: ObjectId) -> Result<bool>;

    /// The approved capacity request of `staff_id` whose batch is still open.
    async fn find_open_batch(&self, staff_id: &str) -> Result<Option<Permission>>;

    /// A pending request of the given type for the staff member (and student).
    async fn find_pending(
        &self,
        staff_id: &str,
        student_id: Option<&str>,
        request_type: RequestType,
    ) -> Result<Option<Permission>>;

    /// Write new approval and batch states, only if the stored approval
    /// state still equals `expected`. Returns the updated request, or `None`
    /// when another writer got there first. Opening a second batch for the
    /// same staff member fails with `Duplicate`.
    async fn update_approval(
        &self,
        id: ObjectId,
        expected: &ApprovalState,
        approval: ApprovalState,
        batch: BatchState,
        updated_at: i64,
    ) -> Result<Option<Permission>>;

    async fn update_payment(
        &self,
        id: ObjectId,
        expected: &PaymentState,
        payment: PaymentState,
        updated_at: i64,
    ) -> Result<Option<Permission>>;

    /// Atomically take one slot of an open batch. Returns the request after
    /// the increment, or `None` if the batch is not open or already full.
    async fn reserve_batch_slot(&self, id: ObjectId) -> Result<Option<Permission>>;

    /// Give back a slot taken by `reserve_batch_slot`.
    async fn release_batch_slot(&self, id: ObjectId) -> Result<()>;

    /// Open → Complete once every slot is taken.
    async fn complete_batch(&self, id: ObjectId, completed_at: i64) -> Result<bool>;
}
