use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use serde::Serialize;

use super::{
    FollowRepository, PermissionFilter, PermissionRepository, RepositoryError, Result,
};
use crate::database::MongoDB;
use crate::models::{ApprovalState, BatchState, Follow, Permission, PaymentState, RequestType};

pub const FOLLOWS: &str = "follows";
pub const PERMISSIONS: &str = "permissions";

const DUPLICATE_KEY: i32 = 11000;

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_err(context: &str) -> impl Fn(mongodb::error::Error) -> RepositoryError + '_ {
    move |err| {
        if is_duplicate_key(&err) {
            RepositoryError::Duplicate(context.to_string())
        } else {
            RepositoryError::Database(format!("{}: {}", context, err))
        }
    }
}

fn to_bson_value<T: Serialize>(value: &T) -> Result<Bson> {
    to_bson(value).map_err(|e| RepositoryError::Database(format!("Serialization error: {}", e)))
}

/// Tag of an internally tagged state enum, e.g. "Open" for `BatchState::Open`.
fn state_tag<T: Serialize>(state: &T) -> Result<String> {
    match to_bson_value(state)? {
        Bson::Document(document) => document
            .get_str("state")
            .map(str::to_string)
            .map_err(|e| RepositoryError::Database(format!("Missing state tag: {}", e))),
        other => Err(RepositoryError::Database(format!("Unexpected state encoding: {}", other))),
    }
}

// ==================== FOLLOWS ====================

pub struct MongoFollowRepository {
    collection: Collection<Follow>,
}

impl MongoFollowRepository {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            collection: db.collection::<Follow>(FOLLOWS),
        }
    }
}

#[async_trait]
impl FollowRepository for MongoFollowRepository {
    async fn insert(&self, mut follow: Follow) -> Result<Follow> {
        let result = self
            .collection
            .insert_one(&follow)
            .await
            .map_err(map_err("Already following this staff member"))?;

        follow.id = result.inserted_id.as_object_id();
        Ok(follow)
    }

    async fn find(&self, staff_id: &str, student_id: &str) -> Result<Option<Follow>> {
        self.collection
            .find_one(doc! { "staff_id": staff_id, "student_id": student_id })
            .await
            .map_err(map_err("Failed to fetch follow"))
    }

    async fn delete(&self, staff_id: &str, student_id: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "staff_id": staff_id, "student_id": student_id })
            .await
            .map_err(map_err("Failed to delete follow"))?;
        Ok(result.deleted_count > 0)
    }

    async fn count_for_staff(&self, staff_id: &str) -> Result<u64> {
        self.collection
            .count_documents(doc! { "staff_id": staff_id })
            .await
            .map_err(map_err("Failed to count followers"))
    }

    async fn list_for_staff(&self, staff_id: &str) -> Result<Vec<Follow>> {
        let cursor = self
            .collection
            .find(doc! { "staff_id": staff_id })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(map_err("Failed to list followers"))?;
        cursor.try_collect().await.map_err(map_err("Failed to read followers"))
    }

    async fn list_for_student(&self, student_id: &str) -> Result<Vec<Follow>> {
        let cursor = self
            .collection
            .find(doc! { "student_id": student_id })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(map_err("Failed to list followed staff"))?;
        cursor.try_collect().await.map_err(map_err("Failed to read followed staff"))
    }
}

// ==================== PERMISSIONS ====================

pub struct MongoPermissionRepository {
    collection: Collection<Permission>,
}

impl MongoPermissionRepository {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            collection: db.collection::<Permission>(PERMISSIONS),
        }
    }
}

#[async_trait]
impl PermissionRepository for MongoPermissionRepository {
    async fn insert(&self, mut permission: Permission) -> Result<Permission> {
        let result = self
            .collection
            .insert_one(&permission)
            .await
            .map_err(map_err("Failed to create request"))?;

        permission.id = result.inserted_id.as_object_id();
        Ok(permission)
    }

    async fn find(&self, id: ObjectId) -> Result<Option<Permission>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_err("Failed to fetch request"))
    }

    async fn list(&self, filter: PermissionFilter) -> Result<Vec<Permission>> {
        let mut query = Document::new();
        if let Some(staff_id) = filter.staff_id {
            query.insert("staff_id", staff_id);
        }
        if let Some(status) = filter.status {
            query.insert("approval.state", status.as_str());
        }
        if let Some(request_type) = filter.request_type {
            query.insert("request_type", request_type.as_str());
        }

        let cursor = self
            .collection
            .find(query)
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(map_err("Failed to list requests"))?;
        cursor.try_collect().await.map_err(map_err("Failed to read requests"))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(map_err("Failed to delete request"))?;
        Ok(result.deleted_count > 0)
    }

    async fn find_open_batch(&self, staff_id: &str) -> Result<Option<Permission>> {
        self.collection
            .find_one(doc! {
                "staff_id": staff_id,
                "request_type": RequestType::CapacityIncrease.as_str(),
                "approval.state": "Approved",
                "batch.state": "Open",
            })
            .await
            .map_err(map_err("Failed to fetch active batch"))
    }

    async fn find_pending(
        &self,
        staff_id: &str,
        student_id: Option<&str>,
        request_type: RequestType,
    ) -> Result<Option<Permission>> {
        let student = match student_id {
            Some(id) => Bson::String(id.to_string()),
            None => Bson::Null,
        };

        self.collection
            .find_one(doc! {
                "staff_id": staff_id,
                "student_id": student,
                "request_type": request_type.as_str(),
                "approval.state": "Pending",
            })
            .await
            .map_err(map_err("Failed to fetch pending request"))
    }

    async fn update_approval(
        &self,
        id: ObjectId,
        expected: &ApprovalState,
        approval: ApprovalState,
        batch: BatchState,
        updated_at: i64,
    ) -> Result<Option<Permission>> {
        let filter = doc! { "_id": id, "approval.state": state_tag(expected)? };
        let update = doc! {
            "$set": {
                "approval": to_bson_value(&approval)?,
                "batch": to_bson_value(&batch)?,
                "updated_at": updated_at,
            }
        };

        self.collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_err("An approved batch is already active for this staff member"))
    }

    async fn update_payment(
        &self,
        id: ObjectId,
        expected: &PaymentState,
        payment: PaymentState,
        updated_at: i64,
    ) -> Result<Option<Permission>> {
        let filter = doc! { "_id": id, "payment.state": state_tag(expected)? };
        let update = doc! {
            "$set": {
                "payment": to_bson_value(&payment)?,
                "updated_at": updated_at,
            }
        };

        self.collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_err("Failed to update payment"))
    }

    async fn reserve_batch_slot(&self, id: ObjectId) -> Result<Option<Permission>> {
        let filter = doc! {
            "_id": id,
            "batch.state": "Open",
            "$expr": { "$lt": ["$batch.approved_count", "$batch_size"] },
        };

        self.collection
            .find_one_and_update(filter, doc! { "$inc": { "batch.approved_count": 1_i64 } })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_err("Failed to reserve batch slot"))
    }

    async fn release_batch_slot(&self, id: ObjectId) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": id, "batch.state": "Open", "batch.approved_count": { "$gt": 0 } },
                doc! { "$inc": { "batch.approved_count": -1_i64 } },
            )
            .await
            .map_err(map_err("Failed to release batch slot"))?;
        Ok(())
    }

    async fn complete_batch(&self, id: ObjectId, completed_at: i64) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "_id": id,
                    "batch.state": "Open",
                    "$expr": { "$gte": ["$batch.approved_count", "$batch_size"] },
                },
                doc! {
                    "$set": {
                        "batch.state": "Complete",
                        "batch.completed_at": completed_at,
                        "updated_at": completed_at,
                    }
                },
            )
            .await
            .map_err(map_err("Failed to complete batch"))?;
        Ok(result.modified_count > 0)
    }
}
