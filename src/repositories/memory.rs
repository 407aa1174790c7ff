use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;

use super::{
    FollowRepository, PermissionFilter, PermissionRepository, RepositoryError, Result,
};
use crate::models::{ApprovalState, BatchState, Follow, Permission, PaymentState, RequestType};

/// Follows kept in a vector.
#[derive(Default)]
pub struct InMemoryFollowRepository(Mutex<Vec<Follow>>);

impl InMemoryFollowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn insert(&self, mut follow: Follow) -> Result<Follow> {
        let mut guard = self.0.lock().await;

        if guard
            .iter()
            .any(|f| f.staff_id == follow.staff_id && f.student_id == follow.student_id)
        {
            return Err(RepositoryError::Duplicate(
                "Already following this staff member".to_string(),
            ));
        }

        follow.id = Some(ObjectId::new());
        guard.push(follow.clone());
        Ok(follow)
    }

    async fn find(&self, staff_id: &str, student_id: &str) -> Result<Option<Follow>> {
        let guard = self.0.lock().await;
        Ok(guard
            .iter()
            .find(|f| f.staff_id == staff_id && f.student_id == student_id)
            .cloned())
    }

    async fn delete(&self, staff_id: &str, student_id: &str) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let before = guard.len();
        guard.retain(|f| !(f.staff_id == staff_id && f.student_id == student_id));
        Ok(guard.len() < before)
    }

    async fn count_for_staff(&self, staff_id: &str) -> Result<u64> {
        let guard = self.0.lock().await;
        Ok(guard.iter().filter(|f| f.staff_id == staff_id).count() as u64)
    }

    async fn list_for_staff(&self, staff_id: &str) -> Result<Vec<Follow>> {
        let guard = self.0.lock().await;
        Ok(guard.iter().rev().filter(|f| f.staff_id == staff_id).cloned().collect())
    }

    async fn list_for_student(&self, student_id: &str) -> Result<Vec<Follow>> {
        let guard = self.0.lock().await;
        Ok(guard.iter().rev().filter(|f| f.student_id == student_id).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryPermissionRepository(Mutex<Vec<Permission>>);

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_mut(items: &mut [Permission], id: ObjectId) -> Option<&mut Permission> {
    items.iter_mut().find(|p| p.id == Some(id))
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn insert(&self, mut permission: Permission) -> Result<Permission> {
        permission.id = Some(ObjectId::new());
        self.0.lock().await.push(permission.clone());
        Ok(permission)
    }

    async fn find(&self, id: ObjectId) -> Result<Option<Permission>> {
        let guard = self.0.lock().await;
        Ok(guard.iter().find(|p| p.id == Some(id)).cloned())
    }

    async fn list(&self, filter: PermissionFilter) -> Result<Vec<Permission>> {
        let guard = self.0.lock().await;
        Ok(guard
            .iter()
            .rev()
            .filter(|p| filter.staff_id.as_ref().map(|s| &p.staff_id == s).unwrap_or(true))
            .filter(|p| filter.status.map(|s| p.status() == s).unwrap_or(true))
            .filter(|p| filter.request_type.map(|t| p.request_type == t).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let before = guard.len();
        guard.retain(|p| p.id != Some(id));
        Ok(guard.len() < before)
    }

    async fn find_open_batch(&self, staff_id: &str) -> Result<Option<Permission>> {
        let guard = self.0.lock().await;
        Ok(guard
            .iter()
            .find(|p| {
                p.staff_id == staff_id
                    && p.request_type == RequestType::CapacityIncrease
                    && matches!(p.approval, ApprovalState::Approved { .. })
                    && p.batch.is_open()
            })
            .cloned())
    }

    async fn find_pending(
        &self,
        staff_id: &str,
        student_id: Option<&str>,
        request_type: RequestType,
    ) -> Result<Option<Permission>> {
        let guard = self.0.lock().await;
        Ok(guard
            .iter()
            .find(|p| {
                p.staff_id == staff_id
                    && p.student_id.as_deref() == student_id
                    && p.request_type == request_type
                    && p.approval == ApprovalState::Pending
            })
            .cloned())
    }

    async fn update_approval(
        &self,
        id: ObjectId,
        expected: &ApprovalState,
        approval: ApprovalState,
        batch: BatchState,
        updated_at: i64,
    ) -> Result<Option<Permission>> {
        let mut guard = self.0.lock().await;

        // mirrors the partial unique index on open batches
        if batch.is_open() {
            let staff_id = match guard.iter().find(|p| p.id == Some(id)) {
                Some(p) => p.staff_id.clone(),
                None => return Ok(None),
            };
            if guard
                .iter()
                .any(|p| p.id != Some(id) && p.staff_id == staff_id && p.batch.is_open())
            {
                return Err(RepositoryError::Duplicate(
                    "An approved batch is already active for this staff member".to_string(),
                ));
            }
        }

        match find_mut(&mut guard, id) {
            Some(p) if p.approval.status() == expected.status() => {
                p.approval = approval;
                p.batch = batch;
                p.updated_at = updated_at;
                Ok(Some(p.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_payment(
        &self,
        id: ObjectId,
        expected: &PaymentState,
        payment: PaymentState,
        updated_at: i64,
    ) -> Result<Option<Permission>> {
        let mut guard = self.0.lock().await;
        match find_mut(&mut guard, id) {
            Some(p) if std::mem::discriminant(&p.payment) == std::mem::discriminant(expected) => {
                p.payment = payment;
                p.updated_at = updated_at;
                Ok(Some(p.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reserve_batch_slot(&self, id: ObjectId) -> Result<Option<Permission>> {
        let mut guard = self.0.lock().await;
        let Some(p) = find_mut(&mut guard, id) else {
            return Ok(None);
        };

        let batch_size = p.batch_size;
        let reserved = match &mut p.batch {
            BatchState::Open { approved_count, .. } if *approved_count < batch_size => {
                *approved_count += 1;
                true
            }
            _ => false,
        };
        Ok(reserved.then(|| p.clone()))
    }

    async fn release_batch_slot(&self, id: ObjectId) -> Result<()> {
        let mut guard = self.0.lock().await;
        if let Some(p) = find_mut(&mut guard, id) {
            if let BatchState::Open { approved_count, .. } = &mut p.batch {
                if *approved_count > 0 {
                    *approved_count -= 1;
                }
            }
        }
        Ok(())
    }

    async fn complete_batch(&self, id: ObjectId, completed_at: i64) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let Some(p) = find_mut(&mut guard, id) else {
            return Ok(false);
        };

        match p.batch {
            BatchState::Open {
                approved_count,
                opened_at,
            } if approved_count >= p.batch_size => {
                p.batch = BatchState::Complete {
                    approved_count,
                    opened_at,
                    completed_at,
                };
                p.updated_at = completed_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
