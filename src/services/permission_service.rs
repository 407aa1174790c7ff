// ==================== PERMISSION SERVICE ====================
// Capacity-increase and follow-permission requests and their approval.

use crate::{
    models::{ApprovalStatus, Permission, PermissionQuery, RequestType, SendPermissionRequest},
    repositories::PermissionFilter,
    state::AppState,
    utils::{parse_object_id, require, AppError, AppResult},
};

const INVALID_STATUS: &str = "Invalid status. Must be one of: Pending, Approved, Rejected";
const BATCH_ALREADY_ACTIVE: &str = "An approved batch is already active for this staff member";

/// POST /send-request/{adminId} - file a request for a staff member
pub async fn send_request(
    state: &AppState,
    staff_id: &str,
    body: SendPermissionRequest,
) -> AppResult<Permission> {
    require(staff_id, "adminId")?;

    let request_type = body.request_type.unwrap_or(RequestType::CapacityIncrease);
    let student_id = body.student_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if request_type == RequestType::FollowPermission && student_id.is_none() {
        return Err(AppError::InvalidRequest(
            "studentId is required for follow permission requests".to_string(),
        ));
    }

    if state
        .permissions
        .find_pending(staff_id, student_id, request_type)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("A pending request already exists".to_string()));
    }

    let mut request = Permission::new(request_type, staff_id, state.config.capacity.batch_size as i64);
    request.staff_name = body.staff_name;
    request.student_id = student_id.map(str::to_string);
    request.student_name = body.student_name;
    request.message = body.message;

    let request = state.permissions.insert(request).await?;
    log::info!("📨 {} request filed for {}", request_type, staff_id);
    Ok(request)
}

pub async fn list_requests(state: &AppState, query: PermissionQuery) -> AppResult<Vec<Permission>> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            ApprovalStatus::parse(raw).ok_or_else(|| AppError::InvalidRequest(INVALID_STATUS.to_string()))?,
        ),
        None => None,
    };

    let filter = PermissionFilter {
        staff_id: query.staff_id,
        status,
        request_type: query.request_type,
    };
    Ok(state.permissions.list(filter).await?)
}

pub async fn get_request(state: &AppState, id: &str) -> AppResult<Permission> {
    let object_id = parse_object_id(id, "request")?;
    state
        .permissions
        .find(object_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
}

/// Move a request to Pending / Approved / Rejected (case-insensitive).
///
/// Approving a capacity request opens its batch; at most one batch per
/// staff member may be open. Rejecting an approved request closes its batch.
pub async fn update_request_status(state: &AppState, id: &str, status: &str) -> AppResult<Permission> {
    let target =
        ApprovalStatus::parse(status).ok_or_else(|| AppError::InvalidRequest(INVALID_STATUS.to_string()))?;
    let request = get_request(state, id).await?;
    let object_id = parse_object_id(id, "request")?;

    if target == ApprovalStatus::Approved && request.request_type == RequestType::CapacityIncrease {
        if let Some(active) = state.permissions.find_open_batch(&request.staff_id).await? {
            if active.id != request.id {
                return Err(AppError::InvalidRequest(BATCH_ALREADY_ACTIVE.to_string()));
            }
        }
    }

    let expected = request.approval.clone();
    let mut next = request.clone();
    let changed = next
        .apply_status(target, chrono::Utc::now().timestamp())
        .map_err(AppError::InvalidRequest)?;
    if !changed {
        return Ok(request);
    }

    let updated = state
        .permissions
        .update_approval(object_id, &expected, next.approval, next.batch, next.updated_at)
        .await?
        .ok_or_else(|| AppError::Conflict("Request was modified concurrently, please retry".to_string()))?;

    log::info!("📝 Request {} for {} is now {}", id, updated.staff_id, target);
    Ok(updated)
}

pub async fn delete_request(state: &AppState, id: &str) -> AppResult<()> {
    let request = get_request(state, id).await?;
    if request.batch.is_open() {
        return Err(AppError::InvalidRequest(
            "Reject the request before deleting it: its batch is still open".to_string(),
        ));
    }

    let object_id = parse_object_id(id, "request")?;
    if !state.permissions.delete(object_id).await? {
        return Err(AppError::NotFound("Request not found".to_string()));
    }
    log::info!("🗑️  Request {} deleted", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchState;
    use crate::state::test_config;

    fn state() -> AppState {
        AppState::in_memory(test_config())
    }

    async fn capacity_request(state: &AppState, staff_id: &str, student_id: &str) -> Permission {
        send_request(
            state,
            staff_id,
            SendPermissionRequest {
                student_id: Some(student_id.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_request_defaults_to_capacity_increase() {
        let state = state();
        let request = capacity_request(&state, "staff-1", "s1").await;
        assert_eq!(request.request_type, RequestType::CapacityIncrease);
        assert_eq!(request.batch_size, 50);
        assert_eq!(request.status(), ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_pending_request_is_rejected() {
        let state = state();
        capacity_request(&state, "staff-1", "s1").await;

        let err = send_request(
            &state,
            "staff-1",
            SendPermissionRequest {
                student_id: Some("s1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // a different student may still ask
        capacity_request(&state, "staff-1", "s2").await;
    }

    #[tokio::test]
    async fn test_follow_permission_needs_student() {
        let err = send_request(
            &state(),
            "staff-1",
            SendPermissionRequest {
                request_type: Some(RequestType::FollowPermission),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected() {
        let state = state();
        let request = capacity_request(&state, "staff-1", "s1").await;
        let id = request.id.unwrap().to_hex();

        let err = update_request_status(&state, &id, "maybe").await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_STATUS);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let state = state();
        let id = mongodb::bson::oid::ObjectId::new().to_hex();
        let err = update_request_status(&state, &id, "approved").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = update_request_status(&state, "garbage", "approved").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_second_active_batch_is_rejected() {
        let state = state();
        let first = capacity_request(&state, "staff-1", "s1").await;
        let second = capacity_request(&state, "staff-1", "s2").await;

        let approved = update_request_status(&state, &first.id.unwrap().to_hex(), "APPROVED")
            .await
            .unwrap();
        assert!(approved.batch.is_open());

        let err = update_request_status(&state, &second.id.unwrap().to_hex(), "approved")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), BATCH_ALREADY_ACTIVE);

        // other staff members are unaffected
        let other = capacity_request(&state, "staff-2", "s1").await;
        update_request_status(&state, &other.id.unwrap().to_hex(), "approved").await.unwrap();
    }

    #[tokio::test]
    async fn test_reapproving_same_request_is_noop() {
        let state = state();
        let request = capacity_request(&state, "staff-1", "s1").await;
        let id = request.id.unwrap().to_hex();

        let first = update_request_status(&state, &id, "approved").await.unwrap();
        let again = update_request_status(&state, &id, "approved").await.unwrap();
        assert_eq!(first.batch, again.batch);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let state = state();
        let a = capacity_request(&state, "staff-1", "s1").await;
        capacity_request(&state, "staff-2", "s1").await;
        update_request_status(&state, &a.id.unwrap().to_hex(), "approved").await.unwrap();

        let pending = list_requests(
            &state,
            PermissionQuery {
                status: Some("pending".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].staff_id, "staff-2");

        let for_staff = list_requests(
            &state,
            PermissionQuery {
                staff_id: Some("staff-1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(for_staff.len(), 1);

        let id = a.id.unwrap().to_hex();
        assert!(delete_request(&state, &id).await.is_err());
        let revoked = update_request_status(&state, &id, "rejected").await.unwrap();
        assert!(matches!(revoked.batch, BatchState::Closed { .. }));
        delete_request(&state, &id).await.unwrap();
        assert!(matches!(get_request(&state, &id).await.unwrap_err(), AppError::NotFound(_)));
    }
}
