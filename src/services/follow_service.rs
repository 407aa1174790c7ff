// ==================== FOLLOW SERVICE ====================
// Students follow staff members. Every staff member has a base capacity;
// past it, follows are admitted only through an approved follow permission
// or the open batch of an approved capacity request, otherwise a new
// capacity request is filed.

use mongodb::bson::oid::ObjectId;

use crate::{
    models::{ApprovalStatus, CapacityInfo, Follow, Permission, RequestType},
    repositories::PermissionFilter,
    state::AppState,
    utils::{require, AppError, AppResult},
};

#[derive(Debug)]
pub enum FollowOutcome {
    Followed {
        follow: Follow,
        /// This follow took the last slot of the staff member's batch
        batch_completed: bool,
    },
    RequiresApproval {
        request: Permission,
        /// false when an identical pending request already existed
        created: bool,
    },
}

pub async fn follow_staff(
    state: &AppState,
    staff_id: &str,
    student_id: &str,
    student_name: &str,
    staff_name: &str,
) -> AppResult<FollowOutcome> {
    require(staff_id, "staffId")?;
    require(student_id, "studentId")?;

    if state.follows.find(staff_id, student_id).await?.is_some() {
        return Err(AppError::Conflict("Already following this staff member".to_string()));
    }

    let capacity = state.config.capacity;
    let current_followers = state.follows.count_for_staff(staff_id).await?;
    let follow = Follow::new(staff_id, staff_name, student_id, student_name);

    if current_followers < capacity.base_capacity {
        let follow = state.follows.insert(follow).await?;
        log::info!(
            "✅ {} now follows {} ({}/{} base slots)",
            student_id,
            staff_id,
            current_followers + 1,
            capacity.base_capacity
        );
        return Ok(FollowOutcome::Followed {
            follow,
            batch_completed: false,
        });
    }

    if has_follow_permission(state, staff_id, student_id).await? {
        let follow = state.follows.insert(follow).await?;
        log::info!("✅ {} now follows {} (approved follow permission)", student_id, staff_id);
        return Ok(FollowOutcome::Followed {
            follow,
            batch_completed: false,
        });
    }

    if let Some(batch) = state.permissions.find_open_batch(staff_id).await? {
        if let Some(batch_id) = batch.id {
            match state.permissions.reserve_batch_slot(batch_id).await? {
                Some(reserved) => return admit_through_batch(state, follow, reserved).await,
                // full but still open: an earlier completion did not go through
                None => {
                    complete_batch(state, batch_id, staff_id).await;
                }
            }
        }
    }

    request_capacity_increase(state, staff_id, staff_name, student_id, student_name).await
}

/// Insert a follow that already holds a reserved slot of `batch`.
async fn admit_through_batch(
    state: &AppState,
    mut follow: Follow,
    batch: Permission,
) -> AppResult<FollowOutcome> {
    let batch_id = batch.id.ok_or_else(|| AppError::DatabaseError("Batch without id".to_string()))?;
    follow.batch_id = Some(batch_id);

    let follow = match state.follows.insert(follow).await {
        Ok(follow) => follow,
        Err(e) => {
            if let Err(release_err) = state.permissions.release_batch_slot(batch_id).await {
                log::error!("❌ Failed to release slot of batch {}: {}", batch_id, release_err);
            }
            return Err(e.into());
        }
    };

    let batch_completed =
        batch.remaining_slots() == 0 && complete_batch(state, batch_id, &batch.staff_id).await;

    log::info!(
        "✅ {} now follows {} (batch slot {}/{})",
        follow.student_id,
        follow.staff_id,
        batch.batch.approved_count(),
        batch.batch_size
    );

    Ok(FollowOutcome::Followed {
        follow,
        batch_completed,
    })
}

/// Mark a full batch complete. Failures are only logged: the follow that
/// filled the batch is already stored, and the next follow that finds the
/// batch full tries again.
async fn complete_batch(state: &AppState, batch_id: ObjectId, staff_id: &str) -> bool {
    match state
        .permissions
        .complete_batch(batch_id, chrono::Utc::now().timestamp())
        .await
    {
        Ok(true) => {
            log::info!("🎯 Batch {} of {} is complete", batch_id, staff_id);
            true
        }
        Ok(false) => false,
        Err(e) => {
            log::error!("❌ Failed to complete batch {} of {}: {}", batch_id, staff_id, e);
            false
        }
    }
}

/// Whether an administrator approved a follow permission for this pair.
async fn has_follow_permission(state: &AppState, staff_id: &str, student_id: &str) -> AppResult<bool> {
    let approved = state
        .permissions
        .list(PermissionFilter {
            staff_id: Some(staff_id.to_string()),
            status: Some(ApprovalStatus::Approved),
            request_type: Some(RequestType::FollowPermission),
        })
        .await?;
    Ok(approved
        .iter()
        .any(|p| p.student_id.as_deref() == Some(student_id)))
}

async fn request_capacity_increase(
    state: &AppState,
    staff_id: &str,
    staff_name: &str,
    student_id: &str,
    student_name: &str,
) -> AppResult<FollowOutcome> {
    if let Some(existing) = state
        .permissions
        .find_pending(staff_id, Some(student_id), RequestType::CapacityIncrease)
        .await?
    {
        return Ok(FollowOutcome::RequiresApproval {
            request: existing,
            created: false,
        });
    }

    let mut request = Permission::new(
        RequestType::CapacityIncrease,
        staff_id,
        state.config.capacity.batch_size as i64,
    );
    request.staff_name = non_empty(staff_name);
    request.student_id = Some(student_id.to_string());
    request.student_name = non_empty(student_name);
    request.message = Some(format!(
        "{} wants to follow {} but the follower limit has been reached",
        if student_name.is_empty() { student_id } else { student_name },
        if staff_name.is_empty() { staff_id } else { staff_name },
    ));

    let request = state.permissions.insert(request).await?;
    log::warn!("⚠️  Capacity reached for {}, request {:?} filed", staff_id, request.id);

    Ok(FollowOutcome::RequiresApproval {
        request,
        created: true,
    })
}

pub async fn unfollow_staff(state: &AppState, staff_id: &str, student_id: &str) -> AppResult<()> {
    require(student_id, "studentId")?;

    if !state.follows.delete(staff_id, student_id).await? {
        return Err(AppError::NotFound("Not following this staff member".to_string()));
    }
    log::info!("👋 {} unfollowed {}", student_id, staff_id);
    Ok(())
}

pub async fn capacity(state: &AppState, staff_id: &str) -> AppResult<CapacityInfo> {
    let base = state.config.capacity.base_capacity;
    let current_followers = state.follows.count_for_staff(staff_id).await?;
    let batch = state.permissions.find_open_batch(staff_id).await?;

    let (batch_size, batch_remaining) = match &batch {
        Some(b) => (b.batch_size.max(0) as u64, b.remaining_slots() as u64),
        None => (0, 0),
    };

    Ok(CapacityInfo {
        current_followers,
        total_capacity: base + batch_size,
        available_slots: base.saturating_sub(current_followers) + batch_remaining,
        has_active_batch: batch.is_some(),
    })
}

pub async fn followers(state: &AppState, staff_id: &str) -> AppResult<Vec<Follow>> {
    Ok(state.follows.list_for_staff(staff_id).await?)
}

pub async fn following(state: &AppState, student_id: &str) -> AppResult<Vec<Follow>> {
    Ok(state.follows.list_for_student(student_id).await?)
}

pub async fn is_following(state: &AppState, staff_id: &str, student_id: &str) -> AppResult<bool> {
    Ok(state.follows.find(staff_id, student_id).await?.is_some())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
