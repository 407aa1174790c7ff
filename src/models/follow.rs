use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A student following a staff member (stored in `follows`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub staff_name: String,
    /// Capacity request whose batch admitted this follow, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<ObjectId>,
    pub created_at: i64,
}

impl Follow {
    pub fn new(staff_id: &str, staff_name: &str, student_id: &str, student_name: &str) -> Self {
        Follow {
            id: None,
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            staff_id: staff_id.to_string(),
            staff_name: staff_name.to_string(),
            batch_id: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub staff_name: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowRequest {
    pub student_id: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub staff_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub created_at: i64,
}

impl From<Follow> for FollowResponse {
    fn from(follow: Follow) -> Self {
        FollowResponse {
            id: follow.id.map(|id| id.to_hex()).unwrap_or_default(),
            student_id: follow.student_id,
            student_name: follow.student_name,
            staff_id: follow.staff_id,
            staff_name: follow.staff_name,
            batch_id: follow.batch_id.map(|id| id.to_hex()),
            created_at: follow.created_at,
        }
    }
}

/// Capacity summary for one staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacityInfo {
    pub current_followers: u64,
    pub total_capacity: u64,
    pub available_slots: u64,
    pub has_active_batch: bool,
}
