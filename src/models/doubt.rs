use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum DoubtStatus {
    Open,
    Resolved,
}

/// A student's question addressed to a staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubtRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub subject: String,
    pub description: String,
    pub status: DoubtStatus,
    pub answer: Option<String>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoubtRequest {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    pub staff_id: String,
    pub subject: String,
    pub description: String,
}

impl CreateDoubtRequest {
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("studentId", &self.student_id),
            ("staffId", &self.staff_id),
            ("subject", &self.subject),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required fields: {}", missing.join(", ")))
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResolveDoubtRequest {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoubtResponse {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub subject: String,
    pub description: String,
    pub status: DoubtStatus,
    pub answer: Option<String>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

impl From<DoubtRequest> for DoubtResponse {
    fn from(doubt: DoubtRequest) -> Self {
        DoubtResponse {
            id: doubt.id.map(|id| id.to_hex()).unwrap_or_default(),
            student_id: doubt.student_id,
            student_name: doubt.student_name,
            staff_id: doubt.staff_id,
            subject: doubt.subject,
            description: doubt.description,
            status: doubt.status,
            answer: doubt.answer,
            created_at: doubt.created_at,
            resolved_at: doubt.resolved_at,
        }
    }
}
