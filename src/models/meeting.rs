use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum MeetingStatus {
    Scheduled,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub staff_id: String,
    pub staff_name: String,
    pub student_ids: Vec<String>,
    pub title: String,
    pub description: Option<String>,
    pub meet_link: String,
    /// Unix timestamp (seconds)
    pub scheduled_at: i64,
    pub duration_minutes: i64,
    pub status: MeetingStatus,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub staff_id: String,
    #[serde(default)]
    pub staff_name: String,
    #[serde(default)]
    pub student_ids: Vec<String>,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
}

impl CreateMeetingRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), String> {
        if self.staff_id.trim().is_empty() {
            return Err("staffId is required".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("Meeting title is required".to_string());
        }
        if self.scheduled_at <= now {
            return Err("Meeting must be scheduled in the future".to_string());
        }

        let duration = self.duration();
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration) {
            return Err(format!(
                "Duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            ));
        }
        Ok(())
    }

    pub fn duration(&self) -> i64 {
        self.duration_minutes.unwrap_or(60)
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResponse {
    pub id: String,
    pub staff_id: String,
    pub staff_name: String,
    pub student_ids: Vec<String>,
    pub title: String,
    pub description: Option<String>,
    pub meet_link: String,
    pub scheduled_at: String,
    pub duration_minutes: i64,
    pub status: MeetingStatus,
    pub created_at: i64,
}

impl From<Meeting> for MeetingResponse {
    fn from(meeting: Meeting) -> Self {
        let scheduled_at = DateTime::<Utc>::from_timestamp(meeting.scheduled_at, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        MeetingResponse {
            id: meeting.id.map(|id| id.to_hex()).unwrap_or_default(),
            staff_id: meeting.staff_id,
            staff_name: meeting.staff_name,
            student_ids: meeting.student_ids,
            title: meeting.title,
            description: meeting.description,
            meet_link: meeting.meet_link,
            scheduled_at,
            duration_minutes: meeting.duration_minutes,
            status: meeting.status,
            created_at: meeting.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(offset: Duration, duration: Option<i64>) -> CreateMeetingRequest {
        CreateMeetingRequest {
            staff_id: "staff-1".into(),
            staff_name: "Ravi".into(),
            student_ids: vec!["s1".into()],
            title: "Algebra revision".into(),
            description: None,
            scheduled_at: Utc::now() + offset,
            duration_minutes: duration,
        }
    }

    #[test]
    fn test_future_meeting_is_valid() {
        assert!(request(Duration::hours(2), None).validate(Utc::now()).is_ok());
    }

    #[test]
    fn test_past_meeting_is_rejected() {
        assert!(request(Duration::hours(-1), None).validate(Utc::now()).is_err());
    }

    #[test]
    fn test_duration_bounds() {
        assert!(request(Duration::hours(1), Some(10)).validate(Utc::now()).is_err());
        assert!(request(Duration::hours(1), Some(241)).validate(Utc::now()).is_err());
        assert!(request(Duration::hours(1), Some(240)).validate(Utc::now()).is_ok());
    }
}
