use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    pub staff_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}

impl CreateFeedbackRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.student_id.trim().is_empty() || self.staff_id.trim().is_empty() {
            return Err("studentId and staffId are required".to_string());
        }
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub staff_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: i64,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        FeedbackResponse {
            id: feedback.id.map(|id| id.to_hex()).unwrap_or_default(),
            student_id: feedback.student_id,
            student_name: feedback.student_name,
            staff_id: feedback.staff_id,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: feedback.created_at,
        }
    }
}

/// Mean rating rounded to two decimals, `None` without feedback
pub fn average_rating(feedback: &[FeedbackResponse]) -> Option<f64> {
    if feedback.is_empty() {
        return None;
    }
    let sum: i64 = feedback.iter().map(|f| f.rating as i64).sum();
    let mean = sum as f64 / feedback.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rating: i32) -> FeedbackResponse {
        FeedbackResponse {
            id: String::new(),
            student_id: "s".into(),
            student_name: "S".into(),
            staff_id: "t".into(),
            rating,
            comment: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[entry(5), entry(4), entry(4)]), Some(4.33));
    }

    #[test]
    fn test_rating_range() {
        let mut request = CreateFeedbackRequest {
            student_id: "s".into(),
            student_name: "S".into(),
            staff_id: "t".into(),
            rating: 0,
            comment: None,
        };
        assert!(request.validate().is_err());
        request.rating = 5;
        assert!(request.validate().is_ok());
        request.rating = 6;
        assert!(request.validate().is_err());
    }
}
