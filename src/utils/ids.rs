use mongodb::bson::oid::ObjectId;

use super::error::AppError;

/// Parse a hex ObjectId coming from a path segment.
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::InvalidRequest(format!("Invalid {} ID", what)))
}

/// Reject blank identifiers in request bodies.
pub fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}
