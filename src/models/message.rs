use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    pub receiver_id: String,
    pub content: String,
}

impl SendMessageRequest {
    /// Trimmed content, or why it cannot be sent
    pub fn validated_content(&self) -> Result<String, String> {
        if self.sender_id.trim().is_empty() || self.receiver_id.trim().is_empty() {
            return Err("senderId and receiverId are required".to_string());
        }
        if self.sender_id == self.receiver_id {
            return Err("Cannot send a message to yourself".to_string());
        }

        let content = self.content.trim();
        if content.is_empty() {
            return Err("Message content is required".to_string());
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(format!("Message exceeds {} characters", MAX_MESSAGE_LENGTH));
        }
        Ok(content.to_string())
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub receiver_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: i64,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        MessageResponse {
            id: message.id.map(|id| id.to_hex()).unwrap_or_default(),
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            receiver_id: message.receiver_id,
            content: message.content,
            read: message.read,
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str) -> SendMessageRequest {
        SendMessageRequest {
            sender_id: "a".into(),
            sender_name: "Asha".into(),
            receiver_id: "b".into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_content_is_trimmed() {
        assert_eq!(request("  hello  ").validated_content().unwrap(), "hello");
    }

    #[test]
    fn test_rejects_blank_and_oversized() {
        assert!(request("   ").validated_content().is_err());
        assert!(request(&"x".repeat(MAX_MESSAGE_LENGTH + 1)).validated_content().is_err());
    }

    #[test]
    fn test_rejects_self_message() {
        let mut req = request("hi");
        req.receiver_id = "a".into();
        assert!(req.validated_content().is_err());
    }
}
