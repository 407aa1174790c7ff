use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Role {
    Staff,
    Student,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "staff" | "admin" | "teacher" => Some(Role::Staff),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "Staff",
            Role::Student => "Student",
        }
    }
}

/// Account record (stored in `users`)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String, // PRIMARY IDENTIFIER used by follows, messages, meetings...
    pub name: String,
    pub email: String,
    pub password: String, // bcrypt hash
    pub role: Role,
    pub subject: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

/// Public profile, never includes the password hash
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub subject: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub created_at: i64,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role,
            subject: user.subject,
            bio: user.bio,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}
