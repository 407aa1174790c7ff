use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const MAX_POST_LENGTH: usize = 5000;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    pub image_url: Option<String>,
}

impl CreatePostRequest {
    pub fn validated_content(&self) -> Result<String, String> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err("Post content cannot be empty".to_string());
        }
        if content.chars().count() > MAX_POST_LENGTH {
            return Err(format!("Post content cannot exceed {} characters", MAX_POST_LENGTH));
        }
        Ok(content.to_string())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl FeedQuery {
    /// (page, limit) with page starting at 1 and limit clamped to 1..=50.
    /// Pages past `MAX_PAGE` are rejected so offsets stay small.
    pub fn normalized(&self) -> Result<(u64, u64), String> {
        let page = self.page.unwrap_or(1).max(1);
        if page > MAX_PAGE {
            return Err(format!("page cannot exceed {}", MAX_PAGE));
        }
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Ok((page, limit))
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes: Vec<String>,
    pub like_count: usize,
    pub created_at: i64,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        PostResponse {
            id: post.id.map(|id| id.to_hex()).unwrap_or_default(),
            like_count: post.likes.len(),
            author_id: post.author_id,
            author_name: post.author_name,
            content: post.content,
            image_url: post.image_url,
            likes: post.likes,
            created_at: post.created_at,
        }
    }
}
