use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;

use crate::database::MongoDB;
use crate::middleware::{auth::Claims, AuthMiddleware};
use crate::models::{CreatePostRequest, FeedQuery, Post, PostResponse};
use crate::utils::{parse_object_id, AppError};

const POSTS: &str = "posts";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/posts")
            .wrap(AuthMiddleware)
            .route("", web::get().to(get_feed))
            .route("", web::post().to(create_post))
            .route("/{id}/like", web::post().to(toggle_like))
            .route("/{id}", web::delete().to(delete_post)),
    );
}

/// POST /api/posts - publish a post as the authenticated user
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Empty or oversized content")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let content = body.validated_content().map_err(AppError::InvalidRequest)?;

    let mut post = Post {
        id: None,
        author_id: claims.sub.clone(),
        author_name: claims.name.clone(),
        content,
        image_url: body.image_url.clone().filter(|url| !url.trim().is_empty()),
        likes: Vec::new(),
        created_at: chrono::Utc::now().timestamp(),
    };

    let result = db.collection::<Post>(POSTS).insert_one(&post).await?;
    post.id = result.inserted_id.as_object_id();
    log::info!("📰 New post by {}", claims.sub);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "post": PostResponse::from(post)
    })))
}

/// GET /api/posts?page&limit - newest first
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "One page of the feed"),
        (status = 400, description = "Page out of range")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_feed(db: web::Data<MongoDB>, query: web::Query<FeedQuery>) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.normalized().map_err(AppError::InvalidRequest)?;
    let collection = db.collection::<Post>(POSTS);

    let total = collection.count_documents(doc! {}).await?;
    let posts: Vec<Post> = collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .skip((page - 1) * limit)
        .limit(limit as i64)
        .await?
        .try_collect()
        .await?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "posts": posts,
        "page": page,
        "limit": limit,
        "total": total,
        "hasMore": page * limit < total
    })))
}

/// POST /api/posts/{id}/like - like, or take back a like
pub async fn toggle_like(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_object_id(&path, "post")?;
    let collection = db.collection::<Post>(POSTS);
    let user_id = claims.sub.as_str();

    let liked = collection
        .find_one_and_update(
            doc! { "_id": post_id, "likes": { "$ne": user_id } },
            doc! { "$addToSet": { "likes": user_id } },
        )
        .return_document(ReturnDocument::After)
        .await?;

    let (post, liked) = match liked {
        Some(post) => (post, true),
        None => {
            let post = collection
                .find_one_and_update(doc! { "_id": post_id }, doc! { "$pull": { "likes": user_id } })
                .return_document(ReturnDocument::After)
                .await?
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
            (post, false)
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "liked": liked,
        "likeCount": post.likes.len()
    })))
}

/// DELETE /api/posts/{id} - authors only
pub async fn delete_post(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_object_id(&path, "post")?;
    let collection = db.collection::<Post>(POSTS);

    let result = collection
        .delete_one(doc! { "_id": post_id, "author_id": &claims.sub })
        .await?;

    if result.deleted_count == 0 {
        return match collection.find_one(doc! { "_id": post_id }).await? {
            Some(_) => Err(AppError::Forbidden("Only the author can delete this post".to_string())),
            None => Err(AppError::NotFound("Post not found".to_string())),
        };
    }

    log::info!("🗑️  Post {} deleted by {}", path, claims.sub);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Post deleted"
    })))
}
