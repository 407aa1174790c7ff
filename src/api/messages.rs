use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;

use crate::database::MongoDB;
use crate::models::{Message, MessageResponse, SendMessageRequest};
use crate::utils::{parse_object_id, AppError};

const MESSAGES: &str = "messages";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/messages")
            .route("", web::post().to(send_message))
            .route("/conversation/{user_a}/{user_b}", web::get().to(get_conversation))
            .route("/inbox/{user_id}", web::get().to(get_inbox))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}

async fn find_messages(
    db: &MongoDB,
    filter: mongodb::bson::Document,
    order: i32,
) -> Result<Vec<MessageResponse>, AppError> {
    let messages: Vec<Message> = db
        .collection::<Message>(MESSAGES)
        .find(filter)
        .sort(doc! { "created_at": order })
        .await?
        .try_collect()
        .await?;

    Ok(messages.into_iter().map(MessageResponse::from).collect())
}

/// POST /api/messages
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Empty, oversized or self-addressed message")
    )
)]
pub async fn send_message(
    db: web::Data<MongoDB>,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let content = body.validated_content().map_err(AppError::InvalidRequest)?;

    let mut message = Message {
        id: None,
        sender_id: body.sender_id.trim().to_string(),
        sender_name: body.sender_name.clone(),
        receiver_id: body.receiver_id.trim().to_string(),
        content,
        read: false,
        created_at: chrono::Utc::now().timestamp(),
    };

    let result = db.collection::<Message>(MESSAGES).insert_one(&message).await?;
    message.id = result.inserted_id.as_object_id();
    log::info!("✉️  Message {} -> {}", message.sender_id, message.receiver_id);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": MessageResponse::from(message)
    })))
}

/// GET /api/messages/conversation/{userA}/{userB} - oldest first
pub async fn get_conversation(
    db: web::Data<MongoDB>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (user_a, user_b) = path.into_inner();
    let filter = doc! {
        "$or": [
            { "sender_id": &user_a, "receiver_id": &user_b },
            { "sender_id": &user_b, "receiver_id": &user_a },
        ]
    };

    let messages = find_messages(&db, filter, 1).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": messages.len(),
        "messages": messages
    })))
}

/// GET /api/messages/inbox/{userId} - newest first
pub async fn get_inbox(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let messages = find_messages(&db, doc! { "receiver_id": path.as_str() }, -1).await?;
    let unread = messages.iter().filter(|m| !m.read).count();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": messages.len(),
        "unread": unread,
        "messages": messages
    })))
}

/// PUT /api/messages/{id}/read
pub async fn mark_read(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let message_id = parse_object_id(&path, "message")?;

    let result = db
        .collection::<Message>(MESSAGES)
        .update_one(doc! { "_id": message_id }, doc! { "$set": { "read": true } })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Message not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Message marked as read"
    })))
}
