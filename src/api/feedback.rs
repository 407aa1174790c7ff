use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;

use crate::database::MongoDB;
use crate::models::{average_rating, CreateFeedbackRequest, Feedback, FeedbackResponse};
use crate::utils::AppError;

const FEEDBACK: &str = "feedback";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/feedback")
            .route("", web::post().to(submit_feedback))
            .route("/staff/{staff_id}", web::get().to(get_staff_feedback)),
    );
}

/// POST /api/feedback
#[utoipa::path(
    post,
    path = "/api/feedback",
    tag = "Feedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Rating outside 1-5 or missing ids")
    )
)]
pub async fn submit_feedback(
    db: web::Data<MongoDB>,
    body: web::Json<CreateFeedbackRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(AppError::InvalidRequest)?;
    let body = body.into_inner();

    let mut feedback = Feedback {
        id: None,
        student_id: body.student_id,
        student_name: body.student_name,
        staff_id: body.staff_id,
        rating: body.rating,
        comment: body.comment.filter(|c| !c.trim().is_empty()),
        created_at: chrono::Utc::now().timestamp(),
    };

    let result = db.collection::<Feedback>(FEEDBACK).insert_one(&feedback).await?;
    feedback.id = result.inserted_id.as_object_id();
    log::info!("⭐ {} rated {} with {}", feedback.student_id, feedback.staff_id, feedback.rating);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "feedback": FeedbackResponse::from(feedback)
    })))
}

/// GET /api/feedback/staff/{staffId} - newest first, with the average rating
#[utoipa::path(
    get,
    path = "/api/feedback/staff/{staffId}",
    tag = "Feedback",
    params(("staffId" = String, Path, description = "Staff member")),
    responses((status = 200, description = "Feedback list with count and averageRating"))
)]
pub async fn get_staff_feedback(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let feedback: Vec<Feedback> = db
        .collection::<Feedback>(FEEDBACK)
        .find(doc! { "staff_id": path.as_str() })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    let feedback: Vec<FeedbackResponse> = feedback.into_iter().map(FeedbackResponse::from).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": feedback.len(),
        "averageRating": average_rating(&feedback),
        "feedback": feedback
    })))
}
