use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;

use crate::database::MongoDB;
use crate::models::{CreateMeetingRequest, Meeting, MeetingResponse, MeetingStatus};
use crate::services::meeting_service;
use crate::utils::{parse_object_id, AppError};

const MEETINGS: &str = "meetings";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/meetings")
            .route("", web::post().to(create_meeting))
            .route("/staff/{staff_id}", web::get().to(list_for_staff))
            .route("/student/{student_id}", web::get().to(list_for_student))
            .route("/{id}/cancel", web::put().to(cancel_meeting)),
    );
}

/// POST /api/meetings - schedule a meeting with a generated Meet link
#[utoipa::path(
    post,
    path = "/api/meetings",
    tag = "Meetings",
    request_body = CreateMeetingRequest,
    responses(
        (status = 201, description = "Meeting scheduled", body = MeetingResponse),
        (status = 400, description = "Past date, bad duration or missing fields")
    )
)]
pub async fn create_meeting(
    db: web::Data<MongoDB>,
    body: web::Json<CreateMeetingRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate(chrono::Utc::now()).map_err(AppError::InvalidRequest)?;
    let body = body.into_inner();

    let mut meeting = Meeting {
        id: None,
        duration_minutes: body.duration(),
        staff_id: body.staff_id.trim().to_string(),
        staff_name: body.staff_name,
        student_ids: body.student_ids,
        title: body.title.trim().to_string(),
        description: body.description,
        meet_link: meeting_service::generate_meet_link(),
        scheduled_at: body.scheduled_at.timestamp(),
        status: MeetingStatus::Scheduled,
        created_at: chrono::Utc::now().timestamp(),
    };

    let result = db.collection::<Meeting>(MEETINGS).insert_one(&meeting).await?;
    meeting.id = result.inserted_id.as_object_id();
    log::info!("📅 Meeting '{}' scheduled by {} ({})", meeting.title, meeting.staff_id, meeting.meet_link);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "meeting": MeetingResponse::from(meeting)
    })))
}

async fn list(db: &MongoDB, filter: mongodb::bson::Document) -> Result<HttpResponse, AppError> {
    let meetings: Vec<Meeting> = db
        .collection::<Meeting>(MEETINGS)
        .find(filter)
        .sort(doc! { "scheduled_at": 1 })
        .await?
        .try_collect()
        .await?;

    let meetings: Vec<MeetingResponse> = meetings.into_iter().map(MeetingResponse::from).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": meetings.len(),
        "meetings": meetings
    })))
}

/// GET /api/meetings/staff/{staffId}
pub async fn list_for_staff(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    list(&db, doc! { "staff_id": path.as_str() }).await
}

/// GET /api/meetings/student/{studentId}
pub async fn list_for_student(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    // matches array members
    list(&db, doc! { "student_ids": path.as_str() }).await
}

/// PUT /api/meetings/{id}/cancel
pub async fn cancel_meeting(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let meeting_id = parse_object_id(&path, "meeting")?;

    let meeting = db
        .collection::<Meeting>(MEETINGS)
        .find_one_and_update(
            doc! { "_id": meeting_id },
            doc! { "$set": { "status": "Cancelled" } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Meeting not found".to_string()))?;

    log::info!("🚫 Meeting {} cancelled", path);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "meeting": MeetingResponse::from(meeting)
    })))
}
