use actix_web::{web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;

use crate::database::MongoDB;
use crate::models::{CreateDoubtRequest, DoubtRequest, DoubtResponse, DoubtStatus, ResolveDoubtRequest};
use crate::utils::{parse_object_id, AppError};

const DOUBTS: &str = "doubts";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/doubts")
            .route("", web::post().to(create_doubt))
            .route("/staff/{staff_id}", web::get().to(list_for_staff))
            .route("/student/{student_id}", web::get().to(list_for_student))
            .route("/{id}/resolve", web::put().to(resolve_doubt)),
    );
}

/// POST /api/doubts - a student asks a staff member a question
#[utoipa::path(
    post,
    path = "/api/doubts",
    tag = "Doubts",
    request_body = CreateDoubtRequest,
    responses(
        (status = 201, description = "Doubt created", body = DoubtResponse),
        (status = 400, description = "Missing fields")
    )
)]
pub async fn create_doubt(db: web::Data<MongoDB>, body: web::Json<CreateDoubtRequest>) -> Result<HttpResponse, AppError> {
    body.validate().map_err(AppError::InvalidRequest)?;
    let body = body.into_inner();

    let mut doubt = DoubtRequest {
        id: None,
        student_id: body.student_id,
        student_name: body.student_name,
        staff_id: body.staff_id,
        subject: body.subject.trim().to_string(),
        description: body.description.trim().to_string(),
        status: DoubtStatus::Open,
        answer: None,
        created_at: chrono::Utc::now().timestamp(),
        resolved_at: None,
    };

    let result = db.collection::<DoubtRequest>(DOUBTS).insert_one(&doubt).await?;
    doubt.id = result.inserted_id.as_object_id();
    log::info!("❓ Doubt from {} to {}: {}", doubt.student_id, doubt.staff_id, doubt.subject);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "doubt": DoubtResponse::from(doubt)
    })))
}

async fn list(db: &MongoDB, filter: mongodb::bson::Document) -> Result<HttpResponse, AppError> {
    let doubts: Vec<DoubtRequest> = db
        .collection::<DoubtRequest>(DOUBTS)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    let doubts: Vec<DoubtResponse> = doubts.into_iter().map(DoubtResponse::from).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": doubts.len(),
        "doubts": doubts
    })))
}

/// GET /api/doubts/staff/{staffId}
pub async fn list_for_staff(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    list(&db, doc! { "staff_id": path.as_str() }).await
}

/// GET /api/doubts/student/{studentId}
pub async fn list_for_student(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    list(&db, doc! { "student_id": path.as_str() }).await
}

/// PUT /api/doubts/{id}/resolve
#[utoipa::path(
    put,
    path = "/api/doubts/{id}/resolve",
    tag = "Doubts",
    params(("id" = String, Path, description = "Doubt ID")),
    request_body = ResolveDoubtRequest,
    responses(
        (status = 200, description = "Doubt resolved", body = DoubtResponse),
        (status = 404, description = "Doubt not found")
    )
)]
pub async fn resolve_doubt(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<ResolveDoubtRequest>,
) -> Result<HttpResponse, AppError> {
    let doubt_id = parse_object_id(&path, "doubt")?;
    let answer = body.answer.trim();
    if answer.is_empty() {
        return Err(AppError::InvalidRequest("Answer is required".to_string()));
    }

    let doubt = db
        .collection::<DoubtRequest>(DOUBTS)
        .find_one_and_update(
            doc! { "_id": doubt_id },
            doc! { "$set": {
                "status": "Resolved",
                "answer": answer,
                "resolved_at": chrono::Utc::now().timestamp(),
            } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("Doubt not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "doubt": DoubtResponse::from(doubt)
    })))
}
