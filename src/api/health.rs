use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<MongoDB>) -> impl Responder {
    let database_up = db.health_check().await;

    let body = HealthResponse {
        status: if database_up { "healthy" } else { "degraded" }.to_string(),
        service: "swapknowledge-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_up { "connected" } else { "unreachable" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if database_up {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
