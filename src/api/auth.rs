use actix_web::{web, HttpResponse};
use mongodb::bson::doc;

use crate::database::MongoDB;
use crate::middleware::{auth::Claims, AuthMiddleware};
use crate::models::{User, UserInfo};
use crate::services::auth_service::{self, AuthResponse, LoginRequest, RegisterRequest, USERS};
use crate::state::AppState;
use crate::utils::AppError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .service(
                web::scope("/me")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(get_me)),
            ),
    )
    .service(
        web::scope("/api/users")
            .route("/staff", web::get().to(list_staff))
            .route("/{user_id}", web::get().to(get_user)),
    );
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    let response = auth_service::login(&db, &state.config.auth, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request or user already exists")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /auth/register - email: {}", email);

    match auth_service::register(&db, &state.config.auth, &request).await {
        Ok(response) => Ok(HttpResponse::Created().json(response)),
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> Result<HttpResponse, AppError> {
    let user = auth_service::get_current_user(&db, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user
    })))
}

/// GET /api/users/staff - staff directory
#[utoipa::path(
    get,
    path = "/api/users/staff",
    tag = "Users",
    responses((status = 200, description = "All staff members"))
)]
pub async fn list_staff(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let staff = auth_service::list_staff(&db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": staff.len(),
        "staff": staff
    })))
}

/// GET /api/users/{userId}
pub async fn get_user(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "user_id": path.as_str() })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserInfo::from(user)
    })))
}
