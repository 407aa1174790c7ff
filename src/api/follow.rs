use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::{CapacityInfo, FollowRequest, FollowResponse, PermissionResponse, UnfollowRequest};
use crate::services::follow_service::{self, FollowOutcome};
use crate::state::AppState;
use crate::utils::AppError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/follow")
            .route("/follow/{staff_id}", web::post().to(follow))
            .route("/unfollow/{staff_id}", web::delete().to(unfollow))
            .route("/capacity/{staff_id}", web::get().to(capacity))
            .route("/followers/{staff_id}", web::get().to(followers))
            .route("/following/{student_id}", web::get().to(following))
            .route("/status/{staff_id}/{student_id}", web::get().to(status)),
    );
}

/// POST /api/follow/follow/{staffId} - follow a staff member
#[utoipa::path(
    post,
    path = "/api/follow/follow/{staffId}",
    tag = "Follow",
    params(("staffId" = String, Path, description = "Staff member to follow")),
    request_body = FollowRequest,
    responses(
        (status = 201, description = "Now following"),
        (status = 403, description = "Follower limit reached, a capacity request was filed"),
        (status = 400, description = "Already following or invalid input")
    )
)]
pub async fn follow(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<FollowRequest>,
) -> Result<HttpResponse, AppError> {
    let staff_id = path.into_inner();
    let body = body.into_inner();
    log::info!("➕ POST /follow/{} - student: {}", staff_id, body.student_id);

    let outcome = follow_service::follow_staff(
        &state,
        &staff_id,
        &body.student_id,
        &body.student_name,
        &body.staff_name,
    )
    .await?;

    Ok(match outcome {
        FollowOutcome::Followed {
            follow,
            batch_completed,
        } => HttpResponse::Created().json(json!({
            "success": true,
            "follow": FollowResponse::from(follow),
            "batchCompleted": batch_completed
        })),
        FollowOutcome::RequiresApproval { request, created } => {
            let message = if created {
                "Follower limit reached. A request for more capacity has been sent to the administrator."
            } else {
                "Follower limit reached. Your request is still waiting for approval."
            };
            HttpResponse::Forbidden().json(json!({
                "success": false,
                "requiresApproval": true,
                "message": message,
                "request": PermissionResponse::from(request)
            }))
        }
    })
}

/// DELETE /api/follow/unfollow/{staffId}
#[utoipa::path(
    delete,
    path = "/api/follow/unfollow/{staffId}",
    tag = "Follow",
    params(("staffId" = String, Path, description = "Staff member to unfollow")),
    request_body = UnfollowRequest,
    responses(
        (status = 200, description = "Unfollowed"),
        (status = 404, description = "Not following this staff member")
    )
)]
pub async fn unfollow(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UnfollowRequest>,
) -> Result<HttpResponse, AppError> {
    let staff_id = path.into_inner();
    follow_service::unfollow_staff(&state, &staff_id, &body.student_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Unfollowed successfully"
    })))
}

/// GET /api/follow/capacity/{staffId}
#[utoipa::path(
    get,
    path = "/api/follow/capacity/{staffId}",
    tag = "Follow",
    params(("staffId" = String, Path, description = "Staff member")),
    responses((status = 200, description = "Capacity summary", body = CapacityInfo))
)]
pub async fn capacity(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let info = follow_service::capacity(&state, &path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "capacity": info
    })))
}

/// GET /api/follow/followers/{staffId}
#[utoipa::path(
    get,
    path = "/api/follow/followers/{staffId}",
    tag = "Follow",
    params(("staffId" = String, Path, description = "Staff member")),
    responses((status = 200, description = "Followers of the staff member, newest first"))
)]
pub async fn followers(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let followers: Vec<FollowResponse> = follow_service::followers(&state, &path)
        .await?
        .into_iter()
        .map(FollowResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": followers.len(),
        "followers": followers
    })))
}

/// GET /api/follow/following/{studentId}
#[utoipa::path(
    get,
    path = "/api/follow/following/{studentId}",
    tag = "Follow",
    params(("studentId" = String, Path, description = "Student")),
    responses((status = 200, description = "Staff members the student follows"))
)]
pub async fn following(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let following: Vec<FollowResponse> = follow_service::following(&state, &path)
        .await?
        .into_iter()
        .map(FollowResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": following.len(),
        "following": following
    })))
}

/// GET /api/follow/status/{staffId}/{studentId}
#[utoipa::path(
    get,
    path = "/api/follow/status/{staffId}/{studentId}",
    tag = "Follow",
    params(
        ("staffId" = String, Path, description = "Staff member"),
        ("studentId" = String, Path, description = "Student")
    ),
    responses((status = 200, description = "Whether the student follows the staff member"))
)]
pub async fn status(state: web::Data<AppState>, path: web::Path<(String, String)>) -> Result<HttpResponse, AppError> {
    let (staff_id, student_id) = path.into_inner();
    let is_following = follow_service::is_following(&state, &staff_id, &student_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "isFollowing": is_following
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapacityConfig;
    use crate::state::test_config;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    fn small_state() -> AppState {
        let mut config = test_config();
        config.capacity = CapacityConfig {
            base_capacity: 2,
            batch_size: 2,
        };
        AppState::in_memory(config)
    }

    fn follow_req(staff_id: &str, student_id: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(&format!("/api/follow/follow/{}", staff_id))
            .set_json(json!({ "studentId": student_id, "studentName": "Student", "staffName": "Ravi" }))
    }

    #[actix_web::test]
    async fn test_follow_until_approval_required() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(small_state()))
                .configure(configure),
        )
        .await;

        for student in ["s1", "s2"] {
            let res = test::call_service(&app, follow_req("staff-1", student).to_request()).await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let res = test::call_service(&app, follow_req("staff-1", "s3").to_request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["requiresApproval"], true);
        assert_eq!(body["request"]["requestType"], "CapacityIncrease");
        assert_eq!(body["request"]["batchSize"], 2);

        let res = test::call_service(&app, follow_req("staff-1", "s1").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_capacity_status_and_unfollow() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(small_state()))
                .configure(configure),
        )
        .await;
        test::call_service(&app, follow_req("staff-1", "s1").to_request()).await;

        let req = test::TestRequest::get().uri("/api/follow/capacity/staff-1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["capacity"]["currentFollowers"], 1);
        assert_eq!(body["capacity"]["availableSlots"], 1);

        let req = test::TestRequest::get().uri("/api/follow/status/staff-1/s1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["isFollowing"], true);

        let req = test::TestRequest::delete()
            .uri("/api/follow/unfollow/staff-1")
            .set_json(json!({ "studentId": "s1" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/api/follow/unfollow/staff-1")
            .set_json(json!({ "studentId": "s1" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
