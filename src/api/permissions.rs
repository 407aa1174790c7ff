use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::{
    PaymentApprovalRequest, PermissionQuery, PermissionResponse, SendPermissionRequest, UpdatePaymentRequest,
    UpdateStatusRequest,
};
use crate::services::{payment_service, permission_service};
use crate::state::AppState;
use crate::utils::AppError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/permissions")
            .route("/send-request/{admin_id}", web::post().to(send_request))
            .route("/requests", web::get().to(list_requests))
            .route("/requests/{id}", web::get().to(get_request))
            .route("/requests/{id}", web::put().to(update_status))
            .route("/requests/{id}", web::delete().to(delete_request))
            .route("/requests/{id}/payment-message", web::post().to(send_payment_message))
            .route("/requests/{id}/payment", web::put().to(update_payment))
            .route("/requests/{id}/payment-approval", web::put().to(review_payment)),
    );
}

fn request_json(request: impl Into<PermissionResponse>) -> serde_json::Value {
    json!({
        "success": true,
        "request": request.into()
    })
}

// ==================== REQUESTS ====================

/// POST /api/permissions/send-request/{adminId} - file a request for a staff member
#[utoipa::path(
    post,
    path = "/api/permissions/send-request/{adminId}",
    tag = "Permissions",
    params(("adminId" = String, Path, description = "Staff member the request is about")),
    request_body = SendPermissionRequest,
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Invalid input or a pending request already exists")
    )
)]
pub async fn send_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SendPermissionRequest>,
) -> Result<HttpResponse, AppError> {
    let staff_id = path.into_inner();
    log::info!("📨 POST /permissions/send-request/{}", staff_id);

    let request = permission_service::send_request(&state, &staff_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(request_json(request)))
}

/// GET /api/permissions/requests?staffId&status&requestType
#[utoipa::path(
    get,
    path = "/api/permissions/requests",
    tag = "Permissions",
    params(PermissionQuery),
    responses((status = 200, description = "Requests, newest first"))
)]
pub async fn list_requests(
    state: web::Data<AppState>,
    query: web::Query<PermissionQuery>,
) -> Result<HttpResponse, AppError> {
    let requests: Vec<PermissionResponse> = permission_service::list_requests(&state, query.into_inner())
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": requests.len(),
        "requests": requests
    })))
}

/// GET /api/permissions/requests/{id}
pub async fn get_request(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let request = permission_service::get_request(&state, &path).await?;
    Ok(HttpResponse::Ok().json(request_json(request)))
}

/// PUT /api/permissions/requests/{id} - approve, reject or reset a request
#[utoipa::path(
    put,
    path = "/api/permissions/requests/{id}",
    tag = "Permissions",
    params(("id" = String, Path, description = "Request ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = PermissionResponse),
        (status = 400, description = "Invalid status, illegal transition or a batch is already active"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 PUT /permissions/requests/{} - status: {}", path, body.status);
    let request = permission_service::update_request_status(&state, &path, &body.status).await?;
    Ok(HttpResponse::Ok().json(request_json(request)))
}

/// DELETE /api/permissions/requests/{id}
pub async fn delete_request(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    permission_service::delete_request(&state, &path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Request deleted"
    })))
}

// ==================== PAYMENT ====================

/// POST /api/permissions/requests/{id}/payment-message
#[utoipa::path(
    post,
    path = "/api/permissions/requests/{id}/payment-message",
    tag = "Permissions",
    params(("id" = String, Path, description = "Approved request ID")),
    responses(
        (status = 200, description = "Payment message generated"),
        (status = 400, description = "Request is not approved")
    )
)]
pub async fn send_payment_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let request = payment_service::send_payment_message(&state, &path).await?;
    let message = request.payment.message().map(str::to_string);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "paymentMessage": message,
        "whatsappNumber": state.config.payment.phone,
        "request": PermissionResponse::from(request)
    })))
}

/// PUT /api/permissions/requests/{id}/payment
#[utoipa::path(
    put,
    path = "/api/permissions/requests/{id}/payment",
    tag = "Permissions",
    params(("id" = String, Path, description = "Request ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment status recorded"),
        (status = 400, description = "Unknown status or no payment message sent yet")
    )
)]
pub async fn update_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = payment_service::update_payment(&state, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request_json(request)))
}

/// PUT /api/permissions/requests/{id}/payment-approval
#[utoipa::path(
    put,
    path = "/api/permissions/requests/{id}/payment-approval",
    tag = "Permissions",
    params(("id" = String, Path, description = "Request ID")),
    request_body = PaymentApprovalRequest,
    responses(
        (status = 200, description = "Payment verified or declined"),
        (status = 400, description = "Payment has not been reported")
    )
)]
pub async fn review_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PaymentApprovalRequest>,
) -> Result<HttpResponse, AppError> {
    let request = payment_service::review_payment(&state, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request_json(request)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_config;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::in_memory(test_config())))
                    .configure(configure),
            )
            .await
        };
    }

    macro_rules! create {
        ($app:expr, $staff:expr, $student:expr) => {{
            let req = test::TestRequest::post()
                .uri(&format!("/api/permissions/send-request/{}", $staff))
                .set_json(json!({ "staffName": "Ravi", "studentId": $student, "message": "need more slots" }))
                .to_request();
            let res = test::call_service(&$app, req).await;
            assert_eq!(res.status(), StatusCode::CREATED);
            let body: Value = test::read_body_json(res).await;
            body["request"]["id"].as_str().unwrap().to_string()
        }};
    }

    fn set_status(id: &str, status: &str) -> test::TestRequest {
        test::TestRequest::put()
            .uri(&format!("/api/permissions/requests/{}", id))
            .set_json(json!({ "status": status }))
    }

    #[actix_web::test]
    async fn test_approve_and_second_batch_conflict() {
        let app = app!();
        let first = create!(app, "staff-1", "s1");
        let second = create!(app, "staff-1", "s2");

        let res = test::call_service(&app, set_status(&first, "approved").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["request"]["status"], "Approved");
        assert_eq!(body["request"]["isBatchActive"], true);

        let res = test::call_service(&app, set_status(&second, "APPROVED").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = test::call_service(&app, set_status(&second, "sideways").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_list_filters_by_status() {
        let app = app!();
        let id = create!(app, "staff-1", "s1");
        create!(app, "staff-2", "s1");
        test::call_service(&app, set_status(&id, "rejected").to_request()).await;

        let req = test::TestRequest::get()
            .uri("/api/permissions/requests?status=pending")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["requests"][0]["staffId"], "staff-2");
    }

    #[actix_web::test]
    async fn test_payment_endpoints() {
        let app = app!();
        let id = create!(app, "staff-1", "s1");
        test::call_service(&app, set_status(&id, "approved").to_request()).await;

        let paid = || {
            test::TestRequest::put()
                .uri(&format!("/api/permissions/requests/{}/payment", id))
                .set_json(json!({ "paymentStatus": "Paid", "transactionId": "UTR123" }))
                .to_request()
        };
        assert_eq!(test::call_service(&app, paid()).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/api/permissions/requests/{}/payment-message", id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["paymentMessage"].as_str().unwrap().contains("Ravi"));
        assert_eq!(body["request"]["paymentMessageSent"], true);

        let body: Value = test::call_and_read_body_json(&app, paid()).await;
        assert_eq!(body["request"]["paymentStatus"], "Paid");
        assert_eq!(body["request"]["transactionId"], "UTR123");

        let req = test::TestRequest::put()
            .uri(&format!("/api/permissions/requests/{}/payment-approval", id))
            .set_json(json!({ "status": "Approved" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["request"]["paymentApprovalStatus"], "Approved");
    }

    #[actix_web::test]
    async fn test_missing_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri(&format!("/api/permissions/requests/{}", mongodb::bson::oid::ObjectId::new().to_hex()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/api/permissions/requests/not-an-id").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
