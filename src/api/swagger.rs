use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SwapKnowledge API",
        version = "1.0.0",
        description = "Backend of the SwapKnowledge tutoring platform.\n\n**Authentication:** endpoints marked with a lock need a JWT Bearer token from `/api/auth/login`.\n\n**Follower capacity:** every staff member accepts 50 followers; beyond that an approved capacity request opens a batch of 50 more slots, paid for manually."
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Auth & users
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::get_me,
        crate::api::auth::list_staff,

        // Follow
        crate::api::follow::follow,
        crate::api::follow::unfollow,
        crate::api::follow::capacity,
        crate::api::follow::followers,
        crate::api::follow::following,
        crate::api::follow::status,

        // Permissions & payment
        crate::api::permissions::send_request,
        crate::api::permissions::list_requests,
        crate::api::permissions::update_status,
        crate::api::permissions::send_payment_message,
        crate::api::permissions::update_payment,
        crate::api::permissions::review_payment,

        // Platform
        crate::api::posts::create_post,
        crate::api::posts::get_feed,
        crate::api::messages::send_message,
        crate::api::meetings::create_meeting,
        crate::api::feedback::submit_feedback,
        crate::api::feedback::get_staff_feedback,
        crate::api::doubts::create_doubt,
        crate::api::doubts::resolve_doubt,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,
            crate::models::Role,
            crate::models::FollowRequest,
            crate::models::UnfollowRequest,
            crate::models::FollowResponse,
            crate::models::CapacityInfo,
            crate::models::RequestType,
            crate::models::ApprovalStatus,
            crate::models::SendPermissionRequest,
            crate::models::UpdateStatusRequest,
            crate::models::UpdatePaymentRequest,
            crate::models::PaymentApprovalRequest,
            crate::models::PermissionResponse,
            crate::models::CreatePostRequest,
            crate::models::PostResponse,
            crate::models::SendMessageRequest,
            crate::models::MessageResponse,
            crate::models::CreateMeetingRequest,
            crate::models::MeetingResponse,
            crate::models::MeetingStatus,
            crate::models::CreateFeedbackRequest,
            crate::models::FeedbackResponse,
            crate::models::CreateDoubtRequest,
            crate::models::ResolveDoubtRequest,
            crate::models::DoubtResponse,
            crate::models::DoubtStatus,
        )
    ),
    tags(
        (name = "Health", description = "Service and database status."),
        (name = "Auth", description = "Registration, login and the current user."),
        (name = "Users", description = "Staff directory."),
        (name = "Follow", description = "Students following staff members, with follower capacity."),
        (name = "Permissions", description = "Capacity-increase requests, batch approval and manual payment."),
        (name = "Posts", description = "Paginated social feed."),
        (name = "Messages", description = "Direct messages between users."),
        (name = "Meetings", description = "Scheduled meetings with generated Meet links."),
        (name = "Feedback", description = "Student ratings of staff members."),
        (name = "Doubts", description = "Questions from students to staff."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_workflow_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/follow/follow/{staffId}",
            "/api/follow/followers/{staffId}",
            "/api/follow/following/{studentId}",
            "/api/follow/status/{staffId}/{studentId}",
            "/api/permissions/requests/{id}",
            "/api/permissions/requests/{id}/payment-approval",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
