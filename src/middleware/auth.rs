use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::services::auth_service::verify_token;
use crate::state::AppState;
use crate::utils::AppError;

pub use crate::services::auth_service::Claims;

/// Requires `Authorization: Bearer <jwt>` and exposes the decoded
/// [`Claims`] to handlers through `web::ReqData<Claims>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(e) => {
                log::warn!("🔒 {} {} rejected: {}", req.method(), req.path(), e);
                Box::pin(async move { Err(e.into()) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::DatabaseError("Application state is not configured".to_string()))?;

    verify_token(token, &state.config.auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::services::auth_service::generate_jwt;
    use crate::state::test_config;
    use actix_web::{test, App, HttpResponse};

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    fn token() -> String {
        let user = User {
            _id: None,
            user_id: "staff-1".into(),
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            password: String::new(),
            role: Role::Staff,
            subject: None,
            bio: None,
            phone: None,
            created_at: 0,
            last_login: None,
        };
        generate_jwt(&user, &test_config().auth).unwrap()
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(test_config())))
                .service(web::scope("/me").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token())))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "staff-1");
    }

    #[actix_web::test]
    async fn test_missing_or_bad_token_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(test_config())))
                .service(web::scope("/me").wrap(AuthMiddleware).route("", web::get().to(whoami))),
        )
        .await;

        for header in [None, Some("Token abc"), Some("Bearer nonsense")] {
            let mut req = test::TestRequest::get().uri("/me");
            if let Some(value) = header {
                req = req.insert_header(("Authorization", value));
            }
            let err = test::try_call_service(&app, req.to_request()).await.unwrap_err();
            assert_eq!(err.as_response_error().status_code(), 401);
        }
    }
}
