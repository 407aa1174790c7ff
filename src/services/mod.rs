pub mod auth_service;
pub mod follow_service;
pub mod meeting_service;
pub mod payment_service;
pub mod permission_service;
