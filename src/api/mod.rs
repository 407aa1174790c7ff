pub mod auth;
pub mod doubts;
pub mod feedback;
pub mod follow;
pub mod health;
pub mod meetings;
pub mod messages;
pub mod permissions;
pub mod posts;
pub mod swagger;
