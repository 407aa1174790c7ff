pub mod doubt;
pub mod feedback;
pub mod follow;
pub mod meeting;
pub mod message;
pub mod permission;
pub mod post;
pub mod user;

pub use doubt::*;
pub use feedback::*;
pub use follow::*;
pub use meeting::*;
pub use message::*;
pub use permission::*;
pub use post::*;
pub use user::*;
