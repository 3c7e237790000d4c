pub mod auth_handlers;
pub mod user_handlers;

pub use auth_handlers::{login, profile, register};
pub use user_handlers::{delete_user, get_user, list_users, update_user};
