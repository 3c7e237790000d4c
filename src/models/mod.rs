pub mod user;

pub use user::{
    AuthResponse, LoginRequest, PublicUser, RegisterRequest, Role, User, UserChanges, UserPage,
    UserRow, UserUpdate,
};
