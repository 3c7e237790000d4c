pub mod middleware;
pub mod token;

pub use middleware::{require_auth, AuthUser};
pub use token::{Claims, TokenError, TokenIssuer};
