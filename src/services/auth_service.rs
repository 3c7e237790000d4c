use crate::auth::token::{TokenError, TokenIssuer};
use crate::models::{AuthResponse, PublicUser};
use crate::services::user_service::{CreateUserRequest, UserService, UserServiceError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Same message for an unknown email and a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error(transparent)]
    User(#[from] UserServiceError),
}

/// Orchestrates registration and login: user creation and lookup go through
/// the directory service, token minting through the issuer.
pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(users: Arc<UserService>, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    pub async fn register(
        &self,
        email: String,
        password: String,
    ) -> Result<AuthResponse, AuthServiceError> {
        let user = self
            .users
            .create_user(CreateUserRequest { email, password })
            .await?;

        let user = PublicUser::from(user);
        let access_token = self.tokens.sign(&user)?;

        Ok(AuthResponse { user, access_token })
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthServiceError> {
        let user = self
            .users
            .validate_user_password(email, password)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let user = PublicUser::from(user);
        let access_token = self.tokens.sign(&user)?;

        Ok(AuthResponse { user, access_token })
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<PublicUser, AuthServiceError> {
        let user = self.users.find_by_id(user_id).await?;
        Ok(user.into())
    }
}
