use crate::models::{User, UserChanges, UserPage, UserUpdate};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use std::sync::Arc;

/// bcrypt work factor, fixed for every hash the service produces.
const BCRYPT_COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must not be empty")]
    EmptyPassword,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Directory service over the credential store. Enforces the business
/// rules the store itself does not: email-conflict pre-check, existence
/// before update/delete, and password hashing.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        self.validate_email(&request.email)?;
        self.validate_password(&request.password)?;

        if self.repository.exists_by_email(&request.email).await? {
            return Err(UserServiceError::EmailTaken);
        }

        let password_hash = hash_password(request.password).await?;

        // The pre-check above is not transactional with the insert. A
        // concurrent registration can still lose the race, in which case the
        // store's unique constraint reports AlreadyExists and we surface the
        // same conflict as the pre-check would have.
        match self.repository.create(&request.email, &password_hash).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Unlike the raw repository read, a missing id here is an error.
    pub async fn find_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    pub async fn update_user(
        &self,
        id: i64,
        update: UserUpdate,
    ) -> Result<User, UserServiceError> {
        // Existence first, so an update of a missing id never touches rows.
        self.find_by_id(id).await?;

        if let Some(ref email) = update.email {
            self.validate_email(email)?;
        }

        let password_hash = match update.password {
            Some(password) => {
                self.validate_password(&password)?;
                Some(hash_password(password).await?)
            }
            None => None,
        };

        let changes = UserChanges {
            email: update.email,
            password_hash,
        };

        match self.repository.update(id, changes).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::EmailTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn delete_user(&self, id: i64) -> Result<User, UserServiceError> {
        self.find_by_id(id).await?;

        match self.repository.delete(id).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Page numbers are 1-indexed; out-of-range pages simply come back empty.
    /// Page and limit arrive straight from the query string, so the offset
    /// math saturates instead of trusting the caller to stay in range.
    pub async fn get_users(&self, page: i64, limit: i64) -> Result<UserPage, UserServiceError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let skip = (page - 1).saturating_mul(limit);

        let users = self.repository.list(skip, limit).await?;
        let total = self.repository.count().await?;
        let total_pages = if total == 0 { 0 } else { (total - 1) / limit + 1 };

        Ok(UserPage {
            users: users.into_iter().map(Into::into).collect(),
            total,
            page,
            total_pages,
        })
    }

    /// Credential check for login. Returns None for an unknown email and for
    /// a wrong password alike; callers cannot tell the two apart, which is
    /// what keeps account enumeration out of the login endpoint.
    pub async fn validate_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let user = match self.repository.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let matches = verify_password(password.to_string(), user.password_hash.clone()).await?;
        Ok(matches.then_some(user))
    }

    fn validate_email(&self, email: &str) -> Result<(), UserServiceError> {
        if email.is_empty() || email.len() > 255 || !email.contains('@') {
            return Err(UserServiceError::InvalidEmail);
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), UserServiceError> {
        if password.is_empty() {
            return Err(UserServiceError::EmptyPassword);
        }
        Ok(())
    }
}

/// bcrypt is CPU-bound; run it on the blocking pool so an in-flight hash
/// never stalls unrelated requests on the async runtime.
async fn hash_password(password: String) -> Result<String, UserServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| UserServiceError::HashingError(e.to_string()))?
        .map_err(|e| UserServiceError::HashingError(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, UserServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| UserServiceError::HashingError(e.to_string()))?
        .map_err(|e| UserServiceError::HashingError(e.to_string()))
}
