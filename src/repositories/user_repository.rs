use crate::models::{Role, User, UserChanges, UserRow};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("User not found")]
    NotFound,
    #[error("User already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// Insert a user together with the default USER role assignment.
    async fn create(&self, email: &str, password_hash: &str) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool>;
    async fn update(&self, id: i64, changes: UserChanges) -> RepositoryResult<User>;
    async fn delete(&self, id: i64) -> RepositoryResult<User>;
    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<User>>;
    async fn count(&self) -> RepositoryResult<i64>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn roles_for(&self, user_id: i64) -> RepositoryResult<Vec<Role>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // Unknown role names are skipped rather than failing the whole read.
        Ok(names.iter().filter_map(|n| Role::from_str(n)).collect())
    }

    async fn fetch_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let roles = self.roles_for(row.id).await?;
                Ok(Some(row.with_roles(roles)))
            }
            None => Ok(None),
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, email: &str, password_hash: &str) -> RepositoryResult<User> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await;

        let id = match result {
            Ok(res) => res.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => return Err(RepositoryError::AlreadyExists),
            Err(e) => return Err(RepositoryError::Database(e)),
        };

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(id)
            .bind(Role::User.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.fetch_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        self.fetch_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let roles = self.roles_for(row.id).await?;
                Ok(Some(row.with_roles(roles)))
            }
            None => Ok(None),
        }
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> RepositoryResult<User> {
        if changes.email.is_none() && changes.password_hash.is_none() {
            return self.fetch_by_id(id).await?.ok_or(RepositoryError::NotFound);
        }

        let result = sqlx::query(
            "UPDATE users SET \
                 email = COALESCE(?, email), \
                 password_hash = COALESCE(?, password_hash) \
             WHERE id = ?",
        )
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) if res.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => self.fetch_by_id(id).await?.ok_or(RepositoryError::NotFound),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::AlreadyExists),
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    async fn delete(&self, id: i64) -> RepositoryResult<User> {
        let removed = self.fetch_by_id(id).await?.ok_or(RepositoryError::NotFound)?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(removed)
    }

    async fn list(&self, offset: i64, limit: i64) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at \
             FROM users \
             ORDER BY created_at DESC, id DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let roles = self.roles_for(row.id).await?;
            users.push(row.with_roles(roles));
        }

        Ok(users)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }
}
