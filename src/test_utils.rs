pub mod test_helpers {
    use crate::auth::token::TokenIssuer;
    use crate::models::Role;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

    pub const TEST_PRIVATE_PEM: &str = include_str!("../tests/keys/test_private.pem");
    pub const TEST_PUBLIC_PEM: &str = include_str!("../tests/keys/test_public.pem");

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Token issuer backed by the checked-in RSA test key pair
    pub fn create_test_issuer() -> TokenIssuer {
        TokenIssuer::from_pem(TEST_PRIVATE_PEM.as_bytes(), TEST_PUBLIC_PEM.as_bytes())
            .expect("test key pair should parse")
    }

    /// Insert a test user with a bcrypt-hashed password and the default role
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        // Minimum cost keeps the test suite fast; production hashing goes
        // through UserService with the fixed work factor.
        let password_hash = bcrypt::hash(password, 4)
            .map_err(|e| sqlx::Error::Configuration(format!("bcrypt failed: {}", e).into()))?;

        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(pool)
            .await?;

        let id = result.last_insert_rowid();

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(id)
            .bind(Role::User.as_str())
            .execute(pool)
            .await?;

        Ok(id)
    }
}
