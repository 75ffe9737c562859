//! Handle database requests.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::user::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database, returning its assigned id.
    pub async fn insert(&self, user: &User) -> Result<i64> {
        let result = sqlx::query(
            r#"INSERT INTO users (name, email, identity_url, sex, favorite, created_at)
                VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.identity_url)
        .bind(user.sex)
        .bind(&user.favorite)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Find the active user linked to `identity_url`.
    pub async fn find_by_identity(
        &self,
        identity_url: &str,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users WHERE identity_url = ? AND deleted_at IS NULL"#,
        )
        .bind(identity_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update current user.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET name = ?, email = ?, sex = ?, favorite = ? WHERE id = ?"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.sex)
        .bind(&user.favorite)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retire current user: the row is retained, the identity unlinked so the
    /// session stops resolving and the identity URL may be claimed again.
    pub async fn delete(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"UPDATE users SET identity_url = NULL, deleted_at = ? WHERE id = ?"#,
        )
        .bind(chrono::Utc::now().naive_utc())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All active users of the opposite sex, ascending by id.
    pub async fn matches_for(&self, user: &User) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"SELECT * FROM users
                WHERE sex <> ? AND identity_url IS NOT NULL
                ORDER BY id ASC"#,
        )
        .bind(user.sex)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
