use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: OffsetDateTime,
}

/// A user joined with their stored hash. Only the login and password
/// rotation paths load this shape.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Another account than `id` already holding this username, if any.
    pub async fn find_other_by_username(
        db: &PgPool,
        id: Uuid,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE username = $1 AND id <> $2
            "#,
        )
        .bind(username)
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Another account than `id` already holding this email, if any.
    pub async fn find_other_by_email(
        db: &PgPool,
        id: Uuid,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at
            FROM users
            WHERE email = $1 AND id <> $2
            "#,
        )
        .bind(email)
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Creates the user row and its password row in one transaction; a
    /// failure on either side rolls the whole thing back, so no user exists
    /// without a credential. A racing duplicate insert surfaces as Conflict.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique)?;

        sqlx::query(
            r#"
            INSERT INTO passwords (user_id, password_hash)
            VALUES ($1, $2)
            "#,
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Partial update: only the supplied fields appear in the statement.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = match (username, email) {
            (Some(username), Some(email)) => {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users SET username = $2, email = $3
                    WHERE id = $1
                    RETURNING id, username, email, created_at
                    "#,
                )
                .bind(id)
                .bind(username)
                .bind(email)
                .fetch_optional(db)
                .await?
            }
            (Some(username), None) => {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users SET username = $2
                    WHERE id = $1
                    RETURNING id, username, email, created_at
                    "#,
                )
                .bind(id)
                .bind(username)
                .fetch_optional(db)
                .await?
            }
            (None, Some(email)) => {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users SET email = $2
                    WHERE id = $1
                    RETURNING id, username, email, created_at
                    "#,
                )
                .bind(id)
                .bind(email)
                .fetch_optional(db)
                .await?
            }
            (None, None) => anyhow::bail!("update_profile called with no fields"),
        };
        Ok(user)
    }
}

impl Credentials {
    pub async fn find_by_username(
        db: &PgPool,
        username: &str,
    ) -> anyhow::Result<Option<Credentials>> {
        let creds = sqlx::query_as::<_, Credentials>(
            r#"
            SELECT u.id, u.username, u.email, pw.password_hash
            FROM users u
            INNER JOIN passwords pw ON u.id = pw.user_id
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(creds)
    }

    pub async fn find_by_user_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Credentials>> {
        let creds = sqlx::query_as::<_, Credentials>(
            r#"
            SELECT u.id, u.username, u.email, pw.password_hash
            FROM users u
            INNER JOIN passwords pw ON u.id = pw.user_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(creds)
    }

    /// Overwrites only the password row. Touching zero rows is an error, not
    /// a silent no-op.
    pub async fn update_password(
        db: &PgPool,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE passwords SET password_hash = $1
            WHERE user_id = $2
            "#,
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(anyhow::anyhow!(
                "no password row for user {user_id}"
            )));
        }
        Ok(())
    }
}

fn conflict_on_unique(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("This username or email has already been registered.".into())
        }
        _ => AppError::Internal(anyhow::Error::new(err)),
    }
}
