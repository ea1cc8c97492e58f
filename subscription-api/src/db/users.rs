//! PostgreSQL user repository

use async_trait::async_trait;
use shared::models::User;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DbError, DbResult, NewUser, UserChanges, UserFilter, UserRepository};

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, active, created_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE wildcards escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> DbResult<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, phone, password_hash, active, created_at)
             VALUES ($1, $2, $3, $4, $5, TRUE, NOW())
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self, filter: &UserFilter, limit: i64, offset: i64) -> DbResult<Vec<User>> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1)
             ORDER BY created_at DESC, id
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count(&self, filter: &UserFilter) -> DbResult<i64> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users
             WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1)",
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                name = COALESCE($1, name),
                phone = COALESCE($2, phone),
                password_hash = COALESCE($3, password_hash)
             WHERE id = $4
             RETURNING {USER_COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.phone)
        .bind(changes.password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    async fn soft_delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ana"), "%ana%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
