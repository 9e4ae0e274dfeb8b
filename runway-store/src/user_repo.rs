use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use runway_core::repository::{StoreResult, UserRepository};
use runway_core::{StoreError, UserAccount};

use crate::database::{map_sqlx_error, read_error};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USERS} WHERE {column} = $1"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(e, "user"))?;

        Ok(row.map(UserAccount::from))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    name: String,
    password_hash: String,
    user_role: bool,
    master_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: row.id,
            username: row.username,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role: row.user_role,
            master_admin: row.master_admin,
            created_at: row.created_at,
        }
    }
}

const SELECT_USERS: &str =
    "SELECT id, username, email, name, password_hash, user_role, master_admin, created_at FROM users";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert_user(&self, user: &UserAccount) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, name, password_hash, user_role, master_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.master_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx_error(
                e,
                "user",
                &[("username", user.username.as_str()), ("email", user.email.as_str())],
            )
        })?;

        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USERS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(e, "user"))?;

        Ok(row.map(UserAccount::from))
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        self.fetch_one_by("username", username).await
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        self.fetch_one_by("email", email).await
    }

    async fn set_user_role(&self, id: Uuid, role: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET user_role = $1 WHERE id = $2")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| read_error(e, "user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| read_error(e, "user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        Ok(())
    }
}
