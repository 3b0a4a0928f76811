use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{TodoStore, UserStore};
use crate::error::AppError;
use crate::models::{Todo, User};

const USER_COLUMNS: &str =
    "id, email, password_hash, todo_ids, session_token, created_at, updated_at";
const TODO_COLUMNS: &str = "id, owner_id, text, created_at, updated_at";

/// Identity Store backed by the `users` table. The reference set lives in the
/// `todo_ids UUID[]` column.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_exists(&self, user_id: Uuid, rows_affected: u64) -> Result<(), AppError> {
        if rows_affected > 0 || self.find_by_id(user_id).await?.is_some() {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("No user found with ID {}", user_id)))
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: User) -> Result<User, AppError> {
        // A unique violation on `email` surfaces as AppError::Conflict via From<sqlx::Error>.
        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, todo_ids, session_token, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.todo_ids)
        .bind(&user.session_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn ids(&self) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn add_todo_ref(&self, user_id: Uuid, todo_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users
             SET todo_ids = array_append(todo_ids, $2), updated_at = NOW()
             WHERE id = $1 AND NOT ($2 = ANY(todo_ids))",
        )
        .bind(user_id)
        .bind(todo_id)
        .execute(&self.pool)
        .await?;
        self.ensure_exists(user_id, result.rows_affected()).await
    }

    async fn remove_todo_ref(&self, user_id: Uuid, todo_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users
             SET todo_ids = array_remove(todo_ids, $2), updated_at = NOW()
             WHERE id = $1 AND $2 = ANY(todo_ids)",
        )
        .bind(user_id)
        .bind(todo_id)
        .execute(&self.pool)
        .await?;
        self.ensure_exists(user_id, result.rows_affected()).await
    }

    async fn replace_todo_refs(
        &self,
        user_id: Uuid,
        todo_ids: Vec<Uuid>,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET todo_ids = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(&todo_ids)
                .execute(&self.pool)
                .await?;
        self.ensure_exists(user_id, result.rows_affected()).await
    }

    async fn set_session_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET session_token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        self.ensure_exists(user_id, result.rows_affected()).await
    }
}

/// Todo Store backed by the `todos` table.
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn insert(&self, todo: Todo) -> Result<Todo, AppError> {
        let inserted = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (id, owner_id, text, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(todo.id)
        .bind(todo.owner_id)
        .bind(&todo.text)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE id = $1",
            TODO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Todo>, AppError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE owner_id = $1 ORDER BY created_at, id",
            TODO_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn update_text(
        &self,
        id: Uuid,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET text = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(id)
        .bind(text)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
