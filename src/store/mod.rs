//! Storage seams for the two record kinds.
//!
//! The Identity Store owns `User` records and the Todo Store owns `Todo` records.
//! Neither store knows about the other: keeping a user's reference set in line with
//! the todos it owns is the job of [`crate::access::AccessControl`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Todo, User};

pub use memory::{MemoryTodoStore, MemoryUserStore};
pub use postgres::{PgTodoStore, PgUserStore};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user. Fails with `Conflict` if the email is already taken.
    async fn insert(&self, user: User) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// `email` is expected in normalized form.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Every user id in the store, for reconciliation sweeps.
    async fn ids(&self) -> Result<Vec<Uuid>, AppError>;

    /// Adds `todo_id` to the user's reference set. Adding an id twice is a no-op.
    async fn add_todo_ref(&self, user_id: Uuid, todo_id: Uuid) -> Result<(), AppError>;

    /// Removes `todo_id` from the user's reference set, if present.
    async fn remove_todo_ref(&self, user_id: Uuid, todo_id: Uuid) -> Result<(), AppError>;

    /// Overwrites the whole reference set.
    async fn replace_todo_refs(&self, user_id: Uuid, todo_ids: Vec<Uuid>)
        -> Result<(), AppError>;

    async fn set_session_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, todo: Todo) -> Result<Todo, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Todo>, AppError>;

    /// All todos owned by `owner_id`, oldest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Todo>, AppError>;

    /// Replaces the text and modified timestamp. Returns `None` if the todo is gone.
    async fn update_text(
        &self,
        id: Uuid,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Todo>, AppError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// The pair of stores a running service works against.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::default()),
            todos: Arc::new(MemoryTodoStore::default()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            todos: Arc::new(PgTodoStore::new(pool)),
        }
    }
}
