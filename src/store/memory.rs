use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TodoStore, UserStore};
use crate::error::AppError;
use crate::models::{Todo, User};

/// In-process Identity Store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

fn user_missing(id: Uuid) -> AppError {
    AppError::NotFound(format!("No user found with ID {}", id))
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("Account Already Exists!".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn ids(&self) -> Result<Vec<Uuid>, AppError> {
        Ok(self.users.read().await.keys().copied().collect())
    }

    async fn add_todo_ref(&self, user_id: Uuid, todo_id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or_else(|| user_missing(user_id))?;
        if !user.todo_ids.contains(&todo_id) {
            user.todo_ids.push(todo_id);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn remove_todo_ref(&self, user_id: Uuid, todo_id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or_else(|| user_missing(user_id))?;
        let before = user.todo_ids.len();
        user.todo_ids.retain(|id| *id != todo_id);
        if user.todo_ids.len() != before {
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn replace_todo_refs(
        &self,
        user_id: Uuid,
        todo_ids: Vec<Uuid>,
    ) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or_else(|| user_missing(user_id))?;
        user.todo_ids = todo_ids;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_session_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or_else(|| user_missing(user_id))?;
        user.session_token = Some(token.to_string());
        Ok(())
    }
}

/// In-process Todo Store.
#[derive(Default)]
pub struct MemoryTodoStore {
    todos: RwLock<HashMap<Uuid, Todo>>,
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn insert(&self, todo: Todo) -> Result<Todo, AppError> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id) {
            return Err(AppError::Conflict(format!("Todo {} already exists", todo.id)));
        }
        todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Todo>, AppError> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Todo>, AppError> {
        let mut owned: Vec<Todo> = self
            .todos
            .read()
            .await
            .values()
            .filter(|todo| todo.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update_text(
        &self,
        id: Uuid,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Todo>, AppError> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|todo| {
            todo.text = text.to_string();
            todo.updated_at = updated_at;
            todo.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.todos.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::default();
        let first = store
            .insert(User::new("emma@jane.com", "h".into()))
            .await
            .unwrap();

        let second = store.insert(User::new("EMMA@jane.com", "h2".into())).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let kept = store.find_by_email("emma@jane.com").await.unwrap().unwrap();
        assert_eq!(kept.id, first.id);
        assert_eq!(kept.password_hash, "h");
    }

    #[actix_rt::test]
    async fn test_reference_set_add_is_idempotent() {
        let store = MemoryUserStore::default();
        let user = store.insert(User::new("a@b.com", "h".into())).await.unwrap();
        let todo_id = Uuid::new_v4();

        store.add_todo_ref(user.id, todo_id).await.unwrap();
        store.add_todo_ref(user.id, todo_id).await.unwrap();
        let refs = store.find_by_id(user.id).await.unwrap().unwrap().todo_ids;
        assert_eq!(refs, vec![todo_id]);

        store.remove_todo_ref(user.id, todo_id).await.unwrap();
        store.remove_todo_ref(user.id, todo_id).await.unwrap();
        let refs = store.find_by_id(user.id).await.unwrap().unwrap().todo_ids;
        assert!(refs.is_empty());
    }

    #[actix_rt::test]
    async fn test_reference_ops_on_unknown_user_fail() {
        let store = MemoryUserStore::default();
        let result = store.add_todo_ref(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_todo_store_scopes_listing_by_owner() {
        let store = MemoryTodoStore::default();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let first = store.insert(Todo::new(owner, "one".into())).await.unwrap();
        let second = store.insert(Todo::new(owner, "two".into())).await.unwrap();
        store.insert(Todo::new(other, "theirs".into())).await.unwrap();

        let listed: Vec<Uuid> = store
            .list_by_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&first.id));
        assert!(listed.contains(&second.id));
    }

    #[actix_rt::test]
    async fn test_update_and_delete_missing_todo() {
        let store = MemoryTodoStore::default();
        let missing = Uuid::new_v4();
        assert!(store
            .update_text(missing, "x", Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(missing).await.unwrap());
    }
}
