//!
//! # Ownership-scoped access to todos
//!
//! `AccessControl` is the only path through which todos are read or written. Every
//! operation takes an already-authenticated requester id and enforces two rules:
//!
//! 1. **Existence before ownership.** A todo id is first looked up; a missing record is
//!    `NotFound`, and only a found record is compared against the requester, giving
//!    `Forbidden` on mismatch.
//! 2. **Todo Store first.** On create the todo is written before the owner's reference
//!    set is updated; on delete the todo is removed before its id is dropped from the
//!    reference set. A failure in the second step is logged and left for
//!    [`AccessControl::reconcile`], since listing always reads the Todo Store.

use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Projection, Todo, TodoId, TodoSummary};
use crate::store::{Stores, TodoStore, UserStore};

/// Outcome of rebuilding one user's reference set from the Todo Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub user_id: Uuid,
    /// Ids owned in the Todo Store but missing from the reference set.
    pub added: Vec<Uuid>,
    /// Ids in the reference set with no matching owned todo.
    pub removed: Vec<Uuid>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone)]
pub struct AccessControl {
    users: Arc<dyn UserStore>,
    todos: Arc<dyn TodoStore>,
}

impl AccessControl {
    pub fn new(stores: Stores) -> Self {
        Self {
            users: stores.users,
            todos: stores.todos,
        }
    }

    /// All todos owned by `requester`, sourced from the Todo Store.
    pub async fn list_owned(
        &self,
        requester: Uuid,
        projection: Projection,
    ) -> Result<Vec<TodoSummary>, AppError> {
        let owned = self.todos.list_by_owner(requester).await?;
        Ok(owned.iter().map(|todo| todo.summary(projection)).collect())
    }

    pub async fn fetch_one(
        &self,
        requester: Uuid,
        todo_id: TodoId,
        projection: Projection,
    ) -> Result<TodoSummary, AppError> {
        let todo = self.load_owned(requester, todo_id).await?;
        Ok(todo.summary(projection))
    }

    /// Creates a todo owned by `requester` and records it in the owner's reference set.
    pub async fn create(&self, requester: Uuid, text: &str) -> Result<TodoSummary, AppError> {
        ensure_text(text)?;

        if self.users.find_by_id(requester).await?.is_none() {
            return Err(AppError::Unauthenticated(
                "Account no longer exists".into(),
            ));
        }

        let todo = self.todos.insert(Todo::new(requester, text.to_string())).await?;

        if let Err(e) = self.users.add_todo_ref(requester, todo.id).await {
            warn!(
                "todo {} created but not added to reference set of user {}; reconcile later: {}",
                todo.id, requester, e
            );
        }

        Ok(todo.summary(Projection::Compact))
    }

    /// Replaces the text of a todo owned by `requester`.
    pub async fn edit(
        &self,
        requester: Uuid,
        todo_id: TodoId,
        new_text: &str,
    ) -> Result<TodoSummary, AppError> {
        ensure_text(new_text)?;
        self.load_owned(requester, todo_id).await?;

        let updated = self
            .todos
            .update_text(todo_id.0, new_text, chrono::Utc::now())
            .await?
            // Deleted between the ownership check and the write.
            .ok_or_else(|| AppError::todo_not_found(todo_id))?;

        Ok(updated.summary(Projection::Compact))
    }

    /// Removes a todo owned by `requester`, then drops it from the reference set.
    pub async fn delete(&self, requester: Uuid, todo_id: TodoId) -> Result<(), AppError> {
        let todo = self.load_owned(requester, todo_id).await?;

        if !self.todos.delete(todo.id).await? {
            return Err(AppError::todo_not_found(todo_id));
        }

        if let Err(e) = self.users.remove_todo_ref(todo.owner_id, todo.id).await {
            warn!(
                "todo {} deleted but still referenced by user {}; reconcile later: {}",
                todo.id, todo.owner_id, e
            );
        }

        Ok(())
    }

    /// Rebuilds `user_id`'s reference set from a scan of the Todo Store.
    ///
    /// The scan and the write-back are not atomic: a `create` landing in between has
    /// its reference overwritten. Run this while no requests are being served, e.g.
    /// at startup.
    pub async fn reconcile(&self, user_id: Uuid) -> Result<ReconcileReport, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user found with ID {}", user_id)))?;

        let owned: Vec<Uuid> = self
            .todos
            .list_by_owner(user_id)
            .await?
            .into_iter()
            .map(|todo| todo.id)
            .collect();

        let owned_set: HashSet<Uuid> = owned.iter().copied().collect();
        let cached_set: HashSet<Uuid> = user.todo_ids.iter().copied().collect();

        let report = ReconcileReport {
            user_id,
            added: owned
                .iter()
                .filter(|id| !cached_set.contains(id))
                .copied()
                .collect(),
            removed: user
                .todo_ids
                .iter()
                .filter(|id| !owned_set.contains(id))
                .copied()
                .collect(),
        };

        // Duplicates in the cached list are also repaired by the rewrite.
        if !report.is_clean() || user.todo_ids.len() != owned.len() {
            self.users.replace_todo_refs(user_id, owned).await?;
            info!(
                "reconciled reference set of user {}: {} added, {} removed",
                user_id,
                report.added.len(),
                report.removed.len()
            );
        }

        Ok(report)
    }

    /// Runs [`AccessControl::reconcile`] for every user and returns the reports that
    /// changed something. A user that fails is logged and skipped; only failing to
    /// enumerate users is an error. Same quiescence requirement as `reconcile`.
    pub async fn reconcile_all(&self) -> Result<Vec<ReconcileReport>, AppError> {
        let mut repaired = Vec::new();
        for user_id in self.users.ids().await? {
            match self.reconcile(user_id).await {
                Ok(report) if !report.is_clean() => repaired.push(report),
                Ok(_) => {}
                Err(e) => warn!("skipping reconciliation of user {}: {}", user_id, e),
            }
        }
        Ok(repaired)
    }

    async fn load_owned(&self, requester: Uuid, todo_id: TodoId) -> Result<Todo, AppError> {
        let todo = self
            .todos
            .find(todo_id.0)
            .await?
            .ok_or_else(|| AppError::todo_not_found(todo_id))?;
        todo.check_ownership(requester)?;
        Ok(todo)
    }
}

fn ensure_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::invalid_field("todo", "Todo must not be empty"));
    }
    Ok(())
}
