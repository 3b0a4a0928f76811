use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account as held by the Identity Store. Not `Serialize`: the
/// credential hash stays server-side.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Lowercased, trimmed email. Unique across the store.
    pub email: String,
    pub password_hash: String,
    /// Reference set: ids of the todos this user owns. A rebuildable cache of the
    /// Todo Store, never read to decide what a user can see.
    pub todo_ids: Vec<Uuid>,
    /// Last token issued at login. Advisory only.
    pub session_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a fresh account with an empty reference set.
    pub fn new(email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            todo_ids: Vec::new(),
            session_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Canonical form used for every email lookup and insert.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new("  Emma@Jane.COM ", "hash".to_string());
        assert_eq!(user.email, "emma@jane.com");
        assert!(user.todo_ids.is_empty());
        assert!(user.session_token.is_none());
    }
}
