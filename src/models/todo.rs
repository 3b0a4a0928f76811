use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use uuid::fmt::Hyphenated;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Upper bound on todo text, counted in characters after trimming.
pub const MAX_TODO_LEN: usize = 1000;

/// A todo as persisted in the Todo Store.
///
/// `owner_id` is a lookup-only back-reference to the owning user. It is fixed at
/// creation and never serialized to clients.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Todo {
    /// Unique identifier for the todo (UUID v4).
    pub id: Uuid,
    /// Identifier of the user who created and owns the todo.
    pub owner_id: Uuid,
    /// The todo content.
    pub text: String,
    /// Timestamp of when the todo was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last edit.
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new `Todo` owned by `owner_id`, with both timestamps set to now.
    pub fn new(owner_id: Uuid, text: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            text,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Fails with `Forbidden` unless `user_id` owns this todo.
    pub fn check_ownership(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::not_owner())
        }
    }

    /// Projects the record into the shape returned to clients.
    pub fn summary(&self, projection: Projection) -> TodoSummary {
        match projection {
            Projection::Compact => TodoSummary::Compact {
                id: self.id,
                todo: self.text.clone(),
            },
            Projection::Verbose => TodoSummary::Verbose {
                id: self.id,
                todo: self.text.clone(),
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }
}

/// Which fields of a todo a response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Identifier and text only.
    #[default]
    Compact,
    /// Identifier, text and both timestamps.
    Verbose,
}

impl Projection {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Projection::Verbose
        } else {
            Projection::Compact
        }
    }
}

/// Client-facing view of a todo. The owner identifier is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoSummary {
    Verbose {
        #[serde(rename = "_id")]
        id: Uuid,
        todo: String,
        #[serde(rename = "createdAt")]
        created_at: DateTime<Utc>,
        #[serde(rename = "updatedAt")]
        updated_at: DateTime<Utc>,
    },
    Compact {
        #[serde(rename = "_id")]
        id: Uuid,
        todo: String,
    },
}

impl TodoSummary {
    pub fn id(&self) -> Uuid {
        match self {
            TodoSummary::Verbose { id, .. } | TodoSummary::Compact { id, .. } => *id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TodoSummary::Verbose { todo, .. } | TodoSummary::Compact { todo, .. } => todo,
        }
    }
}

/// A syntactically valid todo identifier.
///
/// Parsing happens at the boundary so that a malformed id is reported as
/// `InvalidInput` before any store is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TodoId(pub Uuid);

impl FromStr for TodoId {
    type Err = AppError;

    /// Accepts only the hyphenated form. Simple, braced and URN forms are rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::invalid_field("id", "Invalid todo ID");
        if raw.len() != Hyphenated::LENGTH {
            return Err(invalid());
        }
        Uuid::parse_str(raw).map(TodoId).map_err(|_| invalid())
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request body for creating or editing a todo.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TodoInput {
    /// The todo text. Must be 1 to 1000 characters once trimmed.
    #[validate(custom = "validate_todo_text")]
    pub todo: String,
}

/// Query parameters accepted by the read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TodoQuery {
    /// Include timestamps in the response.
    #[serde(default)]
    pub verbose: bool,
}

impl TodoQuery {
    pub fn projection(&self) -> Projection {
        Projection::from_verbose(self.verbose)
    }
}

fn validate_todo_text(text: &str) -> Result<(), ValidationError> {
    let len = text.trim().chars().count();
    if (1..=MAX_TODO_LEN).contains(&len) {
        return Ok(());
    }
    let mut err = ValidationError::new("length");
    err.message = Some(Cow::from(format!(
        "Todo must be between 1 and {} characters",
        MAX_TODO_LEN
    )));
    Err(err)
}
