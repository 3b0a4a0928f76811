//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a request can hit, from a malformed todo id to a broken database
//! connection, is classified into one of its variants before it leaves the handler.
//!
//! `AppError` implements `actix_web::error::ResponseError` so each variant maps to a
//! stable status code and a JSON body. `From` implementations for `sqlx::Error`,
//! `validator::ValidationErrors`, `jsonwebtoken::errors::Error` and `bcrypt::BcryptError`
//! allow the `?` operator to be used at every layer.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Message returned for every login failure, whether the email is unknown or the
/// password does not match.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect Email or Password!";

/// A single per-field validation problem reported alongside `AppError::InvalidInput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending input field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input, caught before any store access (HTTP 422).
    /// Carries one entry per offending field.
    InvalidInput {
        message: String,
        fields: Vec<FieldError>,
    },
    /// Missing, malformed, expired or otherwise invalid credential (HTTP 401).
    Unauthenticated(String),
    /// Login failed: unknown email or wrong password (HTTP 401).
    InvalidCredentials,
    /// Authenticated, but not the owner of the target record (HTTP 403).
    Forbidden(String),
    /// No record matches the requested identifier (HTTP 404).
    NotFound(String),
    /// A unique key already exists (HTTP 409).
    Conflict(String),
    /// Unexpected store or capability failure (HTTP 500).
    /// The message is logged, never sent to the client.
    Internal(String),
}

impl AppError {
    /// Shorthand for an `InvalidInput` error about a single field.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        AppError::InvalidInput {
            message: "Validation Failed. Entered Incorrect Value".into(),
            fields: vec![FieldError::new(field, message)],
        }
    }

    /// The error reported for a todo id that has no record.
    pub fn todo_not_found(id: impl fmt::Display) -> Self {
        AppError::NotFound(format!("No todo found with ID {}. Please check ID.", id))
    }

    /// The error reported when a todo exists but belongs to someone else.
    pub fn not_owner() -> Self {
        AppError::Forbidden("You do not have permissions to perform this action".into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::InvalidInput { message, fields } => {
                write!(f, "Invalid Input: {}", message)?;
                for field in fields {
                    write!(f, " [{}: {}]", field.field, field.message)?;
                }
                Ok(())
            }
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::InvalidCredentials => {
                write!(f, "Invalid Credentials: {}", INVALID_CREDENTIALS_MESSAGE)
            }
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::InvalidInput { message, fields } => builder.json(json!({
                "error": message,
                "details": fields
            })),
            AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => builder.json(json!({
                "error": msg
            })),
            AppError::InvalidCredentials => builder.json(json!({
                "error": INVALID_CREDENTIALS_MESSAGE
            })),
            AppError::Internal(msg) => {
                log::error!("internal error: {}", msg);
                builder.json(json!({
                    "error": "Internal Server Error"
                }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Unique-constraint violations (SQLSTATE 23505) become `Conflict`, with the account
/// message only for the `users` email key; everything else is an internal failure. Absence is modelled with `fetch_optional` in the stores, so
/// `RowNotFound` is not expected here and is treated as internal as well.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.code().as_deref() == Some("23505") {
                return unique_violation(db_error.constraint());
            }
        }
        AppError::Internal(format!("database error: {}", error))
    }
}

/// Name of the unique constraint on `users.email` (see `migrations/`).
pub const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

fn unique_violation(constraint: Option<&str>) -> AppError {
    match constraint {
        Some(USERS_EMAIL_CONSTRAINT) => AppError::Conflict("Account Already Exists!".into()),
        _ => AppError::Conflict("Record Already Exists".into()),
    }
}

/// Converts `validator::ValidationErrors` into `AppError::InvalidInput`, keeping one
/// `FieldError` per failed rule.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", err.code));
                    FieldError::new(field, message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::InvalidInput {
            message: "Validation Failed. Entered Incorrect Value".into(),
            fields,
        }
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthenticated`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthenticated(format!("Invalid token: {}", error))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::Internal`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(format!("credential hashing failed: {}", error))
    }
}
