pub mod accounts;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Re-export necessary items
pub use accounts::Accounts;
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::CredentialVerifier;
pub use token::{Claims, SessionIssuer};

/// Minimum password length, counted after trimming surrounding whitespace.
pub const MIN_PASSWORD_LEN: usize = 5;

/// Email and password, as sent to `/auth/signup`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Must be a valid email address. Compared case-insensitively.
    #[validate(email(message = "Please Enter a valid email"))]
    pub email: String,
    /// Must be at least 5 characters long once trimmed.
    #[validate(custom = "validate_password")]
    pub password: String,
}

/// Email and password, as sent to `/auth/login`.
///
/// The password is only required to be present. Length rules apply at sign-up, so a
/// short wrong password still reaches the credential check and yields
/// `InvalidCredentials`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please Enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response body after a successful sign-up.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub message: String,
    #[serde(rename = "_id")]
    pub id: Uuid,
}

/// Response body after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Response body of the who-am-i endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    #[serde(rename = "loggedInAs")]
    pub logged_in_as: String,
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().chars().count() >= MIN_PASSWORD_LEN {
        return Ok(());
    }
    let mut err = ValidationError::new("length");
    err.message = Some(Cow::from(format!(
        "Password needs to be minimum {} characters long",
        MIN_PASSWORD_LEN
    )));
    Err(err)
}
