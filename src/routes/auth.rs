use crate::{
    auth::{
        Accounts, AuthMiddleware, AuthenticatedUserId, CredentialsRequest, LoginRequest,
        LoginResponse, SignUpResponse, WhoAmIResponse,
    },
    error::AppError,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates a new account. The email is stored lowercased; a second sign-up with
/// the same email answers `409 Conflict`.
#[post("/signup")]
pub async fn signup(
    accounts: web::Data<Accounts>,
    body: web::Json<CredentialsRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let id = accounts.sign_up(&body.email, &body.password).await?;

    Ok(HttpResponse::Created().json(SignUpResponse {
        message: "Successfully Signed Up".into(),
        id,
    }))
}

/// Login user
///
/// Returns a session token valid for the configured window. Unknown email and
/// wrong password both answer `401` with the same message.
#[post("/login")]
pub async fn login(
    accounts: web::Data<Accounts>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let access_token = accounts.log_in(&body.email, &body.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse { access_token }))
}

/// Who am I
///
/// Returns the email of the account the bearer token belongs to.
#[get("/user", wrap = "AuthMiddleware")]
pub async fn who_am_i(
    accounts: web::Data<Accounts>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let email = accounts.who_am_i(user.0).await?;
    Ok(HttpResponse::Ok().json(WhoAmIResponse {
        logged_in_as: email,
    }))
}
