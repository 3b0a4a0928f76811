pub mod auth;
pub mod health;
pub mod todos;

use actix_web::{error, web};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers the auth and todo routes, plus extractor configs that report malformed
/// bodies and query strings as `InvalidInput`.
///
/// Expects `web::Data` for `Accounts`, `AccessControl` and `SessionIssuer` on the app.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        error::Error::from(AppError::invalid_field("body", &detail))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        error::Error::from(AppError::invalid_field("query", &detail))
    }))
    .service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::who_am_i),
    )
    .service(
        web::scope("/todo")
            .wrap(AuthMiddleware)
            .service(todos::list_todos)
            .service(todos::create_todo)
            .service(todos::get_todo)
            .service(todos::edit_todo)
            .service(todos::delete_todo),
    );
}
