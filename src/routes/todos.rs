use crate::{
    access::AccessControl,
    auth::AuthenticatedUserId,
    error::AppError,
    models::{Projection, TodoId, TodoInput, TodoQuery},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Lists the caller's todos.
///
/// ## Query Parameters:
/// - `verbose` (optional): when `true`, each entry also carries `createdAt` and `updatedAt`.
///
/// ## Responses:
/// - `200 OK`: JSON array of todo summaries, empty if the caller owns none.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn list_todos(
    access: web::Data<AccessControl>,
    user: AuthenticatedUserId,
    query: web::Query<TodoQuery>,
) -> Result<impl Responder, AppError> {
    let todos = access.list_owned(user.0, query.projection()).await?;
    Ok(HttpResponse::Ok().json(todos))
}

/// Creates a todo owned by the caller.
///
/// ## Request Body:
/// `{"todo": "<text>"}`, 1 to 1000 characters once trimmed.
///
/// ## Responses:
/// - `200 OK`: `{"_id", "todo"}` of the new record.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: missing or invalid `todo` field.
#[post("")]
pub async fn create_todo(
    access: web::Data<AccessControl>,
    user: AuthenticatedUserId,
    body: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let created = access.create(user.0, &body.todo).await?;
    Ok(HttpResponse::Ok().json(created))
}

/// Fetches one of the caller's todos.
///
/// ## Responses:
/// - `200 OK`: the todo summary (verbose with `?verbose=true`).
/// - `403 Forbidden`: the todo exists but belongs to another user.
/// - `404 Not Found`: no todo has this id.
/// - `422 Unprocessable Entity`: the id is not a valid identifier.
#[get("/{id}")]
pub async fn get_todo(
    access: web::Data<AccessControl>,
    user: AuthenticatedUserId,
    todo_id: web::Path<String>,
    query: web::Query<TodoQuery>,
) -> Result<impl Responder, AppError> {
    let todo_id: TodoId = todo_id.parse()?;

    let todo = access.fetch_one(user.0, todo_id, query.projection()).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Replaces the text of one of the caller's todos.
///
/// ## Responses:
/// - `200 OK`: `{"_id", "todo"}` after the edit.
/// - `403 Forbidden`, `404 Not Found`, `422 Unprocessable Entity`: as for `get_todo`,
///   plus 422 for an invalid body.
#[patch("/{id}")]
pub async fn edit_todo(
    access: web::Data<AccessControl>,
    user: AuthenticatedUserId,
    todo_id: web::Path<String>,
    body: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    let todo_id: TodoId = todo_id.parse()?;
    body.validate()?;

    let edited = access.edit(user.0, todo_id, &body.todo).await?;
    Ok(HttpResponse::Ok().json(edited))
}

/// Deletes one of the caller's todos.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Successfully Deleted Todo"}`.
/// - `403 Forbidden`, `404 Not Found`, `422 Unprocessable Entity`: as for `get_todo`.
#[delete("/{id}")]
pub async fn delete_todo(
    access: web::Data<AccessControl>,
    user: AuthenticatedUserId,
    todo_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let todo_id: TodoId = todo_id.parse()?;

    access.delete(user.0, todo_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully Deleted Todo"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthMiddleware, SessionIssuer};
    use crate::models::{TodoSummary, User};
    use crate::store::{Stores, UserStore};
    use actix_web::{http::header, http::StatusCode, test, App};
    use uuid::Uuid;

    #[actix_rt::test]
    async fn test_malformed_id_is_invalid_input_not_not_found() {
        let stores = Stores::in_memory();
        let user = stores
            .users
            .insert(User::new("a@b.com", "hash".into()))
            .await
            .unwrap();
        let issuer = SessionIssuer::new("routes-test-secret", 7);
        let token = issuer.issue(user.id).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AccessControl::new(stores)))
                .app_data(web::Data::new(issuer))
                .service(
                    web::scope("/todo")
                        .wrap(AuthMiddleware)
                        .service(get_todo)
                        .service(delete_todo),
                ),
        )
        .await;

        for uri in ["/todo/not-a-uuid", "/todo/12345"] {
            let req = test::TestRequest::get()
                .uri(uri)
                .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "uri {}", uri);
        }

        let req = test::TestRequest::delete()
            .uri(&format!("/todo/{}", Uuid::new_v4()))
            .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[::core::prelude::v1::test]
    fn test_query_projection() {
        assert_eq!(TodoQuery::default().projection(), Projection::Compact);
        assert_eq!(TodoQuery { verbose: true }.projection(), Projection::Verbose);
        let summary = TodoSummary::Compact {
            id: Uuid::nil(),
            todo: "x".into(),
        };
        assert_eq!(summary.text(), "x");
    }
}
