//! Shared setup for the integration tests.
//!
//! Everything here runs against the in-memory stores. `TestContext::fixture_identity`
//! is the test-only identity provider: it seeds a user directly into the Identity
//! Store and mints a token for it, bypassing sign-up and login.
#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test,
};
use serde_json::{json, Value};
use std::sync::Arc;
use todoforge::{
    access::AccessControl,
    auth::{Accounts, CredentialVerifier, SessionIssuer},
    models::User,
    store::{MemoryTodoStore, MemoryUserStore, Stores, UserStore},
};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Builds the service under test from a `TestContext`, the same way `main` does.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.issuer.clone()))
                .app_data(actix_web::web::Data::new($ctx.accounts.clone()))
                .app_data(actix_web::web::Data::new($ctx.access.clone()))
                .wrap(actix_web::middleware::Logger::default())
                .service(todoforge::routes::health::health)
                .configure(todoforge::routes::config),
        )
        .await
    };
}

pub struct TestContext {
    pub users: Arc<MemoryUserStore>,
    pub todos: Arc<MemoryTodoStore>,
    pub issuer: SessionIssuer,
    pub accounts: Accounts,
    pub access: AccessControl,
}

impl TestContext {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let users = Arc::new(MemoryUserStore::default());
        let todos = Arc::new(MemoryTodoStore::default());
        let stores = Stores {
            users: users.clone(),
            todos: todos.clone(),
        };
        let issuer = SessionIssuer::new(TEST_SECRET, 7);
        // Lowest bcrypt cost keeps the suite fast.
        let accounts = Accounts::new(users.clone(), CredentialVerifier::new(4), issuer.clone());
        let access = AccessControl::new(stores);

        Self {
            users,
            todos,
            issuer,
            accounts,
            access,
        }
    }

    /// Seeds `email` straight into the Identity Store and returns its id and a token.
    pub async fn fixture_identity(&self, email: &str) -> (Uuid, String) {
        let user = self
            .users
            .insert(User::new(email, "not-a-real-hash".into()))
            .await
            .expect("seed fixture user");
        let token = self.issuer.issue(user.id).expect("mint fixture token");
        (user.id, token)
    }

    /// The reference set currently cached on `user_id`.
    pub async fn reference_set(&self, user_id: Uuid) -> Vec<Uuid> {
        let mut ids = self
            .users
            .find_by_id(user_id)
            .await
            .unwrap()
            .expect("user exists")
            .todo_ids;
        ids.sort();
        ids
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Sends `req` and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json)
}

/// Signs up and logs in through the HTTP surface, returning the id and token.
pub async fn signup_and_login<S, B>(app: &S, email: &str, password: &str) -> (Uuid, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let credentials = json!({ "email": email, "password": password });

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(&credentials)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "sign up failed: {}", body);
    let id: Uuid = body["_id"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("sign up returns a uuid");

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(&credentials)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    let token = body["accessToken"]
        .as_str()
        .expect("login returns a token")
        .to_string();

    (id, token)
}

/// Creates a todo via the HTTP surface and returns its id.
pub async fn create_todo<S, B>(app: &S, token: &str, text: &str) -> Uuid
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/todo")
        .append_header(bearer(token))
        .set_json(json!({ "todo": text }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    body["_id"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("create returns a uuid")
}
