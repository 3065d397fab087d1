#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use messenger_api::app::build_app;
use messenger_api::auth::cookies::CookieConfig;
use messenger_api::auth::jwt::JwtConfig;
use messenger_api::auth::password::hash_password;
use messenger_api::config::ServerConfig;
use messenger_api::state::AppState;
use messenger_db::models::user::{CreateUser, User};
use messenger_db::store::memory::MemoryStore;
use messenger_db::store::UserStore;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "pen@5Apple";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        token_sweep_interval_secs: 3600,
        sweep_on_request: false,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 30,
            refresh_token_expiry_days: 7,
        },
        cookies: CookieConfig { secure: true },
    }
}

/// The application under test plus a handle on its backing store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// A fresh clone of the router for one request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert a user with [`TEST_PASSWORD`] straight into the store.
    pub async fn create_user(&self, username: &str, display_name: &str) -> User {
        let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
        self.store
            .create_with_profile(&CreateUser {
                username: username.to_string(),
                password_hash,
                display_name: display_name.to_string(),
            })
            .await
            .expect("user creation should succeed")
    }

    /// Log in through the API and return the issued session cookies.
    pub async fn login(&self, username: &str) -> SessionCookies {
        let response = post_json(
            self.app(),
            "/login",
            serde_json::json!({ "username": username, "password": TEST_PASSWORD }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        SessionCookies::from_response(&response)
    }
}

/// Build the full application with all middleware layers over an in-memory store.
///
/// This goes through the same `build_app` as `main.rs`, so tests exercise the
/// production middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery, session resolution).
pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone(), store.clone());
    TestApp {
        router: build_app(state),
        store,
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

/// The `refresh` and `access` values a response set, if any.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    pub refresh: Option<String>,
    pub access: Option<String>,
}

impl SessionCookies {
    pub fn from_response(response: &Response) -> Self {
        let mut cookies = SessionCookies::default();
        for (name, value) in set_cookie_pairs(response) {
            match name.as_str() {
                "refresh" => cookies.refresh = Some(value),
                "access" => cookies.access = Some(value),
                _ => {}
            }
        }
        cookies
    }

    pub fn refresh(&self) -> &str {
        self.refresh.as_deref().expect("refresh cookie set")
    }

    pub fn access(&self) -> &str {
        self.access.as_deref().expect("access cookie set")
    }

    /// A `Cookie` request header carrying both values.
    pub fn header(&self) -> String {
        format!("refresh={}; access={}", self.refresh(), self.access())
    }
}

/// Raw `Set-Cookie` header lines, in order.
pub fn set_cookie_lines(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// `(name, value)` of each `Set-Cookie` header, in order.
pub fn set_cookie_pairs(response: &Response) -> Vec<(String, String)> {
    set_cookie_lines(response)
        .iter()
        .map(|line| {
            let pair = line.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            (name.trim().to_string(), value.trim().to_string())
        })
        .collect()
}

/// Cookie names set by the response, in order.
pub fn set_cookie_names(response: &Response) -> Vec<String> {
    set_cookie_pairs(response)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

async fn send(app: Router, method: Method, uri: &str, cookies: Option<&str>, body: Body) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(COOKIE, cookies);
    }
    let request = builder
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, Body::empty()).await
}

pub async fn get_with_cookies(app: Router, uri: &str, cookies: &str) -> Response {
    send(app, Method::GET, uri, Some(cookies), Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Body::from(body.to_string())).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None, Body::empty()).await
}

pub async fn delete_with_cookies(app: Router, uri: &str, cookies: &str) -> Response {
    send(app, Method::DELETE, uri, Some(cookies), Body::empty()).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
