//! Axum router setup.

use crate::config::ServerConfig;
use crate::handlers::{auth, passwords};
use axum::routing::{get, post, put};
use axum::Router;
use pinvault_core::Database;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub fn build_router(db: Database, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/login-pin", post(auth::login_pin))
        .route("/api/auth/setup-pin", post(auth::setup_pin))
        .route(
            "/api/passwords",
            get(passwords::list).post(passwords::create),
        )
        .route(
            "/api/passwords/{id}",
            put(passwords::update).delete(passwords::delete),
        )
        .route("/api/generate-password", get(passwords::generate))
        .route("/health", get(health));

    let router = match &config.static_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            api.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => api,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_payload_size))
        .with_state(db)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pinvault_core::{hash, SecretCodec};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(Database::in_memory().unwrap(), &ServerConfig::default())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, username: &str) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/register",
            Some(json!({ "username": username, "masterPasswordHash": hash("pw") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["user"]["id"].as_i64().unwrap()
    }

    fn credential(user_id: i64, platform: &str) -> Value {
        let encrypted = SecretCodec::default().encrypt("hunter2", "pw").unwrap();
        json!({
            "userId": user_id,
            "platform": platform,
            "accountName": "work",
            "username": "me@example.com",
            "encryptedPassword": encrypted,
            "notes": "",
            "category": "Social"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_and_duplicate() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "alice", "masterPasswordHash": hash("pw") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["username"], "alice");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "alice", "masterPasswordHash": hash("other") })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username already exists");
    }

    #[tokio::test]
    async fn test_login_and_pin_flow() {
        let app = app();
        let user_id = register(&app, "alice").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "alice", "masterPasswordHash": hash("pw") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasPin"], false);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "alice", "masterPasswordHash": hash("nope") })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/setup-pin",
            Some(json!({ "userId": user_id, "pinHash": hash("123456") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login-pin",
            Some(json!({ "pinHash": hash("123456") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user_id);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login-pin",
            Some(json!({ "pinHash": hash("000000") })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid PIN");
    }

    #[tokio::test]
    async fn test_setup_pin_unknown_user() {
        let (status, _) = send(
            &app(),
            "POST",
            "/api/auth/setup-pin",
            Some(json!({ "userId": 404, "pinHash": hash("123456") })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_password_crud() {
        let app = app();
        let user_id = register(&app, "alice").await;

        let payload = credential(user_id, "GitHub");
        let (status, body) = send(&app, "POST", "/api/passwords", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_i64().unwrap();

        let uri = format!("/api/passwords?userId={}", user_id);
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["platform"], "GitHub");
        assert_eq!(rows[0]["account_name"], "work");
        let stored = rows[0]["encrypted_password"].as_str().unwrap();
        assert_eq!(
            SecretCodec::default().decrypt(stored, "pw").unwrap(),
            "hunter2"
        );

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/passwords/{}", id),
            Some(credential(user_id, "GitLab")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(body[0]["platform"], "GitLab");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/passwords/{}?userId={}", id, user_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, "GET", &uri, None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_scoped_to_owner() {
        let app = app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let payload = credential(alice, "GitHub");
        let (_, body) = send(&app, "POST", "/api/passwords", Some(payload)).await;
        let id = body["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/passwords/{}", id),
            Some(credential(bob, "Mine")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/passwords/{}?userId={}", id, bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_plaintext_password_rejected() {
        let app = app();
        let user_id = register(&app, "alice").await;

        let mut payload = credential(user_id, "GitHub");
        payload["encryptedPassword"] = json!("hunter2");

        let (status, body) = send(&app, "POST", "/api/passwords", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("ciphertext"));
    }

    #[tokio::test]
    async fn test_list_requires_user_id() {
        let (status, body) = send(&app(), "GET", "/api/passwords", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_requests_answer_with_json_errors() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "a" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("masterPasswordHash"));

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/register")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "DELETE", "/api/passwords/abc?userId=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_generate_password() {
        let app = app();

        let (status, body) = send(&app, "GET", "/api/generate-password", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["password"].as_str().unwrap().chars().count(), 16);

        let (_, body) = send(&app, "GET", "/api/generate-password?length=40", None).await;
        assert_eq!(body["password"].as_str().unwrap().chars().count(), 40);

        let (status, body) = send(&app, "GET", "/api/generate-password?length=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["password"], "");

        let (status, _) = send(&app, "GET", "/api/generate-password?length=1000", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_static_dir_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>vault</html>").unwrap();

        let config = ServerConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let app = build_router(Database::in_memory().unwrap(), &config);

        let response = app
            .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>vault</html>");
    }
}
