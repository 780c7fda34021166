//! Swole Server
//!
//! HTTP/JSON API for registering users, verifying their passwords and
//! keeping a log of their workouts. Backed by an embedded SQLite file.

mod config;
mod error;
mod extractors;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use services::AccountService;
use storage::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        let accounts = Arc::new(AccountService::new(db.clone()));
        Self { db, accounts }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {:?}: {}, using \"info\"", config.log_level, e);
        EnvFilter::new("info")
    });
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Swole Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server(config).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(config: Config) -> Result<()> {
    let database_path = config.database_path();
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address,
        database_path.display()
    );

    let db = Arc::new(
        Database::new(&database_path)
            .await
            .context("Failed to initialize database")?,
    );

    let app = router(AppState::new(db.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    info!("Server listening on {}", config.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/user/add", post(handlers::users::add))
        .route("/user/authenticate", post(handlers::users::authenticate))
        .route("/users", get(handlers::users::list))
        .route(
            "/user/:id",
            get(handlers::users::get).delete(handlers::users::delete),
        )
        .route("/workout/add", post(handlers::workouts::add))
        .route("/workout", get(handlers::workouts::list))
        .route("/workout/delete/:id", delete(handlers::workouts::delete))
        .route(
            "/workout/update/:id",
            put(handlers::workouts::update).patch(handlers::workouts::update),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use swole_types::message;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let accounts = Arc::new(AccountService::with_hasher(
            db.clone(),
            services::accounts::fast_hasher(),
        ));
        router(AppState { db, accounts })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
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
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/user/add",
            Some(json!({"username": username, "password": password})),
        )
        .await
    }

    fn bench(user_id: i64) -> Value {
        json!({
            "user_id": user_id,
            "title": "Bench",
            "weight": "135",
            "reps": "10",
            "muscle": "chest"
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_and_duplicate() {
        let app = test_app().await;

        let (status, body) = register(&app, "arnold", "pump").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, message::USER_CREATED);

        let (status, body) = register(&app, "arnold", "different").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, message::USERNAME_TAKEN);

        // First password still verifies
        let (status, body) = send(
            &app,
            "POST",
            "/user/authenticate",
            Some(json!({"username": "arnold", "password": "pump"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, message::USER_VERIFIED);
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;

        let (status, body) = send(
            &app,
            "POST",
            "/user/authenticate",
            Some(json!({"username": "arnold", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, message::PASSWORD_NOT_VERIFIED);

        let (status, body) = send(
            &app,
            "POST",
            "/user/authenticate",
            Some(json!({"username": "franco", "password": "pump"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, message::USER_NOT_VERIFIED);
    }

    #[tokio::test]
    async fn test_authenticate_requires_json_content_type() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/user/authenticate")
            .header("content-type", "text/plain")
            .body(Body::from(r#"{"username": "arnold", "password": "pump"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, message::NOT_JSON);
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let app = test_app().await;
        let (status, body) =
            send(&app, "POST", "/user/add", Some(json!({"username": "arnold"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: password is required");
    }

    #[tokio::test]
    async fn test_users_listing_and_lookup() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;
        send(&app, "POST", "/workout/add", Some(bench(1))).await;

        let (status, body) = send(&app, "GET", "/users", None).await;
        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["username"], "arnold");
        assert_eq!(users[0]["workout"][0]["title"], "Bench");
        assert!(users[0].get("password").is_none());

        let (status, body) = send(&app, "GET", "/user/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (status, body) = send(&app, "GET", "/user/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, message::USER_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_workout_round_trip() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;

        let (status, body) = send(&app, "POST", "/workout/add", Some(bench(1))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, message::WORKOUT_CREATED);

        let (status, body) = send(&app, "GET", "/workout", None).await;
        assert_eq!(status, StatusCode::OK);
        let workouts = body.as_array().unwrap();
        assert_eq!(workouts.len(), 1);

        let workout = &workouts[0];
        assert!(workout["id"].as_i64().is_some());
        assert_eq!(workout["user_id"], 1);
        assert_eq!(workout["title"], "Bench");
        assert_eq!(workout["weight"], "135");
        assert_eq!(workout["reps"], "10");
        assert_eq!(workout["muscle"], "chest");
    }

    #[tokio::test]
    async fn test_workout_for_unknown_user_is_rejected() {
        let app = test_app().await;
        let (status, body) = send(&app, "POST", "/workout/add", Some(bench(42))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, message::USER_NOT_FOUND);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;
        register(&app, "franco", "pump").await;
        send(&app, "POST", "/workout/add", Some(bench(1))).await;
        send(&app, "POST", "/workout/add", Some(bench(1))).await;
        send(&app, "POST", "/workout/add", Some(bench(2))).await;

        let (status, body) = send(&app, "DELETE", "/user/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, message::USER_DELETED);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        let workouts = body.as_array().unwrap();
        assert_eq!(workouts.len(), 1);
        assert!(workouts.iter().all(|w| w["user_id"] != 1));

        let (status, _) = send(&app, "DELETE", "/user/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;
        send(&app, "POST", "/workout/add", Some(bench(1))).await;

        let (status, body) = send(
            &app,
            "PATCH",
            "/workout/update/1",
            Some(json!({"weight": "145"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, message::WORKOUT_UPDATED);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        let workout = &body[0];
        assert_eq!(workout["weight"], "145");
        assert_eq!(workout["title"], "Bench");
        assert_eq!(workout["reps"], "10");
        assert_eq!(workout["muscle"], "chest");

        let (status, _) = send(
            &app,
            "PUT",
            "/workout/update/1",
            Some(json!({"muscle": "triceps", "title": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        assert_eq!(body[0]["muscle"], "triceps");
        assert_eq!(body[0]["title"], "Bench");
    }

    #[tokio::test]
    async fn test_update_missing_workout() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            "PATCH",
            "/workout/update/5",
            Some(json!({"weight": "145"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, message::WORKOUT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_workout_twice() {
        let app = test_app().await;

        for _ in 0..2 {
            let (status, body) = send(&app, "DELETE", "/workout/delete/3", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, message::WORKOUT_NOT_FOUND);
        }

        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn send_text(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "text/plain")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_workout_endpoints_require_json_content_type() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;

        let (status, body) =
            send_text(&app, "POST", "/workout/add", &bench(1).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, message::NOT_JSON);

        send(&app, "POST", "/workout/add", Some(bench(1))).await;
        let (status, body) =
            send_text(&app, "PATCH", "/workout/update/1", r#"{"weight": "145"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, message::NOT_JSON);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["weight"], "135");
    }

    #[tokio::test]
    async fn test_update_ignores_user_id() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;
        register(&app, "franco", "pump").await;
        send(&app, "POST", "/workout/add", Some(bench(1))).await;

        let (status, _) = send(
            &app,
            "PATCH",
            "/workout/update/1",
            Some(json!({"user_id": 2, "reps": "12"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        assert_eq!(body[0]["user_id"], 1);
        assert_eq!(body[0]["reps"], "12");

        let (_, body) = send(&app, "GET", "/user/2", None).await;
        assert_eq!(body["workout"], json!([]));
    }

    #[tokio::test]
    async fn test_non_integer_ids_get_json_bad_request() {
        let app = test_app().await;

        for (method, uri) in [
            ("GET", "/user/abc"),
            ("DELETE", "/user/1.5"),
            ("DELETE", "/workout/delete/abc"),
            ("DELETE", "/workout/delete/99999999999999999999"),
        ] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
            assert_eq!(body, message::INVALID_ID, "{} {}", method, uri);
        }

        let (status, body) = send(
            &app,
            "PATCH",
            "/workout/update/abc",
            Some(json!({"weight": "145"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, message::INVALID_ID);
    }

    #[tokio::test]
    async fn test_health_degraded_when_store_closed() {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let app = router(AppState {
            db: db.clone(),
            accounts: Arc::new(AccountService::with_hasher(
                db.clone(),
                services::accounts::fast_hasher(),
            )),
        });

        db.close().await;

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_delete_workout() {
        let app = test_app().await;
        register(&app, "arnold", "pump").await;
        send(&app, "POST", "/workout/add", Some(bench(1))).await;

        let (status, body) = send(&app, "DELETE", "/workout/delete/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, message::WORKOUT_DELETED);

        let (_, body) = send(&app, "GET", "/workout", None).await;
        assert_eq!(body, json!([]));
    }
}
