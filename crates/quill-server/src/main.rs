use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_api::middleware::{optional_auth, require_auth};
use quill_api::{AppState, AppStateInner, articles, users};

/// Upload cap, matching the 50 MB avatar limit.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUILL_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let static_dir = std::env::var("QUILL_STATIC_DIR").unwrap_or_else(|_| "static".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;

    // Collaborators
    let db = Arc::new(quill_db::Database::open(&PathBuf::from(&db_path))?);
    let files = Arc::new(quill_store::FileStore::new(&static_dir).await?);

    let state: AppState = Arc::new(AppStateInner::new(db, files, jwt_secret));

    // Routes
    let public = Router::new()
        .route("/user", post(users::create))
        .route("/users/login", post(users::login))
        .route("/users", get(users::get_all))
        .route("/user/{id}", get(users::get_one));

    let anonymous_ok = Router::new()
        .route("/articles", get(articles::get_all))
        .route("/articles/{id}", get(articles::get_one))
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let protected = Router::new()
        .route(
            "/user",
            get(users::current).put(users::update).delete(users::delete),
        )
        .route("/articles", post(articles::create))
        .route(
            "/articles/{id}",
            put(articles::update).delete(articles::delete),
        )
        .route(
            "/articles/{id}/favorite",
            post(articles::favorite).delete(articles::unfavorite),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(public)
        .merge(anonymous_ok)
        .merge(protected)
        .nest_service(
            "/avatars",
            ServeDir::new(PathBuf::from(&static_dir).join("avatars")),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("quill server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
