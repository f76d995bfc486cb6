pub mod authentication;
pub mod comments;
pub mod config;
pub mod data_formats;
pub mod db_helpers;
pub mod errors;
pub mod feed;
pub mod follow_graph;
pub mod fragment_cache;
mod handlers;
pub mod media;
pub mod models;
pub mod posts;
pub mod render;
pub mod store;

use anyhow::Context;
pub use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use config::Config;
pub use data_formats::*;
use db_helpers::SqliteStore;
pub use errors::{FieldErrors, RequestError};
use fragment_cache::{FragmentCache, MokaBackend};
use handlers::*;
use media::MediaStore;
use render::{JsonRenderer, Renderer};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{net::TcpListener, sync::Arc};
use store::ContentStore;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Shared by every handler through an [`Extension`].
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub fragments: FragmentCache,
    pub renderer: Arc<dyn Renderer>,
    pub media: MediaStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ContentStore>) -> Self {
        let fragments = FragmentCache::new(Arc::new(MokaBackend::new(config.cache_capacity)));
        AppState {
            store,
            fragments,
            renderer: Arc::new(JsonRenderer),
            media: MediaStore::new(config.media_root.clone()),
            config: Arc::new(config),
        }
    }
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("could not create database {db_url}"))?;
    } else {
        info!(db_url, "database already exists");
    }
    let pool = SqlitePool::connect(db_url)
        .await
        .with_context(|| format!("could not connect to {db_url}"))?;
    info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("migrations completed");
    Ok(pool)
}

pub fn make_router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/check_health", get(alive))
        .route("/auth/signup/", post(register_user))
        .route("/auth/login/", post(login_user))
        .route("/new/", get(new_post_form).post(new_post))
        .route("/follow/", get(follow_index))
        .route("/group/:slug/", get(group_posts))
        .route("/:username/", get(profile))
        .route("/:username/follow/", get(profile_follow).post(profile_follow))
        .route(
            "/:username/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
        .route("/:username/:post_id/", get(post_view))
        .route(
            "/:username/:post_id/edit/",
            get(post_edit_form).post(post_edit),
        )
        .route("/:username/:post_id/comment", post(add_comment))
        .fallback(not_found)
}

/// Opens the database and wires the router with its state and middleware.
pub async fn build_app(config: Config) -> Result<(Router, AppState)> {
    let pool = init_db(&config.database_url).await?;
    let state = AppState::new(config, Arc::new(SqliteStore::new(pool)));
    let app = make_router()
        .nest_service("/media", ServeDir::new(state.media.root()))
        .layer(Extension(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());
    Ok((app, state))
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let address = listener.local_addr()?;
    info!(%address, "server started");
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn run_app(config: Config) -> Result<()> {
    let listener = TcpListener::bind(config.listen_address)
        .with_context(|| format!("could not bind {}", config.listen_address))?;
    let (app, _) = build_app(config).await?;
    serve(listener, app).await
}
