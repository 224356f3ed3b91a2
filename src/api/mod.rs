use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{AccountService, CatalogService, FeedbackService, Mailer, TokenCodec};
use crate::state::SharedState;

pub mod auth;
mod comments;
mod error;
mod observability;
mod reviews;
mod taxonomy;
mod titles;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.shared.catalog
    }

    #[must_use]
    pub fn feedback(&self) -> &Arc<dyn FeedbackService> {
        &self.shared.feedback
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.shared.accounts
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Same as [`create_app_state_from_config`] with explicit mail and
/// confirmation-code capabilities.
pub async fn create_app_state_with(
    config: Config,
    mailer: Arc<dyn Mailer>,
    codec: Arc<dyn TokenCodec>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_capabilities(config, mailer, codec).await?);
    Ok(create_app_state(shared, None))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().read().await.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(catalog_routes())
        .merge(feedback_routes())
        .merge(account_routes())
        .route("/metrics", get(observability::get_metrics))
        .route("/health", get(observability::health))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::actor_middleware,
        ))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/titles",
            get(titles::list_titles).post(titles::create_title),
        )
        .route(
            "/titles/{id}",
            get(titles::get_title)
                .patch(titles::update_title)
                .delete(titles::delete_title),
        )
        .route(
            "/categories",
            get(taxonomy::list_categories).post(taxonomy::create_category),
        )
        .route("/categories/{slug}", delete(taxonomy::delete_category))
        .route(
            "/genres",
            get(taxonomy::list_genres).post(taxonomy::create_genre),
        )
        .route("/genres/{slug}", delete(taxonomy::delete_genre))
}

fn feedback_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/titles/{title_id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{id}",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{id}",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
}

fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/email", post(auth::signup))
        .route("/auth/token", post(auth::activate))
        .route("/auth/token/refresh", post(auth::refresh_token))
        .route("/token", post(auth::login))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/me",
            get(users::get_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .route(
            "/users/{username}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
}
