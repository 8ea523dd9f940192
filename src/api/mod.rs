//! HTTP handlers (DTO boundary).
//!
//! Handlers parse the request, run the matching use case on the blocking
//! pool and map the result to a response. All routes live under `/api`.

pub mod catalog;
pub mod extract;
pub mod query;
pub mod recipes;
pub mod users;

use crate::domain::limits::MAX_AVATAR_BYTES;
use crate::error::AppError;
use crate::infra::{DbPool, MediaStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Largest accepted request body: a base64-encoded maximum-size image plus
/// room for the other JSON fields.
pub const MAX_BODY_BYTES: usize = MAX_AVATAR_BYTES / 3 * 4 + 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub media: Arc<MediaStore>,
    pub frontend_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(pool: DbPool, media: MediaStore, frontend_url: Option<String>) -> Self {
        Self {
            pool: Arc::new(pool),
            media: Arc::new(media),
            frontend_url: frontend_url.map(Arc::from),
        }
    }
}

/// Run a synchronous use case off the async runtime.
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&DbPool, &MediaStore) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    let media = state.media.clone();
    tokio::task::spawn_blocking(move || f(&pool, &media))
        .await
        .map_err(|e| AppError::Db(format!("blocking task failed: {}", e)))?
}

/// Unwrap a JSON body, reporting malformed payloads as validation errors.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Validation(format!(
                "request body is larger than {} bytes",
                MAX_BODY_BYTES
            ))
        } else {
            AppError::Validation(rejection.body_text())
        }
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health/", get(health))
        .route("/api/auth/token/login/", post(users::token_login))
        .route("/api/auth/token/logout/", post(users::token_logout))
        .route("/api/users/", get(users::list).post(users::register))
        .route("/api/users/me/", get(users::me))
        .route(
            "/api/users/me/avatar/",
            axum::routing::put(users::set_avatar).delete(users::delete_avatar),
        )
        .route("/api/users/set_password/", post(users::set_password))
        .route("/api/users/subscriptions/", get(users::subscriptions))
        .route("/api/users/{id}/", get(users::retrieve))
        .route(
            "/api/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/api/tags/", get(catalog::tag_list))
        .route("/api/tags/{id}/", get(catalog::tag_get))
        .route("/api/ingredients/", get(catalog::ingredient_list))
        .route("/api/ingredients/{id}/", get(catalog::ingredient_get))
        .route("/api/recipes/", get(recipes::list).post(recipes::create))
        .route(
            "/api/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/",
            get(recipes::retrieve)
                .patch(recipes::update)
                .delete(recipes::destroy),
        )
        .route("/api/recipes/{id}/get-link/", get(recipes::get_link))
        .route(
            "/api/recipes/{id}/favorite/",
            post(recipes::favorite_add).delete(recipes::favorite_remove),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(recipes::cart_add).delete(recipes::cart_remove),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            extract::authenticate,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
