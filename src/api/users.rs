use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::domain::Actor;
use crate::services::{UserInput, UserPatch};

/// `GET /api/v1/users` (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.accounts().list_users(&actor).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// `POST /api/v1/users` (admin)
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let Json(payload) = payload?;
    let user = state.accounts().create_user(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// `GET /api/v1/users/{username}` (admin)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.accounts().get_user(&actor, &username).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// `PATCH /api/v1/users/{username}` (admin)
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(username): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Json(payload) = payload?;
    let user = state
        .accounts()
        .update_user(&actor, &username, payload)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// `DELETE /api/v1/users/{username}` (admin, never oneself)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.accounts().delete_user(&actor, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/users/me`
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.accounts().get_me(&actor).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// `PATCH /api/v1/users/me`
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Json(payload) = payload?;
    let user = state.accounts().update_me(&actor, payload).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// `DELETE /api/v1/users/me` is always refused.
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, ApiError> {
    state.accounts().delete_me(&actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
