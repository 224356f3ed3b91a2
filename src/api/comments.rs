use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CommentDto};
use crate::domain::Actor;
use crate::services::{CommentInput, CommentPatch};

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<Vec<CommentDto>>>, ApiError> {
    let comments = state
        .feedback()
        .list_comments(&actor, title_id, review_id)
        .await?;
    Ok(Json(ApiResponse::success(
        comments.into_iter().map(CommentDto::from).collect(),
    )))
}

pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id, id)): Path<(i32, i32, i32)>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let comment = state
        .feedback()
        .get_comment(&actor, title_id, review_id, id)
        .await?;
    Ok(Json(ApiResponse::success(comment.into())))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CommentDto>>), ApiError> {
    let Json(payload) = payload?;
    let comment = state
        .feedback()
        .create_comment(&actor, title_id, review_id, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(comment.into())),
    ))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id, id)): Path<(i32, i32, i32)>,
    payload: Result<Json<CommentPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let Json(payload) = payload?;
    let comment = state
        .feedback()
        .update_comment(&actor, title_id, review_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(comment.into())))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, review_id, id)): Path<(i32, i32, i32)>,
) -> Result<StatusCode, ApiError> {
    state
        .feedback()
        .delete_comment(&actor, title_id, review_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
