use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ReviewDto};
use crate::domain::Actor;
use crate::services::{FeedbackError, ReviewInput, ReviewPatch};

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            FeedbackError::Unauthenticated => Self::unauthenticated(),
            FeedbackError::Forbidden => Self::forbidden(),
            FeedbackError::InvalidField(field) => field.into(),
            FeedbackError::DuplicateReview => {
                Self::Conflict("You have already reviewed this title".to_string())
            }
            FeedbackError::Database(msg) => Self::DatabaseError(msg),
            FeedbackError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/v1/titles/{title_id}/reviews`
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(title_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ReviewDto>>>, ApiError> {
    let reviews = state.feedback().list_reviews(&actor, title_id).await?;
    Ok(Json(ApiResponse::success(
        reviews.into_iter().map(ReviewDto::from).collect(),
    )))
}

/// `GET /api/v1/titles/{title_id}/reviews/{id}`
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<ReviewDto>>, ApiError> {
    let review = state.feedback().get_review(&actor, title_id, id).await?;
    Ok(Json(ApiResponse::success(review.into())))
}

/// `POST /api/v1/titles/{title_id}/reviews`
///
/// One review per user and title; a second attempt is a 409.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(title_id): Path<i32>,
    payload: Result<Json<ReviewInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewDto>>), ApiError> {
    let Json(payload) = payload?;
    let review = state
        .feedback()
        .create_review(&actor, title_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(review.into()))))
}

/// `PATCH /api/v1/titles/{title_id}/reviews/{id}`
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, id)): Path<(i32, i32)>,
    payload: Result<Json<ReviewPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<ReviewDto>>, ApiError> {
    let Json(payload) = payload?;
    let review = state
        .feedback()
        .update_review(&actor, title_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(review.into())))
}

/// `DELETE /api/v1/titles/{title_id}/reviews/{id}`
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path((title_id, id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    state.feedback().delete_review(&actor, title_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
