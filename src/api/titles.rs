use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TitleDto};
use crate::domain::{Actor, TitleFilter};
use crate::services::{CatalogError, TitleInput, TitlePatch};

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            CatalogError::Unauthenticated => Self::unauthenticated(),
            CatalogError::Forbidden => Self::forbidden(),
            CatalogError::InvalidField(field) => field.into(),
            CatalogError::Conflict(msg) => Self::Conflict(msg),
            CatalogError::Database(msg) => Self::DatabaseError(msg),
            CatalogError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Lists titles.
///
/// # Endpoint
/// `GET /api/v1/titles?name=&year=&category=&genre=`
///
/// `genre` may repeat (`?genre=a&genre=b`) or carry a comma separated list;
/// a title matches when it has any of the given genres. All filters combine
/// with AND.
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<TitleDto>>>, ApiError> {
    let Query(pairs) = query?;
    let filter = TitleFilter::from_pairs(pairs).map_err(ApiError::validation)?;

    let titles = state.catalog().list_titles(&actor, &filter).await?;
    Ok(Json(ApiResponse::success(
        titles.into_iter().map(TitleDto::from).collect(),
    )))
}

/// `GET /api/v1/titles/{id}`
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    let title = state.catalog().get_title(&actor, id).await?;
    Ok(Json(ApiResponse::success(title.into())))
}

/// `POST /api/v1/titles`
pub async fn create_title(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<TitleInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TitleDto>>), ApiError> {
    let Json(payload) = payload?;
    let title = state.catalog().create_title(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(title.into()))))
}

/// `PATCH /api/v1/titles/{id}`
pub async fn update_title(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    payload: Result<Json<TitlePatch>, JsonRejection>,
) -> Result<Json<ApiResponse<TitleDto>>, ApiError> {
    let Json(payload) = payload?;
    let title = state.catalog().update_title(&actor, id, payload).await?;
    Ok(Json(ApiResponse::success(title.into())))
}

/// `DELETE /api/v1/titles/{id}`
pub async fn delete_title(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete_title(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
