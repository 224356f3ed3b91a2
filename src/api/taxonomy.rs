//! Categories and genres share one shape: name plus slug, looked up by slug.

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TaxonomyDto};
use crate::domain::Actor;
use crate::services::TaxonomyInput;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<TaxonomyDto>>>, ApiError> {
    let categories = state
        .catalog()
        .list_categories(&actor, query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(TaxonomyDto::from).collect(),
    )))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<TaxonomyInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TaxonomyDto>>), ApiError> {
    let Json(payload) = payload?;
    let category = state.catalog().create_category(&actor, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(category.into())),
    ))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete_category(&actor, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<TaxonomyDto>>>, ApiError> {
    let genres = state
        .catalog()
        .list_genres(&actor, query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(
        genres.into_iter().map(TaxonomyDto::from).collect(),
    )))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<TaxonomyInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TaxonomyDto>>), ApiError> {
    let Json(payload) = payload?;
    let genre = state.catalog().create_genre(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(genre.into()))))
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete_genre(&actor, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
