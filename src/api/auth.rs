use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TokenDto};
use crate::domain::Actor;
use crate::services::{AccountError, ActivationInput, LoginInput, SignupInput, SignupReceipt};

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            AccountError::Unauthenticated => Self::unauthenticated(),
            AccountError::Forbidden => Self::forbidden(),
            AccountError::InvalidField(field) => field.into(),
            AccountError::InvalidCredentials => {
                Self::Unauthorized("Invalid credentials".to_string())
            }
            AccountError::Conflict(msg) => Self::Conflict(msg),
            AccountError::Mail(msg) => Self::mail_error(msg),
            AccountError::Database(msg) => Self::DatabaseError(msg),
            AccountError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller into an [`Actor`] and stores it in the request
/// extensions. Requests without a valid token proceed as anonymous; the
/// services decide what anonymous callers may do.
///
/// Tokens are read from:
/// 1. `X-Api-Key` header
/// 2. `Authorization: Bearer <token>` header
pub async fn actor_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = match extract_token(&headers) {
        Some(token) => state.accounts().resolve_token(&token).await?,
        None => Actor::Anonymous,
    };

    if let Some(user_id) = actor.user_id() {
        tracing::Span::current().record("user_id", user_id);
    }

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/email
/// Registers an inactive account and mails its confirmation code
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<SignupInput>, JsonRejection>,
) -> Result<Json<ApiResponse<SignupReceipt>>, ApiError> {
    let Json(payload) = payload?;
    let receipt = state.accounts().signup(&actor, payload).await?;
    Ok(Json(ApiResponse::success(receipt)))
}

/// POST /auth/token
/// Exchanges a confirmation code for an activated account and its token
pub async fn activate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ActivationInput>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let Json(payload) = payload?;
    let token = state.accounts().activate(payload).await?;
    Ok(Json(ApiResponse::success(TokenDto { token })))
}

/// POST /auth/token/refresh
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let token = state.accounts().refresh_token(&actor).await?;
    Ok(Json(ApiResponse::success(TokenDto { token })))
}

/// POST /token
/// Authenticate with username and password, returns the bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let Json(payload) = payload?;

    if payload.username.is_empty() {
        return Err(ApiError::InvalidField {
            field: "username".to_string(),
            message: "Username is required".to_string(),
        });
    }
    if payload.password.is_empty() {
        return Err(ApiError::InvalidField {
            field: "password".to_string(),
            message: "Password is required".to_string(),
        });
    }

    let token = state.accounts().login(payload).await?;
    Ok(Json(ApiResponse::success(TokenDto { token })))
}
