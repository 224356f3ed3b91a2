//! Domain service for reviews and the comments hanging off them.
//!
//! Every route is nested under a title (and, for comments, a review), and
//! the parent chain is validated before anything else touches the store.

use serde::Deserialize;
use thiserror::Error;

use crate::db::{CommentRow, ReviewRow, is_unique_violation};
use crate::domain::{Actor, Denial, FieldError};

/// Errors specific to review and comment operations.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Invalid {}: {}", .0.field, .0.message)]
    InvalidField(FieldError),

    #[error("You have already reviewed this title")]
    DuplicateReview,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Denial> for FeedbackError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::Forbidden => Self::Forbidden,
        }
    }
}

impl From<FieldError> for FeedbackError {
    fn from(err: FieldError) -> Self {
        Self::InvalidField(err)
    }
}

impl From<sea_orm::DbErr> for FeedbackError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FeedbackError {
    fn from(err: anyhow::Error) -> Self {
        // The only unique index on feedback tables is (author, title).
        if is_unique_violation(&err) {
            return Self::DuplicateReview;
        }
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    #[serde(default)]
    pub text: Option<String>,
}

#[async_trait::async_trait]
pub trait FeedbackService: Send + Sync {
    /// True when `actor` is authenticated and has not yet reviewed the title.
    async fn can_create_review(&self, actor: &Actor, title_id: i32)
    -> Result<bool, FeedbackError>;

    async fn list_reviews(
        &self,
        actor: &Actor,
        title_id: i32,
    ) -> Result<Vec<ReviewRow>, FeedbackError>;

    async fn get_review(
        &self,
        actor: &Actor,
        title_id: i32,
        id: i32,
    ) -> Result<ReviewRow, FeedbackError>;

    /// Creates a review and refreshes the title rating in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError::DuplicateReview`] if the actor already
    /// reviewed the title, including when two attempts race.
    async fn create_review(
        &self,
        actor: &Actor,
        title_id: i32,
        input: ReviewInput,
    ) -> Result<ReviewRow, FeedbackError>;

    async fn update_review(
        &self,
        actor: &Actor,
        title_id: i32,
        id: i32,
        patch: ReviewPatch,
    ) -> Result<ReviewRow, FeedbackError>;

    async fn delete_review(&self, actor: &Actor, title_id: i32, id: i32)
    -> Result<(), FeedbackError>;

    async fn list_comments(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
    ) -> Result<Vec<CommentRow>, FeedbackError>;

    async fn get_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        id: i32,
    ) -> Result<CommentRow, FeedbackError>;

    async fn create_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        input: CommentInput,
    ) -> Result<CommentRow, FeedbackError>;

    async fn update_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        id: i32,
        patch: CommentPatch,
    ) -> Result<CommentRow, FeedbackError>;

    async fn delete_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        id: i32,
    ) -> Result<(), FeedbackError>;
}
