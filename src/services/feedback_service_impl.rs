//! `SeaORM` implementation of the `FeedbackService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{CommentRow, ReviewRow, Store, is_unique_violation};
use crate::domain::{Action, Actor, Owner, Resource, require, validation};
use crate::services::feedback_service::{
    CommentInput, CommentPatch, FeedbackError, FeedbackService, ReviewInput, ReviewPatch,
};

pub struct SeaOrmFeedbackService {
    store: Store,
}

impl SeaOrmFeedbackService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ensure_title(&self, title_id: i32) -> Result<(), FeedbackError> {
        if self.store.title_exists(title_id).await? {
            Ok(())
        } else {
            Err(FeedbackError::NotFound(format!("Title {title_id}")))
        }
    }

    async fn load_review(&self, title_id: i32, id: i32) -> Result<ReviewRow, FeedbackError> {
        self.ensure_title(title_id).await?;
        self.store
            .get_review(title_id, id)
            .await?
            .ok_or_else(|| FeedbackError::NotFound(format!("Review {id}")))
    }

    async fn load_comment(
        &self,
        title_id: i32,
        review_id: i32,
        id: i32,
    ) -> Result<CommentRow, FeedbackError> {
        self.load_review(title_id, review_id).await?;
        self.store
            .get_comment(review_id, id)
            .await?
            .ok_or_else(|| FeedbackError::NotFound(format!("Comment {id}")))
    }

    fn author_id(actor: &Actor) -> Result<i32, FeedbackError> {
        actor.user_id().ok_or(FeedbackError::Unauthenticated)
    }
}

#[async_trait]
impl FeedbackService for SeaOrmFeedbackService {
    async fn can_create_review(
        &self,
        actor: &Actor,
        title_id: i32,
    ) -> Result<bool, FeedbackError> {
        let Some(author_id) = actor.user_id() else {
            return Ok(false);
        };
        Ok(!self.store.has_reviewed(author_id, title_id).await?)
    }

    async fn list_reviews(
        &self,
        actor: &Actor,
        title_id: i32,
    ) -> Result<Vec<ReviewRow>, FeedbackError> {
        require(actor, Action::List, Resource::Review, None)?;
        self.ensure_title(title_id).await?;
        Ok(self.store.list_reviews(title_id).await?)
    }

    async fn get_review(
        &self,
        actor: &Actor,
        title_id: i32,
        id: i32,
    ) -> Result<ReviewRow, FeedbackError> {
        require(actor, Action::Retrieve, Resource::Review, None)?;
        self.load_review(title_id, id).await
    }

    async fn create_review(
        &self,
        actor: &Actor,
        title_id: i32,
        input: ReviewInput,
    ) -> Result<ReviewRow, FeedbackError> {
        require(actor, Action::Create, Resource::Review, None)?;
        let author_id = Self::author_id(actor)?;
        self.ensure_title(title_id).await?;

        let text = validation::text(&input.text)?;
        let score = validation::score(input.score)?;

        if !self.can_create_review(actor, title_id).await? {
            return Err(FeedbackError::DuplicateReview);
        }

        let review = match self
            .store
            .create_review(title_id, author_id, text, score)
            .await
        {
            Ok(review) => review,
            Err(e) if is_unique_violation(&e) => {
                warn!(title_id, author_id, "Concurrent duplicate review rejected");
                return Err(FeedbackError::DuplicateReview);
            }
            Err(e) => return Err(e.into()),
        };

        info!(review_id = review.id, title_id, author_id, score, "Review created");

        self.store
            .get_review(title_id, review.id)
            .await?
            .ok_or_else(|| FeedbackError::Internal("Failed to retrieve created review".into()))
    }

    async fn update_review(
        &self,
        actor: &Actor,
        title_id: i32,
        id: i32,
        patch: ReviewPatch,
    ) -> Result<ReviewRow, FeedbackError> {
        require(actor, Action::Update, Resource::Review, None)?;
        let row = self.load_review(title_id, id).await?;
        require(
            actor,
            Action::Update,
            Resource::Review,
            Some(Owner(row.review.author_id)),
        )?;

        let text = patch.text.as_deref().map(validation::text).transpose()?;
        let score = patch.score.map(validation::score).transpose()?;

        let review = self.store.update_review(row.review, text, score).await?;

        Ok(ReviewRow {
            review,
            author: row.author,
        })
    }

    async fn delete_review(
        &self,
        actor: &Actor,
        title_id: i32,
        id: i32,
    ) -> Result<(), FeedbackError> {
        require(actor, Action::Delete, Resource::Review, None)?;
        let row = self.load_review(title_id, id).await?;
        require(
            actor,
            Action::Delete,
            Resource::Review,
            Some(Owner(row.review.author_id)),
        )?;

        self.store.delete_review(&row.review).await?;
        info!(review_id = id, title_id, "Review deleted");
        Ok(())
    }

    async fn list_comments(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
    ) -> Result<Vec<CommentRow>, FeedbackError> {
        require(actor, Action::List, Resource::Comment, None)?;
        self.load_review(title_id, review_id).await?;
        Ok(self.store.list_comments(review_id).await?)
    }

    async fn get_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        id: i32,
    ) -> Result<CommentRow, FeedbackError> {
        require(actor, Action::Retrieve, Resource::Comment, None)?;
        self.load_comment(title_id, review_id, id).await
    }

    async fn create_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        input: CommentInput,
    ) -> Result<CommentRow, FeedbackError> {
        require(actor, Action::Create, Resource::Comment, None)?;
        let author_id = Self::author_id(actor)?;
        self.load_review(title_id, review_id).await?;

        let text = validation::text(&input.text)?;
        let comment = self
            .store
            .create_comment(review_id, author_id, text)
            .await?;

        info!(comment_id = comment.id, review_id, author_id, "Comment created");

        self.store
            .get_comment(review_id, comment.id)
            .await?
            .ok_or_else(|| FeedbackError::Internal("Failed to retrieve created comment".into()))
    }

    async fn update_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        id: i32,
        patch: CommentPatch,
    ) -> Result<CommentRow, FeedbackError> {
        require(actor, Action::Update, Resource::Comment, None)?;
        let row = self.load_comment(title_id, review_id, id).await?;
        require(
            actor,
            Action::Update,
            Resource::Comment,
            Some(Owner(row.comment.author_id)),
        )?;

        let Some(text) = patch.text.as_deref().map(validation::text).transpose()? else {
            return Ok(row);
        };

        let comment = self.store.update_comment(row.comment, text).await?;
        Ok(CommentRow {
            comment,
            author: row.author,
        })
    }

    async fn delete_comment(
        &self,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        id: i32,
    ) -> Result<(), FeedbackError> {
        require(actor, Action::Delete, Resource::Comment, None)?;
        let row = self.load_comment(title_id, review_id, id).await?;
        require(
            actor,
            Action::Delete,
            Resource::Comment,
            Some(Owner(row.comment.author_id)),
        )?;

        self.store.delete_comment(row.comment.id).await?;
        info!(comment_id = id, review_id, "Comment deleted");
        Ok(())
    }
}
