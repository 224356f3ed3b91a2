use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::recompute_rating;
use crate::entities::{prelude::*, reviews, titles, users};

/// A review together with its author's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub review: reviews::Model,
    pub author: String,
}

impl ReviewRow {
    fn from_pair(review: reviews::Model, author: Option<users::Model>) -> Self {
        Self {
            review,
            author: author.map(|u| u.username).unwrap_or_default(),
        }
    }
}

/// Recomputes the mean score of a title and stores it on the title row.
///
/// Callers run this inside the transaction that changed the reviews so the
/// stored rating never disagrees with the committed review set.
pub async fn refresh_rating<C: ConnectionTrait>(conn: &C, title_id: i32) -> Result<Option<f64>> {
    let scores: Vec<i32> = Reviews::find()
        .select_only()
        .column(reviews::Column::Score)
        .filter(reviews::Column::TitleId.eq(title_id))
        .into_tuple()
        .all(conn)
        .await
        .context("Failed to load review scores")?;

    let rating = recompute_rating(&scores);

    Titles::update_many()
        .col_expr(titles::Column::Rating, Expr::value(rating))
        .filter(titles::Column::Id.eq(title_id))
        .exec(conn)
        .await
        .context("Failed to store title rating")?;

    debug!(title_id, ?rating, reviews = scores.len(), "Title rating refreshed");
    Ok(rating)
}

pub struct ReviewRepository {
    conn: DatabaseConnection,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_title(&self, title_id: i32) -> Result<Vec<ReviewRow>> {
        let rows = Reviews::find()
            .find_also_related(Users)
            .filter(reviews::Column::TitleId.eq(title_id))
            .order_by_asc(reviews::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list reviews")?;

        Ok(rows
            .into_iter()
            .map(|(review, author)| ReviewRow::from_pair(review, author))
            .collect())
    }

    /// Looks up a review only if it belongs to `title_id`.
    pub async fn get(&self, title_id: i32, id: i32) -> Result<Option<ReviewRow>> {
        let row = Reviews::find_by_id(id)
            .find_also_related(Users)
            .filter(reviews::Column::TitleId.eq(title_id))
            .one(&self.conn)
            .await
            .context("Failed to query review")?;

        Ok(row.map(|(review, author)| ReviewRow::from_pair(review, author)))
    }

    pub async fn exists_for_author(&self, author_id: i32, title_id: i32) -> Result<bool> {
        let existing = Reviews::find()
            .filter(reviews::Column::AuthorId.eq(author_id))
            .filter(reviews::Column::TitleId.eq(title_id))
            .one(&self.conn)
            .await
            .context("Failed to check for an existing review")?;

        Ok(existing.is_some())
    }

    /// Inserts a review and refreshes the title rating atomically.
    ///
    /// The insert runs first so the unique (author, title) index decides
    /// concurrent attempts; the loser surfaces as a unique violation.
    pub async fn create(
        &self,
        title_id: i32,
        author_id: i32,
        text: String,
        score: i32,
    ) -> Result<reviews::Model> {
        let txn = self.conn.begin().await?;

        let review = reviews::ActiveModel {
            title_id: Set(title_id),
            author_id: Set(author_id),
            text: Set(text),
            score: Set(score),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        refresh_rating(&txn, title_id).await?;

        txn.commit().await?;
        Ok(review)
    }

    pub async fn update(
        &self,
        review: reviews::Model,
        text: Option<String>,
        score: Option<i32>,
    ) -> Result<reviews::Model> {
        let title_id = review.title_id;
        let txn = self.conn.begin().await?;

        let mut active: reviews::ActiveModel = review.into();
        if let Some(text) = text {
            active.text = Set(text);
        }
        if let Some(score) = score {
            active.score = Set(score);
        }
        let updated = active.update(&txn).await?;

        refresh_rating(&txn, title_id).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, review: &reviews::Model) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let result = Reviews::delete_by_id(review.id).exec(&txn).await?;
        refresh_rating(&txn, review.title_id).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
