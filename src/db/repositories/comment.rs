use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{comments, prelude::*, users};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub comment: comments::Model,
    pub author: String,
}

impl CommentRow {
    fn from_pair(comment: comments::Model, author: Option<users::Model>) -> Self {
        Self {
            comment,
            author: author.map(|u| u.username).unwrap_or_default(),
        }
    }
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_review(&self, review_id: i32) -> Result<Vec<CommentRow>> {
        let rows = Comments::find()
            .find_also_related(Users)
            .filter(comments::Column::ReviewId.eq(review_id))
            .order_by_asc(comments::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?;

        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentRow::from_pair(comment, author))
            .collect())
    }

    /// Looks up a comment only if it belongs to `review_id`.
    pub async fn get(&self, review_id: i32, id: i32) -> Result<Option<CommentRow>> {
        let row = Comments::find_by_id(id)
            .find_also_related(Users)
            .filter(comments::Column::ReviewId.eq(review_id))
            .one(&self.conn)
            .await
            .context("Failed to query comment")?;

        Ok(row.map(|(comment, author)| CommentRow::from_pair(comment, author)))
    }

    pub async fn create(
        &self,
        review_id: i32,
        author_id: i32,
        text: String,
    ) -> Result<comments::Model> {
        let comment = comments::ActiveModel {
            review_id: Set(review_id),
            author_id: Set(author_id),
            text: Set(text),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(comment)
    }

    pub async fn update(&self, comment: comments::Model, text: String) -> Result<comments::Model> {
        let mut active: comments::ActiveModel = comment.into();
        active.text = Set(text);
        Ok(active.update(&self.conn).await?)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Comments::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
