use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, LoaderTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::name_search;
use crate::domain::TitleFilter;
use crate::entities::{categories, genres, prelude::*, title_genres, titles};

/// A title with its category and genres resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRow {
    pub title: titles::Model,
    pub category: Option<categories::Model>,
    pub genres: Vec<genres::Model>,
}

#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub genre_ids: Vec<i32>,
}

/// Partial update. `category_id: Some(None)` clears the category;
/// `genre_ids: Some(..)` replaces the genre set.
#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<i32>>,
    pub genre_ids: Option<Vec<i32>>,
}

pub struct TitleRepository {
    conn: DatabaseConnection,
}

impl TitleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Lists titles in insertion order, narrowed by `filter`.
    pub async fn list(&self, filter: &TitleFilter) -> Result<Vec<TitleRow>> {
        let mut query = Titles::find().order_by_asc(titles::Column::Id);

        if let Some(pattern) = name_search(filter.name.as_deref()) {
            query = query.filter(titles::Column::NameLower.like(pattern));
        }

        if let Some(year) = filter.year {
            query = query.filter(titles::Column::Year.eq(year));
        }

        // A numeric value may be either a category id or a numeric slug.
        if let Some(category) = filter.category() {
            let by_slug = titles::Column::CategoryId.in_subquery(
                Query::select()
                    .column(categories::Column::Id)
                    .from(Categories)
                    .and_where(Expr::col(categories::Column::Slug).eq(category))
                    .to_owned(),
            );
            let condition = match category.parse::<i32>() {
                Ok(id) => Condition::any()
                    .add(titles::Column::CategoryId.eq(id))
                    .add(by_slug),
                Err(_) => Condition::all().add(by_slug),
            };
            query = query.filter(condition);
        }

        let genre_slugs = filter.genre_slugs();
        if !genre_slugs.is_empty() {
            query = query.filter(
                titles::Column::Id.in_subquery(
                    Query::select()
                        .column((TitleGenres, title_genres::Column::TitleId))
                        .from(TitleGenres)
                        .inner_join(
                            Genres,
                            Expr::col((Genres, genres::Column::Id))
                                .equals((TitleGenres, title_genres::Column::GenreId)),
                        )
                        .and_where(Expr::col((Genres, genres::Column::Slug)).is_in(genre_slugs))
                        .to_owned(),
                ),
            );
        }

        let models = query
            .all(&self.conn)
            .await
            .context("Failed to list titles")?;

        self.attach_relations(models).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<TitleRow>> {
        let Some(model) = Titles::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query title")?
        else {
            return Ok(None);
        };

        Ok(self.attach_relations(vec![model]).await?.pop())
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(Titles::find_by_id(id).one(&self.conn).await?.is_some())
    }

    pub async fn create(&self, new_title: NewTitle) -> Result<TitleRow> {
        let txn = self.conn.begin().await?;

        let model = titles::ActiveModel {
            name_lower: Set(new_title.name.to_lowercase()),
            name: Set(new_title.name),
            year: Set(new_title.year),
            description: Set(new_title.description),
            category_id: Set(new_title.category_id),
            rating: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_genres(&txn, model.id, &new_title.genre_ids).await?;

        txn.commit().await?;

        self.get(model.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created title"))
    }

    pub async fn update(&self, id: i32, changes: TitleChanges) -> Result<Option<TitleRow>> {
        let txn = self.conn.begin().await?;

        let Some(model) = Titles::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: titles::ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name_lower = Set(name.to_lowercase());
            active.name = Set(name);
        }
        if let Some(year) = changes.year {
            active.year = Set(year);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        active.update(&txn).await?;

        if let Some(genre_ids) = changes.genre_ids {
            replace_genres(&txn, id, &genre_ids).await?;
        }

        txn.commit().await?;
        self.get(id).await
    }

    /// Reviews and their comments cascade with the title.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Titles::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn attach_relations(&self, models: Vec<titles::Model>) -> Result<Vec<TitleRow>> {
        let categories = models.load_one(Categories, &self.conn).await?;
        let genres = models
            .load_many_to_many(Genres, TitleGenres, &self.conn)
            .await?;

        Ok(models
            .into_iter()
            .zip(categories)
            .zip(genres)
            .map(|((title, category), mut genres)| {
                genres.sort_by(|a, b| a.slug.cmp(&b.slug));
                TitleRow {
                    title,
                    category,
                    genres,
                }
            })
            .collect())
    }
}

async fn replace_genres(txn: &DatabaseTransaction, title_id: i32, genre_ids: &[i32]) -> Result<()> {
    TitleGenres::delete_many()
        .filter(title_genres::Column::TitleId.eq(title_id))
        .exec(txn)
        .await?;

    if genre_ids.is_empty() {
        return Ok(());
    }

    let mut ids = genre_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let links: Vec<title_genres::ActiveModel> = ids
        .into_iter()
        .map(|genre_id| title_genres::ActiveModel {
            title_id: Set(title_id),
            genre_id: Set(genre_id),
        })
        .collect();

    TitleGenres::insert_many(links).exec(txn).await?;
    Ok(())
}
