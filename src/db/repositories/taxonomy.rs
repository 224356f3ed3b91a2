//! Categories and genres: flat name/slug lookups.

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::name_search;
use crate::entities::{categories, genres, prelude::*};

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Lists categories in reverse slug order, optionally narrowed by a
    /// case-insensitive name search.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<categories::Model>> {
        let mut query = Categories::find().order_by_desc(categories::Column::Slug);

        if let Some(pattern) = name_search(search) {
            query = query.filter(categories::Column::NameLower.like(pattern));
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to list categories")
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<categories::Model>> {
        Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query category by slug")
    }

    pub async fn create(&self, name: String, slug: String) -> Result<categories::Model> {
        let model = categories::ActiveModel {
            name_lower: Set(name.to_lowercase()),
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    /// Titles in this category keep existing with a null category.
    pub async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let result = Categories::delete_many()
            .filter(categories::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

pub struct GenreRepository {
    conn: DatabaseConnection,
}

impl GenreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<genres::Model>> {
        let mut query = Genres::find().order_by_asc(genres::Column::Slug);

        if let Some(pattern) = name_search(search) {
            query = query.filter(genres::Column::NameLower.like(pattern));
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to list genres")
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<genres::Model>> {
        Genres::find()
            .filter(genres::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query genre by slug")
    }

    /// Resolves the known slugs; unknown ones are skipped.
    pub async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<genres::Model>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        Genres::find()
            .filter(genres::Column::Slug.is_in(slugs.iter().cloned()))
            .order_by_asc(genres::Column::Slug)
            .all(&self.conn)
            .await
            .context("Failed to query genres by slug")
    }

    pub async fn create(&self, name: String, slug: String) -> Result<genres::Model> {
        let model = genres::ActiveModel {
            name_lower: Set(name.to_lowercase()),
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    /// Detaches the genre from its titles; the titles themselves remain.
    pub async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let result = Genres::delete_many()
            .filter(genres::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
