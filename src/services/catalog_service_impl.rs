//! `SeaORM` implementation of the `CatalogService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{NewTitle, Store, TitleChanges, TitleRow};
use crate::domain::{Action, Actor, OneOrMany, Resource, TitleFilter, require, validation};
use crate::entities::{categories, genres};
use crate::services::catalog_service::{
    CatalogError, CatalogService, TaxonomyInput, TitleInput, TitlePatch,
};

pub struct SeaOrmCatalogService {
    store: Store,
}

impl SeaOrmCatalogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn resolve_category(&self, slug: &str) -> Result<i32, CatalogError> {
        self.store
            .get_category_by_slug(slug)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| CatalogError::NotFound(format!("Category '{slug}'")))
    }

    /// Unknown genre slugs are dropped rather than rejected.
    async fn resolve_genres(&self, genre: OneOrMany<String>) -> Result<Vec<i32>, CatalogError> {
        let slugs = genre.into_slugs();
        let found = self.store.find_genres_by_slugs(&slugs).await?;
        Ok(found.into_iter().map(|g| g.id).collect())
    }

    fn normalise_description(description: Option<String>) -> Option<String> {
        description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    }
}

#[async_trait]
impl CatalogService for SeaOrmCatalogService {
    async fn list_titles(
        &self,
        actor: &Actor,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleRow>, CatalogError> {
        require(actor, Action::List, Resource::Title, None)?;
        Ok(self.store.list_titles(filter).await?)
    }

    async fn get_title(&self, actor: &Actor, id: i32) -> Result<TitleRow, CatalogError> {
        require(actor, Action::Retrieve, Resource::Title, None)?;
        self.store
            .get_title(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Title {id}")))
    }

    async fn create_title(
        &self,
        actor: &Actor,
        input: TitleInput,
    ) -> Result<TitleRow, CatalogError> {
        require(actor, Action::Create, Resource::Title, None)?;

        let name = validation::title_name(&input.name)?;
        let year = validation::release_year(input.year)?;

        let category_id = match input.category.as_deref() {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let genre_ids = self.resolve_genres(input.genre).await?;

        let row = self
            .store
            .create_title(NewTitle {
                name,
                year,
                description: Self::normalise_description(input.description),
                category_id,
                genre_ids,
            })
            .await?;

        info!(title_id = row.title.id, name = %row.title.name, "Title created");
        Ok(row)
    }

    async fn update_title(
        &self,
        actor: &Actor,
        id: i32,
        patch: TitlePatch,
    ) -> Result<TitleRow, CatalogError> {
        require(actor, Action::Update, Resource::Title, None)?;

        if !self.store.title_exists(id).await? {
            return Err(CatalogError::NotFound(format!("Title {id}")));
        }

        let mut changes = TitleChanges {
            name: patch
                .name
                .as_deref()
                .map(validation::title_name)
                .transpose()?,
            year: patch.year.map(validation::release_year).transpose()?,
            description: patch.description.map(Self::normalise_description),
            ..Default::default()
        };

        changes.category_id = match patch.category {
            Some(Some(slug)) => Some(Some(self.resolve_category(&slug).await?)),
            Some(None) => Some(None),
            None => None,
        };
        if let Some(genre) = patch.genre {
            changes.genre_ids = Some(self.resolve_genres(genre).await?);
        }

        self.store
            .update_title(id, changes)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Title {id}")))
    }

    async fn delete_title(&self, actor: &Actor, id: i32) -> Result<(), CatalogError> {
        require(actor, Action::Delete, Resource::Title, None)?;

        if !self.store.delete_title(id).await? {
            return Err(CatalogError::NotFound(format!("Title {id}")));
        }

        info!(title_id = id, "Title deleted");
        Ok(())
    }

    async fn list_categories(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<categories::Model>, CatalogError> {
        require(actor, Action::List, Resource::Category, None)?;
        Ok(self.store.list_categories(search).await?)
    }

    async fn create_category(
        &self,
        actor: &Actor,
        input: TaxonomyInput,
    ) -> Result<categories::Model, CatalogError> {
        require(actor, Action::Create, Resource::Category, None)?;

        let name = validation::taxonomy_name(&input.name)?;
        let slug = validation::slug(&input.slug)?;

        if self.store.get_category_by_slug(&slug).await?.is_some() {
            return Err(CatalogError::Conflict(format!(
                "Category with slug '{slug}' already exists"
            )));
        }

        let category = self.store.create_category(name, slug).await?;
        info!(slug = %category.slug, "Category created");
        Ok(category)
    }

    async fn delete_category(&self, actor: &Actor, slug: &str) -> Result<(), CatalogError> {
        require(actor, Action::Delete, Resource::Category, None)?;

        if !self.store.delete_category(slug).await? {
            return Err(CatalogError::NotFound(format!("Category '{slug}'")));
        }

        info!(%slug, "Category deleted");
        Ok(())
    }

    async fn list_genres(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<genres::Model>, CatalogError> {
        require(actor, Action::List, Resource::Genre, None)?;
        Ok(self.store.list_genres(search).await?)
    }

    async fn create_genre(
        &self,
        actor: &Actor,
        input: TaxonomyInput,
    ) -> Result<genres::Model, CatalogError> {
        require(actor, Action::Create, Resource::Genre, None)?;

        let name = validation::taxonomy_name(&input.name)?;
        let slug = validation::slug(&input.slug)?;

        if self.store.get_genre_by_slug(&slug).await?.is_some() {
            return Err(CatalogError::Conflict(format!(
                "Genre with slug '{slug}' already exists"
            )));
        }

        let genre = self.store.create_genre(name, slug).await?;
        info!(slug = %genre.slug, "Genre created");
        Ok(genre)
    }

    async fn delete_genre(&self, actor: &Actor, slug: &str) -> Result<(), CatalogError> {
        require(actor, Action::Delete, Resource::Genre, None)?;

        if !self.store.delete_genre(slug).await? {
            return Err(CatalogError::NotFound(format!("Genre '{slug}'")));
        }

        info!(%slug, "Genre deleted");
        Ok(())
    }
}
