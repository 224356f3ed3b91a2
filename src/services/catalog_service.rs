//! Domain service for the catalog: titles, categories and genres.
//!
//! Reads are open to everyone; every write requires an admin. Ratings are
//! never written here, they follow the review set (see the feedback service).

use serde::Deserialize;
use thiserror::Error;

use crate::db::{TitleRow, is_unique_violation};
use crate::domain::{Actor, Denial, FieldError, OneOrMany, TitleFilter, nullable};
use crate::entities::{categories, genres};

/// Errors specific to catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Invalid {}: {}", .0.field, .0.message)]
    InvalidField(FieldError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Denial> for CatalogError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::Forbidden => Self::Forbidden,
        }
    }
}

impl From<FieldError> for CatalogError {
    fn from(err: FieldError) -> Self {
        Self::InvalidField(err)
    }
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        if is_unique_violation(&err) {
            return Self::Conflict("slug already exists".to_string());
        }
        Self::Internal(format!("{err:#}"))
    }
}

/// Body of a title create request. `category` and `genre` are slugs.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleInput {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub genre: OneOrMany<String>,
}

/// Partial title update; an explicit `null` clears `description` or
/// `category`, a present `genre` replaces the whole genre set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitlePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default)]
    pub genre: Option<OneOrMany<String>>,
}

/// Category or genre.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyInput {
    pub name: String,
    pub slug: String,
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Lists titles matching every criterion in `filter`, in id order.
    async fn list_titles(
        &self,
        actor: &Actor,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleRow>, CatalogError>;

    async fn get_title(&self, actor: &Actor, id: i32) -> Result<TitleRow, CatalogError>;

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if `category` names no category.
    async fn create_title(&self, actor: &Actor, input: TitleInput)
    -> Result<TitleRow, CatalogError>;

    async fn update_title(
        &self,
        actor: &Actor,
        id: i32,
        patch: TitlePatch,
    ) -> Result<TitleRow, CatalogError>;

    /// Deletes the title together with its reviews and their comments.
    async fn delete_title(&self, actor: &Actor, id: i32) -> Result<(), CatalogError>;

    async fn list_categories(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<categories::Model>, CatalogError>;

    async fn create_category(
        &self,
        actor: &Actor,
        input: TaxonomyInput,
    ) -> Result<categories::Model, CatalogError>;

    /// Titles in the category survive with no category.
    async fn delete_category(&self, actor: &Actor, slug: &str) -> Result<(), CatalogError>;

    async fn list_genres(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<genres::Model>, CatalogError>;

    async fn create_genre(
        &self,
        actor: &Actor,
        input: TaxonomyInput,
    ) -> Result<genres::Model, CatalogError>;

    async fn delete_genre(&self, actor: &Actor, slug: &str) -> Result<(), CatalogError>;
}
