use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::TitleFilter;
use crate::entities::{categories, comments, genres, reviews};

pub mod migrator;
pub mod repositories;

pub use repositories::comment::CommentRow;
pub use repositories::review::ReviewRow;
pub use repositories::title::{NewTitle, TitleChanges, TitleRow};
pub use repositories::user::{NewUser, User, UserChanges};

/// True when `err` wraps a unique-constraint violation from the database.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<DbErr>())
        .any(|db_err| matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::taxonomy::CategoryRepository {
        repositories::taxonomy::CategoryRepository::new(self.conn.clone())
    }

    fn genre_repo(&self) -> repositories::taxonomy::GenreRepository {
        repositories::taxonomy::GenreRepository::new(self.conn.clone())
    }

    fn title_repo(&self) -> repositories::title::TitleRepository {
        repositories::title::TitleRepository::new(self.conn.clone())
    }

    fn review_repo(&self) -> repositories::review::ReviewRepository {
        repositories::review::ReviewRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn activate_user(&self, id: i32) -> Result<String> {
        self.user_repo().activate(id).await
    }

    pub async fn verify_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().verify_token(token).await
    }

    pub async fn ensure_user_token(&self, id: i32) -> Result<String> {
        self.user_repo().ensure_token(id).await
    }

    pub async fn regenerate_user_token(&self, id: i32) -> Result<String> {
        self.user_repo().regenerate_token(id).await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn set_user_password(
        &self,
        id: i32,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo().set_password(id, password, config).await
    }

    // Categories & genres

    pub async fn list_categories(&self, search: Option<&str>) -> Result<Vec<categories::Model>> {
        self.category_repo().list(search).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<categories::Model>> {
        self.category_repo().get_by_slug(slug).await
    }

    pub async fn create_category(&self, name: String, slug: String) -> Result<categories::Model> {
        self.category_repo().create(name, slug).await
    }

    pub async fn delete_category(&self, slug: &str) -> Result<bool> {
        self.category_repo().delete_by_slug(slug).await
    }

    pub async fn list_genres(&self, search: Option<&str>) -> Result<Vec<genres::Model>> {
        self.genre_repo().list(search).await
    }

    pub async fn get_genre_by_slug(&self, slug: &str) -> Result<Option<genres::Model>> {
        self.genre_repo().get_by_slug(slug).await
    }

    pub async fn find_genres_by_slugs(&self, slugs: &[String]) -> Result<Vec<genres::Model>> {
        self.genre_repo().find_by_slugs(slugs).await
    }

    pub async fn create_genre(&self, name: String, slug: String) -> Result<genres::Model> {
        self.genre_repo().create(name, slug).await
    }

    pub async fn delete_genre(&self, slug: &str) -> Result<bool> {
        self.genre_repo().delete_by_slug(slug).await
    }

    // Titles

    pub async fn list_titles(&self, filter: &TitleFilter) -> Result<Vec<TitleRow>> {
        self.title_repo().list(filter).await
    }

    pub async fn get_title(&self, id: i32) -> Result<Option<TitleRow>> {
        self.title_repo().get(id).await
    }

    pub async fn title_exists(&self, id: i32) -> Result<bool> {
        self.title_repo().exists(id).await
    }

    pub async fn create_title(&self, new_title: NewTitle) -> Result<TitleRow> {
        self.title_repo().create(new_title).await
    }

    pub async fn update_title(&self, id: i32, changes: TitleChanges) -> Result<Option<TitleRow>> {
        self.title_repo().update(id, changes).await
    }

    pub async fn delete_title(&self, id: i32) -> Result<bool> {
        self.title_repo().delete(id).await
    }

    // Reviews

    pub async fn list_reviews(&self, title_id: i32) -> Result<Vec<ReviewRow>> {
        self.review_repo().list_for_title(title_id).await
    }

    pub async fn get_review(&self, title_id: i32, id: i32) -> Result<Option<ReviewRow>> {
        self.review_repo().get(title_id, id).await
    }

    pub async fn has_reviewed(&self, author_id: i32, title_id: i32) -> Result<bool> {
        self.review_repo()
            .exists_for_author(author_id, title_id)
            .await
    }

    pub async fn create_review(
        &self,
        title_id: i32,
        author_id: i32,
        text: String,
        score: i32,
    ) -> Result<reviews::Model> {
        self.review_repo()
            .create(title_id, author_id, text, score)
            .await
    }

    pub async fn update_review(
        &self,
        review: reviews::Model,
        text: Option<String>,
        score: Option<i32>,
    ) -> Result<reviews::Model> {
        self.review_repo().update(review, text, score).await
    }

    pub async fn delete_review(&self, review: &reviews::Model) -> Result<bool> {
        self.review_repo().delete(review).await
    }

    // Comments

    pub async fn list_comments(&self, review_id: i32) -> Result<Vec<CommentRow>> {
        self.comment_repo().list_for_review(review_id).await
    }

    pub async fn get_comment(&self, review_id: i32, id: i32) -> Result<Option<CommentRow>> {
        self.comment_repo().get(review_id, id).await
    }

    pub async fn create_comment(
        &self,
        review_id: i32,
        author_id: i32,
        text: String,
    ) -> Result<comments::Model> {
        self.comment_repo().create(review_id, author_id, text).await
    }

    pub async fn update_comment(
        &self,
        comment: comments::Model,
        text: String,
    ) -> Result<comments::Model> {
        self.comment_repo().update(comment, text).await
    }

    pub async fn delete_comment(&self, id: i32) -> Result<bool> {
        self.comment_repo().delete(id).await
    }
}
