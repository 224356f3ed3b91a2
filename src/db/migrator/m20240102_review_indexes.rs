use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_author_title_unique ON reviews(author_id, title_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_reviews_title ON reviews(title_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_comments_review ON comments(review_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_title_genres_genre ON title_genres(genre_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_title_genres_genre")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_comments_review")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_reviews_title")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_reviews_author_title_unique")
            .await?;

        Ok(())
    }
}
