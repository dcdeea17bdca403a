//! News repository
//!
//! - `NewsRepository` trait defining news data access
//! - `SqlxNewsRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::News;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const NEWS_COLUMNS: &str = "id, title, summary, content, category, image_url, created_at";

const INSERT_NEWS_SQL: &str = r#"
    INSERT INTO news (id, title, summary, content, category, image_url, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// All news, newest first
    async fn list(&self) -> Result<Vec<News>>;

    /// Get news item by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<News>>;

    /// Insert a news item, keeping its `created_at`
    async fn create(&self, news: &News) -> Result<News>;

    /// Insert every item or none of them
    async fn create_many(&self, news: &[News]) -> Result<()>;

    /// Set the illustration URL and nothing else.
    ///
    /// Returns `false` when no news item has this ID.
    async fn update_image(&self, id: &str, image_url: &str) -> Result<bool>;

    /// Number of stored news items
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based news repository
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn list(&self) -> Result<Vec<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_news_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => list_news_mysql(mysql_pool(&self.pool)?).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_news_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn create(&self, news: &News) -> Result<News> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_news_sqlite(sqlite_pool(&self.pool)?, news).await,
            DatabaseDriver::Mysql => create_news_mysql(mysql_pool(&self.pool)?, news).await,
        }
    }

    async fn create_many(&self, news: &[News]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_many_news_sqlite(sqlite_pool(&self.pool)?, news).await,
            DatabaseDriver::Mysql => create_many_news_mysql(mysql_pool(&self.pool)?, news).await,
        }
    }

    async fn update_image(&self, id: &str, image_url: &str) -> Result<bool> {
        let sql = "UPDATE news SET image_url = ? WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(image_url)
                .bind(id)
                .execute(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to update news image")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(image_url)
                .bind(id)
                .execute(mysql_pool(&self.pool)?)
                .await
                .context("Failed to update news image")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS n FROM news";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to count news")?
                .get("n"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql_pool(&self.pool)?)
                .await
                .context("Failed to count news")?
                .get("n"),
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_news_sqlite(pool: &SqlitePool) -> Result<Vec<News>> {
    let sql = format!("SELECT {} FROM news ORDER BY created_at DESC", NEWS_COLUMNS);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list news")?;

    Ok(rows.iter().map(row_to_news_sqlite).collect())
}

async fn get_news_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<News>> {
    let sql = format!("SELECT {} FROM news WHERE id = ?", NEWS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.as_ref().map(row_to_news_sqlite))
}

async fn create_news_sqlite(pool: &SqlitePool, news: &News) -> Result<News> {
    sqlx::query(INSERT_NEWS_SQL)
        .bind(&news.id)
        .bind(&news.title)
        .bind(&news.summary)
        .bind(&news.content)
        .bind(&news.category)
        .bind(&news.image_url)
        .bind(news.created_at)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(news.clone())
}

async fn create_many_news_sqlite(pool: &SqlitePool, items: &[News]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for news in items {
        sqlx::query(INSERT_NEWS_SQL)
            .bind(&news.id)
            .bind(&news.title)
            .bind(&news.summary)
            .bind(&news.content)
            .bind(&news.category)
            .bind(&news.image_url)
            .bind(news.created_at)
            .execute(&mut *tx)
            .await
            .context("Failed to create news")?;
    }
    tx.commit().await.context("Failed to commit news")?;
    Ok(())
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        summary: row.get("summary"),
        content: row.get("content"),
        category: row.get("category"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_news_mysql(pool: &MySqlPool) -> Result<Vec<News>> {
    let sql = format!("SELECT {} FROM news ORDER BY created_at DESC", NEWS_COLUMNS);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list news")?;

    Ok(rows.iter().map(row_to_news_mysql).collect())
}

async fn get_news_mysql(pool: &MySqlPool, id: &str) -> Result<Option<News>> {
    let sql = format!("SELECT {} FROM news WHERE id = ?", NEWS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.as_ref().map(row_to_news_mysql))
}

async fn create_news_mysql(pool: &MySqlPool, news: &News) -> Result<News> {
    sqlx::query(INSERT_NEWS_SQL)
        .bind(&news.id)
        .bind(&news.title)
        .bind(&news.summary)
        .bind(&news.content)
        .bind(&news.category)
        .bind(&news.image_url)
        .bind(news.created_at)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(news.clone())
}

async fn create_many_news_mysql(pool: &MySqlPool, items: &[News]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for news in items {
        sqlx::query(INSERT_NEWS_SQL)
            .bind(&news.id)
            .bind(&news.title)
            .bind(&news.summary)
            .bind(&news.content)
            .bind(&news.category)
            .bind(&news.image_url)
            .bind(news.created_at)
            .execute(&mut *tx)
            .await
            .context("Failed to create news")?;
    }
    tx.commit().await.context("Failed to commit news")?;
    Ok(())
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        summary: row.get("summary"),
        content: row.get("content"),
        category: row.get("category"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateNewsInput;
    use chrono::{Duration, Utc};

    async fn setup_test_repo() -> SqlxNewsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxNewsRepository::new(pool)
    }

    fn news_item(title: &str, age_hours: i64) -> News {
        let mut news = News::new(CreateNewsInput {
            title: title.to_string(),
            summary: "Resumo".to_string(),
            content: "Conteúdo".to_string(),
            category: "Prevenção".to_string(),
            image_url: None,
        });
        news.created_at = Utc::now() - Duration::hours(age_hours);
        news
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_test_repo().await;
        repo.create(&news_item("old", 48)).await.unwrap();
        repo.create(&news_item("newest", 1)).await.unwrap();
        repo.create(&news_item("middle", 24)).await.unwrap();

        let titles: Vec<String> = repo.list().await.unwrap().into_iter().map(|n| n.title).collect();

        assert_eq!(titles, vec!["newest", "middle", "old"]);
    }

    #[tokio::test]
    async fn test_update_image_keeps_other_fields() {
        let repo = setup_test_repo().await;
        let created = repo.create(&news_item("Vacinação", 2)).await.unwrap();

        assert!(repo.update_image(&created.id, "https://img/1.png").await.unwrap());
        let found = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(found.title, created.title);
        assert_eq!(found.summary, created.summary);
        assert_eq!(found.category, created.category);
        assert_eq!(found.created_at, created.created_at);
        assert_eq!(found.image_url.as_deref(), Some("https://img/1.png"));
    }

    #[tokio::test]
    async fn test_get_missing_and_update_missing() {
        let repo = setup_test_repo().await;

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert!(!repo.update_image("missing", "https://x").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_many_keeps_order_and_rolls_back() {
        let repo = setup_test_repo().await;
        let newer = news_item("Mais recente", 1);
        let mut clash = news_item("Repetida", 2);
        clash.id = newer.id.clone();

        assert!(repo.create_many(&[newer.clone(), clash]).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create_many(&[news_item("Antiga", 5), newer]).await.unwrap();
        let titles: Vec<String> = repo.list().await.unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Mais recente", "Antiga"]);
    }
}
