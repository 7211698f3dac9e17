// src/store.rs
//! SQLite-backed announcement store. The UNIQUE constraint on `url` is the
//! dedup mechanism; everything here is a thin query over that table.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{Announcement, StoredRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS announcements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    content TEXT,
    source TEXT,
    publish_date TEXT NOT NULL,
    crawl_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

const PUBLISH_DATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_announcements_publish_date ON announcements (publish_date)";

const SELECT_COLUMNS: &str =
    "SELECT id, title, url, content, source, publish_date, crawl_date FROM announcements";

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if absent) the database file and ensure the schema exists.
    /// Existing rows are never touched.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database. One connection, so every query sees the same data.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        sqlx::query(PUBLISH_DATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert unless the url is already stored. Returns true only for a fresh row;
    /// a second insert of the same url (even concurrently) is a no-op.
    pub async fn insert_if_new(&self, a: &Announcement) -> Result<bool> {
        let res = sqlx::query(
            "INSERT OR IGNORE INTO announcements (title, url, content, source, publish_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&a.title)
        .bind(&a.url)
        .bind(&a.content)
        .bind(&a.source)
        .bind(&a.publish_date)
        .execute(&self.pool)
        .await?;

        let inserted = res.rows_affected() == 1;
        if inserted {
            info!(url = %a.url, "stored announcement: {}", a.title);
        } else {
            debug!(url = %a.url, "already stored, skipping: {}", a.title);
        }
        Ok(inserted)
    }

    /// Insert each item; returns how many were new.
    pub async fn insert_batch(&self, items: &[Announcement]) -> Result<usize> {
        let mut n = 0usize;
        for a in items {
            if self.insert_if_new(a).await? {
                n += 1;
            }
        }
        Ok(n)
    }

    pub async fn exists(&self, url: &str) -> Result<bool> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM announcements WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    /// Most recently inserted first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<StoredRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?");
        let rows = sqlx::query_as::<_, StoredRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Most recently inserted first.
    pub async fn all(&self) -> Result<Vec<StoredRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id DESC");
        let rows = sqlx::query_as::<_, StoredRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Case-sensitive literal substring match on the title.
    pub async fn find_by_title(&self, needle: &str) -> Result<Vec<StoredRecord>> {
        // instr() instead of LIKE: LIKE folds ASCII case and treats % and _ as wildcards.
        let sql = format!("{SELECT_COLUMNS} WHERE instr(title, ?) > 0 ORDER BY id DESC");
        let rows = sqlx::query_as::<_, StoredRecord>(&sql)
            .bind(needle)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn delete_by_url(&self, url: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM announcements WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Remove the most recently inserted row whose publish_date starts with `date_prefix`.
    pub async fn delete_latest_for_date(&self, date_prefix: &str) -> Result<bool> {
        let res = sqlx::query(
            "DELETE FROM announcements WHERE id = ( \
                 SELECT id FROM announcements \
                 WHERE substr(publish_date, 1, length(?1)) = ?1 \
                 ORDER BY id DESC LIMIT 1)",
        )
        .bind(date_prefix)
        .execute(&self.pool)
        .await?;

        let deleted = res.rows_affected() > 0;
        if deleted {
            info!("deleted latest announcement published {date_prefix}");
        } else {
            info!("no announcement published {date_prefix}");
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM announcements")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM announcements")
            .execute(&self.pool)
            .await?;
        info!("cleared all announcements");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(title: &str, url: &str, date: &str) -> Announcement {
        Announcement::new(title, url, date)
    }

    #[tokio::test]
    async fn insert_if_new_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        let a = ann("进口大豆竞价公告", "http://x/1", "2024-01-01");

        assert!(store.insert_if_new(&a).await.unwrap());
        assert!(!store.insert_if_new(&a).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn first_write_wins_for_same_url() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_if_new(&ann("first", "http://x/1", "2024-01-01"))
            .await
            .unwrap();
        let second = store
            .insert_if_new(&ann("second", "http://x/1", "2024-02-02"))
            .await
            .unwrap();

        assert!(!second);
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "first");
        assert_eq!(all[0].publish_date, "2024-01-01");
        assert!(!all[0].crawl_date.is_empty());
    }

    #[tokio::test]
    async fn recent_orders_newest_insert_first() {
        let store = Store::in_memory().await.unwrap();
        for i in 1..=3 {
            store
                .insert_if_new(&ann(&format!("t{i}"), &format!("http://x/{i}"), "2024-01-01"))
                .await
                .unwrap();
        }
        let recent = store.recent(2).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["t3", "t2"]);
        assert!(recent[0].id > recent[1].id);
    }

    #[tokio::test]
    async fn title_search_is_case_sensitive_and_literal() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_if_new(&ann("Soybean auction", "http://x/1", "2024-01-01"))
            .await
            .unwrap();
        store
            .insert_if_new(&ann("100% wheat", "http://x/2", "2024-01-01"))
            .await
            .unwrap();

        assert_eq!(store.find_by_title("Soybean").await.unwrap().len(), 1);
        assert!(store.find_by_title("soybean").await.unwrap().is_empty());
        assert_eq!(store.find_by_title("%").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_latest_for_date_removes_newest_match_only() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_if_new(&ann("a", "http://x/1", "2024-01-01 09:00"))
            .await
            .unwrap();
        store
            .insert_if_new(&ann("b", "http://x/2", "2024-01-01 10:00"))
            .await
            .unwrap();
        store
            .insert_if_new(&ann("c", "http://x/3", "2024-01-02"))
            .await
            .unwrap();

        assert!(store.delete_latest_for_date("2024-01-01").await.unwrap());
        assert!(store.exists("http://x/1").await.unwrap());
        assert!(!store.exists("http://x/2").await.unwrap());
        assert!(store.exists("http://x/3").await.unwrap());

        assert!(!store.delete_latest_for_date("2023").await.unwrap());
    }

    #[tokio::test]
    async fn delete_by_url_and_clear() {
        let store = Store::in_memory().await.unwrap();
        store
            .insert_if_new(&ann("a", "http://x/1", "2024-01-01"))
            .await
            .unwrap();
        store
            .insert_if_new(&ann("b", "http://x/2", "2024-01-01"))
            .await
            .unwrap();

        assert!(store.delete_by_url("http://x/1").await.unwrap());
        assert!(!store.delete_by_url("http://x/1").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_batch_counts_only_new_rows() {
        let store = Store::in_memory().await.unwrap();
        let items = vec![
            ann("a", "http://x/1", "2024-01-01"),
            ann("a again", "http://x/1", "2024-01-01"),
            ann("b", "http://x/2", "2024-01-01"),
        ];
        assert_eq!(store.insert_batch(&items).await.unwrap(), 2);
    }
}
