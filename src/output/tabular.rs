//! SQLite-backed tabular sink
//!
//! One row per note, keyed by note id. Re-collecting a note replaces its row, so
//! repeated runs into the same store never duplicate notes.

use crate::api::Item;
use crate::output::traits::{ItemSink, SinkConfig, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// SQL schema for the tabular store
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    note_id TEXT PRIMARY KEY,
    note_url TEXT NOT NULL,
    note_type TEXT NOT NULL,
    user_id TEXT,
    nickname TEXT,
    title TEXT,
    description TEXT,
    liked_count TEXT,
    collected_count TEXT,
    comment_count TEXT,
    share_count TEXT,
    upload_time TEXT,
    ip_location TEXT,
    tags TEXT,
    media_urls TEXT,
    raw TEXT NOT NULL,
    captured_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
"#;

/// Tabular sink writing one row per note
pub struct TabularSink {
    conn: Mutex<Connection>,
}

impl TabularSink {
    /// Opens or creates the store at `path`, creating parent directories
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite file
    ///
    /// # Returns
    ///
    /// The opened sink, or an error if the store could not be initialized
    pub fn open(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        tracing::debug!("Opened tabular store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a store that lives only in memory
    pub fn open_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Note ids in insertion order
    pub fn note_ids(&self) -> SinkResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT note_id FROM notes ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn lock(&self) -> SinkResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SinkError::Lock(format!("Failed to lock tabular store: {}", e)))
    }

    fn insert(&self, item: &Item) -> SinkResult<()> {
        let tags = serde_json::to_string(&item.tags)?;
        let media: Vec<&str> = item.media.iter().map(|m| m.url.as_str()).collect();
        let media = serde_json::to_string(&media)?;
        let raw = serde_json::to_string(&item.raw)?;
        let upload_time = item
            .published_at
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO notes (
                note_id, note_url, note_type, user_id, nickname, title, description,
                liked_count, collected_count, comment_count, share_count,
                upload_time, ip_location, tags, media_urls, raw, captured_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                item.id,
                item.web_url(),
                item.kind.as_str(),
                item.author.user_id,
                item.author.nickname,
                item.title,
                item.description,
                item.interactions.liked,
                item.interactions.collected,
                item.interactions.comments,
                item.interactions.shares,
                upload_time,
                item.ip_location,
                tags,
                media,
                raw,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ItemSink for TabularSink {
    fn name(&self) -> &'static str {
        "tabular"
    }

    async fn write(&self, item: &Item, _config: &SinkConfig) -> SinkResult<()> {
        self.insert(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::item;
    use crate::api::{MediaKind, MediaRef};
    use crate::output::traits::{MediaFilter, SaveMode};
    use tempfile::TempDir;

    fn config(dir: &Path) -> SinkConfig {
        SinkConfig {
            mode: SaveMode::TabularOnly,
            media_filter: MediaFilter::All,
            media_dir: dir.join("media"),
            tabular_dir: dir.join("excel"),
            table_name: "笔记数据".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rows_keep_collection_order() {
        let sink = TabularSink::open_in_memory().unwrap();
        let dir = TempDir::new().unwrap();
        for id in ["n3", "n1", "n2"] {
            sink.write(&item(id), &config(dir.path())).await.unwrap();
        }
        assert_eq!(sink.note_ids().unwrap(), vec!["n3", "n1", "n2"]);
    }

    #[tokio::test]
    async fn test_recollected_note_replaces_row() {
        let sink = TabularSink::open_in_memory().unwrap();
        let dir = TempDir::new().unwrap();
        let mut note = item("n1");
        sink.write(&note, &config(dir.path())).await.unwrap();
        note.title = "updated".to_string();
        sink.write(&note, &config(dir.path())).await.unwrap();

        assert_eq!(sink.note_ids().unwrap(), vec!["n1"]);
        let conn = sink.lock().unwrap();
        let title: String = conn
            .query_row("SELECT title FROM notes WHERE note_id = 'n1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(title, "updated");
    }

    #[tokio::test]
    async fn test_open_creates_file_and_columns() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let path = config.tabular_path();
        let sink = TabularSink::open(&path).unwrap();
        assert!(path.exists());

        let mut note = item("abc");
        note.published_at = Some(0);
        note.tags = vec!["旅行".to_string()];
        note.media = vec![MediaRef {
            kind: MediaKind::Image,
            url: "https://img.example/1.jpg".to_string(),
        }];
        sink.write(&note, &config).await.unwrap();

        let conn = sink.lock().unwrap();
        let (upload, tags, media): (String, String, String) = conn
            .query_row(
                "SELECT upload_time, tags, media_urls FROM notes WHERE note_id = 'abc'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(upload, "1970-01-01 00:00:00");
        assert_eq!(tags, r#"["旅行"]"#);
        assert_eq!(media, r#"["https://img.example/1.jpg"]"#);
    }
}
