//! Repository for CRUD operations on thoughts and tags

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use super::schema::{Schema, SCHEMA_VERSION};
use crate::error::{Result, StoreError};
use crate::model::{
    normalize_tag_name, Tag, TagId, TagUsage, Thought, ThoughtId, UserId, MAX_TAG_BYTES,
};

const SELECT_THOUGHT: &str = "SELECT th.id, th.owner_id, th.text, th.image_path, th.created_at, tg.id, tg.name \
     FROM thoughts th LEFT JOIN tags tg ON tg.id = th.tag_id";

/// Synchronous SQLite repository.
///
/// Every mutating method runs as a single transaction.
pub struct Repository {
    conn: rusqlite::Connection,
}

impl Repository {
    /// Open (or create) a repository at the given database path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: rusqlite::Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        let current_version = self.get_schema_version().unwrap_or(0);

        if current_version == 0 {
            self.conn.execute_batch(Schema::create_tables())?;
            self.set_schema_version(SCHEMA_VERSION)?;
        } else if current_version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: current_version,
            }
            .into());
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Option<u32> {
        self.conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok()
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        Ok(())
    }

    // ==================== Tag Operations ====================

    /// Insert a tag if its normalized name is new, returning the id either way
    pub fn create_tag(&self, name: &str) -> Result<TagId> {
        let name = normalize_tag_name(name)
            .ok_or_else(|| StoreError::Validation("tag name is empty".to_string()))?;
        if name.len() > MAX_TAG_BYTES {
            return Err(StoreError::TagTooLong {
                max_bytes: MAX_TAG_BYTES,
            }
            .into());
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            [&name],
        )?;
        let id: i64 = tx.query_row("SELECT id FROM tags WHERE name = ?1", [&name], |row| {
            row.get(0)
        })?;
        tx.commit()?;

        Ok(TagId(id))
    }

    /// Get all tags, ordered by name
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name ASC")?;

        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: TagId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// Tags with the number of thoughts referencing them, most used first
    pub fn tag_usage_counts(&self) -> Result<Vec<TagUsage>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.id, tg.name, COUNT(th.id) AS usage_count
            FROM tags tg
            LEFT JOIN thoughts th ON th.tag_id = tg.id
            GROUP BY tg.id, tg.name
            ORDER BY usage_count DESC, tg.name ASC
            "#,
        )?;

        let usage = stmt
            .query_map([], |row| {
                let count: i64 = row.get(2)?;
                Ok(TagUsage {
                    tag: Tag {
                        id: TagId(row.get(0)?),
                        name: row.get(1)?,
                    },
                    count: count.max(0) as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(usage)
    }

    // ==================== Thought Operations ====================

    /// Save a new untagged thought stamped with the current time
    pub fn create_thought(
        &self,
        owner_id: UserId,
        text: &str,
        image_path: Option<&str>,
    ) -> Result<ThoughtId> {
        self.insert_thought(owner_id, text, image_path, Utc::now())
    }

    /// Save a new untagged thought with an explicit creation time
    pub fn insert_thought(
        &self,
        owner_id: UserId,
        text: &str,
        image_path: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<ThoughtId> {
        if text.trim().is_empty() {
            return Err(StoreError::Validation("thought text is empty".to_string()).into());
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO thoughts (owner_id, text, tag_id, image_path, created_at) VALUES (?1, ?2, NULL, ?3, ?4)",
            params![
                owner_id.0,
                text,
                image_path,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(ThoughtId(id))
    }

    /// Get a thought by id
    pub fn get_thought(&self, id: ThoughtId) -> Result<Option<Thought>> {
        let sql = format!("{SELECT_THOUGHT} WHERE th.id = ?1");
        let thought = self
            .conn
            .query_row(&sql, [id.0], Self::row_to_thought)
            .optional()?;
        Ok(thought)
    }

    /// All thoughts, most recent first
    pub fn list_thoughts(&self) -> Result<Vec<Thought>> {
        let sql = format!("{SELECT_THOUGHT} ORDER BY th.created_at DESC, th.id DESC");
        let mut stmt = self.conn.prepare(&sql)?;

        let thoughts = stmt
            .query_map([], Self::row_to_thought)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(thoughts)
    }

    /// Thoughts carrying the given tag, most recent first
    pub fn list_thoughts_by_tag(&self, tag_name: &str) -> Result<Vec<Thought>> {
        let Some(name) = normalize_tag_name(tag_name) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "{SELECT_THOUGHT} WHERE tg.name = ?1 ORDER BY th.created_at DESC, th.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let thoughts = stmt
            .query_map([&name], Self::row_to_thought)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(thoughts)
    }

    /// Point a thought at a tag
    pub fn set_thought_tag(&self, thought_id: ThoughtId, tag_id: TagId) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let tag_exists = tx
            .query_row("SELECT 1 FROM tags WHERE id = ?1", [tag_id.0], |_| Ok(()))
            .optional()?
            .is_some();
        if !tag_exists {
            return Err(StoreError::NotFound(format!("tag {tag_id}")).into());
        }

        let updated = tx.execute(
            "UPDATE thoughts SET tag_id = ?1 WHERE id = ?2",
            params![tag_id.0, thought_id.0],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("thought {thought_id}")).into());
        }

        tx.commit()?;
        Ok(())
    }

    /// Replace a thought's text
    pub fn update_thought_text(&self, thought_id: ThoughtId, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(StoreError::Validation("thought text is empty".to_string()).into());
        }

        let updated = self.conn.execute(
            "UPDATE thoughts SET text = ?1 WHERE id = ?2",
            params![text, thought_id.0],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("thought {thought_id}")).into());
        }

        Ok(())
    }

    /// Delete a thought. Deleting a missing id is not an error.
    pub fn delete_thought(&self, thought_id: ThoughtId) -> Result<()> {
        self.conn
            .execute("DELETE FROM thoughts WHERE id = ?1", [thought_id.0])?;
        Ok(())
    }

    fn row_to_thought(row: &rusqlite::Row) -> rusqlite::Result<Thought> {
        let created_at_str: String = row.get(4)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&Utc);

        let tag_id: Option<i64> = row.get(5)?;
        let tag_name: Option<String> = row.get(6)?;
        let tag = match (tag_id, tag_name) {
            (Some(id), Some(name)) => Some(Tag { id: TagId(id), name }),
            _ => None,
        };

        Ok(Thought {
            id: ThoughtId(row.get(0)?),
            owner_id: UserId(row.get(1)?),
            text: row.get(2)?,
            image_path: row.get(3)?,
            created_at,
            tag,
        })
    }
}
