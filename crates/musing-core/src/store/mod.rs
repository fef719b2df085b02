//! Record store for thoughts and tags
//!
//! [`RecordStore`] is the async contract the conversation flow consumes.
//! [`SqliteStore`] implements it over a synchronous [`Repository`], running
//! each call on the blocking thread pool.

mod repository;
mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

pub use repository::Repository;
pub use schema::{Schema, SCHEMA_VERSION};

use crate::error::{Result, StoreError};
use crate::model::{Tag, TagId, TagUsage, Thought, ThoughtId, UserId};

/// Query and mutation contract over thoughts and tags
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert-or-get a tag by normalized name
    async fn create_tag(&self, name: &str) -> Result<TagId>;

    /// All tags
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Attach a tag to a thought
    async fn set_thought_tag(&self, thought_id: ThoughtId, tag_id: TagId) -> Result<()>;

    /// Save a new untagged thought
    async fn create_thought(
        &self,
        owner_id: UserId,
        text: &str,
        image_path: Option<&str>,
    ) -> Result<ThoughtId>;

    /// Look up a single thought
    async fn get_thought(&self, thought_id: ThoughtId) -> Result<Option<Thought>>;

    /// All thoughts, most recent first
    async fn list_thoughts(&self) -> Result<Vec<Thought>>;

    /// Thoughts with the given tag, most recent first
    async fn list_thoughts_by_tag(&self, tag_name: &str) -> Result<Vec<Thought>>;

    /// Replace a thought's text
    async fn update_thought_text(&self, thought_id: ThoughtId, text: &str) -> Result<()>;

    /// Delete a thought (idempotent)
    async fn delete_thought(&self, thought_id: ThoughtId) -> Result<()>;

    /// Usage count per tag, most used first
    async fn tag_usage_counts(&self) -> Result<Vec<TagUsage>>;
}

/// [`RecordStore`] backed by a single SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    repo: Arc<Mutex<Repository>>,
}

impl SqliteStore {
    /// Open the database at `path`, creating tables on first use
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::new(path)?;
        tracing::info!("Opened thought store");
        Ok(Self::from_repository(repo))
    }

    /// In-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_repository(Repository::in_memory()?))
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T> + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        tokio::task::spawn_blocking(move || {
            let guard = repo
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("Mutex poisoned: {}", e)))?;
            op(&*guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create_tag(&self, name: &str) -> Result<TagId> {
        let name = name.to_string();
        self.run(move |repo| repo.create_tag(&name)).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.run(|repo| repo.list_tags()).await
    }

    async fn set_thought_tag(&self, thought_id: ThoughtId, tag_id: TagId) -> Result<()> {
        self.run(move |repo| repo.set_thought_tag(thought_id, tag_id))
            .await
    }

    async fn create_thought(
        &self,
        owner_id: UserId,
        text: &str,
        image_path: Option<&str>,
    ) -> Result<ThoughtId> {
        let text = text.to_string();
        let image_path = image_path.map(str::to_string);
        self.run(move |repo| repo.create_thought(owner_id, &text, image_path.as_deref()))
            .await
    }

    async fn get_thought(&self, thought_id: ThoughtId) -> Result<Option<Thought>> {
        self.run(move |repo| repo.get_thought(thought_id)).await
    }

    async fn list_thoughts(&self) -> Result<Vec<Thought>> {
        self.run(|repo| repo.list_thoughts()).await
    }

    async fn list_thoughts_by_tag(&self, tag_name: &str) -> Result<Vec<Thought>> {
        let tag_name = tag_name.to_string();
        self.run(move |repo| repo.list_thoughts_by_tag(&tag_name))
            .await
    }

    async fn update_thought_text(&self, thought_id: ThoughtId, text: &str) -> Result<()> {
        let text = text.to_string();
        self.run(move |repo| repo.update_thought_text(thought_id, &text))
            .await
    }

    async fn delete_thought(&self, thought_id: ThoughtId) -> Result<()> {
        self.run(move |repo| repo.delete_thought(thought_id)).await
    }

    async fn tag_usage_counts(&self) -> Result<Vec<TagUsage>> {
        self.run(|repo| repo.tag_usage_counts()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let store = SqliteStore::in_memory().unwrap();

        let id = store.create_thought(UserId(9), "buy milk", None).await.unwrap();
        let tag = store.create_tag("Errands").await.unwrap();
        store.set_thought_tag(id, tag).await.unwrap();

        let thoughts = store.list_thoughts_by_tag("errands").await.unwrap();
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].text, "buy milk");
        assert_eq!(thoughts[0].owner_id, UserId(9));
    }

    #[tokio::test]
    async fn test_sqlite_store_concurrent_create_tag() {
        let store = SqliteStore::in_memory().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let name = if i % 2 == 0 { "Study" } else { " study " };
                    store.create_tag(name).await.unwrap()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.list_tags().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = SqliteStore::in_memory().unwrap();
        let id = store.create_thought(UserId(1), "x", None).await.unwrap();
        store.delete_thought(id).await.unwrap();
        store.delete_thought(id).await.unwrap();
        assert!(store.list_thoughts().await.unwrap().is_empty());
    }
}
