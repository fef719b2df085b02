//! Tag ranking for the quick-pick keyboard

use crate::error::Result;
use crate::model::TagUsage;
use crate::store::RecordStore;

/// Default number of tags offered in the picker
pub const DEFAULT_TOP_TAGS: usize = 7;

/// Rank tags by usage, most used first, and keep the first `n`.
///
/// Equal counts are ordered by name so the picker is stable.
pub fn top_tags(mut usage: Vec<TagUsage>, n: usize) -> Vec<TagUsage> {
    usage.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.tag.name.cmp(&b.tag.name))
    });
    usage.truncate(n);
    usage
}

/// Store-backed ranker
pub struct TagRanker<'a> {
    store: &'a dyn RecordStore,
    limit: usize,
}

impl<'a> TagRanker<'a> {
    pub fn new(store: &'a dyn RecordStore, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Current top tags
    pub async fn top(&self) -> Result<Vec<TagUsage>> {
        let usage = self.store.tag_usage_counts().await?;
        Ok(top_tags(usage, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Tag, TagId, UserId};
    use crate::store::SqliteStore;

    fn usage(id: i64, name: &str, count: u64) -> TagUsage {
        TagUsage {
            tag: Tag {
                id: TagId(id),
                name: name.to_string(),
            },
            count,
        }
    }

    fn names(ranked: &[TagUsage]) -> Vec<&str> {
        ranked.iter().map(|u| u.tag.name.as_str()).collect()
    }

    #[test]
    fn test_rank_by_count() {
        let ranked = top_tags(
            vec![usage(1, "a", 3), usage(2, "b", 5), usage(3, "c", 0)],
            DEFAULT_TOP_TAGS,
        );
        assert_eq!(names(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let ranked = top_tags(
            vec![usage(1, "zeta", 2), usage(2, "alpha", 2), usage(3, "mid", 4)],
            DEFAULT_TOP_TAGS,
        );
        assert_eq!(names(&ranked), vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_limit() {
        let all: Vec<_> = (0..10).map(|i| usage(i, &format!("t{i}"), i as u64)).collect();
        let ranked = top_tags(all, 7);
        assert_eq!(ranked.len(), 7);
        assert_eq!(ranked[0].tag.name, "t9");
        assert_eq!(ranked[6].tag.name, "t3");
    }

    #[tokio::test]
    async fn test_ranker_reads_store() {
        let store = SqliteStore::in_memory().unwrap();
        let work = store.create_tag("work").await.unwrap();
        store.create_tag("home").await.unwrap();
        let id = store.create_thought(UserId(1), "ship it", None).await.unwrap();
        store.set_thought_tag(id, work).await.unwrap();

        let ranked = TagRanker::new(&store, 7).top().await.unwrap();
        assert_eq!(names(&ranked), vec!["work", "home"]);
        assert_eq!(ranked[0].count, 1);
    }
}
