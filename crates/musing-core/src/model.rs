//! Thought and tag records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

integer_id!(
    /// Chat user identifier, assigned by the transport
    UserId
);
integer_id!(
    /// Chat a conversation takes place in; equals the user id for private chats
    ChatId
);
integer_id!(
    /// Thought identifier, assigned by the store
    ThoughtId
);
integer_id!(
    /// Tag identifier, assigned by the store
    TagId
);

/// A normalized label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A user-authored note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub id: ThoughtId,
    pub owner_id: UserId,
    pub text: String,
    /// Resolved tag, `None` when untagged
    pub tag: Option<Tag>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Thought {
    /// Tag id, if any
    pub fn tag_id(&self) -> Option<TagId> {
        self.tag.as_ref().map(|t| t.id)
    }
}

/// A tag together with the number of thoughts referencing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    pub tag: Tag,
    pub count: u64,
}

/// Longest normalized tag name, in bytes.
///
/// `tag_page:<name>:<page>` must stay within the 64-byte button payload
/// limit for any realistic page number.
pub const MAX_TAG_BYTES: usize = 48;

/// Normalize a tag name: trim and lowercase.
///
/// Returns `None` when nothing is left.
pub fn normalize_tag_name(input: &str) -> Option<String> {
    let name = input.trim().to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_name() {
        assert_eq!(normalize_tag_name(" Study "), Some("study".to_string()));
        assert_eq!(normalize_tag_name("УЧЁБА"), Some("учёба".to_string()));
        assert_eq!(normalize_tag_name("   "), None);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ThoughtId(42).to_string(), "42");
        assert_eq!(TagId::from(7), TagId(7));
    }
}
