//! Inline button payloads
//!
//! Payloads are colon-delimited tokens. The wire format is shared with
//! buttons already sitting in users' chat histories, so it must not change:
//!
//! ```text
//! thoughts_page:<page>        tag_page:<tag>:<page>
//! edit_thought:<id>           delete_thought:<id>
//! tag:<thought>:<tag>         custom_tag:<thought>
//! confirm_delete              cancel_delete
//! noop
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::CallbackError;
use crate::model::{TagId, ThoughtId};

/// A decoded inline-button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Page of the full thought list
    ThoughtsPage { page: usize },
    /// Page of the thoughts carrying one tag
    TagPage { tag: String, page: usize },
    /// Start editing a thought
    EditThought { thought_id: ThoughtId },
    /// Ask to delete a thought
    DeleteThought { thought_id: ThoughtId },
    /// Attach an existing tag
    AssignTag { thought_id: ThoughtId, tag_id: TagId },
    /// Ask for a free-text tag
    CustomTag { thought_id: ThoughtId },
    ConfirmDelete,
    CancelDelete,
    /// Display-only button
    Noop,
}

impl Callback {
    /// Encode to the wire payload
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::ThoughtsPage { page } => write!(f, "thoughts_page:{page}"),
            Callback::TagPage { tag, page } => write!(f, "tag_page:{tag}:{page}"),
            Callback::EditThought { thought_id } => write!(f, "edit_thought:{thought_id}"),
            Callback::DeleteThought { thought_id } => write!(f, "delete_thought:{thought_id}"),
            Callback::AssignTag { thought_id, tag_id } => write!(f, "tag:{thought_id}:{tag_id}"),
            Callback::CustomTag { thought_id } => write!(f, "custom_tag:{thought_id}"),
            Callback::ConfirmDelete => write!(f, "confirm_delete"),
            Callback::CancelDelete => write!(f, "cancel_delete"),
            Callback::Noop => write!(f, "noop"),
        }
    }
}

impl FromStr for Callback {
    type Err = CallbackError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let (action, rest) = match payload.split_once(':') {
            Some((action, rest)) => (action, Some(rest)),
            None => (payload, None),
        };

        match (action, rest) {
            ("noop", None) => Ok(Callback::Noop),
            ("confirm_delete", None) => Ok(Callback::ConfirmDelete),
            ("cancel_delete", None) => Ok(Callback::CancelDelete),
            ("thoughts_page", Some(page)) => Ok(Callback::ThoughtsPage {
                page: parse_number(payload, page)?,
            }),
            ("tag_page", Some(rest)) => {
                // Tag names may themselves contain ':'
                let (tag, page) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| CallbackError::Malformed(payload.to_string()))?;
                if tag.is_empty() {
                    return Err(CallbackError::Malformed(payload.to_string()));
                }
                Ok(Callback::TagPage {
                    tag: tag.to_string(),
                    page: parse_number(payload, page)?,
                })
            }
            ("edit_thought", Some(id)) => Ok(Callback::EditThought {
                thought_id: ThoughtId(parse_number(payload, id)?),
            }),
            ("delete_thought", Some(id)) => Ok(Callback::DeleteThought {
                thought_id: ThoughtId(parse_number(payload, id)?),
            }),
            ("tag", Some(rest)) => {
                let (thought, tag) = rest
                    .split_once(':')
                    .ok_or_else(|| CallbackError::Malformed(payload.to_string()))?;
                Ok(Callback::AssignTag {
                    thought_id: ThoughtId(parse_number(payload, thought)?),
                    tag_id: TagId(parse_number(payload, tag)?),
                })
            }
            ("custom_tag", Some(id)) => Ok(Callback::CustomTag {
                thought_id: ThoughtId(parse_number(payload, id)?),
            }),
            (
                "noop" | "confirm_delete" | "cancel_delete" | "thoughts_page" | "tag_page"
                | "edit_thought" | "delete_thought" | "tag" | "custom_tag",
                _,
            ) => Err(CallbackError::Malformed(payload.to_string())),
            (other, _) => Err(CallbackError::UnknownAction(other.to_string())),
        }
    }
}

fn parse_number<N: FromStr>(payload: &str, field: &str) -> Result<N, CallbackError> {
    field.parse().map_err(|_| CallbackError::InvalidNumber {
        payload: payload.to_string(),
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("thoughts_page:2", Callback::ThoughtsPage { page: 2 })]
    #[case("tag_page:учеба:1", Callback::TagPage { tag: "учеба".into(), page: 1 })]
    #[case("tag_page:a:b:0", Callback::TagPage { tag: "a:b".into(), page: 0 })]
    #[case("edit_thought:17", Callback::EditThought { thought_id: ThoughtId(17) })]
    #[case("delete_thought:4", Callback::DeleteThought { thought_id: ThoughtId(4) })]
    #[case("tag:12:3", Callback::AssignTag { thought_id: ThoughtId(12), tag_id: TagId(3) })]
    #[case("custom_tag:12", Callback::CustomTag { thought_id: ThoughtId(12) })]
    #[case("confirm_delete", Callback::ConfirmDelete)]
    #[case("cancel_delete", Callback::CancelDelete)]
    #[case("noop", Callback::Noop)]
    fn test_wire_format(#[case] payload: &str, #[case] expected: Callback) {
        assert_eq!(payload.parse::<Callback>().unwrap(), expected);
        assert_eq!(expected.encode(), payload);
    }

    #[rstest]
    #[case("thoughts_page:")]
    #[case("thoughts_page:-1")]
    #[case("thoughts_page:x")]
    #[case("tag_page:study")]
    #[case("tag_page::1")]
    #[case("tag:12")]
    #[case("tag:12:x")]
    #[case("edit_thought")]
    #[case("noop:1")]
    fn test_malformed_payloads(#[case] payload: &str) {
        let err = payload.parse::<Callback>().unwrap_err();
        assert!(matches!(
            err,
            CallbackError::Malformed(_) | CallbackError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            "explode:1".parse::<Callback>(),
            Err(CallbackError::UnknownAction("explode".to_string()))
        );
    }
}
