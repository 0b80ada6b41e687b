//! Wire and state models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers arrive as strings from some proxy routes and as numbers from others.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn opt_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(s)| s))
}

/// A conversation between two marketplace users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub user1_id: String,
    #[serde(deserialize_with = "id_string")]
    pub user2_id: String,
    #[serde(default)]
    pub user1_name: Option<String>,
    #[serde(default)]
    pub user2_name: Option<String>,
    #[serde(default)]
    pub user1_avatar: Option<String>,
    #[serde(default)]
    pub user2_avatar: Option<String>,
    /// Listing the conversation is about, if any.
    #[serde(default, deserialize_with = "opt_id_string")]
    pub item_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

impl Chat {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The participant that is not `me`.
    pub fn counterpart(&self, me: &str) -> Option<&str> {
        if self.user1_id == me {
            Some(&self.user2_id)
        } else if self.user2_id == me {
            Some(&self.user1_id)
        } else {
            None
        }
    }

    /// Display name of the participant that is not `me`, falling back to their id.
    pub fn counterpart_name(&self, me: &str) -> Option<&str> {
        let (id, name) = if self.user1_id == me {
            (&self.user2_id, &self.user2_name)
        } else if self.user2_id == me {
            (&self.user1_id, &self.user1_name)
        } else {
            return None;
        };
        Some(name.as_deref().unwrap_or(id))
    }
}

/// A single message inside a [`Chat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub chat_id: String,
    #[serde(deserialize_with = "id_string")]
    pub sender_id: String,
    #[serde(alias = "body", alias = "message")]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "read")]
    pub is_read: bool,
}

/// Response of `GET /v1/home/top_nav`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopNavCounts {
    pub messages_count: u32,
    pub notifications_count: u32,
    pub auctions_count: u32,
    pub bidding_count: u32,
}

/// Badge counters shown in the navigation chrome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    pub messages: u32,
    pub notifications: u32,
    pub auctions: u32,
    pub bidding: u32,
}

impl UnreadCounts {
    pub fn total(&self) -> u64 {
        [self.messages, self.notifications, self.auctions, self.bidding]
            .iter()
            .map(|c| u64::from(*c))
            .sum()
    }
}

impl From<TopNavCounts> for UnreadCounts {
    fn from(counts: TopNavCounts) -> Self {
        Self {
            messages: counts.messages_count,
            notifications: counts.notifications_count,
            auctions: counts.auctions_count,
            bidding: counts.bidding_count,
        }
    }
}

/// Partial update merged into [`UnreadCounts`]; `None` leaves a counter untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountsPatch {
    pub messages: Option<u32>,
    pub notifications: Option<u32>,
    pub auctions: Option<u32>,
    pub bidding: Option<u32>,
}

impl CountsPatch {
    pub fn messages(mut self, n: u32) -> Self {
        self.messages = Some(n);
        self
    }

    pub fn notifications(mut self, n: u32) -> Self {
        self.notifications = Some(n);
        self
    }

    pub fn auctions(mut self, n: u32) -> Self {
        self.auctions = Some(n);
        self
    }

    pub fn bidding(mut self, n: u32) -> Self {
        self.bidding = Some(n);
        self
    }

    pub fn apply(&self, counts: &mut UnreadCounts) {
        if let Some(n) = self.messages {
            counts.messages = n;
        }
        if let Some(n) = self.notifications {
            counts.notifications = n;
        }
        if let Some(n) = self.auctions {
            counts.auctions = n;
        }
        if let Some(n) = self.bidding {
            counts.bidding = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_accepts_numeric_ids() {
        let chat: Chat = serde_json::from_str(
            r#"{"id":7,"user1Id":"u-1","user2Id":12,"user2Name":"Grace",
                "itemId":99,"createdAt":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(chat.id, "7");
        assert_eq!(chat.user2_id, "12");
        assert_eq!(chat.item_id.as_deref(), Some("99"));
        assert_eq!(chat.unread_count, 0);
        assert_eq!(chat.counterpart("u-1"), Some("12"));
        assert_eq!(chat.counterpart_name("u-1"), Some("Grace"));
        assert_eq!(chat.counterpart_name("12"), Some("u-1"));
        assert_eq!(chat.counterpart("stranger"), None);
    }

    #[test]
    fn test_message_body_alias() {
        let msg: Message = serde_json::from_str(
            r#"{"id":"m1","chatId":"c1","senderId":"u-2","body":"still available?",
                "createdAt":"2024-05-01T10:00:00Z","read":true}"#,
        )
        .unwrap();
        assert_eq!(msg.content, "still available?");
        assert!(msg.is_read);
    }

    #[test]
    fn test_top_nav_partial_payload() {
        let counts: TopNavCounts = serde_json::from_str(r#"{"messagesCount":2}"#).unwrap();
        let unread = UnreadCounts::from(counts);
        assert_eq!(unread.messages, 2);
        assert_eq!(unread.total(), 2);
    }

    #[test]
    fn test_patch_merges() {
        let mut counts = UnreadCounts {
            messages: 5,
            notifications: 3,
            auctions: 1,
            bidding: 0,
        };
        CountsPatch::default().auctions(4).apply(&mut counts);
        assert_eq!(
            counts,
            UnreadCounts {
                messages: 5,
                notifications: 3,
                auctions: 4,
                bidding: 0
            }
        );
    }
}
