//! Data models for Pumble.
//!
//! Records are produced by the normalizer in [`crate::pumble::normalize`],
//! which never fails: a field the API left out ends up as an empty string or
//! `None`. The serde derives describe the canonical (camelCase) form and can be
//! used for strict decoding of data that is already canonical.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A message posted in a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID.
    pub id: String,
    /// Message text.
    pub text: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Author's user ID.
    pub user_id: String,
    /// Creation timestamp as sent by the API.
    pub created_at: String,
    /// Last edit timestamp.
    pub updated_at: Option<String>,
    /// Reactions, keyed or listed the way the API sends them.
    pub reactions: Option<Value>,
    /// Parent message ID for thread replies.
    pub thread_id: Option<String>,
    /// IDs of mentioned users.
    pub mentions: Option<Vec<String>>,
    /// Attachment metadata.
    pub attachments: Option<Vec<Value>>,
}

impl Message {
    /// Whether the message was written by `user_id`.
    #[must_use]
    pub fn is_from(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Canonical JSON form: every field under its primary key, absent values as `null`.
    #[must_use]
    pub fn to_canonical(&self) -> Value {
        json!({
            "id": self.id,
            "text": self.text,
            "channelId": self.channel_id,
            "userId": self.user_id,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
            "reactions": self.reactions,
            "threadId": self.thread_id,
            "mentions": self.mentions,
            "attachments": self.attachments,
        })
    }
}

/// A channel in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel ID.
    pub id: String,
    /// Channel name.
    pub name: String,
    /// Whether the channel is private. `false` when the API omits it.
    pub is_private: bool,
    /// Channel description.
    pub description: Option<String>,
    /// Creation timestamp as sent by the API.
    pub created_at: Option<String>,
    /// Member user IDs.
    pub members: Option<Vec<String>>,
}

impl Channel {
    /// Canonical JSON form.
    #[must_use]
    pub fn to_canonical(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "isPrivate": self.is_private,
            "description": self.description,
            "createdAt": self.created_at,
            "members": self.members,
        })
    }
}

/// A workspace member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Whether the account is a bot. `None` when the API does not say.
    pub is_bot: Option<bool>,
    /// Presence or custom status text.
    pub status: Option<String>,
}

impl User {
    /// Canonical JSON form.
    #[must_use]
    pub fn to_canonical(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "avatarUrl": self.avatar_url,
            "isBot": self.is_bot,
            "status": self.status,
        })
    }
}

/// One page of a channel's messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCollection {
    cursor: Option<String>,
    has_more: Option<bool>,
    messages: Vec<Message>,
}

impl MessageCollection {
    /// Build a page from its parts.
    #[must_use]
    pub fn new(messages: Vec<Message>, cursor: Option<String>, has_more: Option<bool>) -> Self {
        Self {
            cursor,
            has_more,
            messages,
        }
    }

    /// Messages on this page, in the order the API returned them.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consume the page, keeping only its messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Cursor for the next page, if the API sent one.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the API reported more pages. Absent counts as `false`.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more.unwrap_or(false)
    }

    /// Number of messages on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether this page has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Canonical JSON form. `hasMore` is `null` when the API did not send it.
    #[must_use]
    pub fn to_canonical(&self) -> Value {
        json!({
            "cursor": self.cursor,
            "hasMore": self.has_more,
            "messages": self.messages.iter().map(Message::to_canonical).collect::<Vec<_>>(),
        })
    }
}
