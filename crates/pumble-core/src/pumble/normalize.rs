//! Permissive decoding of API payloads into canonical records.
//!
//! The API is inconsistent about key naming: the same field can arrive as
//! `channelId` on one endpoint and `channel_id` on another, sometimes mixed
//! within a single object. Every field therefore has an ordered list of
//! candidate keys, and [`lookup`] returns the value of the first candidate
//! that is present and not `null`. Each field is resolved on its own.
//!
//! Decoding never fails. Missing or wrongly typed required strings become
//! `""`, missing optionals become `None`, and `is_private` defaults to `false`.

use serde_json::{Map, Value};

use crate::pumble::models::{Channel, Message, MessageCollection, User};

/// Candidate keys for every field, primary key first.
pub mod keys {
    /// Record identity.
    pub const ID: &[&str] = &["id"];
    /// Message text.
    pub const TEXT: &[&str] = &["text"];
    /// Channel or user name.
    pub const NAME: &[&str] = &["name"];
    /// User email.
    pub const EMAIL: &[&str] = &["email"];
    /// Channel description.
    pub const DESCRIPTION: &[&str] = &["description"];
    /// User status.
    pub const STATUS: &[&str] = &["status"];
    /// Message reactions.
    pub const REACTIONS: &[&str] = &["reactions"];
    /// Mentioned user IDs.
    pub const MENTIONS: &[&str] = &["mentions"];
    /// Message attachments.
    pub const ATTACHMENTS: &[&str] = &["attachments"];
    /// Channel member IDs.
    pub const MEMBERS: &[&str] = &["members"];

    /// Channel privacy flag.
    pub const IS_PRIVATE: &[&str] = &["isPrivate", "is_private"];
    /// Creation timestamp.
    pub const CREATED_AT: &[&str] = &["createdAt", "created_at"];
    /// Edit timestamp.
    pub const UPDATED_AT: &[&str] = &["updatedAt", "updated_at"];
    /// Owning channel of a message.
    pub const CHANNEL_ID: &[&str] = &["channelId", "channel_id"];
    /// Author of a message.
    pub const USER_ID: &[&str] = &["userId", "user_id"];
    /// Parent message of a thread reply.
    pub const THREAD_ID: &[&str] = &["threadId", "thread_id"];
    /// User avatar.
    pub const AVATAR_URL: &[&str] = &["avatarUrl", "avatar_url"];
    /// User bot flag.
    pub const IS_BOT: &[&str] = &["isBot", "is_bot"];

    /// Next-page cursor of a message page.
    pub const CURSOR: &[&str] = &["cursor", "nextCursor"];
    /// More-pages flag of a message page.
    pub const HAS_MORE: &[&str] = &["hasMore", "has_more"];
    /// Message list of a message page.
    pub const MESSAGES: &[&str] = &["messages", "data"];

    /// List inside a channel listing.
    pub const CHANNEL_LIST: &[&str] = &["channels", "data"];
    /// List inside a user listing.
    pub const USER_LIST: &[&str] = &["users", "data"];
    /// Record inside a send/reply response.
    pub const MESSAGE_ENVELOPE: &[&str] = &["message", "data"];
    /// Record inside a create-channel response.
    pub const CHANNEL_ENVELOPE: &[&str] = &["channel", "data"];
}

/// Decode a record from an arbitrary JSON value. Never fails.
pub trait Normalize: Sized {
    /// Build the record, defaulting whatever is missing.
    fn normalize(payload: &Value) -> Self;

    /// Decode every object in a list. Non-object entries are skipped. An
    /// object is treated as a list of its values.
    fn normalize_list(list: &Value) -> Vec<Self> {
        let entries: Box<dyn Iterator<Item = &Value> + '_> = match list {
            Value::Array(items) => Box::new(items.iter()),
            Value::Object(map) => Box::new(map.values()),
            _ => return Vec::new(),
        };
        entries
            .filter(|entry| {
                let keep = entry.is_object();
                if !keep {
                    log::debug!("skipping non-object list entry: {entry}");
                }
                keep
            })
            .map(Self::normalize)
            .collect()
    }
}

/// Value of the first candidate key that is present and not `null`.
#[must_use]
pub fn lookup<'a>(payload: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    let object: &Map<String, Value> = payload.as_object()?;
    candidates
        .iter()
        .find_map(|key| object.get(*key).filter(|value| !value.is_null()))
}

/// The list inside a listing envelope, or the whole body when no candidate matches.
#[must_use]
pub fn unwrap_list<'a>(body: &'a Value, candidates: &[&str]) -> &'a Value {
    lookup(body, candidates).unwrap_or(body)
}

/// The object inside a single-record envelope, or the whole body.
#[must_use]
pub fn unwrap_record<'a>(body: &'a Value, candidates: &[&str]) -> &'a Value {
    lookup(body, candidates)
        .filter(|value| value.is_object())
        .unwrap_or(body)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn required_string(payload: &Value, candidates: &[&str]) -> String {
    optional_string(payload, candidates).unwrap_or_default()
}

fn optional_string(payload: &Value, candidates: &[&str]) -> Option<String> {
    lookup(payload, candidates).and_then(text)
}

fn optional_flag(payload: &Value, candidates: &[&str]) -> Option<bool> {
    lookup(payload, candidates).and_then(flag)
}

fn id_list(payload: &Value, candidates: &[&str]) -> Option<Vec<String>> {
    lookup(payload, candidates)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(text).collect())
}

fn opaque_list(payload: &Value, candidates: &[&str]) -> Option<Vec<Value>> {
    lookup(payload, candidates).and_then(Value::as_array).cloned()
}

fn opaque_structure(payload: &Value, candidates: &[&str]) -> Option<Value> {
    lookup(payload, candidates)
        .filter(|value| value.is_object() || value.is_array())
        .cloned()
}

impl Normalize for Message {
    fn normalize(payload: &Value) -> Self {
        Self {
            id: required_string(payload, keys::ID),
            text: required_string(payload, keys::TEXT),
            channel_id: required_string(payload, keys::CHANNEL_ID),
            user_id: required_string(payload, keys::USER_ID),
            created_at: required_string(payload, keys::CREATED_AT),
            updated_at: optional_string(payload, keys::UPDATED_AT),
            reactions: opaque_structure(payload, keys::REACTIONS),
            thread_id: optional_string(payload, keys::THREAD_ID),
            mentions: id_list(payload, keys::MENTIONS),
            attachments: opaque_list(payload, keys::ATTACHMENTS),
        }
    }
}

impl Normalize for Channel {
    fn normalize(payload: &Value) -> Self {
        Self {
            id: required_string(payload, keys::ID),
            name: required_string(payload, keys::NAME),
            is_private: optional_flag(payload, keys::IS_PRIVATE).unwrap_or(false),
            description: optional_string(payload, keys::DESCRIPTION),
            created_at: optional_string(payload, keys::CREATED_AT),
            members: id_list(payload, keys::MEMBERS),
        }
    }
}

impl Normalize for User {
    fn normalize(payload: &Value) -> Self {
        Self {
            id: required_string(payload, keys::ID),
            name: required_string(payload, keys::NAME),
            email: required_string(payload, keys::EMAIL),
            avatar_url: optional_string(payload, keys::AVATAR_URL),
            is_bot: optional_flag(payload, keys::IS_BOT),
            status: optional_string(payload, keys::STATUS),
        }
    }
}

impl Normalize for MessageCollection {
    fn normalize(payload: &Value) -> Self {
        let messages = lookup(payload, keys::MESSAGES)
            .map(Message::normalize_list)
            .unwrap_or_default();
        Self::new(
            messages,
            optional_string(payload, keys::CURSOR),
            optional_flag(payload, keys::HAS_MORE),
        )
    }
}

/// Channels from a `/listChannels` body.
#[must_use]
pub fn channels_from_listing(body: &Value) -> Vec<Channel> {
    Channel::normalize_list(unwrap_list(body, keys::CHANNEL_LIST))
}

/// Users from a `/listUsers` body.
#[must_use]
pub fn users_from_listing(body: &Value) -> Vec<User> {
    User::normalize_list(unwrap_list(body, keys::USER_LIST))
}
