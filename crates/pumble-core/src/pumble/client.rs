//! Typed request helpers for the Pumble API-keys endpoints.
//!
//! Each method maps to exactly one endpoint and returns the decoded JSON
//! unchanged. Normalization into records happens one layer up, in
//! [`PumbleService`](crate::pumble::service::PumbleService).

use serde_json::{Value, json};

use crate::Result;
use crate::pumble::transport::{ApiRequest, Transport};

/// Identity a message is posted under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendAs {
    /// Post as the API key's bot (`asBot = true`).
    #[default]
    Bot,
    /// Post as the key owner's personal account (`asBot = false`).
    Personal,
}

impl SendAs {
    /// Value of the `asBot` request field.
    #[must_use]
    pub const fn as_bot(self) -> bool {
        matches!(self, Self::Bot)
    }
}

/// Pumble API client over any [`Transport`].
#[derive(Debug, Clone)]
pub struct PumbleClient<T> {
    transport: T,
}

impl<T: Transport> PumbleClient<T> {
    /// Wrap a transport.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// List messages in a channel.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel name or ID
    /// * `cursor` - Cursor from a previous page; `None` for the first page
    /// * `limit` - Page size; the API default applies when `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_messages(
        &self,
        channel: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Value> {
        let mut request =
            ApiRequest::get("list messages", "/listMessages").with_query("channel", channel);
        if let Some(cursor) = cursor {
            request = request.with_query("cursor", cursor);
        }
        if let Some(limit) = limit {
            request = request.with_query("limit", limit.to_string());
        }
        self.transport.send(request).await
    }

    /// List all channels in the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_channels(&self) -> Result<Value> {
        self.transport
            .send(ApiRequest::get("list channels", "/listChannels"))
            .await
    }

    /// List all users in the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_users(&self) -> Result<Value> {
        self.transport
            .send(ApiRequest::get("list users", "/listUsers"))
            .await
    }

    /// Send a message to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_message(&self, channel: &str, text: &str, send_as: SendAs) -> Result<Value> {
        let body = json!({
            "channel": channel,
            "text": text,
            "asBot": send_as.as_bot(),
        });
        self.transport
            .send(ApiRequest::post("send message", "/sendMessage", body))
            .await
    }

    /// Reply in the thread of `message_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_reply(
        &self,
        channel: &str,
        message_id: &str,
        text: &str,
        send_as: SendAs,
    ) -> Result<Value> {
        let body = json!({
            "channel": channel,
            "messageId": message_id,
            "text": text,
            "asBot": send_as.as_bot(),
        });
        self.transport
            .send(ApiRequest::post("send reply", "/sendReply", body))
            .await
    }

    /// Add an emoji reaction (e.g. `thumbsup`) to a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn add_reaction(&self, channel: &str, message_id: &str, emoji: &str) -> Result<Value> {
        let body = json!({
            "channel": channel,
            "messageId": message_id,
            "emoji": emoji,
        });
        self.transport
            .send(ApiRequest::post("add reaction", "/addReaction", body))
            .await
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_message(&self, channel: &str, message_id: &str) -> Result<Value> {
        let body = json!({
            "channel": channel,
            "messageId": message_id,
        });
        self.transport
            .send(ApiRequest::delete("delete message", "/deleteMessage", body))
            .await
    }

    /// Create a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_channel(&self, name: &str, is_private: bool) -> Result<Value> {
        let body = json!({
            "name": name,
            "isPrivate": is_private,
        });
        self.transport
            .send(ApiRequest::post("create channel", "/createChannel", body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pumble::testing::ScriptedTransport;
    use crate::pumble::transport::Method;

    #[tokio::test]
    async fn list_messages_omits_absent_cursor_and_limit() {
        let client = PumbleClient::new(ScriptedTransport::replying([json!({}), json!({})]));

        client
            .list_messages("general", None, None)
            .await
            .expect("first page");
        client
            .list_messages("general", Some("abc"), Some(50))
            .await
            .expect("next page");

        let requests = client.transport().requests();
        assert_eq!(requests[0].path, "/listMessages");
        assert_eq!(requests[0].query, vec![("channel", "general".to_string())]);
        assert_eq!(requests[1].query_value("cursor"), Some("abc"));
        assert_eq!(requests[1].query_value("limit"), Some("50"));
    }

    #[tokio::test]
    async fn write_helpers_build_expected_bodies() {
        let client = PumbleClient::new(ScriptedTransport::replying(vec![json!({}); 5]));

        client
            .send_message("general", "hi", SendAs::Bot)
            .await
            .expect("send");
        client
            .send_reply("general", "m1", "re", SendAs::Personal)
            .await
            .expect("reply");
        client
            .add_reaction("general", "m1", "heart")
            .await
            .expect("react");
        client.delete_message("general", "m1").await.expect("delete");
        client.create_channel("ops", true).await.expect("create");

        let requests = client.transport().requests();
        let summary: Vec<_> = requests.iter().map(|r| (r.method, r.path)).collect();
        assert_eq!(
            summary,
            [
                (Method::Post, "/sendMessage"),
                (Method::Post, "/sendReply"),
                (Method::Post, "/addReaction"),
                (Method::Delete, "/deleteMessage"),
                (Method::Post, "/createChannel"),
            ]
        );
        assert_eq!(
            requests[0].body,
            Some(json!({"channel": "general", "text": "hi", "asBot": true}))
        );
        assert_eq!(
            requests[1].body,
            Some(json!({"channel": "general", "messageId": "m1", "text": "re", "asBot": false}))
        );
        assert_eq!(
            requests[2].body,
            Some(json!({"channel": "general", "messageId": "m1", "emoji": "heart"}))
        );
        assert_eq!(
            requests[3].body,
            Some(json!({"channel": "general", "messageId": "m1"}))
        );
        assert_eq!(
            requests[4].body,
            Some(json!({"name": "ops", "isPrivate": true}))
        );
    }

    #[test]
    fn bot_is_the_default_identity() {
        assert_eq!(SendAs::default(), SendAs::Bot);
        assert!(SendAs::Bot.as_bot());
        assert!(!SendAs::Personal.as_bot());
    }
}
