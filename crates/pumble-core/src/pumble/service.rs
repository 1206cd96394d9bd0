//! High-level Pumble operations.
//!
//! Read operations return normalized records. Write operations return the
//! API's JSON unchanged; the `*_record` variants additionally normalize the
//! response for callers that want a typed result.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::config::{ApiConfig, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::pumble::client::{PumbleClient, SendAs};
use crate::pumble::http::HttpTransport;
use crate::pumble::models::{Channel, Message, MessageCollection, User};
use crate::pumble::normalize::{self, Normalize, keys};
use crate::pumble::pagination::{self, PageSource};
use crate::pumble::query;
use crate::pumble::transport::Transport;

/// Entry point for applications using the Pumble API.
///
/// Build one instance at startup and pass it to whatever needs it; it holds
/// no mutable state and can be shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PumbleService<T> {
    client: PumbleClient<T>,
    page_size: u32,
    max_pages: usize,
}

impl PumbleService<HttpTransport> {
    /// Service over HTTP with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingApiKey`](crate::CoreError::MissingApiKey)
    /// for a blank key.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::from_config(&ApiConfig {
            api_key: Some(api_key.to_string()),
            ..ApiConfig::default()
        })
    }

    /// Service over HTTP configured from the `[api]` section.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingApiKey`](crate::CoreError::MissingApiKey)
    /// if no key is configured.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(api)?;
        Ok(Self::with_transport(transport)
            .with_page_size(api.page_size)
            .with_max_pages(api.max_pages))
    }
}

impl<T: Transport> PumbleService<T> {
    /// Service over an arbitrary transport.
    #[must_use]
    pub const fn with_transport(transport: T) -> Self {
        Self {
            client: PumbleClient::new(transport),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Page size used by [`search_messages`](Self::search_messages) and
    /// [`get_messages_by_user`](Self::get_messages_by_user).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Upper bound on pages requested by one full-history fetch.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Default page size for full-history fetches.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The endpoint client, for calls that need the raw JSON.
    #[must_use]
    pub const fn client(&self) -> &PumbleClient<T> {
        &self.client
    }

    /// One page of messages from a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_messages(
        &self,
        channel: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<MessageCollection> {
        let body = self.client.list_messages(channel, cursor, limit).await?;
        Ok(MessageCollection::normalize(&body))
    }

    /// Every message in a channel, following cursors until the API reports no
    /// more pages. Messages keep the order the API returned them in.
    ///
    /// Makes one request per page, so cost grows with the channel's history.
    ///
    /// # Errors
    ///
    /// Returns the first request failure, or
    /// [`CoreError::PageLimitExceeded`](crate::CoreError::PageLimitExceeded)
    /// if the history is longer than the configured page cap allows.
    pub async fn get_all_messages(&self, channel: &str, page_size: u32) -> Result<Vec<Message>> {
        let pages = ChannelPages {
            client: &self.client,
            channel,
            page_size: page_size.max(1),
        };
        pagination::fetch_all(&pages, self.max_pages).await
    }

    /// All channels in the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_channels(&self) -> Result<Vec<Channel>> {
        let body = self.client.list_channels().await?;
        Ok(normalize::channels_from_listing(&body))
    }

    /// All users in the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_users(&self) -> Result<Vec<User>> {
        let body = self.client.list_users().await?;
        Ok(normalize::users_from_listing(&body))
    }

    /// Send a message to a channel. Returns the API response as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_message(&self, channel: &str, text: &str, send_as: SendAs) -> Result<Value> {
        self.client.send_message(channel, text, send_as).await
    }

    /// Send a message and normalize the response into a [`Message`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn send_message_record(
        &self,
        channel: &str,
        text: &str,
        send_as: SendAs,
    ) -> Result<Message> {
        let body = self.send_message(channel, text, send_as).await?;
        Ok(Message::normalize(normalize::unwrap_record(
            &body,
            keys::MESSAGE_ENVELOPE,
        )))
    }

    /// Reply in the thread of `message_id`. Returns the API response as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reply_to_message(
        &self,
        channel: &str,
        message_id: &str,
        text: &str,
        send_as: SendAs,
    ) -> Result<Value> {
        self.client
            .send_reply(channel, message_id, text, send_as)
            .await
    }

    /// Reply in a thread and normalize the response into a [`Message`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reply_to_message_record(
        &self,
        channel: &str,
        message_id: &str,
        text: &str,
        send_as: SendAs,
    ) -> Result<Message> {
        let body = self
            .reply_to_message(channel, message_id, text, send_as)
            .await?;
        Ok(Message::normalize(normalize::unwrap_record(
            &body,
            keys::MESSAGE_ENVELOPE,
        )))
    }

    /// Add a reaction to a message. Returns the API response as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn add_reaction(&self, channel: &str, message_id: &str, emoji: &str) -> Result<Value> {
        self.client.add_reaction(channel, message_id, emoji).await
    }

    /// Delete a message. Returns the API response as-is (`null` for an empty body).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_message(&self, channel: &str, message_id: &str) -> Result<Value> {
        self.client.delete_message(channel, message_id).await
    }

    /// Create a channel. Returns the API response as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_channel(&self, name: &str, is_private: bool) -> Result<Value> {
        self.client.create_channel(name, is_private).await
    }

    /// Create a channel and normalize the response into a [`Channel`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_channel_record(&self, name: &str, is_private: bool) -> Result<Channel> {
        let body = self.create_channel(name, is_private).await?;
        Ok(Channel::normalize(normalize::unwrap_record(
            &body,
            keys::CHANNEL_ENVELOPE,
        )))
    }

    /// Messages in a channel whose text contains `term`, ignoring case.
    ///
    /// Fetches the channel's entire history first; see
    /// [`get_all_messages`](Self::get_all_messages).
    ///
    /// # Errors
    ///
    /// Returns an error if fetching the history fails.
    pub async fn search_messages(&self, channel: &str, term: &str) -> Result<Vec<Message>> {
        let history = self.get_all_messages(channel, self.page_size).await?;
        Ok(query::matching_text(history, term))
    }

    /// Messages in a channel written by `user_id`.
    ///
    /// Fetches the channel's entire history first; see
    /// [`get_all_messages`](Self::get_all_messages).
    ///
    /// # Errors
    ///
    /// Returns an error if fetching the history fails.
    pub async fn get_messages_by_user(&self, channel: &str, user_id: &str) -> Result<Vec<Message>> {
        let history = self.get_all_messages(channel, self.page_size).await?;
        Ok(query::from_user(history, user_id))
    }
}

/// Pages of one channel's listing.
struct ChannelPages<'a, T> {
    client: &'a PumbleClient<T>,
    channel: &'a str,
    page_size: u32,
}

#[async_trait]
impl<T: Transport> PageSource for ChannelPages<'_, T> {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<MessageCollection> {
        let body = self
            .client
            .list_messages(self.channel, cursor, Some(self.page_size))
            .await?;
        Ok(MessageCollection::normalize(&body))
    }
}
