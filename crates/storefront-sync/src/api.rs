//! Typed calls against the storefront proxy routes.

use crate::models::{Chat, Message, TopNavCounts};
use async_trait::async_trait;
use storefront_http::{ApiClient, ApiRequest, Result};

pub const CHAT_MESSAGES_PATH: &str = "/api/chats/get-chat";
pub const USER_CHATS_PATH: &str = "/api/chats/get-user-chats";
pub const TOP_NAV_PATH: &str = "/v1/home/top_nav";

/// Where the authoritative unread counters come from.
#[async_trait]
pub trait CountsSource: Send + Sync + 'static {
    async fn fetch_counts(&self) -> Result<TopNavCounts>;
}

#[derive(Clone)]
pub struct StorefrontApi {
    client: ApiClient,
}

impl StorefrontApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn chat_messages_request(chat_id: &str) -> ApiRequest {
        ApiRequest::get(CHAT_MESSAGES_PATH).with_query("chatId", chat_id)
    }

    pub fn user_chats_request(user_id: &str) -> ApiRequest {
        ApiRequest::get(USER_CHATS_PATH).with_query("userId", user_id)
    }

    pub async fn chat_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.client
            .fetch_json(Self::chat_messages_request(chat_id))
            .await
    }

    pub async fn user_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        self.client
            .fetch_json(Self::user_chats_request(user_id))
            .await
    }

    pub async fn top_nav_counts(&self) -> Result<TopNavCounts> {
        self.client.fetch_json(ApiRequest::get(TOP_NAV_PATH)).await
    }
}

#[async_trait]
impl CountsSource for StorefrontApi {
    async fn fetch_counts(&self) -> Result<TopNavCounts> {
        self.top_nav_counts().await
    }
}
