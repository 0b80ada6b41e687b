//! Polling read models.
//!
//! A [`Feed`] keeps the latest snapshot of one GET fresh by re-issuing it on
//! the context's chat poll interval, regardless of whether anyone is looking.
//! Feeds built without a key issue no requests at all.

use crate::api::StorefrontApi;
use crate::cache::CacheLease;
use crate::context::SyncContext;
use crate::models::{Chat, Message};
use crate::poller::{spawn_poller, PollHandle};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use storefront_http::{ApiError, ApiRequest};
use tokio::sync::watch;

/// Snapshot exposed to consumers of a feed.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// No data and no error seen yet for a keyed feed.
    pub is_loading: bool,
    /// Most recent failure. Cleared by the next success.
    pub error: Option<Arc<ApiError>>,
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }

    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::idle()
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T: Clone> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }
}

pub struct Feed<T> {
    key: Option<String>,
    state: watch::Receiver<QueryState<T>>,
    poller: Option<PollHandle>,
    lease: Option<CacheLease>,
}

impl<T> Feed<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Poll `request` until the feed is dropped. `None` yields an idle feed.
    pub fn poll(ctx: &SyncContext, request: Option<ApiRequest>) -> Self {
        let Some(request) = request else {
            let (_tx, state) = watch::channel(QueryState::idle());
            return Self {
                key: None,
                state,
                poller: None,
                lease: None,
            };
        };

        let key = request.cache_key();
        let cache = ctx.cache().clone();
        let lease = cache.retain(&key);
        let client = ctx.api().client().clone();

        let initial = cache
            .cached(&key)
            .and_then(|value| T::deserialize(value.as_ref()).ok())
            .map(|data| QueryState {
                data: Some(data),
                is_loading: false,
                error: None,
            })
            .unwrap_or_else(QueryState::loading);
        let (tx, state) = watch::channel(initial);
        let tx = Arc::new(tx);

        let log_key = key.clone();
        let poller = spawn_poller("feed", ctx.config().chat_poll_interval, move |token| {
            let cache = cache.clone();
            let client = client.clone();
            let request = request.clone();
            let tx = tx.clone();
            let key = log_key.clone();
            async move {
                let result = cache.fetch_as::<T>(&client, request).await;
                if token.is_cancelled() {
                    tracing::trace!(%key, "feed closed, discarding response");
                    return;
                }
                tx.send_modify(move |state| {
                    state.is_loading = false;
                    match result {
                        Ok(data) => {
                            state.data = Some(data);
                            state.error = None;
                        }
                        Err(error) => {
                            tracing::debug!(%key, %error, "feed refresh failed");
                            state.error = Some(error);
                        }
                    }
                });
            }
        });

        Self {
            key: Some(key),
            state,
            poller: Some(poller),
            lease: Some(lease),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_cancelled())
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Wait for the next state change. Returns `false` once the feed can no longer change.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Stop polling; the last state stays readable. Releases this feed's
    /// hold on the shared cache entry.
    pub fn close(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        self.lease = None;
    }
}

impl Feed<Vec<Message>> {
    /// Messages of `chat_id`, or an idle feed when no chat is selected.
    pub fn chat_messages(ctx: &SyncContext, chat_id: Option<&str>) -> Self {
        Self::poll(ctx, chat_id.map(StorefrontApi::chat_messages_request))
    }
}

impl Feed<Vec<Chat>> {
    /// Chats of `user_id`, or an idle feed when nobody is logged in.
    pub fn user_chats(ctx: &SyncContext, user_id: Option<&str>) -> Self {
        Self::poll(ctx, user_id.map(StorefrontApi::user_chats_request))
    }
}
