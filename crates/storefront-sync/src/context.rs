//! Explicit dependency container handed to every feed and badge consumer.

use crate::api::{CountsSource, StorefrontApi};
use crate::cache::QueryCache;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::poller::PollHandle;
use crate::unread::UnreadCountStore;
use std::sync::Arc;
use storefront_http::{ApiClient, Navigator, SessionStore};

#[derive(Clone)]
pub struct SyncContext {
    api: StorefrontApi,
    config: SyncConfig,
    cache: QueryCache,
    unread: Option<Arc<UnreadCountStore>>,
}

impl SyncContext {
    pub fn new(client: ApiClient, config: SyncConfig) -> Self {
        Self {
            api: StorefrontApi::new(client),
            config,
            cache: QueryCache::new(),
            unread: None,
        }
    }

    /// Authenticated client plus a fresh unread-count store.
    pub fn connect(
        config: SyncConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = ApiClient::authenticated(config.client.clone(), session, navigator)?;
        Ok(Self::new(client, config).with_unread_counts(Arc::new(UnreadCountStore::new())))
    }

    pub fn with_unread_counts(mut self, store: Arc<UnreadCountStore>) -> Self {
        self.unread = Some(store);
        self
    }

    pub fn api(&self) -> &StorefrontApi {
        &self.api
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The shared counter store. Fails when this context was built without one.
    pub fn unread_counts(&self) -> Result<&Arc<UnreadCountStore>> {
        self.unread
            .as_ref()
            .ok_or(SyncError::NotProvided("unread counts"))
    }

    /// Start refreshing the shared counters from the storefront API.
    pub fn start_counts_refresh(&self) -> Result<PollHandle> {
        let store = self.unread_counts()?;
        let source: Arc<dyn CountsSource> = Arc::new(self.api.clone());
        Ok(store.spawn_refresher(source, self.config.counts_refresh_interval))
    }
}
