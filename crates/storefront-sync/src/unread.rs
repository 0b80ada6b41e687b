//! Shared navigation unread counters.
//!
//! One store per logged-in session. Refreshes are authoritative and replace
//! all four counters in a single publish; local decrements are optimistic and
//! only live until the next refresh lands.

use crate::api::CountsSource;
use crate::models::{CountsPatch, UnreadCounts};
use crate::poller::{spawn_poller, PollHandle, PollToken};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use storefront_http::ApiError;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountsPhase {
    /// No refresh has completed yet.
    #[default]
    Uninitialized,
    Fetching,
    Ready,
}

/// Bookkeeping for overlapping refreshes.
#[derive(Debug, Default)]
struct RefreshState {
    in_flight: usize,
    loaded: bool,
}

impl RefreshState {
    fn settled_phase(&self) -> CountsPhase {
        if self.loaded {
            CountsPhase::Ready
        } else if self.in_flight > 0 {
            CountsPhase::Fetching
        } else {
            CountsPhase::Uninitialized
        }
    }
}

#[derive(Debug)]
pub struct UnreadCountStore {
    counts: watch::Sender<UnreadCounts>,
    phase: watch::Sender<CountsPhase>,
    refresh: Mutex<RefreshState>,
}

impl Default for UnreadCountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UnreadCountStore {
    pub fn new() -> Self {
        Self::with_counts(UnreadCounts::default())
    }

    /// Store seeded with `counts`, still waiting for its first refresh.
    pub fn with_counts(counts: UnreadCounts) -> Self {
        let (counts, _) = watch::channel(counts);
        let (phase, _) = watch::channel(CountsPhase::Uninitialized);
        Self {
            counts,
            phase,
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    pub fn counts(&self) -> UnreadCounts {
        *self.counts.borrow()
    }

    pub fn phase(&self) -> CountsPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UnreadCounts> {
        self.counts.subscribe()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<CountsPhase> {
        self.phase.subscribe()
    }

    /// Lower the message badge by `n`, never below zero.
    pub fn decrement_message_count(&self, n: u32) {
        self.counts
            .send_modify(|c| c.messages = c.messages.saturating_sub(n));
    }

    pub fn decrement_message(&self) {
        self.decrement_message_count(1);
    }

    /// Lower the notification badge by `n`, never below zero.
    pub fn decrement_notification_count(&self, n: u32) {
        self.counts
            .send_modify(|c| c.notifications = c.notifications.saturating_sub(n));
    }

    pub fn decrement_notification(&self) {
        self.decrement_notification_count(1);
    }

    /// Merge a partial update.
    pub fn set_counts(&self, patch: CountsPatch) {
        self.counts.send_modify(|c| patch.apply(c));
    }

    /// Fetch the authoritative counters and replace all four at once.
    ///
    /// A failed fetch is logged and leaves the current counters in place.
    /// Returns whether the refresh succeeded.
    pub async fn refresh_counts(&self, source: &dyn CountsSource) -> bool {
        self.refresh(source, None).await
    }

    async fn refresh(&self, source: &dyn CountsSource, token: Option<&PollToken>) -> bool {
        let mut in_flight = InFlightRefresh::begin(self);
        let result = source.fetch_counts().await;

        if token.is_some_and(PollToken::is_cancelled) {
            return false;
        }

        match result {
            Ok(fresh) => {
                let fresh = UnreadCounts::from(fresh);
                in_flight.fresh = Some(fresh);
                drop(in_flight);
                tracing::debug!(?fresh, "unread counts refreshed");
                true
            }
            Err(error) => {
                drop(in_flight);
                log_refresh_failure(&error);
                false
            }
        }
    }

    /// Settle one refresh. The phase reflects every refresh that has
    /// completed, not the phase this one happened to start from.
    fn finish_refresh(&self, fresh: Option<UnreadCounts>) {
        let mut state = self.refresh.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if let Some(fresh) = fresh {
            self.counts.send_replace(fresh);
            state.loaded = true;
        }
        self.phase.send_replace(state.settled_phase());
    }

    /// Refresh now and then every `period` until the handle is dropped.
    pub fn spawn_refresher(
        self: &Arc<Self>,
        source: Arc<dyn CountsSource>,
        period: Duration,
    ) -> PollHandle {
        let store = Arc::clone(self);
        spawn_poller("unread-counts", period, move |token| {
            let store = store.clone();
            let source = source.clone();
            async move {
                store.refresh(source.as_ref(), Some(&token)).await;
            }
        })
    }
}

/// One refresh in progress. Settles on drop, including when the refresh
/// future itself is dropped mid-fetch.
struct InFlightRefresh<'a> {
    store: &'a UnreadCountStore,
    fresh: Option<UnreadCounts>,
}

impl<'a> InFlightRefresh<'a> {
    fn begin(store: &'a UnreadCountStore) -> Self {
        let mut state = store.refresh.lock();
        state.in_flight += 1;
        store.phase.send_replace(CountsPhase::Fetching);
        drop(state);
        Self { store, fresh: None }
    }
}

impl Drop for InFlightRefresh<'_> {
    fn drop(&mut self) {
        self.store.finish_refresh(self.fresh.take());
    }
}

fn log_refresh_failure(error: &ApiError) {
    if error.is_access_denied() {
        tracing::info!(%error, "unread counts refresh rejected");
    } else {
        tracing::warn!(%error, "unread counts refresh failed, keeping previous counts");
    }
}
