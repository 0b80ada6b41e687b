//! Fixed-interval scheduler with explicit cancellation.
//!
//! A poller runs its tick once immediately and then every `period`. Ticks never
//! overlap: a slow tick delays the next one instead of queueing a burst. There
//! is no backoff; a failing tick is simply run again on the next period.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Lets a tick that is already running find out it has been cancelled.
#[derive(Clone, Debug)]
pub struct PollToken {
    stop: watch::Receiver<bool>,
}

impl PollToken {
    pub fn is_cancelled(&self) -> bool {
        *self.stop.borrow()
    }
}

/// Owner of a running poller. Dropping it cancels the poller.
#[derive(Debug)]
pub struct PollHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop scheduling ticks. A tick in flight runs to completion.
    pub fn cancel(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.stop.borrow()
    }

    /// Cancel and wait for the background task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Poller task failed: {}", e);
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}

/// Spawn `tick` on the tokio runtime, first immediately and then every `period`.
pub fn spawn_poller<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut(PollToken) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let token = PollToken {
        stop: stop_rx.clone(),
    };
    let period = period.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(poller = name, ?period, "poller started");

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }
            if *stop_rx.borrow() {
                break;
            }
            tick(token.clone()).await;
        }

        tracing::debug!(poller = name, "poller stopped");
    });

    PollHandle {
        stop: stop_tx,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(period: Duration) -> (PollHandle, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = spawn_poller("test", period, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (handle, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let (_handle, ticks) = counting(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let (_handle, ticks) = counting(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        // t = 0, 5, 10
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_cancel() {
        let (handle, ticks) = counting(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        handle.cancel();
        assert!(handle.is_cancelled());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (handle, ticks) = counting(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_tick_sees_cancellation() {
        let observed = Arc::new(AtomicUsize::new(0));
        let seen = observed.clone();
        let handle = spawn_poller("slow", Duration::from_secs(5), move |token| {
            let seen = seen.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                if token.is_cancelled() {
                    seen.fetch_add(100, Ordering::SeqCst);
                } else {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.shutdown().await;
        assert_eq!(observed.load(Ordering::SeqCst), 100);
    }
}
