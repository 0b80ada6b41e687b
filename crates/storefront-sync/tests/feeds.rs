use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront_http::{ApiClient, ApiNetwork, ApiRequest, ApiResponse, ClientConfig};
use storefront_sync::{Feed, SyncConfig, SyncContext};

/// Replays queued responses per path; the last response for a path repeats.
#[derive(Default)]
struct ScriptedNetwork {
    responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    fn respond(&self, path: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(ApiResponse::new(status, body.to_string()));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiNetwork for ScriptedNetwork {
    async fn fetch(&self, url: &str, request: ApiRequest) -> storefront_http::Result<ApiResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());
        tokio::time::sleep(Duration::from_millis(1)).await;
        let mut responses = self.responses.lock();
        let queue = responses.entry(request.path.clone()).or_default();
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(response.unwrap_or_else(|| ApiResponse::new(404, "")))
    }
}

fn context(network: Arc<ScriptedNetwork>) -> SyncContext {
    let client = ApiClient::builder(ClientConfig::default())
        .network(network)
        .build()
        .unwrap();
    SyncContext::new(client, SyncConfig::default())
}

const MESSAGES: &str = r#"[
    {"id":"m1","chatId":"c1","senderId":"u-2","content":"Is the bike still for sale?","createdAt":"2024-05-01T10:00:00Z"},
    {"id":"m2","chatId":"c1","senderId":"u-1","content":"Yes","createdAt":"2024-05-01T10:01:00Z","isRead":true}
]"#;

#[tokio::test(start_paused = true)]
async fn test_absent_key_issues_no_requests() {
    let network = Arc::new(ScriptedNetwork::default());
    let ctx = context(network.clone());

    let feed = Feed::chat_messages(&ctx, None);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let state = feed.state();
    assert!(state.data.is_none());
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert!(!feed.is_polling());
    assert_eq!(network.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_messages_feed_loads_and_polls() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-chat", 200, MESSAGES);
    let ctx = context(network.clone());

    let feed = Feed::chat_messages(&ctx, Some("c1"));
    assert!(feed.state().is_loading);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let state = feed.state();
    assert!(!state.is_loading);
    let messages = state.data.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Is the bike still for sale?");
    assert!(messages[1].is_read);
    assert_eq!(network.calls(), 1);
    assert_eq!(
        network.urls.lock()[0],
        "http://localhost:3000/api/chats/get-chat?chatId=c1"
    );

    // t = 5, 10, 15
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(network.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_data_and_recovers() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-user-chats", 200, "[]");
    network.respond(
        "/api/chats/get-user-chats",
        500,
        r#"{"apierror":{"message":"Backend down"}}"#,
    );
    network.respond(
        "/api/chats/get-user-chats",
        500,
        r#"{"apierror":{"message":"Backend down"}}"#,
    );
    network.respond(
        "/api/chats/get-user-chats",
        200,
        r#"[{"id":"c1","user1Id":"u-1","user2Id":"u-2","createdAt":"2024-05-01T10:00:00Z","unreadCount":2}]"#,
    );
    let ctx = context(network.clone());

    let feed = Feed::user_chats(&ctx, Some("u-1"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(feed.data().unwrap().len(), 0);

    // First failure: data kept, error surfaced.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let state = feed.state();
    assert_eq!(state.data.as_ref().map(Vec::len), Some(0));
    let error = state.error.unwrap();
    assert_eq!(error.status(), Some(500));
    assert_eq!(error.user_message(), "Backend down");

    // Second failure: retried without backoff on the next tick.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(network.calls(), 3);
    assert!(feed.state().error.is_some());

    // Recovery clears the error.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let state = feed.state();
    assert!(state.error.is_none());
    let chats = state.data.unwrap();
    assert_eq!(chats[0].unread_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_feed_stops_requests() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-chat", 200, MESSAGES);
    let ctx = context(network.clone());

    let feed = Feed::chat_messages(&ctx, Some("c1"));
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(network.calls(), 2);

    drop(feed);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(network.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_closed_feed_keeps_last_state() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-chat", 200, MESSAGES);
    let ctx = context(network.clone());

    let mut feed = Feed::chat_messages(&ctx, Some("c1"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    feed.close();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert!(!feed.is_polling());
    assert_eq!(feed.data().map(|m| m.len()), Some(2));
    assert_eq!(network.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_two_feeds_same_chat_share_requests() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-chat", 200, MESSAGES);
    let ctx = context(network.clone());

    let header = Feed::chat_messages(&ctx, Some("c1"));
    let thread = Feed::chat_messages(&ctx, Some("c1"));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(header.data(), thread.data());
    assert_eq!(network.calls(), 1);

    // A feed opened later starts from the cached snapshot.
    let late = Feed::chat_messages(&ctx, Some("c1"));
    assert!(!late.state().is_loading);
    assert_eq!(late.data().map(|m| m.len()), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_are_notified() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-chat", 200, MESSAGES);
    let ctx = context(network.clone());

    let mut feed = Feed::chat_messages(&ctx, Some("c1"));
    assert!(feed.changed().await);
    assert_eq!(feed.data().map(|m| m.len()), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_evicted_after_last_feed_closes() {
    let network = Arc::new(ScriptedNetwork::default());
    network.respond("/api/chats/get-chat", 200, MESSAGES);
    let ctx = context(network.clone());
    let key = ApiRequest::get("/api/chats/get-chat")
        .with_query("chatId", "c1")
        .cache_key();

    let mut header = Feed::chat_messages(&ctx, Some("c1"));
    let thread = Feed::chat_messages(&ctx, Some("c1"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(ctx.cache().cached(&key).is_some());

    header.close();
    assert!(ctx.cache().cached(&key).is_some());
    drop(thread);
    assert!(ctx.cache().cached(&key).is_none());

    let reopened = Feed::chat_messages(&ctx, Some("c1"));
    assert!(reopened.state().is_loading);
}
