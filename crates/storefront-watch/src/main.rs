use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use storefront_http::{ChannelNavigator, SessionStore};
use storefront_sync::{Feed, QueryState, SyncConfig, SyncContext};
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "storefront-watch")]
#[command(about = "Poll a storefront account's chats and unread counters")]
struct Cli {
    /// Origin serving the storefront proxy routes
    #[arg(long, env = "STOREFRONT_BASE_URL")]
    base_url: Option<String>,
    /// Auth token of the logged-in user
    #[arg(long, env = "STOREFRONT_TOKEN")]
    token: String,
    #[arg(long, env = "STOREFRONT_USER_ID")]
    user_id: String,
    /// Also follow the messages of this chat
    #[arg(long)]
    chat_id: Option<String>,
    #[arg(long)]
    chat_poll_secs: Option<u64>,
    #[arg(long)]
    counts_poll_secs: Option<u64>,
}

impl Cli {
    fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::from_env();
        if let Some(url) = &self.base_url {
            config.client.base_url = url.clone();
        }
        if let Some(secs) = self.chat_poll_secs.filter(|s| *s > 0) {
            config.chat_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.counts_poll_secs.filter(|s| *s > 0) {
            config.counts_refresh_interval = Duration::from_secs(secs);
        }
        config
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "storefront_watch=info,storefront_sync=info,storefront_http=info".into()
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Log every state change of `feed` until it stops changing.
fn report<T, F>(label: &'static str, mut rx: watch::Receiver<QueryState<T>>, describe: F)
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = {
                let state = rx.borrow_and_update();
                match (&state.data, &state.error) {
                    (_, Some(e)) => Err(e.user_message()),
                    (Some(data), None) => Ok(describe(data)),
                    (None, None) => continue,
                }
            };
            match line {
                Ok(line) => info!("[{}] {}", label, line),
                Err(e) => warn!("[{}] refresh failed: {}", label, e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.sync_config();

    info!("=== Storefront Watch ===");
    info!(
        "Polling {} (chats every {:?}, counters every {:?})",
        config.client.base_url, config.chat_poll_interval, config.counts_refresh_interval
    );

    let session = SessionStore::with_login(cli.token.clone(), cli.user_id.clone());
    let (navigator, mut redirects) = ChannelNavigator::new();
    let ctx = SyncContext::connect(config, session.clone(), Arc::new(navigator))?;

    let store = ctx.unread_counts()?.clone();
    let _counts = ctx.start_counts_refresh()?;
    let mut counts_rx = store.subscribe();
    tokio::spawn(async move {
        while counts_rx.changed().await.is_ok() {
            let counts = *counts_rx.borrow_and_update();
            info!(
                "[counts] messages={} notifications={} auctions={} bidding={}",
                counts.messages, counts.notifications, counts.auctions, counts.bidding
            );
        }
    });

    let me = cli.user_id.clone();
    let chats = Feed::user_chats(&ctx, session.user_id().as_deref());
    report("chats", chats.subscribe(), move |chats| {
        let unread: u32 = chats.iter().map(|c| c.unread_count).sum();
        let names: Vec<&str> = chats
            .iter()
            .filter_map(|c| c.counterpart_name(&me))
            .collect();
        format!("{} chats, {} unread: {}", chats.len(), unread, names.join(", "))
    });

    let messages = Feed::chat_messages(&ctx, cli.chat_id.as_deref());
    if let Some(chat_id) = messages.key() {
        info!("Following {}", chat_id);
    }
    report("messages", messages.subscribe(), |messages| {
        match messages.last() {
            Some(last) => format!(
                "{} messages, last from {} at {}: {}",
                messages.len(),
                last.sender_id,
                last.created_at,
                last.content
            ),
            None => "no messages".to_string(),
        }
    });

    tokio::select! {
        target = redirects.recv() => {
            if let Some(target) = target {
                error!("Session rejected by server; log in again at {}", target);
            }
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown requested. Cleaning up...");
        }
    }

    drop(chats);
    drop(messages);
    Ok(())
}
