use crate::error::{ApiError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Something that can send the user to another screen.
#[async_trait]
pub trait Navigator: Send + Sync + 'static {
    async fn navigate(&self, target: &str) -> Result<()>;
}

/// Forwards navigation targets to whoever owns the receiving end.
#[derive(Clone, Debug)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Navigator for ChannelNavigator {
    async fn navigate(&self, target: &str) -> Result<()> {
        self.tx
            .send(target.to_string())
            .map_err(|_| ApiError::Navigation(format!("no listener for {target}")))
    }
}
