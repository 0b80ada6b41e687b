//! Client-side read models for the storefront.
//!
//! Chats, messages and the navigation unread counters are kept fresh by
//! re-fetching on fixed intervals. Nothing here is pushed from the server;
//! the latest response to arrive is what callers see.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod models;
pub mod poller;
pub mod unread;

pub use api::{CountsSource, StorefrontApi};
pub use cache::{CacheLease, QueryCache};
pub use config::SyncConfig;
pub use context::SyncContext;
pub use error::{Result, SyncError};
pub use feed::{Feed, QueryState};
pub use models::{Chat, CountsPatch, Message, TopNavCounts, UnreadCounts};
pub use poller::{spawn_poller, PollHandle, PollToken};
pub use unread::{CountsPhase, UnreadCountStore};
