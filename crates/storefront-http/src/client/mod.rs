//! Storefront HTTP client implementation.

mod config;
mod fetch;
pub mod native_network;

pub use config::ClientConfig;
pub use fetch::{ApiClient, ApiClientBuilder};
pub use native_network::NativeNetwork;
