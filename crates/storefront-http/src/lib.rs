pub mod client;
pub mod error;
pub mod middleware;
pub mod session;
pub mod traits;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder, ClientConfig};
pub use error::{ApiError, Result};
pub use middleware::{
    AuthRedirect, ChannelNavigator, Middleware, Navigator, Next, RequestLog, SessionHeaders,
};
pub use session::SessionStore;
pub use traits::ApiNetwork;
pub use types::{ApiRequest, ApiResponse};
