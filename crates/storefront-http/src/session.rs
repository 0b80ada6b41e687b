//! Session cookies held by the client.
//!
//! The storefront keeps its auth state in three readable cookies. The store is
//! shared between the [`crate::middleware::SessionHeaders`] stage, which sends
//! them, and [`crate::middleware::AuthRedirect`], which wipes them on 401/403.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const AUTH_TOKEN: &str = "authToken";
pub const USER_ID: &str = "userId";
pub const USER_NAME: &str = "userName";

#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    cookies: Arc<RwLock<BTreeMap<String, String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for an already logged-in user.
    pub fn with_login(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(AUTH_TOKEN, token);
        store.set(USER_ID, user_id);
        store
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.write().insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies.write().remove(name)
    }

    pub fn token(&self) -> Option<String> {
        self.get(AUTH_TOKEN).filter(|t| !t.is_empty())
    }

    pub fn user_id(&self) -> Option<String> {
        self.get(USER_ID).filter(|id| !id.is_empty())
    }

    pub fn user_name(&self) -> Option<String> {
        self.get(USER_NAME)
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// Remove every cookie. Returns how many were dropped.
    pub fn clear_all(&self) -> usize {
        let mut cookies = self.cookies.write();
        let removed = cookies.len();
        cookies.clear();
        removed
    }

    /// `Cookie` header value, or `None` when the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.read();
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
