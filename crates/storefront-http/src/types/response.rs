//! HTTP response as seen by middleware and callers.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Error envelopes produced by the proxy routes and the upstream backend.
#[derive(Deserialize)]
struct ErrorEnvelope {
    apierror: Option<MessageBody>,
    error: Option<MessageBody>,
    message: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        ApiResponse {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[inline]
    pub fn is_access_denied(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Best-effort human readable message for a failed response.
    ///
    /// Looks at `apierror.message`, then `error.message`, then `message`,
    /// then the raw text body, and finally the status reason phrase.
    pub fn error_message(&self) -> String {
        if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(&self.body) {
            let found = envelope
                .apierror
                .and_then(|e| e.message)
                .or_else(|| envelope.error.and_then(|e| e.message))
                .or(envelope.message);
            if let Some(message) = found.filter(|m| !m.trim().is_empty()) {
                return message;
            }
        }

        if let Some(text) = self.body_str().map(str::trim) {
            if !text.is_empty() && !text.starts_with('{') {
                return text.to_string();
            }
        }

        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Request failed")
            .to_string()
    }

    /// Turn a non-2xx response into [`crate::ApiError::Status`].
    pub fn error_for_status(self) -> crate::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(crate::ApiError::Status {
                status: self.status,
                message: self.error_message(),
            })
        }
    }
}

impl Default for ApiResponse {
    fn default() -> Self {
        ApiResponse::new(200, Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apierror_envelope() {
        let res = ApiResponse::new(404, r#"{"apierror":{"message":"Chat not found"}}"#);
        assert_eq!(res.error_message(), "Chat not found");
    }

    #[test]
    fn test_nested_error_envelope() {
        let res = ApiResponse::new(400, r#"{"error":{"message":"Bad chat id"}}"#);
        assert_eq!(res.error_message(), "Bad chat id");
    }

    #[test]
    fn test_plain_text_body() {
        let res = ApiResponse::new(502, "upstream unavailable");
        assert_eq!(res.error_message(), "upstream unavailable");
    }

    #[test]
    fn test_empty_body_falls_back_to_reason() {
        let res = ApiResponse::new(503, "");
        assert_eq!(res.error_message(), "Service Unavailable");
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse::new(200, "[]").error_for_status();
        assert!(ok.is_ok());

        let err = ApiResponse::new(403, r#"{"apierror":{"message":"Forbidden item"}}"#)
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.user_message(), "Forbidden item");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let res = ApiResponse::new(200, "").with_header("Content-Type", "application/json");
        assert_eq!(res.header("content-type"), Some("application/json"));
    }
}
