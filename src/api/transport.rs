//! Transport seam between the provisioning client and the outside world.
//!
//! The client only ever sees `Transport::send`; credential attachment and
//! refresh live in the transport implementation, not in the core. Tests
//! substitute an in-memory implementation behind the same trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::error::ProvisionError;

const USER_AGENT: &str = concat!("onboarder/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// One round trip to the provisioning API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch `body` to `path` and return the decoded JSON response.
    ///
    /// Implementations map failures onto `ProvisionError`; they do not
    /// retry (the caller's workflow is forward-only and user-driven).
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ProvisionError>;
}

/// HTTPS transport with bearer authentication.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Build a transport rooted at `base_url`. `token` is attached as a
    /// bearer credential on every request when present.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ProvisionError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProvisionError::transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Pull the human-readable message out of an upstream error body.
///
/// The provisioning services answer errors with
/// `{"error": {"message": "..."}}`; anything else falls back to the raw
/// body or the status code.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ProvisionError> {
        let url = self.url_for(path);
        tracing::debug!(method = method.as_str(), %url, "dispatching provisioning call");

        let mut request = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProvisionError::transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProvisionError::transport(e.to_string()))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&text).map_err(|e| ProvisionError::transport(e.to_string()))
        } else {
            let message = error_message(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), %message, "provisioning call rejected");
            Err(ProvisionError::from_status(status.as_u16(), message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_google_body() {
        let body = r#"{"error": {"code": 409, "message": "Customer already exists."}}"#;
        assert_eq!(error_message(409, body), "Customer already exists.");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(502, "upstream timed out"), "upstream timed out");
        assert_eq!(error_message(503, "   "), "HTTP 503");
        // JSON without the expected envelope falls back to the raw body.
        assert_eq!(error_message(400, r#"{"detail": "nope"}"#), r#"{"detail": "nope"}"#);
    }

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::new("https://www.googleapis.com/", None).unwrap();
        assert_eq!(
            transport.url_for("/apps/reseller/v1/customers"),
            "https://www.googleapis.com/apps/reseller/v1/customers"
        );
        assert_eq!(
            transport.url_for("apps/reseller/v1/customers"),
            "https://www.googleapis.com/apps/reseller/v1/customers"
        );
    }
}
