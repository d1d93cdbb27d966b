//! HTTP operations against the teamboard REST API.
//!
//! ERROR HANDLING
//! ==============
//! Every call resolves into the tagged result the action builder consumes:
//! `Ok(Value)` with the response body, or `Err(OpError)` keeping the HTTP
//! status and the parsed error body. Transport failures and error responses
//! collapse into the same type, so callers have exactly one failure channel.

use reqwest::Method;
use serde_json::Value;

/// Failure of a wrapped async operation.
#[derive(Debug, thiserror::Error)]
#[error("operation failed: {detail}")]
pub struct OpError {
    /// HTTP status when the server answered; `None` for transport failures.
    pub status: Option<u16>,
    /// Parsed error body, or a description of the transport failure.
    pub detail: Value,
}

impl OpError {
    #[must_use]
    pub fn transport(error: &reqwest::Error) -> Self {
        Self {
            status: error.status().map(|status| status.as_u16()),
            detail: Value::String(error.to_string()),
        }
    }

    /// A failure that never reached the server.
    #[must_use]
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self { status: None, detail: Value::String(detail.into()) }
    }

    /// True when the server rejected the request as unauthorized.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// The failure as an action payload.
    #[must_use]
    pub fn payload(&self) -> Value {
        serde_json::json!({
            "error": { "statusCode": self.status, "detail": self.detail }
        })
    }
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
        }
    }

    /// One JSON request. Non-2xx responses become [`OpError`] with the
    /// parsed body as detail.
    ///
    /// # Errors
    ///
    /// [`OpError`] for transport failures and error responses.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value, OpError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(&json);
        }

        let response = request
            .send()
            .await
            .map_err(|error| OpError::transport(&error))?;
        let status = response.status();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);

        if status.is_success() {
            Ok(value)
        } else {
            Err(OpError { status: Some(status.as_u16()), detail: value })
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
