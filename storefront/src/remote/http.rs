// fleur-storefront/src/remote/http.rs

//! Shared request plumbing for the HTTP adapters.

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use super::normalize;
use super::{RemoteError, RemoteSystem};

/// Client with a hard per-request timeout so a stalled remote cannot hang a checkout.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
  Client::builder()
    .timeout(timeout)
    .user_agent(concat!("fleur-storefront/", env!("CARGO_PKG_VERSION")))
    .build()
}

/// Sends `request` and decodes a JSON body. An empty 2xx body decodes to `Value::Null`.
pub async fn send_json(system: RemoteSystem, step: &'static str, request: RequestBuilder) -> Result<Value, RemoteError> {
  let response = request.send().await.map_err(|e| {
    let message = if e.is_timeout() {
      "request timed out".to_string()
    } else {
      format!("transport error: {}", e)
    };
    RemoteError::new(system, step, None, message)
  })?;

  let status = response.status();
  let body = response
    .text()
    .await
    .map_err(|e| RemoteError::new(system, step, Some(status.as_u16()), format!("failed to read body: {}", e)))?;

  if !status.is_success() {
    let message = normalize::error_message(&body)
      .or_else(|| status.canonical_reason().map(str::to_string))
      .unwrap_or_else(|| "request failed".to_string());
    tracing::warn!(%system, step, status = status.as_u16(), %message, "Remote call returned an error status.");
    return Err(RemoteError::new(system, step, Some(status.as_u16()), message));
  }

  if body.trim().is_empty() {
    return Ok(Value::Null);
  }
  serde_json::from_str(&body).map_err(|e| {
    RemoteError::new(system, step, Some(status.as_u16()), format!("malformed JSON response: {}", e))
  })
}

/// Error for a 2xx body that lacks a field the canonical record needs.
pub fn missing_field(system: RemoteSystem, step: &'static str, field: &str) -> RemoteError {
  RemoteError::new(system, step, None, format!("response is missing '{}'", field))
}
