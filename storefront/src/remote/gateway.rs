// fleur-storefront/src/remote/gateway.rs

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::http::{missing_field, send_json};
use super::normalize::{pick_id, pick_string};
use super::{PaymentGateway, RemoteError, RemoteSystem};
use crate::config::GatewayConfig;
use crate::models::{GatewayCheckoutRequest, GatewayCheckoutResult};

const SYSTEM: RemoteSystem = RemoteSystem::Gateway;

#[derive(Serialize)]
struct CheckoutBody<'a> {
  order_id: &'a str,
  #[serde(with = "rust_decimal::serde::float")]
  amount: Decimal,
  currency: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  user_id: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  return_url: Option<&'a str>,
  metadata: &'a Value,
}

/// Hosted checkout sessions, authenticated with the static integration key.
pub struct HttpPaymentGateway {
  client: Client,
  config: GatewayConfig,
}

impl HttpPaymentGateway {
  pub fn new(client: Client, config: GatewayConfig) -> Self {
    Self { client, config }
  }
}

fn normalize_checkout(response: Value) -> Result<GatewayCheckoutResult, RemoteError> {
  // A bare `id` may be an envelope's request id, so explicit names win at any depth.
  let transaction_id = pick_id(&response, &["transaction_id", "transactionId"])
    .or_else(|| pick_id(&response, &["id"]))
    .ok_or_else(|| missing_field(SYSTEM, "create_checkout", "transaction_id"))?;
  let checkout_url = pick_string(&response, &["payment_url", "checkout_url", "checkoutUrl", "url"])
    .filter(|url| !url.trim().is_empty())
    .ok_or_else(|| missing_field(SYSTEM, "create_checkout", "payment_url"))?;

  Ok(GatewayCheckoutResult {
    transaction_id,
    checkout_url,
    raw_response: response,
  })
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
  #[instrument(
    name = "gateway::create_checkout",
    skip_all,
    fields(order_id = %request.order_id, amount = %request.amount, currency = %request.currency)
  )]
  async fn create_checkout(&self, request: GatewayCheckoutRequest) -> Result<GatewayCheckoutResult, RemoteError> {
    let body = CheckoutBody {
      order_id: &request.order_id,
      amount: request.amount,
      currency: &request.currency,
      user_id: request.user_id.as_deref(),
      return_url: self.config.return_url.as_deref(),
      metadata: &request.metadata,
    };

    let http_request = self
      .client
      .post(format!("{}/checkout", self.config.base_url))
      .bearer_auth(&self.config.api_key)
      .json(&body);
    let response = send_json(SYSTEM, "create_checkout", http_request).await?;
    let result = normalize_checkout(response)?;

    info!(transaction_id = %result.transaction_id, "Gateway checkout session created.");
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn checkout_field_variants_normalize() {
    let cases = [
      json!({"transaction_id": "tx1", "payment_url": "https://pay.test/tx1"}),
      json!({"id": "tx1", "url": "https://pay.test/tx1"}),
      json!({"data": {"transactionId": "tx1", "checkout_url": "https://pay.test/tx1"}}),
      json!({"result": {"id": "tx1", "payment_url": "https://pay.test/tx1"}}),
    ];
    for body in cases {
      let result = normalize_checkout(body.clone()).unwrap();
      assert_eq!(result.transaction_id, "tx1");
      assert_eq!(result.checkout_url, "https://pay.test/tx1");
      assert_eq!(result.raw_response, body);
    }
  }

  #[test]
  fn nested_transaction_id_beats_envelope_id() {
    let body = json!({"id": "req-9", "data": {"transaction_id": "tx1", "payment_url": "https://pay.test/tx1"}});
    assert_eq!(normalize_checkout(body).unwrap().transaction_id, "tx1");
  }

  #[test]
  fn missing_url_is_malformed() {
    let err = normalize_checkout(json!({"transaction_id": "tx1"})).unwrap_err();
    assert!(err.message.contains("payment_url"));
    assert!(normalize_checkout(json!({"url": "https://pay.test"})).is_err());
  }
}
