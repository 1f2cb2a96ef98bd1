// fleur-storefront/src/models/results.rs

//! Canonical records produced by the remote adapters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed inventory/POS order (the former draft).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOrderResult {
  pub order_id: String,
  pub order_number: Option<String>,
  pub raw_response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceOrderResult {
  pub order_id: String,
  pub order_number: Option<String>,
  /// Authoritative charge amount when the commerce backend reports one.
  pub amount: Option<Decimal>,
  pub currency: Option<String>,
  pub raw_response: Value,
}

/// One entry of a customer's commerce order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceOrder {
  pub id: String,
  pub order_number: Option<String>,
  pub status: Option<String>,
  pub amount: Option<Decimal>,
  pub currency: Option<String>,
  pub created_at: Option<String>,
  pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCheckoutRequest {
  /// Internal order attempt id; echoed back in the gateway's notification.
  pub order_id: String,
  pub amount: Decimal,
  pub currency: String,
  pub user_id: Option<String>,
  pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCheckoutResult {
  pub transaction_id: String,
  pub checkout_url: String,
  pub raw_response: Value,
}
