// fleur-storefront/src/models/order_attempt.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::payload::CheckoutPayload;
use super::results::{CommerceOrderResult, InventoryOrderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  PendingPayment,
  Paid,
  Failed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::PendingPayment => "pending_payment",
      OrderStatus::Paid => "paid",
      OrderStatus::Failed => "failed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Paid | OrderStatus::Failed | OrderStatus::Cancelled)
  }

  /// Allowed lifecycle edges. Terminal states have none.
  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Pending, PendingPayment) | (Pending, Paid) | (Pending, Failed) | (PendingPayment, Paid)
        | (PendingPayment, Failed)
        | (PendingPayment, Cancelled)
    )
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Cash,
  Card,
  Gateway,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Cash => "cash",
      PaymentMethod::Card => "card",
      PaymentMethod::Gateway => "gateway",
    }
  }

  /// Online payment settled later through a gateway notification.
  pub fn uses_gateway(&self) -> bool {
    matches!(self, PaymentMethod::Gateway)
  }
}

impl FromStr for PaymentMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "cash" => Ok(PaymentMethod::Cash),
      "card" => Ok(PaymentMethod::Card),
      "gateway" => Ok(PaymentMethod::Gateway),
      other => Err(format!("unknown payment method '{}'", other)),
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The caller's session credential. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
  /// `None` for a blank value, which never counts as a credential.
  pub fn new(raw: impl Into<String>) -> Option<Self> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      None
    } else {
      Some(Self(trimmed.to_string()))
    }
  }

  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for SessionToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("SessionToken([redacted])")
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTransaction {
  pub transaction_id: String,
  pub checkout_url: String,
  pub amount: Decimal,
  pub currency: String,
  pub raw_response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAttempt {
  pub id: Uuid,
  pub status: OrderStatus,
  pub raw_payload: CheckoutPayload,
  pub payment_method: PaymentMethod,
  pub amount: Decimal,
  pub currency: String,
  pub inventory_result: Option<InventoryOrderResult>,
  pub commerce_result: Option<CommerceOrderResult>,
  pub gateway_transaction: Option<GatewayTransaction>,
  /// Set by the one payment callback allowed to settle the attempt.
  #[serde(default)]
  pub settlement_claimed_at: Option<DateTime<Utc>>,
  /// Process memory only: never serialized, so never stored durably or returned.
  #[serde(skip)]
  pub auth_token: Option<SessionToken>,
  pub log: Vec<LogEntry>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderAttempt {
  pub fn transaction_id(&self) -> Option<&str> {
    self.gateway_transaction.as_ref().map(|tx| tx.transaction_id.as_str())
  }
}

/// Partial update for an attempt. `None` fields are left untouched.
///
/// `gateway_transaction` is doubly optional: `Some(None)` clears the
/// transaction (and its index entry), `None` leaves it as is.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
  pub status: Option<OrderStatus>,
  pub inventory_result: Option<InventoryOrderResult>,
  pub commerce_result: Option<CommerceOrderResult>,
  pub gateway_transaction: Option<Option<GatewayTransaction>>,
}

impl OrderPatch {
  pub fn status(status: OrderStatus) -> Self {
    Self {
      status: Some(status),
      ..Default::default()
    }
  }

  pub fn with_status(mut self, status: OrderStatus) -> Self {
    self.status = Some(status);
    self
  }

  pub fn with_inventory(mut self, result: InventoryOrderResult) -> Self {
    self.inventory_result = Some(result);
    self
  }

  pub fn with_commerce(mut self, result: CommerceOrderResult) -> Self {
    self.commerce_result = Some(result);
    self
  }

  pub fn with_gateway_transaction(mut self, tx: GatewayTransaction) -> Self {
    self.gateway_transaction = Some(Some(tx));
    self
  }

  pub fn clear_gateway_transaction(mut self) -> Self {
    self.gateway_transaction = Some(None);
    self
  }
}
