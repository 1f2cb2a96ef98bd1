// fleur-storefront/src/store/mod.rs

//! Order record store: authoritative lifecycle state of every order attempt.
//!
//! All writes go through `create`, `update`, `append_log` and `claim_settlement`.
//! Reads return owned snapshots, so callers never hold references into stored state.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CheckoutPayload, LogEntry, OrderAttempt, OrderPatch, OrderStatus, SessionToken};

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("unknown order attempt {0}")]
  UnknownOrder(Uuid),

  #[error("illegal status transition {from} -> {to}")]
  IllegalTransition { from: OrderStatus, to: OrderStatus },

  #[error("{field} is already recorded for this order attempt")]
  ResultAlreadyRecorded { field: &'static str },

  #[error("gateway transaction {0} already belongs to another order attempt")]
  TransactionConflict(String),

  #[error("invalid checkout payload: {0}")]
  InvalidPayload(String),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("record serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
  pub auth_token: Option<SessionToken>,
  /// Used when the payload totals carry no currency.
  pub default_currency: String,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Allocates a new `pending` attempt holding its own copy of `payload`.
  async fn create(&self, payload: &CheckoutPayload, options: CreateOptions) -> Result<OrderAttempt, StoreError>;

  async fn get(&self, id: Uuid) -> Result<Option<OrderAttempt>, StoreError>;

  async fn find_by_gateway_transaction(&self, transaction_id: &str) -> Result<Option<OrderAttempt>, StoreError>;

  /// Merges `patch` and refreshes `updated_at`. `Ok(None)` for an unknown id.
  async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Option<OrderAttempt>, StoreError>;

  async fn append_log(&self, id: Uuid, message: String) -> Result<(), StoreError>;

  /// Atomically marks a `pending_payment` attempt as being settled. Only the
  /// first caller gets `true`; every later caller must leave the attempt alone.
  async fn claim_settlement(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Builds a fresh attempt. Shared by every store so creation rules stay identical.
pub(crate) fn new_attempt(payload: &CheckoutPayload, options: CreateOptions) -> Result<OrderAttempt, StoreError> {
  let payment_method = payload.payment_method().map_err(StoreError::InvalidPayload)?;
  let amount = payload
    .total_amount()
    .ok_or_else(|| StoreError::InvalidPayload("totals.amount is missing".to_string()))?;
  let currency = payload
    .currency()
    .map(str::to_string)
    .unwrap_or(options.default_currency);
  let now = Utc::now();

  Ok(OrderAttempt {
    id: Uuid::new_v4(),
    status: OrderStatus::Pending,
    raw_payload: payload.clone(),
    payment_method,
    amount,
    currency,
    inventory_result: None,
    commerce_result: None,
    gateway_transaction: None,
    settlement_claimed_at: None,
    auth_token: options.auth_token,
    log: Vec::new(),
    created_at: now,
    updated_at: now,
  })
}

/// Index entries a patch removes and adds.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct IndexChange {
  pub removed: Option<String>,
  pub added: Option<String>,
}

/// Transaction id the patch would index, if it sets one.
pub(crate) fn incoming_transaction(patch: &OrderPatch) -> Option<&str> {
  match &patch.gateway_transaction {
    Some(Some(tx)) => Some(tx.transaction_id.as_str()),
    _ => None,
  }
}

/// Validates `patch` against `attempt` and applies it. Nothing is modified
/// when validation fails.
pub(crate) fn apply_patch(attempt: &mut OrderAttempt, patch: OrderPatch) -> Result<IndexChange, StoreError> {
  if let Some(next) = patch.status {
    if next != attempt.status && !attempt.status.can_transition_to(next) {
      return Err(StoreError::IllegalTransition {
        from: attempt.status,
        to: next,
      });
    }
  }
  if patch.inventory_result.is_some() && attempt.inventory_result.is_some() {
    return Err(StoreError::ResultAlreadyRecorded {
      field: "inventory_result",
    });
  }
  if patch.commerce_result.is_some() && attempt.commerce_result.is_some() {
    return Err(StoreError::ResultAlreadyRecorded {
      field: "commerce_result",
    });
  }

  let mut change = IndexChange::default();
  if let Some(status) = patch.status {
    attempt.status = status;
  }
  if let Some(result) = patch.inventory_result {
    attempt.inventory_result = Some(result);
  }
  if let Some(result) = patch.commerce_result {
    attempt.commerce_result = Some(result);
  }
  if let Some(tx) = patch.gateway_transaction {
    let old = attempt.transaction_id().map(str::to_string);
    let new = tx.as_ref().map(|t| t.transaction_id.clone());
    if old != new {
      change.removed = old;
      change.added = new;
    }
    attempt.gateway_transaction = tx;
  }
  attempt.updated_at = Utc::now();
  Ok(change)
}

/// Claims `attempt` for settlement unless it is settled or already claimed.
pub(crate) fn claim(attempt: &mut OrderAttempt) -> bool {
  if attempt.status != OrderStatus::PendingPayment
    || attempt.inventory_result.is_some()
    || attempt.settlement_claimed_at.is_some()
  {
    return false;
  }
  let now = Utc::now();
  attempt.settlement_claimed_at = Some(now);
  attempt.updated_at = now;
  true
}

pub(crate) fn push_log(attempt: &mut OrderAttempt, message: String) {
  let now = Utc::now();
  attempt.log.push(LogEntry {
    timestamp: now,
    message,
  });
  attempt.updated_at = now;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{GatewayTransaction, InventoryOrderResult};
  use rust_decimal::Decimal;
  use serde_json::json;

  fn payload(method: &str) -> CheckoutPayload {
    serde_json::from_value(json!({
      "items": [{"productId": "p1", "quantity": 2, "price": 100}],
      "checkout": {"paymentMethod": method},
      "totals": {"amount": 200}
    }))
    .unwrap()
  }

  fn tx(id: &str) -> GatewayTransaction {
    GatewayTransaction {
      transaction_id: id.to_string(),
      checkout_url: format!("https://pay.test/{}", id),
      amount: Decimal::new(200, 0),
      currency: "UZS".to_string(),
      raw_response: json!({}),
    }
  }

  fn inventory() -> InventoryOrderResult {
    InventoryOrderResult {
      order_id: "inv-1".to_string(),
      order_number: None,
      raw_response: json!({}),
    }
  }

  fn opened(method: &str) -> OrderAttempt {
    new_attempt(
      &payload(method),
      CreateOptions {
        auth_token: None,
        default_currency: "UZS".to_string(),
      },
    )
    .unwrap()
  }

  #[test]
  fn new_attempt_copies_totals_and_defaults_currency() {
    let attempt = opened("gateway");
    assert_eq!(attempt.status, OrderStatus::Pending);
    assert_eq!(attempt.amount, Decimal::new(200, 0));
    assert_eq!(attempt.currency, "UZS");
    assert!(attempt.payment_method.uses_gateway());
  }

  #[test]
  fn illegal_transition_leaves_attempt_untouched() {
    let mut attempt = opened("cash");
    apply_patch(&mut attempt, OrderPatch::status(OrderStatus::Failed)).unwrap();
    let before = attempt.updated_at;

    let err = apply_patch(&mut attempt, OrderPatch::status(OrderStatus::Paid).with_inventory(inventory())).unwrap_err();
    assert!(matches!(
      err,
      StoreError::IllegalTransition {
        from: OrderStatus::Failed,
        to: OrderStatus::Paid
      }
    ));
    assert_eq!(attempt.status, OrderStatus::Failed);
    assert!(attempt.inventory_result.is_none());
    assert_eq!(attempt.updated_at, before);
  }

  #[test]
  fn recorded_results_are_never_overwritten() {
    let mut attempt = opened("cash");
    apply_patch(&mut attempt, OrderPatch::default().with_inventory(inventory())).unwrap();
    let err = apply_patch(&mut attempt, OrderPatch::default().with_inventory(inventory())).unwrap_err();
    assert!(matches!(
      err,
      StoreError::ResultAlreadyRecorded {
        field: "inventory_result"
      }
    ));
  }

  #[test]
  fn same_status_patch_is_not_a_transition() {
    let mut attempt = opened("cash");
    apply_patch(&mut attempt, OrderPatch::status(OrderStatus::Paid)).unwrap();
    assert!(apply_patch(&mut attempt, OrderPatch::status(OrderStatus::Paid)).is_ok());
  }

  #[test]
  fn settlement_is_claimed_once_and_only_while_awaiting_payment() {
    let mut attempt = opened("gateway");
    assert!(!claim(&mut attempt));

    apply_patch(&mut attempt, OrderPatch::status(OrderStatus::PendingPayment)).unwrap();
    assert!(claim(&mut attempt));
    assert!(attempt.settlement_claimed_at.is_some());
    assert!(!claim(&mut attempt));
  }

  #[test]
  fn transaction_changes_report_index_updates() {
    let mut attempt = opened("gateway");
    let change = apply_patch(&mut attempt, OrderPatch::default().with_gateway_transaction(tx("tx1"))).unwrap();
    assert_eq!(
      change,
      IndexChange {
        removed: None,
        added: Some("tx1".to_string())
      }
    );

    let change = apply_patch(&mut attempt, OrderPatch::default().with_gateway_transaction(tx("tx2"))).unwrap();
    assert_eq!(change.removed.as_deref(), Some("tx1"));
    assert_eq!(change.added.as_deref(), Some("tx2"));

    let change = apply_patch(&mut attempt, OrderPatch::default().clear_gateway_transaction()).unwrap();
    assert_eq!(change.removed.as_deref(), Some("tx2"));
    assert!(change.added.is_none());
    assert!(attempt.gateway_transaction.is_none());
  }
}
