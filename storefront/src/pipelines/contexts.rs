// fleur-storefront/src/pipelines/contexts.rs

//! Data structs the pipelines run over. Handlers receive them wrapped in
//! `fleur_flow::ContextData`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::payload::de_opt_id;
use crate::models::{
  CheckoutPayload, CommerceOrderResult, InventoryOrderResult, OrderAttempt, PaymentMethod, SessionToken,
};
use crate::remote::{CommerceBackend, InventoryBackend, PaymentGateway};
use crate::store::OrderStore;

/// Collaborators shared by every pipeline run.
#[derive(Clone)]
pub struct Backends {
  pub store: Arc<dyn OrderStore>,
  pub inventory: Arc<dyn InventoryBackend>,
  pub commerce: Arc<dyn CommerceBackend>,
  pub gateway: Arc<dyn PaymentGateway>,
}

/// Outcome of one remote call within a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StepOutcome<T> {
  #[default]
  NotAttempted,
  Succeeded(T),
  /// Failure text as written to the audit log.
  Failed(String),
}

impl<T> StepOutcome<T> {
  pub fn succeeded(&self) -> Option<&T> {
    match self {
      StepOutcome::Succeeded(value) => Some(value),
      _ => None,
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, StepOutcome::Succeeded(_))
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub backends: Backends,
  pub default_currency: String,
  pub payload: CheckoutPayload,
  pub auth_token: Option<SessionToken>,

  // Filled in as the steps run.
  pub payment_method: Option<PaymentMethod>,
  pub attempt: Option<OrderAttempt>,
  pub commerce: StepOutcome<CommerceOrderResult>,
  pub inventory: StepOutcome<InventoryOrderResult>,
}

impl CheckoutCtxData {
  pub fn new(
    backends: Backends,
    default_currency: impl Into<String>,
    payload: CheckoutPayload,
    auth_token: Option<SessionToken>,
  ) -> Self {
    Self {
      backends,
      default_currency: default_currency.into(),
      payload,
      auth_token,
      payment_method: None,
      attempt: None,
      commerce: StepOutcome::NotAttempted,
      inventory: StepOutcome::NotAttempted,
    }
  }

  pub fn on_gateway_path(&self) -> bool {
    self.payment_method.is_some_and(|m| m.uses_gateway())
  }
}

/// Gateway webhook body. Both key spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
  #[serde(default, alias = "transactionId", deserialize_with = "de_opt_id")]
  pub transaction_id: Option<String>,
  #[serde(default, alias = "orderId", deserialize_with = "de_opt_id")]
  pub order_id: Option<String>,
  #[serde(default)]
  pub status: String,
}

impl PaymentNotification {
  /// `success` and `completed` (any case) confirm payment; everything else cancels.
  pub fn is_confirmed(&self) -> bool {
    let status = self.status.trim();
    status.eq_ignore_ascii_case("success") || status.eq_ignore_ascii_case("completed")
  }
}

#[derive(Clone)]
pub struct PaymentCallbackCtxData {
  pub backends: Backends,
  pub notification: PaymentNotification,

  pub attempt: Option<OrderAttempt>,
  /// Set when the attempt was already settled and the notification changed nothing.
  pub replay: bool,
}

impl PaymentCallbackCtxData {
  pub fn new(backends: Backends, notification: PaymentNotification) -> Self {
    Self {
      backends,
      notification,
      attempt: None,
      replay: false,
    }
  }
}
