// fleur-storefront/src/remote/mod.rs

//! Adapters for the three remote systems an order touches.
//!
//! Each adapter maps every known response variant into one canonical record
//! (see `crate::models::results`) before anything else sees it.

pub mod commerce;
pub mod gateway;
pub mod http;
pub mod inventory;
pub mod normalize;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::models::{
  CheckoutPayload, CommerceOrder, CommerceOrderResult, GatewayCheckoutRequest, GatewayCheckoutResult,
  InventoryOrderResult, PaymentMethod,
};

pub use commerce::HttpCommerceBackend;
pub use gateway::HttpPaymentGateway;
pub use inventory::HttpInventoryBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSystem {
  Inventory,
  Commerce,
  Gateway,
}

impl fmt::Display for RemoteSystem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      RemoteSystem::Inventory => "inventory",
      RemoteSystem::Commerce => "commerce",
      RemoteSystem::Gateway => "gateway",
    })
  }
}

/// Transport failure, non-2xx status, or an unusable response body.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{system} {step} failed{}: {message}", fmt_status(.status))]
pub struct RemoteError {
  pub system: RemoteSystem,
  /// Sub-step that failed, e.g. `open_draft` or `create_order`.
  pub step: &'static str,
  pub status: Option<u16>,
  pub message: String,
}

impl RemoteError {
  pub fn new(system: RemoteSystem, step: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
    Self {
      system,
      step,
      status,
      message: message.into(),
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    self.status == Some(401)
  }
}

fn fmt_status(status: &Option<u16>) -> String {
  status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
  /// Missing or rejected end-user credential.
  #[error("authentication required")]
  AuthRequired,

  #[error(transparent)]
  Remote(#[from] RemoteError),
}

#[async_trait]
pub trait InventoryBackend: Send + Sync {
  /// Opens a draft, adds every line, attaches the buyer (when known) and
  /// submits payment. A failing sub-step aborts the sequence; the draft is
  /// left open.
  async fn create_order(
    &self,
    payload: &CheckoutPayload,
    method: PaymentMethod,
  ) -> Result<InventoryOrderResult, RemoteError>;
}

#[async_trait]
pub trait CommerceBackend: Send + Sync {
  async fn create_order(
    &self,
    payload: &CheckoutPayload,
    token: Option<&str>,
  ) -> Result<CommerceOrderResult, AdapterError>;

  async fn list_orders(&self, token: Option<&str>) -> Result<Vec<CommerceOrder>, AdapterError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout(&self, request: GatewayCheckoutRequest) -> Result<GatewayCheckoutResult, RemoteError>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_includes_step_and_status() {
    let err = RemoteError::new(RemoteSystem::Inventory, "add_product", Some(422), "unknown product");
    assert_eq!(err.to_string(), "inventory add_product failed (HTTP 422): unknown product");

    let err = RemoteError::new(RemoteSystem::Gateway, "create_checkout", None, "connection refused");
    assert_eq!(err.to_string(), "gateway create_checkout failed: connection refused");
  }
}
