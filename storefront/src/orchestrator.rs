// fleur-storefront/src/orchestrator.rs

//! Entry point for checkout submissions and payment notifications.
//!
//! Owns the pipeline registry and the collaborators every run needs, turns
//! the settled order attempt into the outcome the HTTP layer renders, and
//! maps a `failed` attempt onto `AppError::OrderFailed`.

use fleur_flow::{ContextData, FlowRegistry, PipelineResult};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{
  CheckoutPayload, CommerceOrder, CommerceOrderResult, InventoryOrderResult, OrderAttempt, OrderStatus, PaymentMethod,
  SessionToken,
};
use crate::pipelines::contexts::{Backends, CheckoutCtxData, PaymentCallbackCtxData, PaymentNotification};
use crate::pipelines::register_all_pipelines;

/// Commerce order reference returned to the storefront after a gateway checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceRef {
  pub order_id: String,
  pub order_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRef {
  pub checkout_url: String,
  pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckoutOutcome {
  /// Cash or card: settled synchronously. At most one of the two results is missing.
  #[serde(rename_all = "camelCase")]
  Direct {
    internal_order_id: Uuid,
    payment_method: PaymentMethod,
    status: OrderStatus,
    inventory: Option<InventoryOrderResult>,
    commerce: Option<CommerceOrderResult>,
  },
  /// Awaiting the buyer on the gateway's hosted checkout page.
  #[serde(rename_all = "camelCase")]
  Gateway {
    order_id: Uuid,
    payment_method: PaymentMethod,
    gateway: GatewayRef,
    commerce: Option<CommerceRef>,
  },
}

impl CheckoutOutcome {
  pub fn order_id(&self) -> Uuid {
    match self {
      CheckoutOutcome::Direct { internal_order_id, .. } => *internal_order_id,
      CheckoutOutcome::Gateway { order_id, .. } => *order_id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
  pub order_id: Uuid,
  pub status: OrderStatus,
  /// The attempt was already settled; nothing changed.
  pub replay: bool,
}

pub struct OrderOrchestrator {
  registry: FlowRegistry<AppError>,
  backends: Backends,
  default_currency: String,
}

impl OrderOrchestrator {
  pub fn new(backends: Backends, default_currency: impl Into<String>) -> Self {
    let registry = FlowRegistry::new();
    register_all_pipelines(&registry);
    Self {
      registry,
      backends,
      default_currency: default_currency.into(),
    }
  }

  #[instrument(name = "OrderOrchestrator::submit_checkout", skip_all, fields(items = payload.items.len()))]
  pub async fn submit_checkout(&self, payload: CheckoutPayload, auth_token: Option<SessionToken>) -> Result<CheckoutOutcome> {
    let ctx = ContextData::new(CheckoutCtxData::new(
      self.backends.clone(),
      self.default_currency.clone(),
      payload,
      auth_token,
    ));

    let result = self.registry.run(ctx.clone()).await?;
    if let PipelineResult::Stopped { step } = &result {
      info!(%step, "Checkout pipeline stopped early.");
    }

    let opened = ctx.with_read(|data| data.attempt.as_ref().map(|a| a.id));
    let id = opened.ok_or_else(|| AppError::Internal("checkout finished without an order attempt".to_string()))?;
    let attempt = self.reload(id).await?;

    match (attempt.status, attempt.payment_method.uses_gateway()) {
      (OrderStatus::Failed, _) => {
        warn!(order_id = %attempt.id, "Checkout ended with a failed order attempt.");
        Err(AppError::OrderFailed { order_id: attempt.id })
      }
      (OrderStatus::Paid, false) => Ok(CheckoutOutcome::Direct {
        internal_order_id: attempt.id,
        payment_method: attempt.payment_method,
        status: attempt.status,
        inventory: attempt.inventory_result,
        commerce: attempt.commerce_result,
      }),
      (OrderStatus::PendingPayment, true) => {
        let transaction = attempt.gateway_transaction.ok_or_else(|| {
          AppError::Internal(format!("order attempt {} awaits payment without a transaction", attempt.id))
        })?;
        Ok(CheckoutOutcome::Gateway {
          order_id: attempt.id,
          payment_method: attempt.payment_method,
          gateway: GatewayRef {
            checkout_url: transaction.checkout_url,
            transaction_id: transaction.transaction_id,
          },
          commerce: attempt.commerce_result.map(|c| CommerceRef {
            order_id: c.order_id,
            order_number: c.order_number,
          }),
        })
      }
      (status, _) => Err(AppError::Internal(format!(
        "checkout left order attempt {} in unexpected status {}",
        attempt.id, status
      ))),
    }
  }

  #[instrument(
    name = "OrderOrchestrator::handle_payment_callback",
    skip_all,
    fields(transaction_id = ?notification.transaction_id, status = %notification.status)
  )]
  pub async fn handle_payment_callback(&self, notification: PaymentNotification) -> Result<CallbackOutcome> {
    let ctx = ContextData::new(PaymentCallbackCtxData::new(self.backends.clone(), notification));
    self.registry.run(ctx.clone()).await?;

    let (resolved, replay) = ctx.with_read(|data| (data.attempt.as_ref().map(|a| a.id), data.replay));
    let id = resolved.ok_or_else(|| AppError::Internal("callback finished without an order attempt".to_string()))?;
    let attempt = self.reload(id).await?;

    if !replay && attempt.status == OrderStatus::Failed {
      return Err(AppError::OrderFailed { order_id: attempt.id });
    }
    Ok(CallbackOutcome {
      order_id: attempt.id,
      status: attempt.status,
      replay,
    })
  }

  /// Audit view of one attempt.
  pub async fn order_attempt(&self, id: Uuid) -> Result<OrderAttempt> {
    self
      .backends
      .store
      .get(id)
      .await?
      .ok_or_else(|| AppError::NotFound("Order attempt".to_string()))
  }

  /// The caller's order history as recorded by the commerce backend.
  #[instrument(name = "OrderOrchestrator::commerce_orders", skip_all)]
  pub async fn commerce_orders(&self, auth_token: Option<SessionToken>) -> Result<Vec<CommerceOrder>> {
    let token = auth_token.ok_or(AppError::AuthRequired)?;
    let orders = self.backends.commerce.list_orders(Some(token.expose())).await?;
    Ok(orders)
  }

  async fn reload(&self, id: Uuid) -> Result<OrderAttempt> {
    self
      .backends
      .store
      .get(id)
      .await?
      .ok_or_else(|| AppError::Internal(format!("order attempt {} vanished from the store", id)))
  }
}
