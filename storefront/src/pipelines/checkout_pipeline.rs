// fleur-storefront/src/pipelines/checkout_pipeline.rs

//! Checkout: validate, open the attempt, then call the remote systems one at a time.
//!
//! Direct payments (cash, card) create the commerce and inventory orders
//! independently and settle as `paid` if either succeeds. Gateway payments
//! need the commerce order first, since its amount is the one charged, and
//! end in `pending_payment` with a hosted checkout session.

use fleur_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::contexts::{CheckoutCtxData, StepOutcome};
use super::{current_attempt, note, record};
use crate::errors::AppError;
use crate::models::{GatewayCheckoutRequest, GatewayTransaction, OrderPatch, OrderStatus, SessionToken};
use crate::remote::AdapterError;
use crate::store::{CreateOptions, StoreError};

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) {
  let gateway_path: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx: ContextData<CheckoutCtxData>| ctx.read().on_gateway_path());
  let direct_path: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx: ContextData<CheckoutCtxData>| !ctx.read().on_gateway_path());

  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_checkout", false, None),
    ("require_session", false, None),
    ("open_order_attempt", false, None),
    ("create_commerce_order", false, None),
    ("create_inventory_order", false, Some(gateway_path.clone())),
    ("settle_direct_payment", false, Some(gateway_path)),
    ("open_gateway_checkout", false, Some(direct_path)),
  ]);

  p.on_root("validate_checkout", validate_checkout);
  p.on_root("require_session", require_session);
  p.on_root("open_order_attempt", open_order_attempt);
  p.on_root("create_commerce_order", create_commerce_order);
  p.on_root("create_inventory_order", create_inventory_order);
  p.on_root("settle_direct_payment", settle_direct_payment);
  p.on_root("open_gateway_checkout", open_gateway_checkout);

  registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}

async fn validate_checkout(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let verdict = ctx.read().payload.validate();
  match verdict {
    Ok(method) => {
      ctx.write().payment_method = Some(method);
      Ok(PipelineControl::Continue)
    }
    Err(reason) => {
      warn!(%reason, "Checkout payload rejected.");
      Err(AppError::Validation(reason))
    }
  }
}

// Runs before the attempt exists, so a missing session leaves no record and makes no remote call.
async fn require_session(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  if ctx.read().auth_token.is_none() {
    warn!("Checkout rejected: no session credential.");
    return Err(AppError::AuthRequired);
  }
  Ok(PipelineControl::Continue)
}

async fn open_order_attempt(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (store, payload, options) = ctx.with_read(|data| {
    (
      data.backends.store.clone(),
      data.payload.clone(),
      CreateOptions {
        auth_token: data.auth_token.clone(),
        default_currency: data.default_currency.clone(),
      },
    )
  });

  let attempt = store.create(&payload, options).await?;
  note(
    &*store,
    attempt.id,
    format!(
      "order attempt opened: method={}, amount={} {}, items={}",
      attempt.payment_method,
      attempt.amount,
      attempt.currency,
      payload.items.len()
    ),
  )
  .await?;

  ctx.write().attempt = Some(attempt);
  Ok(PipelineControl::Continue)
}

async fn create_commerce_order(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let attempt = current_attempt(&ctx, |data| data.attempt.as_ref())?;
  let (backends, payload, token, gateway) = ctx.with_read(|data| {
    (
      data.backends.clone(),
      data.payload.clone(),
      data.auth_token.clone(),
      data.on_gateway_path(),
    )
  });
  let store = &*backends.store;

  let created = backends
    .commerce
    .create_order(&payload, token.as_ref().map(SessionToken::expose))
    .await;

  match created {
    Ok(result) => {
      let message = format!(
        "commerce order created: id={}, number={}",
        result.order_id,
        result.order_number.as_deref().unwrap_or("-")
      );
      let updated = record(store, attempt.id, OrderPatch::default().with_commerce(result.clone()), message).await?;
      let mut data = ctx.write();
      data.attempt = Some(updated);
      data.commerce = StepOutcome::Succeeded(result);
      Ok(PipelineControl::Continue)
    }
    Err(AdapterError::AuthRequired) => {
      warn!(order_id = %attempt.id, "Commerce backend rejected the session credential.");
      let updated = record(
        store,
        attempt.id,
        OrderPatch::status(OrderStatus::Failed),
        "commerce order rejected: session credential not accepted; attempt failed".to_string(),
      )
      .await?;
      ctx.write().attempt = Some(updated);
      Err(AppError::AuthRequired)
    }
    Err(AdapterError::Remote(e)) => {
      error!(order_id = %attempt.id, error = %e, "Commerce order creation failed.");
      if gateway {
        let updated = record(
          store,
          attempt.id,
          OrderPatch::status(OrderStatus::Failed),
          format!("commerce order failed: {}; attempt failed, no gateway session opened", e),
        )
        .await?;
        let mut data = ctx.write();
        data.attempt = Some(updated);
        data.commerce = StepOutcome::Failed(e.to_string());
        return Ok(PipelineControl::Stop);
      }

      note(store, attempt.id, format!("commerce order failed: {}", e)).await?;
      ctx.write().commerce = StepOutcome::Failed(e.to_string());
      Ok(PipelineControl::Continue)
    }
  }
}

async fn create_inventory_order(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let attempt = current_attempt(&ctx, |data| data.attempt.as_ref())?;
  let backends = ctx.with_read(|data| data.backends.clone());
  let store = &*backends.store;

  if let Some(existing) = attempt.inventory_result.clone() {
    note(
      store,
      attempt.id,
      format!("inventory order {} already recorded; not creating another", existing.order_id),
    )
    .await?;
    ctx.write().inventory = StepOutcome::Succeeded(existing);
    return Ok(PipelineControl::Continue);
  }

  let created = backends
    .inventory
    .create_order(&attempt.raw_payload, attempt.payment_method)
    .await;

  match created {
    Ok(result) => {
      let message = format!("inventory order created: id={}", result.order_id);
      let updated = record(store, attempt.id, OrderPatch::default().with_inventory(result.clone()), message).await?;
      let mut data = ctx.write();
      data.attempt = Some(updated);
      data.inventory = StepOutcome::Succeeded(result);
    }
    Err(e) => {
      error!(order_id = %attempt.id, step = e.step, error = %e, "Inventory order creation failed.");
      note(store, attempt.id, format!("inventory order failed at {}: {}", e.step, e)).await?;
      ctx.write().inventory = StepOutcome::Failed(e.to_string());
    }
  }
  Ok(PipelineControl::Continue)
}

/// Either order succeeding is enough; the two backends may drift until reconciled by hand.
async fn settle_direct_payment(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let attempt = current_attempt(&ctx, |data| data.attempt.as_ref())?;
  let (store, commerce_ok, inventory_ok) = ctx.with_read(|data| {
    (
      data.backends.store.clone(),
      data.commerce.is_success(),
      data.inventory.is_success(),
    )
  });

  let (status, message) = match (commerce_ok, inventory_ok) {
    (true, true) => (OrderStatus::Paid, "commerce and inventory orders created; attempt paid"),
    (true, false) => (
      OrderStatus::Paid,
      "partial success: commerce order created, inventory order failed; attempt paid",
    ),
    (false, true) => (
      OrderStatus::Paid,
      "partial success: inventory order created, commerce order failed; attempt paid",
    ),
    (false, false) => (OrderStatus::Failed, "commerce and inventory orders both failed; attempt failed"),
  };

  let updated = record(&*store, attempt.id, OrderPatch::status(status), message.to_string()).await?;
  ctx.write().attempt = Some(updated);
  Ok(PipelineControl::Continue)
}

async fn open_gateway_checkout(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let attempt = current_attempt(&ctx, |data| data.attempt.as_ref())?;
  let (backends, commerce) = ctx.with_read(|data| (data.backends.clone(), data.commerce.succeeded().cloned()));
  let store = &*backends.store;

  // The commerce backend's own figures are authoritative; payload totals are the fallback.
  let amount = commerce
    .as_ref()
    .and_then(|c| c.amount)
    .filter(|a| *a > Decimal::ZERO)
    .unwrap_or(attempt.amount);
  let currency = commerce
    .as_ref()
    .and_then(|c| c.currency.clone())
    .unwrap_or_else(|| attempt.currency.clone());

  let request = GatewayCheckoutRequest {
    order_id: attempt.id.to_string(),
    amount,
    currency: currency.clone(),
    user_id: attempt.raw_payload.buyer_id().map(str::to_string),
    metadata: json!({
      "commerceOrderId": commerce.as_ref().map(|c| c.order_id.clone()),
      "commerceOrderNumber": commerce.as_ref().and_then(|c| c.order_number.clone()),
    }),
  };

  let opened = backends.gateway.create_checkout(request).await;
  let result = match opened {
    Ok(result) => result,
    Err(e) => {
      error!(order_id = %attempt.id, error = %e, "Gateway checkout creation failed.");
      let updated = record(
        store,
        attempt.id,
        OrderPatch::status(OrderStatus::Failed),
        format!("gateway checkout failed: {}; attempt failed", e),
      )
      .await?;
      ctx.write().attempt = Some(updated);
      return Ok(PipelineControl::Continue);
    }
  };

  let message = format!(
    "gateway checkout opened: transaction={}, amount={} {}; awaiting payment",
    result.transaction_id, amount, currency
  );
  let transaction = GatewayTransaction {
    transaction_id: result.transaction_id,
    checkout_url: result.checkout_url,
    amount,
    currency,
    raw_response: result.raw_response,
  };
  let patch = OrderPatch::status(OrderStatus::PendingPayment).with_gateway_transaction(transaction);

  let updated = match record(store, attempt.id, patch, message).await {
    Ok(updated) => updated,
    Err(AppError::Store(StoreError::TransactionConflict(tx_id))) => {
      error!(order_id = %attempt.id, transaction_id = %tx_id, "Gateway reused a transaction id.");
      record(
        store,
        attempt.id,
        OrderPatch::status(OrderStatus::Failed),
        format!("gateway transaction {} already belongs to another order; attempt failed", tx_id),
      )
      .await?
    }
    Err(e) => return Err(e),
  };
  ctx.write().attempt = Some(updated);
  Ok(PipelineControl::Continue)
}
