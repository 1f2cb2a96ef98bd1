// fleur-storefront/src/pipelines/callback_pipeline.rs

//! Gateway payment notifications: settle a `pending_payment` attempt exactly once.

use fleur_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::contexts::PaymentCallbackCtxData;
use super::{current_attempt, note, record};
use crate::errors::AppError;
use crate::models::{OrderAttempt, OrderPatch, OrderStatus};
use crate::store::StoreError;

pub fn register_callback_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Pipeline::<PaymentCallbackCtxData, AppError>::new(&[
    ("resolve_order_attempt", false, None),
    ("skip_settled_attempt", false, None),
    ("apply_payment_verdict", false, None),
  ]);

  p.on_root("resolve_order_attempt", resolve_order_attempt);
  p.on_root("skip_settled_attempt", skip_settled_attempt);
  p.on_root("apply_payment_verdict", apply_payment_verdict);

  registry.register_pipeline(p);
  info!("Payment callback pipeline registered.");
}

async fn resolve_order_attempt(ctx: ContextData<PaymentCallbackCtxData>) -> Result<PipelineControl, AppError> {
  let (store, notification) = ctx.with_read(|data| (data.backends.store.clone(), data.notification.clone()));

  // TODO: verify the gateway's signature once the provider documents its webhook signing scheme.
  warn!(
    transaction_id = ?notification.transaction_id,
    order_id = ?notification.order_id,
    status = %notification.status,
    "Accepting unauthenticated payment callback."
  );

  let transaction_id = notification.transaction_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
  let order_id = notification.order_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
  if transaction_id.is_none() && order_id.is_none() {
    return Err(AppError::Validation(
      "Payment notification must reference a transaction or an order".to_string(),
    ));
  }

  let mut attempt = None;
  if let Some(tx_id) = transaction_id {
    attempt = store.find_by_gateway_transaction(tx_id).await?;
  }
  if attempt.is_none() {
    if let Some(id) = order_id.and_then(|raw| Uuid::parse_str(raw).ok()) {
      attempt = store.get(id).await?;
    }
  }

  match attempt {
    Some(found) => {
      ctx.write().attempt = Some(found);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(?transaction_id, ?order_id, "Payment callback references no known order attempt.");
      Err(AppError::NotFound("Order".to_string()))
    }
  }
}

/// Redelivered notifications land here once the attempt has settled.
async fn skip_settled_attempt(ctx: ContextData<PaymentCallbackCtxData>) -> Result<PipelineControl, AppError> {
  let attempt = current_attempt(&ctx, |data| data.attempt.as_ref())?;

  if attempt.inventory_result.is_some() || attempt.status.is_terminal() {
    info!(order_id = %attempt.id, status = %attempt.status, "Payment callback replayed; attempt already settled.");
    ctx.write().replay = true;
    return Ok(PipelineControl::Stop);
  }
  if attempt.settlement_claimed_at.is_some() {
    return ignore_duplicate(&ctx, &attempt).await;
  }
  if attempt.status == OrderStatus::Pending {
    warn!(order_id = %attempt.id, "Payment callback arrived before a gateway session was opened.");
    return Err(AppError::Conflict("Order is not awaiting payment".to_string()));
  }
  Ok(PipelineControl::Continue)
}

/// Another delivery holds the settlement claim: record the duplicate and stop.
async fn ignore_duplicate(
  ctx: &ContextData<PaymentCallbackCtxData>,
  attempt: &OrderAttempt,
) -> Result<PipelineControl, AppError> {
  let (store, status) = ctx.with_read(|data| (data.backends.store.clone(), data.notification.status.clone()));
  warn!(order_id = %attempt.id, "Duplicate payment callback; another delivery is settling the attempt.");
  note(
    &*store,
    attempt.id,
    format!("duplicate payment callback ignored (gateway status '{}')", status),
  )
  .await?;
  ctx.write().replay = true;
  Ok(PipelineControl::Stop)
}

async fn apply_payment_verdict(ctx: ContextData<PaymentCallbackCtxData>) -> Result<PipelineControl, AppError> {
  let attempt = current_attempt(&ctx, |data| data.attempt.as_ref())?;
  let (backends, notification) = ctx.with_read(|data| (data.backends.clone(), data.notification.clone()));
  let store = &*backends.store;

  // Only one delivery of a notification may act on the attempt.
  if !store.claim_settlement(attempt.id).await? {
    return ignore_duplicate(&ctx, &attempt).await;
  }

  if !notification.is_confirmed() {
    let updated = record(
      store,
      attempt.id,
      OrderPatch::status(OrderStatus::Cancelled),
      format!("payment not completed (gateway status '{}'); attempt cancelled", notification.status),
    )
    .await?;
    ctx.write().attempt = Some(updated);
    return Ok(PipelineControl::Continue);
  }

  note(
    store,
    attempt.id,
    format!("payment confirmed (gateway status '{}'); creating inventory order", notification.status),
  )
  .await?;

  let created = backends
    .inventory
    .create_order(&attempt.raw_payload, attempt.payment_method)
    .await;

  let result = match created {
    Ok(result) => result,
    Err(e) => {
      error!(order_id = %attempt.id, step = e.step, error = %e, "Inventory order creation failed after payment.");
      let updated = record(
        store,
        attempt.id,
        OrderPatch::status(OrderStatus::Failed),
        format!("inventory order failed at {} after payment: {}; attempt failed", e.step, e),
      )
      .await?;
      ctx.write().attempt = Some(updated);
      return Ok(PipelineControl::Continue);
    }
  };

  let message = format!("inventory order created: id={}; attempt paid", result.order_id);
  let patch = OrderPatch::status(OrderStatus::Paid).with_inventory(result);
  match record(store, attempt.id, patch, message).await {
    Ok(updated) => {
      ctx.write().attempt = Some(updated);
    }
    // A concurrent delivery of the same notification settled the attempt first.
    Err(AppError::Store(StoreError::ResultAlreadyRecorded { .. }))
    | Err(AppError::Store(StoreError::IllegalTransition { .. })) => {
      warn!(order_id = %attempt.id, "Concurrent payment callback already settled the attempt.");
      ctx.write().replay = true;
    }
    Err(e) => return Err(e),
  }
  Ok(PipelineControl::Continue)
}
