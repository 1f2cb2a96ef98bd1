// fleur-storefront/src/pipelines/mod.rs

//! Defines and registers the order pipelines.

use fleur_flow::{ContextData, FlowRegistry};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{OrderAttempt, OrderPatch};
use crate::store::{OrderStore, StoreError};

pub mod callback_pipeline;
pub mod checkout_pipeline;
pub mod contexts;

/// Registers every pipeline with `registry`. Called once per orchestrator.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  info!("Registering order pipelines...");

  checkout_pipeline::register_checkout_pipeline(registry);
  callback_pipeline::register_callback_pipeline(registry);

  info!("All order pipelines registered.");
}

/// Applies `patch`, then writes `note` to the attempt's audit log.
pub(crate) async fn record(
  store: &dyn OrderStore,
  id: Uuid,
  patch: OrderPatch,
  note: String,
) -> Result<OrderAttempt, AppError> {
  let attempt = store.update(id, patch).await?.ok_or(StoreError::UnknownOrder(id))?;
  info!(order_id = %id, status = %attempt.status, "{}", note);
  store.append_log(id, note).await?;
  Ok(attempt)
}

/// Audit log entry without a state change.
pub(crate) async fn note(store: &dyn OrderStore, id: Uuid, message: String) -> Result<(), AppError> {
  info!(order_id = %id, "{}", message);
  store.append_log(id, message).await?;
  Ok(())
}

/// The attempt a step operates on. Missing only if the pipeline is wired wrong.
pub(crate) fn current_attempt<T: Send + Sync + 'static>(
  ctx: &ContextData<T>,
  pick: impl FnOnce(&T) -> Option<&OrderAttempt>,
) -> Result<OrderAttempt, AppError> {
  ctx
    .with_read(|data| pick(data).cloned())
    .ok_or_else(|| AppError::Internal("order attempt is not open".to_string()))
}
