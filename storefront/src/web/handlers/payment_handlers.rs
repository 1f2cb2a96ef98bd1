// fleur-storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{error, info, instrument};

use super::success;
use crate::errors::AppError;
use crate::pipelines::contexts::PaymentNotification;
use crate::state::AppState;

/// Gateway webhook. The gateway retries on non-2xx, so replays answer 200.
#[instrument(
  name = "handler::payment_callback",
  skip(app_state, notification),
  fields(transaction_id = ?notification.transaction_id, order_id = ?notification.order_id)
)]
pub async fn payment_callback_handler(
  app_state: web::Data<AppState>,
  notification: web::Json<PaymentNotification>,
) -> Result<HttpResponse, AppError> {
  match app_state.orchestrator.handle_payment_callback(notification.into_inner()).await {
    Ok(outcome) => {
      info!(
        order_id = %outcome.order_id,
        status = %outcome.status,
        replay = outcome.replay,
        "Payment callback processed."
      );
      Ok(HttpResponse::Ok().json(success(outcome)))
    }
    Err(app_err) => {
      error!(error = %app_err, "Payment callback failed.");
      Err(app_err)
    }
  }
}
