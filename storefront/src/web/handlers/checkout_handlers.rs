// fleur-storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, instrument, warn};

use super::{session_token, success};
use crate::errors::AppError;
use crate::models::CheckoutPayload;
use crate::state::AppState;

#[instrument(
  name = "handler::submit_checkout",
  skip(app_state, req, payload),
  fields(payment_method = ?payload.checkout.payment_method, items = payload.items.len())
)]
pub async fn submit_checkout_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let token = session_token(&req, &app_state.config.auth_cookie_name);

  match app_state.orchestrator.submit_checkout(payload.into_inner(), token).await {
    Ok(outcome) => {
      info!(order_id = %outcome.order_id(), "Checkout accepted.");
      Ok(HttpResponse::Ok().json(success(outcome)))
    }
    Err(app_err) => {
      warn!(error = %app_err, "Checkout failed.");
      Err(app_err)
    }
  }
}
