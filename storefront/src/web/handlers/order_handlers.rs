// fleur-storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use super::{session_token, success};
use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::list_orders", skip(app_state, req))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  let token = session_token(&req, &app_state.config.auth_cookie_name);
  let orders = app_state.orchestrator.commerce_orders(token).await?;
  Ok(HttpResponse::Ok().json(success(orders)))
}

/// Operator audit view of one attempt.
///
/// Any session credential is accepted, and the record is returned whole:
/// `rawPayload` and `log` included. Log entries name the remote systems and
/// quote their errors, unlike the generic error envelope, so this route must
/// not be exposed to shoppers.
#[instrument(name = "handler::get_order_attempt", skip(app_state, req), fields(attempt_id = %attempt_id))]
pub async fn get_order_attempt_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  attempt_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  if session_token(&req, &app_state.config.auth_cookie_name).is_none() {
    return Err(AppError::AuthRequired);
  }
  let id = Uuid::parse_str(attempt_id.as_str())
    .map_err(|_| AppError::Validation(format!("'{}' is not a valid order attempt id", attempt_id)))?;

  let attempt = app_state.orchestrator.order_attempt(id).await?;
  Ok(HttpResponse::Ok().json(success(attempt)))
}
