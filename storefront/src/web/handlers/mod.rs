// fleur-storefront/src/web/handlers/mod.rs

pub mod checkout_handlers;
pub mod order_handlers;
pub mod payment_handlers;

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use serde::Serialize;
use serde_json::json;

use crate::models::SessionToken;

/// Session credential: the auth cookie first, then `Authorization: Bearer`.
pub(crate) fn session_token(req: &HttpRequest, cookie_name: &str) -> Option<SessionToken> {
  if let Some(token) = req.cookie(cookie_name).and_then(|c| SessionToken::new(c.value())) {
    return Some(token);
  }
  req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.strip_prefix("Bearer "))
    .and_then(SessionToken::new)
}

pub(crate) fn success<T: Serialize>(data: T) -> serde_json::Value {
  json!({ "success": true, "data": data })
}
