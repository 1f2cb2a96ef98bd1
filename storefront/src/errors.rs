// fleur-storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use fleur_flow::FlowError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::remote::{AdapterError, RemoteError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  /// No usable session credential for an operation that needs one.
  #[error("Authentication required")]
  AuthRequired,

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  /// The order attempt ended in `failed`; details are in its audit log.
  #[error("Order {order_id} failed")]
  OrderFailed { order_id: Uuid },

  #[error("Remote call failed: {0}")]
  Upstream(#[from] RemoteError),

  #[error("Order store error: {0}")]
  Store(#[from] StoreError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<AdapterError> for AppError {
  fn from(err: AdapterError) -> Self {
    match err {
      AdapterError::AuthRequired => AppError::AuthRequired,
      AdapterError::Remote(remote) => AppError::Upstream(remote),
    }
  }
}

impl AppError {
  pub fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "VALIDATION_ERROR",
      AppError::AuthRequired => "AUTH_REQUIRED",
      AppError::NotFound(_) => "NOT_FOUND",
      AppError::Conflict(_) => "CONFLICT",
      AppError::OrderFailed { .. } => "ORDER_FAILED",
      AppError::Upstream(_) => "UPSTREAM_FAILURE",
      AppError::Store(_) | AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "INTERNAL_ERROR"
      }
    }
  }

  /// Caller-facing text. Never names a remote system or carries upstream detail.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) => m.clone(),
      AppError::AuthRequired => "Authentication required".to_string(),
      AppError::NotFound(what) => format!("{} not found", what),
      AppError::Conflict(m) => m.clone(),
      AppError::OrderFailed { .. } => "The order could not be completed".to_string(),
      AppError::Upstream(_) => "An upstream service failed to process the request".to_string(),
      _ => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::AuthRequired => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    let mut body = json!({
      "success": false,
      "error": self.public_message(),
      "code": self.code(),
    });
    if let AppError::OrderFailed { order_id } = self {
      body["orderId"] = json!(order_id);
    }
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::remote::RemoteSystem;

  #[test]
  fn upstream_errors_do_not_leak_system_detail() {
    let err = AppError::from(AdapterError::Remote(RemoteError::new(
      RemoteSystem::Inventory,
      "submit_payment",
      Some(502),
      "cashbox 7 closed",
    )));
    assert_eq!(err.code(), "UPSTREAM_FAILURE");
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let msg = err.public_message();
    assert!(!msg.contains("cashbox"));
    assert!(!msg.to_lowercase().contains("inventory"));
  }

  #[test]
  fn codes_map_to_statuses() {
    assert_eq!(AppError::AuthRequired.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::from(AdapterError::AuthRequired).code(), "AUTH_REQUIRED");
    assert_eq!(AppError::NotFound("Order".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("busy".into()).status_code(), StatusCode::CONFLICT);
    assert_eq!(
      AppError::OrderFailed { order_id: Uuid::new_v4() }.code(),
      "ORDER_FAILED"
    );
    assert_eq!(AppError::Validation("bad".into()).status_code(), StatusCode::BAD_REQUEST);
  }
}
