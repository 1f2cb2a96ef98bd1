// fleur-flow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {type_name}")]
  PipelineNotRegistered { type_name: String },

  #[error("Type mismatch during context downcast (expected {expected_type}, step: '{step_name}')")]
  TypeMismatch { step_name: String, expected_type: String },

  #[error("Error in step handler. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a FlowError that was boxed into anyhow on its way out of a handler,
    // otherwise keep the chain as the handler source.
    match err.downcast::<FlowError>() {
      Ok(flow_err) => flow_err,
      Err(other) => FlowError::HandlerError { source: other },
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anyhow_wrapping_a_flow_error_is_unwrapped() {
    let wrapped = anyhow::Error::new(FlowError::StepNotFound {
      step_name: "settle".to_string(),
    });
    match FlowError::from(wrapped) {
      FlowError::StepNotFound { step_name } => assert_eq!(step_name, "settle"),
      other => panic!("expected StepNotFound, got {:?}", other),
    }
  }

  #[test]
  fn foreign_anyhow_errors_become_handler_errors() {
    let err = FlowError::from(anyhow::anyhow!("socket closed"));
    assert!(matches!(err, FlowError::HandlerError { .. }));
    assert!(err.to_string().contains("socket closed"));
  }
}
