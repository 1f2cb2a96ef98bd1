// fleur-storefront/src/state.rs

use crate::config::AppConfig;
use crate::orchestrator::OrderOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orchestrator: Arc<OrderOrchestrator>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(orchestrator: OrderOrchestrator, config: AppConfig) -> Self {
    Self {
      orchestrator: Arc::new(orchestrator),
      config: Arc::new(config),
    }
  }
}
