// fleur-storefront/src/store/memory.rs

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{apply_patch, claim, incoming_transaction, new_attempt, push_log, CreateOptions, OrderStore, StoreError};
use crate::models::{CheckoutPayload, OrderAttempt, OrderPatch};

#[derive(Default)]
struct Inner {
  attempts: HashMap<Uuid, OrderAttempt>,
  /// gateway transaction id -> attempt id
  by_transaction: HashMap<String, Uuid>,
}

/// Process-local store. Attempts and the transaction index sit behind one
/// lock so they can never be observed out of step. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryOrderStore {
  inner: RwLock<Inner>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.inner.read().attempts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Snapshot of every attempt, oldest first.
  pub fn attempts(&self) -> Vec<OrderAttempt> {
    let mut all: Vec<OrderAttempt> = self.inner.read().attempts.values().cloned().collect();
    all.sort_by_key(|a| a.created_at);
    all
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn create(&self, payload: &CheckoutPayload, options: CreateOptions) -> Result<OrderAttempt, StoreError> {
    let attempt = new_attempt(payload, options)?;
    self.inner.write().attempts.insert(attempt.id, attempt.clone());
    Ok(attempt)
  }

  async fn get(&self, id: Uuid) -> Result<Option<OrderAttempt>, StoreError> {
    Ok(self.inner.read().attempts.get(&id).cloned())
  }

  async fn find_by_gateway_transaction(&self, transaction_id: &str) -> Result<Option<OrderAttempt>, StoreError> {
    let guard = self.inner.read();
    Ok(
      guard
        .by_transaction
        .get(transaction_id)
        .and_then(|id| guard.attempts.get(id))
        .cloned(),
    )
  }

  async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Option<OrderAttempt>, StoreError> {
    let mut guard = self.inner.write();
    let Inner {
      attempts,
      by_transaction,
    } = &mut *guard;

    let Some(attempt) = attempts.get_mut(&id) else {
      return Ok(None);
    };
    if let Some(tx_id) = incoming_transaction(&patch) {
      if by_transaction.get(tx_id).is_some_and(|owner| *owner != id) {
        return Err(StoreError::TransactionConflict(tx_id.to_string()));
      }
    }

    let change = apply_patch(attempt, patch)?;
    if let Some(stale) = change.removed {
      by_transaction.remove(&stale);
    }
    if let Some(fresh) = change.added {
      by_transaction.insert(fresh, id);
    }
    Ok(Some(attempt.clone()))
  }

  async fn append_log(&self, id: Uuid, message: String) -> Result<(), StoreError> {
    let mut guard = self.inner.write();
    let attempt = guard.attempts.get_mut(&id).ok_or(StoreError::UnknownOrder(id))?;
    push_log(attempt, message);
    Ok(())
  }

  async fn claim_settlement(&self, id: Uuid) -> Result<bool, StoreError> {
    let mut guard = self.inner.write();
    let attempt = guard.attempts.get_mut(&id).ok_or(StoreError::UnknownOrder(id))?;
    Ok(claim(attempt))
  }
}
