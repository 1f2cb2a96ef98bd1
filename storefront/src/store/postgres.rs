// fleur-storefront/src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{apply_patch, claim, incoming_transaction, new_attempt, push_log, CreateOptions, OrderStore, StoreError};
use crate::models::{CheckoutPayload, OrderAttempt, OrderPatch};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS order_attempts (
  id UUID PRIMARY KEY,
  status TEXT NOT NULL,
  gateway_transaction_id TEXT UNIQUE,
  record JSONB NOT NULL,
  created_at TIMESTAMPTZ NOT NULL,
  updated_at TIMESTAMPTZ NOT NULL
)
"#;

/// Durable store. The whole attempt lives in `record`; `status` and
/// `gateway_transaction_id` are lifted into columns for lookup and uniqueness.
///
/// Session tokens are not persisted: attempts read back from here carry no `auth_token`.
#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
    let pool = PgPool::connect(database_url).await?;
    Ok(Self::new(pool))
  }

  /// Creates the table when missing.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::query(SCHEMA).execute(&self.pool).await?;
    Ok(())
  }

  async fn lock_record(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Option<OrderAttempt>, StoreError> {
    let row: Option<(serde_json::Value,)> = sqlx::query_as("SELECT record FROM order_attempts WHERE id = $1 FOR UPDATE")
      .bind(id)
      .fetch_optional(&mut **tx)
      .await?;
    decode(row)
  }

  async fn write_record(tx: &mut Transaction<'_, Postgres>, attempt: &OrderAttempt) -> Result<(), StoreError> {
    sqlx::query(
      "UPDATE order_attempts SET status = $2, gateway_transaction_id = $3, record = $4, updated_at = $5 WHERE id = $1",
    )
    .bind(attempt.id)
    .bind(attempt.status.as_str())
    .bind(attempt.transaction_id())
    .bind(serde_json::to_value(attempt)?)
    .bind(attempt.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| unique_violation(e, attempt))?;
    Ok(())
  }
}

fn unique_violation(err: sqlx::Error, attempt: &OrderAttempt) -> StoreError {
  let is_unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
  match (is_unique, attempt.transaction_id()) {
    (true, Some(tx_id)) => StoreError::TransactionConflict(tx_id.to_string()),
    _ => StoreError::Database(err),
  }
}

fn decode(record: Option<(serde_json::Value,)>) -> Result<Option<OrderAttempt>, StoreError> {
  record
    .map(|(value,)| serde_json::from_value(value))
    .transpose()
    .map_err(StoreError::from)
}

#[async_trait]
impl OrderStore for PgOrderStore {
  async fn create(&self, payload: &CheckoutPayload, options: CreateOptions) -> Result<OrderAttempt, StoreError> {
    let attempt = new_attempt(payload, options)?;
    sqlx::query(
      "INSERT INTO order_attempts (id, status, gateway_transaction_id, record, created_at, updated_at) \
       VALUES ($1, $2, NULL, $3, $4, $5)",
    )
    .bind(attempt.id)
    .bind(attempt.status.as_str())
    .bind(serde_json::to_value(&attempt)?)
    .bind(attempt.created_at)
    .bind(attempt.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(attempt)
  }

  async fn get(&self, id: Uuid) -> Result<Option<OrderAttempt>, StoreError> {
    let row = sqlx::query_as("SELECT record FROM order_attempts WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    decode(row)
  }

  async fn find_by_gateway_transaction(&self, transaction_id: &str) -> Result<Option<OrderAttempt>, StoreError> {
    let row = sqlx::query_as("SELECT record FROM order_attempts WHERE gateway_transaction_id = $1")
      .bind(transaction_id)
      .fetch_optional(&self.pool)
      .await?;
    decode(row)
  }

  async fn update(&self, id: Uuid, patch: OrderPatch) -> Result<Option<OrderAttempt>, StoreError> {
    let mut tx = self.pool.begin().await?;
    let Some(mut attempt) = Self::lock_record(&mut tx, id).await? else {
      return Ok(None);
    };

    if let Some(tx_id) = incoming_transaction(&patch) {
      let owner: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM order_attempts WHERE gateway_transaction_id = $1")
        .bind(tx_id)
        .fetch_optional(&mut *tx)
        .await?;
      if owner.is_some_and(|(owner,)| owner != id) {
        return Err(StoreError::TransactionConflict(tx_id.to_string()));
      }
    }

    apply_patch(&mut attempt, patch)?;
    Self::write_record(&mut tx, &attempt).await?;
    tx.commit().await?;
    Ok(Some(attempt))
  }

  async fn append_log(&self, id: Uuid, message: String) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await?;
    let mut attempt = Self::lock_record(&mut tx, id).await?.ok_or(StoreError::UnknownOrder(id))?;
    push_log(&mut attempt, message);
    Self::write_record(&mut tx, &attempt).await?;
    tx.commit().await?;
    Ok(())
  }

  async fn claim_settlement(&self, id: Uuid) -> Result<bool, StoreError> {
    let mut tx = self.pool.begin().await?;
    let mut attempt = Self::lock_record(&mut tx, id).await?.ok_or(StoreError::UnknownOrder(id))?;
    if !claim(&mut attempt) {
      return Ok(false);
    }
    Self::write_record(&mut tx, &attempt).await?;
    tx.commit().await?;
    Ok(true)
  }
}
