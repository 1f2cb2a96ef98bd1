// tests/order_store_tests.rs

mod common;

use common::{checkout_payload, setup_tracing, token};
use rust_decimal::Decimal;
use serde_json::json;
use serial_test::serial;

use fleur_storefront::models::{GatewayTransaction, InventoryOrderResult, OrderPatch, OrderStatus};
use fleur_storefront::store::{CreateOptions, InMemoryOrderStore, OrderStore, PgOrderStore, StoreError};

fn options() -> CreateOptions {
  CreateOptions {
    auth_token: token(),
    default_currency: "UZS".to_string(),
  }
}

fn transaction(id: &str) -> GatewayTransaction {
  GatewayTransaction {
    transaction_id: id.to_string(),
    checkout_url: format!("https://pay.test/{}", id),
    amount: Decimal::new(200, 0),
    currency: "UZS".to_string(),
    raw_response: json!({"transaction_id": id}),
  }
}

fn inventory() -> InventoryOrderResult {
  InventoryOrderResult {
    order_id: "inv-1".to_string(),
    order_number: None,
    raw_response: json!({}),
  }
}

/// Behavior every store implementation must share.
async fn exercise_store(store: &dyn OrderStore) {
  let payload = checkout_payload("gateway");
  let attempt = store.create(&payload, options()).await.unwrap();
  assert_eq!(attempt.status, OrderStatus::Pending);
  assert_eq!(attempt.raw_payload, payload);

  // Transaction index: set, resolve, move, clear.
  let tx_a = format!("tx-{}", attempt.id);
  let tx_b = format!("tx-{}-b", attempt.id);
  store
    .update(attempt.id, OrderPatch::status(OrderStatus::PendingPayment).with_gateway_transaction(transaction(&tx_a)))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(store.find_by_gateway_transaction(&tx_a).await.unwrap().unwrap().id, attempt.id);

  store
    .update(attempt.id, OrderPatch::default().with_gateway_transaction(transaction(&tx_b)))
    .await
    .unwrap();
  assert!(store.find_by_gateway_transaction(&tx_a).await.unwrap().is_none());
  assert_eq!(store.find_by_gateway_transaction(&tx_b).await.unwrap().unwrap().id, attempt.id);

  // A second attempt may not claim a transaction id that is already owned.
  let other = store.create(&payload, options()).await.unwrap();
  let err = store
    .update(other.id, OrderPatch::default().with_gateway_transaction(transaction(&tx_b)))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::TransactionConflict(ref id) if *id == tx_b));
  assert!(store.get(other.id).await.unwrap().unwrap().gateway_transaction.is_none());

  store
    .update(attempt.id, OrderPatch::default().clear_gateway_transaction())
    .await
    .unwrap();
  assert!(store.find_by_gateway_transaction(&tx_b).await.unwrap().is_none());

  // Settlement can be claimed once, and only while awaiting payment.
  assert!(!store.claim_settlement(other.id).await.unwrap());
  store
    .update(attempt.id, OrderPatch::status(OrderStatus::PendingPayment))
    .await
    .unwrap();
  assert!(store.claim_settlement(attempt.id).await.unwrap());
  assert!(!store.claim_settlement(attempt.id).await.unwrap());
  assert!(store.get(attempt.id).await.unwrap().unwrap().settlement_claimed_at.is_some());

  // Illegal edges are refused and leave the record as it was.
  let err = store
    .update(attempt.id, OrderPatch::status(OrderStatus::Pending))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::IllegalTransition { .. }));

  let paid = store
    .update(attempt.id, OrderPatch::status(OrderStatus::Paid).with_inventory(inventory()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(paid.status, OrderStatus::Paid);
  assert!(paid.updated_at >= attempt.updated_at);

  let err = store
    .update(attempt.id, OrderPatch::status(OrderStatus::Cancelled))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::IllegalTransition { .. }));
  let err = store
    .update(attempt.id, OrderPatch::default().with_inventory(inventory()))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::ResultAlreadyRecorded { .. }));

  // Audit log.
  store.append_log(attempt.id, "first".to_string()).await.unwrap();
  store.append_log(attempt.id, "second".to_string()).await.unwrap();
  let logged = store.get(attempt.id).await.unwrap().unwrap();
  let messages: Vec<&str> = logged.log.iter().map(|e| e.message.as_str()).collect();
  assert_eq!(messages, ["first", "second"]);

  // Unknown ids.
  let unknown = uuid::Uuid::new_v4();
  assert!(store.get(unknown).await.unwrap().is_none());
  assert!(store.update(unknown, OrderPatch::status(OrderStatus::Paid)).await.unwrap().is_none());
  assert!(matches!(
    store.append_log(unknown, "nope".to_string()).await,
    Err(StoreError::UnknownOrder(id)) if id == unknown
  ));
  assert!(matches!(
    store.claim_settlement(unknown).await,
    Err(StoreError::UnknownOrder(id)) if id == unknown
  ));
}

#[tokio::test]
#[serial]
async fn in_memory_store_contract() {
  setup_tracing();
  let store = InMemoryOrderStore::new();
  exercise_store(&store).await;
  assert_eq!(store.len(), 2);
}

#[tokio::test]
#[serial]
async fn in_memory_store_hands_out_copies() {
  setup_tracing();
  let store = InMemoryOrderStore::new();
  let mut attempt = store.create(&checkout_payload("cash"), options()).await.unwrap();

  attempt.raw_payload.items.clear();
  attempt.status = OrderStatus::Paid;

  let stored = store.get(attempt.id).await.unwrap().unwrap();
  assert_eq!(stored.raw_payload.items.len(), 1);
  assert_eq!(stored.status, OrderStatus::Pending);
  assert_eq!(stored.auth_token, token());
}

#[tokio::test]
#[serial]
async fn invalid_payload_is_not_stored() {
  let store = InMemoryOrderStore::new();
  let mut payload = checkout_payload("cash");
  payload.totals = None;

  let err = store.create(&payload, options()).await.unwrap_err();
  assert!(matches!(err, StoreError::InvalidPayload(_)));
  assert!(store.is_empty());
}

/// Runs against a real database when `TEST_DATABASE_URL` is set.
#[tokio::test]
#[serial]
async fn postgres_store_contract() {
  setup_tracing();
  let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
    eprintln!("TEST_DATABASE_URL not set; skipping Postgres store test.");
    return;
  };

  let store = PgOrderStore::connect(&url).await.expect("connect to test database");
  store.migrate().await.expect("migrate");
  exercise_store(&store).await;

  // Session tokens stay in process memory.
  let attempt = store.create(&checkout_payload("cash"), options()).await.unwrap();
  assert!(store.get(attempt.id).await.unwrap().unwrap().auth_token.is_none());
}
