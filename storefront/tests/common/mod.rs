// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use fleur_storefront::config::AppConfig;
use fleur_storefront::models::{
  CheckoutPayload, CommerceOrder, CommerceOrderResult, GatewayCheckoutRequest, GatewayCheckoutResult,
  InventoryOrderResult, PaymentMethod, SessionToken,
};
use fleur_storefront::pipelines::contexts::Backends;
use fleur_storefront::remote::{
  AdapterError, CommerceBackend, InventoryBackend, PaymentGateway, RemoteError, RemoteSystem,
};
use fleur_storefront::state::AppState;
use fleur_storefront::store::InMemoryOrderStore;
use fleur_storefront::OrderOrchestrator;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn checkout_payload(method: &str) -> CheckoutPayload {
  serde_json::from_value(json!({
    "items": [{"productId": "p1", "quantity": 2, "price": 100}],
    "checkout": {"paymentMethod": method},
    "totals": {"amount": 200, "currency": "UZS"}
  }))
  .unwrap()
}

pub fn token() -> Option<SessionToken> {
  SessionToken::new("session-abc")
}

/// Inventory backend double. Counts every `create_order` call.
#[derive(Default)]
pub struct FakeInventory {
  pub calls: AtomicUsize,
  pub failing: Mutex<bool>,
  /// Simulated POS latency per order.
  pub delay: Mutex<Option<Duration>>,
}

impl FakeInventory {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn fail(&self, failing: bool) {
    *self.failing.lock() = failing;
  }

  pub fn slow_down(&self, delay: Duration) {
    *self.delay.lock() = Some(delay);
  }
}

#[async_trait]
impl InventoryBackend for FakeInventory {
  async fn create_order(
    &self,
    _payload: &CheckoutPayload,
    _method: PaymentMethod,
  ) -> Result<InventoryOrderResult, RemoteError> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    let delay = *self.delay.lock();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    if *self.failing.lock() {
      return Err(RemoteError::new(
        RemoteSystem::Inventory,
        "add_product",
        Some(500),
        "product not in stock",
      ));
    }
    Ok(InventoryOrderResult {
      order_id: format!("inv-{}", n),
      order_number: Some(format!("POS-{}", n)),
      raw_response: json!({"id": format!("inv-{}", n)}),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommerceMode {
  Succeed,
  Fail,
  RejectToken,
}

pub struct FakeCommerce {
  pub create_calls: AtomicUsize,
  pub list_calls: AtomicUsize,
  pub mode: Mutex<CommerceMode>,
  /// Amount reported back on created orders.
  pub amount: Mutex<Option<Decimal>>,
  pub seen_tokens: Mutex<Vec<String>>,
}

impl Default for FakeCommerce {
  fn default() -> Self {
    Self {
      create_calls: AtomicUsize::new(0),
      list_calls: AtomicUsize::new(0),
      mode: Mutex::new(CommerceMode::Succeed),
      amount: Mutex::new(None),
      seen_tokens: Mutex::new(Vec::new()),
    }
  }
}

impl FakeCommerce {
  pub fn calls(&self) -> usize {
    self.create_calls.load(Ordering::SeqCst) + self.list_calls.load(Ordering::SeqCst)
  }

  pub fn set_mode(&self, mode: CommerceMode) {
    *self.mode.lock() = mode;
  }

  fn outcome(&self, token: Option<&str>) -> Result<(), AdapterError> {
    if let Some(token) = token {
      self.seen_tokens.lock().push(token.to_string());
    }
    match *self.mode.lock() {
      CommerceMode::Succeed => Ok(()),
      CommerceMode::RejectToken => Err(AdapterError::AuthRequired),
      CommerceMode::Fail => Err(AdapterError::Remote(RemoteError::new(
        RemoteSystem::Commerce,
        "create_order",
        Some(502),
        "bad gateway",
      ))),
    }
  }
}

#[async_trait]
impl CommerceBackend for FakeCommerce {
  async fn create_order(
    &self,
    _payload: &CheckoutPayload,
    token: Option<&str>,
  ) -> Result<CommerceOrderResult, AdapterError> {
    let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
    self.outcome(token)?;
    let amount = *self.amount.lock();
    Ok(CommerceOrderResult {
      order_id: format!("c-{}", n),
      order_number: Some(format!("100{}", n)),
      amount,
      currency: amount.map(|_| "UZS".to_string()),
      raw_response: json!({"id": format!("c-{}", n)}),
    })
  }

  async fn list_orders(&self, token: Option<&str>) -> Result<Vec<CommerceOrder>, AdapterError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    self.outcome(token)?;
    Ok(vec![CommerceOrder {
      id: "c-1".to_string(),
      order_number: Some("1001".to_string()),
      status: Some("new".to_string()),
      amount: Some(Decimal::new(200, 0)),
      currency: Some("UZS".to_string()),
      created_at: None,
      raw: Value::Null,
    }])
  }
}

pub struct FakeGateway {
  pub calls: AtomicUsize,
  pub failing: Mutex<bool>,
  /// Transaction id handed out for the next session.
  pub next_transaction: Mutex<String>,
  pub requests: Mutex<Vec<GatewayCheckoutRequest>>,
}

impl Default for FakeGateway {
  fn default() -> Self {
    Self {
      calls: AtomicUsize::new(0),
      failing: Mutex::new(false),
      next_transaction: Mutex::new("tx1".to_string()),
      requests: Mutex::new(Vec::new()),
    }
  }
}

impl FakeGateway {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn fail(&self, failing: bool) {
    *self.failing.lock() = failing;
  }

  pub fn hand_out(&self, transaction_id: &str) {
    *self.next_transaction.lock() = transaction_id.to_string();
  }

  pub fn last_request(&self) -> Option<GatewayCheckoutRequest> {
    self.requests.lock().last().cloned()
  }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
  async fn create_checkout(&self, request: GatewayCheckoutRequest) -> Result<GatewayCheckoutResult, RemoteError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.requests.lock().push(request);
    if *self.failing.lock() {
      return Err(RemoteError::new(
        RemoteSystem::Gateway,
        "create_checkout",
        None,
        "request timed out",
      ));
    }
    let transaction_id = self.next_transaction.lock().clone();
    Ok(GatewayCheckoutResult {
      checkout_url: format!("https://pay.test/{}", transaction_id),
      raw_response: json!({"transaction_id": transaction_id}),
      transaction_id,
    })
  }
}

/// Orchestrator wired to an in-memory store and the fakes above.
pub struct Harness {
  pub store: Arc<InMemoryOrderStore>,
  pub inventory: Arc<FakeInventory>,
  pub commerce: Arc<FakeCommerce>,
  pub gateway: Arc<FakeGateway>,
  pub orchestrator: Arc<OrderOrchestrator>,
}

impl Harness {
  pub fn new() -> Self {
    setup_tracing();
    let store = Arc::new(InMemoryOrderStore::new());
    let inventory = Arc::new(FakeInventory::default());
    let commerce = Arc::new(FakeCommerce::default());
    let gateway = Arc::new(FakeGateway::default());

    let backends = Backends {
      store: store.clone(),
      inventory: inventory.clone(),
      commerce: commerce.clone(),
      gateway: gateway.clone(),
    };
    let orchestrator = Arc::new(OrderOrchestrator::new(backends, "UZS"));

    Self {
      store,
      inventory,
      commerce,
      gateway,
      orchestrator,
    }
  }

  pub fn remote_calls(&self) -> usize {
    self.inventory.calls() + self.commerce.calls() + self.gateway.calls()
  }

  pub fn app_state(&self) -> AppState {
    AppState {
      orchestrator: self.orchestrator.clone(),
      config: Arc::new(test_config()),
    }
  }
}

/// Configuration with placeholder endpoints; the fakes never dial them.
pub fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| {
    let value = match name {
      "INVENTORY_API_URL" => "http://inventory.invalid",
      "INVENTORY_API_TOKEN" => "svc-token",
      "INVENTORY_SHOP_ID" => "shop-1",
      "INVENTORY_CASHBOX_ID" => "box-1",
      "COMMERCE_API_URL" => "http://commerce.invalid",
      "GATEWAY_API_URL" => "http://gateway.invalid",
      "GATEWAY_API_KEY" => "gw-key",
      _ => return None,
    };
    Some(value.to_string())
  })
  .expect("test configuration is complete")
}
