// fleur-storefront/src/remote/commerce.rs

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::http::{missing_field, send_json};
use super::normalize::{list_envelope, pick, pick_decimal, pick_id, pick_string};
use super::{AdapterError, CommerceBackend, RemoteError, RemoteSystem};
use crate::config::CommerceConfig;
use crate::models::{CheckoutPayload, CommerceOrder, CommerceOrderResult};

const SYSTEM: RemoteSystem = RemoteSystem::Commerce;

const ORDER_ID_KEYS: [&str; 3] = ["id", "order_id", "orderId"];
const ORDER_NUMBER_KEYS: [&str; 3] = ["order_number", "orderNumber", "number"];
const AMOUNT_KEYS: [&str; 4] = ["total_amount", "totalAmount", "total", "amount"];

#[derive(Serialize)]
struct CommerceLine<'a> {
  product_id: &'a str,
  name: Option<&'a str>,
  quantity: u32,
  #[serde(with = "rust_decimal::serde::float")]
  price: Decimal,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
  items: Vec<CommerceLine<'a>>,
  payment_method: Option<&'a str>,
  delivery_method: Option<&'a str>,
  comment: Option<&'a str>,
  #[serde(with = "rust_decimal::serde::float_option")]
  total_amount: Option<Decimal>,
  currency: Option<&'a str>,
}

/// Merchant order ledger. Every call runs on behalf of the end user's session.
pub struct HttpCommerceBackend {
  client: Client,
  config: CommerceConfig,
}

impl HttpCommerceBackend {
  pub fn new(client: Client, config: CommerceConfig) -> Self {
    Self { client, config }
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.config.base_url, path)
  }
}

fn require_token(token: Option<&str>) -> Result<&str, AdapterError> {
  token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AdapterError::AuthRequired)
}

/// A 401 means the session credential was rejected, which callers treat like a missing one.
fn classify(err: RemoteError) -> AdapterError {
  if err.is_unauthorized() {
    AdapterError::AuthRequired
  } else {
    AdapterError::Remote(err)
  }
}

fn order_body(payload: &CheckoutPayload) -> CreateOrderBody<'_> {
  CreateOrderBody {
    items: payload
      .items
      .iter()
      .map(|item| CommerceLine {
        product_id: item.product_id.as_deref().unwrap_or_default(),
        name: item.name.as_deref(),
        quantity: item.quantity,
        price: item.price,
      })
      .collect(),
    payment_method: payload.checkout.payment_method.as_deref(),
    delivery_method: payload.checkout.delivery_method.as_deref(),
    comment: payload.checkout.comment.as_deref(),
    total_amount: payload.total_amount(),
    currency: payload.currency(),
  }
}

/// The created order may come back bare, enveloped, or as `{data: {order: {...}}}`.
fn normalize_created(response: Value) -> Result<CommerceOrderResult, RemoteError> {
  let order = pick(&response, &["order"]).cloned().unwrap_or_else(|| response.clone());
  let order_id = pick_id(&order, &ORDER_ID_KEYS).ok_or_else(|| missing_field(SYSTEM, "create_order", "id"))?;

  Ok(CommerceOrderResult {
    order_id,
    order_number: pick_id(&order, &ORDER_NUMBER_KEYS),
    amount: pick_decimal(&order, &AMOUNT_KEYS),
    currency: pick_string(&order, &["currency"]),
    raw_response: response,
  })
}

fn normalize_listed(row: &Value) -> Option<CommerceOrder> {
  Some(CommerceOrder {
    id: pick_id(row, &ORDER_ID_KEYS)?,
    order_number: pick_id(row, &ORDER_NUMBER_KEYS),
    status: pick_string(row, &["status", "state"]),
    amount: pick_decimal(row, &AMOUNT_KEYS),
    currency: pick_string(row, &["currency"]),
    created_at: pick_string(row, &["created_at", "createdAt"]),
    raw: row.clone(),
  })
}

#[async_trait]
impl CommerceBackend for HttpCommerceBackend {
  #[instrument(name = "commerce::create_order", skip_all, fields(items = payload.items.len()))]
  async fn create_order(
    &self,
    payload: &CheckoutPayload,
    token: Option<&str>,
  ) -> Result<CommerceOrderResult, AdapterError> {
    let token = require_token(token)?;

    let request = self
      .client
      .post(self.endpoint("orders"))
      .bearer_auth(token)
      .json(&order_body(payload));
    let response = send_json(SYSTEM, "create_order", request).await.map_err(classify)?;
    let result = normalize_created(response)?;

    info!(order_id = %result.order_id, order_number = ?result.order_number, "Commerce order created.");
    Ok(result)
  }

  #[instrument(name = "commerce::list_orders", skip_all)]
  async fn list_orders(&self, token: Option<&str>) -> Result<Vec<CommerceOrder>, AdapterError> {
    let token = require_token(token)?;

    let request = self.client.get(self.endpoint("orders")).bearer_auth(token);
    let response = send_json(SYSTEM, "list_orders", request).await.map_err(classify)?;

    let rows = match list_envelope(&response) {
      Some(rows) => rows,
      None if response.is_null() => return Ok(Vec::new()),
      None => {
        return Err(AdapterError::Remote(RemoteError::new(
          SYSTEM,
          "list_orders",
          None,
          "unrecognized order list shape",
        )))
      }
    };

    let orders: Vec<CommerceOrder> = rows.iter().filter_map(normalize_listed).collect();
    if orders.len() < rows.len() {
      warn!(dropped = rows.len() - orders.len(), "Commerce orders without an id were skipped.");
    }
    Ok(orders)
  }
}
