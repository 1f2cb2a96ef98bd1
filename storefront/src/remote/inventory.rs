// fleur-storefront/src/remote/inventory.rs

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::http::{missing_field, send_json};
use super::normalize::pick_id;
use super::{InventoryBackend, RemoteError, RemoteSystem};
use crate::config::InventoryConfig;
use crate::models::{CheckoutPayload, InventoryOrderResult, PaymentMethod};

const SYSTEM: RemoteSystem = RemoteSystem::Inventory;

#[derive(Serialize)]
struct OpenDraftBody<'a> {
  shop_id: &'a str,
  cashbox_id: &'a str,
}

#[derive(Serialize)]
struct AddProductBody<'a> {
  product_id: &'a str,
  quantity: u32,
  #[serde(with = "rust_decimal::serde::float")]
  price: Decimal,
}

#[derive(Serialize)]
struct AttachCustomerBody<'a> {
  customer_id: &'a str,
}

#[derive(Serialize)]
struct SubmitPaymentBody<'a> {
  shop_id: &'a str,
  cashbox_id: &'a str,
  method: &'a str,
  #[serde(with = "rust_decimal::serde::float")]
  amount: Decimal,
  currency: &'a str,
}

/// Inventory/POS backend over HTTP, authenticated with a static service token.
pub struct HttpInventoryBackend {
  client: Client,
  config: InventoryConfig,
  default_currency: String,
}

impl HttpInventoryBackend {
  pub fn new(client: Client, config: InventoryConfig, default_currency: impl Into<String>) -> Self {
    Self {
      client,
      config,
      default_currency: default_currency.into(),
    }
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.config.base_url, path)
  }

  async fn post(&self, step: &'static str, path: &str, body: &impl Serialize) -> Result<serde_json::Value, RemoteError> {
    let request = self
      .client
      .post(self.endpoint(path))
      .bearer_auth(&self.config.api_token)
      .json(body);
    send_json(SYSTEM, step, request).await
  }

  async fn open_draft(&self) -> Result<String, RemoteError> {
    let body = OpenDraftBody {
      shop_id: &self.config.shop_id,
      cashbox_id: &self.config.cashbox_id,
    };
    let response = self.post("open_draft", "orders/drafts", &body).await?;
    pick_id(&response, &["id", "order_id", "orderId", "draft_id"]).ok_or_else(|| missing_field(SYSTEM, "open_draft", "id"))
  }

  async fn fill_draft(
    &self,
    draft_id: &str,
    payload: &CheckoutPayload,
    method: PaymentMethod,
  ) -> Result<InventoryOrderResult, RemoteError> {
    for item in &payload.items {
      let product_id = item.product_id.as_deref().unwrap_or_default();
      let body = AddProductBody {
        product_id,
        quantity: item.quantity,
        price: item.price,
      };
      self
        .post("add_product", &format!("orders/drafts/{}/products", draft_id), &body)
        .await?;
    }

    if let Some(customer_id) = payload.buyer_id() {
      self
        .post(
          "attach_customer",
          &format!("orders/drafts/{}/customer", draft_id),
          &AttachCustomerBody { customer_id },
        )
        .await?;
    }

    let body = SubmitPaymentBody {
      shop_id: &self.config.shop_id,
      cashbox_id: &self.config.cashbox_id,
      method: method.as_str(),
      amount: payload.total_amount().unwrap_or_default(),
      currency: payload.currency().unwrap_or(self.default_currency.as_str()),
    };
    let response = self
      .post("submit_payment", &format!("orders/drafts/{}/payment", draft_id), &body)
      .await?;

    Ok(InventoryOrderResult {
      order_id: pick_id(&response, &["order_id", "orderId", "id"]).unwrap_or_else(|| draft_id.to_string()),
      order_number: pick_id(&response, &["order_number", "orderNumber", "number"]),
      raw_response: response,
    })
  }
}

#[async_trait]
impl InventoryBackend for HttpInventoryBackend {
  #[instrument(name = "inventory::create_order", skip_all, fields(items = payload.items.len(), method = %method))]
  async fn create_order(
    &self,
    payload: &CheckoutPayload,
    method: PaymentMethod,
  ) -> Result<InventoryOrderResult, RemoteError> {
    let draft_id = self.open_draft().await?;
    info!(draft_id = %draft_id, "Inventory draft opened.");

    match self.fill_draft(&draft_id, payload, method).await {
      Ok(result) => {
        info!(draft_id = %draft_id, order_id = %result.order_id, "Inventory order submitted.");
        Ok(result)
      }
      Err(e) => {
        // No rollback endpoint exists; the draft stays open on the POS side.
        warn!(draft_id = %draft_id, step = e.step, error = %e, "Inventory sequence aborted, draft left open.");
        Err(e)
      }
    }
  }
}
