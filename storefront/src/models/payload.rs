// fleur-storefront/src/models/payload.rs

//! Checkout submission as posted by the storefront.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::order_attempt::PaymentMethod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  #[serde(default)]
  pub items: Vec<LineItem>,
  #[serde(default)]
  pub checkout: CheckoutOptions,
  #[serde(default)]
  pub user: Option<BuyerRef>,
  #[serde(default)]
  pub totals: Option<Totals>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  #[serde(default, deserialize_with = "de_opt_id")]
  pub product_id: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub quantity: u32,
  #[serde(default)]
  pub price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptions {
  #[serde(default)]
  pub payment_method: Option<String>,
  #[serde(default)]
  pub delivery_method: Option<String>,
  #[serde(default)]
  pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerRef {
  #[serde(default, deserialize_with = "de_opt_id")]
  pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
  #[serde(default)]
  pub amount: Option<Decimal>,
  #[serde(default)]
  pub currency: Option<String>,
}

impl CheckoutPayload {
  /// Checks the payload and resolves the payment method (default `cash`).
  pub fn validate(&self) -> Result<PaymentMethod, String> {
    if self.items.is_empty() {
      return Err("Checkout must contain at least one item".to_string());
    }
    for (idx, item) in self.items.iter().enumerate() {
      if item.product_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        return Err(format!("Item {} has no product id", idx + 1));
      }
      if item.quantity == 0 {
        return Err(format!("Item {} must have a positive quantity", idx + 1));
      }
      if item.price.is_sign_negative() {
        return Err(format!("Item {} has a negative price", idx + 1));
      }
    }
    match self.total_amount() {
      None => return Err("Order totals are missing".to_string()),
      Some(amount) if amount <= Decimal::ZERO => return Err("Order total must be positive".to_string()),
      Some(_) => {}
    }
    self.payment_method()
  }

  pub fn payment_method(&self) -> Result<PaymentMethod, String> {
    match self.checkout.payment_method.as_deref().map(str::trim) {
      None | Some("") => Ok(PaymentMethod::Cash),
      Some(raw) => raw
        .parse::<PaymentMethod>()
        .map_err(|_| format!("Unsupported payment method '{}'", raw)),
    }
  }

  pub fn total_amount(&self) -> Option<Decimal> {
    self.totals.as_ref().and_then(|t| t.amount)
  }

  pub fn currency(&self) -> Option<&str> {
    self
      .totals
      .as_ref()
      .and_then(|t| t.currency.as_deref())
      .filter(|c| !c.trim().is_empty())
  }

  pub fn buyer_id(&self) -> Option<&str> {
    self
      .user
      .as_ref()
      .and_then(|u| u.id.as_deref())
      .filter(|id| !id.trim().is_empty())
  }
}

/// Ids arrive as JSON strings or numbers depending on the page that built the payload.
pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(Value::Number(n)) => Ok(Some(n.to_string())),
    Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
  }
}
