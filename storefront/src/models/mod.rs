// fleur-storefront/src/models/mod.rs

//! Order attempt records, checkout payloads and canonical remote results.

pub mod order_attempt;
pub mod payload;
pub mod results;

pub use order_attempt::{
  GatewayTransaction, LogEntry, OrderAttempt, OrderPatch, OrderStatus, PaymentMethod, SessionToken,
};
pub use payload::{BuyerRef, CheckoutOptions, CheckoutPayload, LineItem, Totals};
pub use results::{
  CommerceOrder, CommerceOrderResult, GatewayCheckoutRequest, GatewayCheckoutResult, InventoryOrderResult,
};
