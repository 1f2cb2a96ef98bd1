// fleur-storefront/src/lib.rs

//! Order orchestration and payment reconciliation for the Fleur storefront.
//!
//! A checkout creates an order attempt, then sequences calls against the
//! commerce backend, the inventory/POS backend and (for online payments) the
//! payment gateway. Gateway notifications later settle the same attempt.

pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod pipelines;
pub mod remote;
pub mod state;
pub mod store;
pub mod web;

pub use crate::errors::{AppError, Result};
pub use crate::orchestrator::{CallbackOutcome, CheckoutOutcome, OrderOrchestrator};
