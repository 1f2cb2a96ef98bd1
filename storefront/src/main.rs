// fleur-storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use fleur_storefront::config::AppConfig;
use fleur_storefront::pipelines::contexts::Backends;
use fleur_storefront::remote::http::build_client;
use fleur_storefront::remote::{HttpCommerceBackend, HttpInventoryBackend, HttpPaymentGateway};
use fleur_storefront::state::AppState;
use fleur_storefront::store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use fleur_storefront::web::configure_app_routes;
use fleur_storefront::OrderOrchestrator;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn OrderStore>> {
  match config.database_url.as_deref() {
    Some(url) => {
      let store = PgOrderStore::connect(url).await.context("connecting to the order database")?;
      store.migrate().await.context("creating the order_attempts table")?;
      tracing::info!("Order attempts are stored in Postgres.");
      Ok(Arc::new(store))
    }
    None => {
      tracing::warn!("DATABASE_URL not set; order attempts are kept in memory and lost on restart.");
      Ok(Arc::new(InMemoryOrderStore::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();

  tracing::info!("Starting storefront order service...");

  let config = AppConfig::from_env().context("loading configuration")?;
  let client = build_client(config.http_timeout).context("building the HTTP client")?;

  let backends = Backends {
    store: open_store(&config).await?,
    inventory: Arc::new(HttpInventoryBackend::new(
      client.clone(),
      config.inventory.clone(),
      config.default_currency.clone(),
    )),
    commerce: Arc::new(HttpCommerceBackend::new(client.clone(), config.commerce.clone())),
    gateway: Arc::new(HttpPaymentGateway::new(client, config.gateway.clone())),
  };

  let orchestrator = OrderOrchestrator::new(backends, config.default_currency.clone());
  let server_address = format!("{}:{}", config.server_host, config.server_port);
  let app_state = AppState::new(orchestrator, config);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;

  Ok(())
}
