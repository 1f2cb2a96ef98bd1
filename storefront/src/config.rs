// fleur-storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct InventoryConfig {
  pub base_url: String,
  /// Static service credential, not an end-user token.
  pub api_token: String,
  pub shop_id: String,
  pub cashbox_id: String,
}

#[derive(Debug, Clone)]
pub struct CommerceConfig {
  pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
  pub base_url: String,
  pub api_key: String,
  pub return_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// When set, order attempts are kept in Postgres instead of process memory.
  pub database_url: Option<String>,
  pub auth_cookie_name: String,
  pub http_timeout: Duration,
  pub default_currency: String,

  pub inventory: InventoryConfig,
  pub commerce: CommerceConfig,
  pub gateway: GatewayConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL").ok();
    let auth_cookie_name = get_env("AUTH_COOKIE_NAME").unwrap_or_else(|_| "auth_token".to_string());
    let http_timeout_secs = get_env("HTTP_TIMEOUT_SECS")
      .unwrap_or_else(|_| "30".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid HTTP_TIMEOUT_SECS: {}", e)))?;
    if http_timeout_secs == 0 {
      return Err(AppError::Config("HTTP_TIMEOUT_SECS must be greater than zero".to_string()));
    }
    let default_currency = get_env("DEFAULT_CURRENCY").unwrap_or_else(|_| "UZS".to_string());

    let inventory = InventoryConfig {
      base_url: trim_base(get_env("INVENTORY_API_URL")?),
      api_token: get_env("INVENTORY_API_TOKEN")?,
      shop_id: get_env("INVENTORY_SHOP_ID")?,
      cashbox_id: get_env("INVENTORY_CASHBOX_ID")?,
    };
    let commerce = CommerceConfig {
      base_url: trim_base(get_env("COMMERCE_API_URL")?),
    };
    let gateway = GatewayConfig {
      base_url: trim_base(get_env("GATEWAY_API_URL")?),
      api_key: get_env("GATEWAY_API_KEY")?,
      return_url: get_env("GATEWAY_RETURN_URL").ok(),
    };

    tracing::info!(
      persistence = if database_url.is_some() { "postgres" } else { "memory" },
      timeout_secs = http_timeout_secs,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      auth_cookie_name,
      http_timeout: Duration::from_secs(http_timeout_secs),
      default_currency,
      inventory,
      commerce,
      gateway,
    })
  }
}

fn trim_base(url: String) -> String {
  url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn required() -> HashMap<&'static str, &'static str> {
    HashMap::from([
      ("INVENTORY_API_URL", "https://pos.example.test/v1/"),
      ("INVENTORY_API_TOKEN", "svc-token"),
      ("INVENTORY_SHOP_ID", "shop-1"),
      ("INVENTORY_CASHBOX_ID", "cashbox-1"),
      ("COMMERCE_API_URL", "https://commerce.example.test"),
      ("GATEWAY_API_URL", "https://pay.example.test"),
      ("GATEWAY_API_KEY", "gw-key"),
    ])
  }

  fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig> {
    AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
  }

  #[test]
  fn defaults_apply_when_optional_variables_are_absent() {
    let cfg = load(&required()).unwrap();
    assert_eq!(cfg.server_host, "127.0.0.1");
    assert_eq!(cfg.server_port, 8080);
    assert!(cfg.database_url.is_none());
    assert_eq!(cfg.auth_cookie_name, "auth_token");
    assert_eq!(cfg.http_timeout, Duration::from_secs(30));
    assert_eq!(cfg.default_currency, "UZS");
    assert_eq!(cfg.inventory.base_url, "https://pos.example.test/v1");
    assert!(cfg.gateway.return_url.is_none());
  }

  #[test]
  fn missing_required_variable_is_a_config_error() {
    let mut vars = required();
    vars.remove("GATEWAY_API_KEY");
    match load(&vars) {
      Err(AppError::Config(msg)) => assert!(msg.contains("GATEWAY_API_KEY")),
      other => panic!("expected config error, got {:?}", other.map(|_| ())),
    }
  }

  #[test]
  fn invalid_numbers_are_rejected() {
    let mut vars = required();
    vars.insert("SERVER_PORT", "not-a-port");
    assert!(matches!(load(&vars), Err(AppError::Config(_))));

    let mut vars = required();
    vars.insert("HTTP_TIMEOUT_SECS", "0");
    assert!(matches!(load(&vars), Err(AppError::Config(_))));
  }
}
