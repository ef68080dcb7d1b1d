use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function. Decoupled from the real environment so tests can drive it with
/// a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let shop_name = require("SHOPIFY_SHOP_NAME")?;
    let storefront_token = require("SHOPIFY_STOREFRONT_TOKEN")?;
    let storefront_endpoint = lookup("SHOPIFY_STOREFRONT_ENDPOINT").ok();

    let env = parse_environment(&or_default("PRICEGATE_ENV", "development"));
    let bind_addr = parse_addr("PRICEGATE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PRICEGATE_LOG_LEVEL", "info");
    let rules_path = PathBuf::from(or_default(
        "PRICEGATE_RULES_PATH",
        "./config/pricing_rules.yaml",
    ));

    let catalog_page_size = parse_u32("PRICEGATE_CATALOG_PAGE_SIZE", "50")?;
    let shopify_request_timeout_secs = parse_u64("PRICEGATE_SHOPIFY_TIMEOUT_SECS", "30")?;
    let shopify_max_retries = parse_u32("PRICEGATE_SHOPIFY_MAX_RETRIES", "3")?;
    let shopify_retry_backoff_base_secs =
        parse_u64("PRICEGATE_SHOPIFY_RETRY_BACKOFF_BASE_SECS", "5")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        rules_path,
        shop_name,
        storefront_token,
        storefront_endpoint,
        catalog_page_size,
        shopify_request_timeout_secs,
        shopify_max_retries,
        shopify_retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
