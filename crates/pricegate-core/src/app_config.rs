use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Application configuration, loaded from the environment at startup and
/// passed explicitly to the components that need it. Fetch and pricing code
/// never read env vars directly.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Path to the YAML pricing rules file.
    pub rules_path: PathBuf,
    /// Shopify shop name, i.e. the `{shop}` in `{shop}.myshopify.com`.
    pub shop_name: String,
    /// Storefront API access token.
    pub storefront_token: String,
    /// Full GraphQL endpoint override. When set it replaces the URL derived
    /// from `shop_name` — used to point the client at a local test server.
    pub storefront_endpoint: Option<String>,
    /// Products per catalog page.
    pub catalog_page_size: u32,
    pub shopify_request_timeout_secs: u64,
    pub shopify_max_retries: u32,
    pub shopify_retry_backoff_base_secs: u64,
}

/// Storefront API version pinned by the fetch client.
pub const STOREFRONT_API_VERSION: &str = "2024-07";

impl AppConfig {
    /// The GraphQL endpoint the fetch client should POST to.
    #[must_use]
    pub fn storefront_endpoint_url(&self) -> String {
        match &self.storefront_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}.myshopify.com/api/{STOREFRONT_API_VERSION}/graphql.json",
                self.shop_name
            ),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("rules_path", &self.rules_path)
            .field("shop_name", &self.shop_name)
            .field("storefront_token", &"[redacted]")
            .field("storefront_endpoint", &self.storefront_endpoint)
            .field("catalog_page_size", &self.catalog_page_size)
            .field(
                "shopify_request_timeout_secs",
                &self.shopify_request_timeout_secs,
            )
            .field("shopify_max_retries", &self.shopify_max_retries)
            .field(
                "shopify_retry_backoff_base_secs",
                &self.shopify_retry_backoff_base_secs,
            )
            .finish()
    }
}
