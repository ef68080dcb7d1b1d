mod api;
mod middleware;
mod notify;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::notify::LogNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pricegate_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let rules = pricegate_core::RuleStore::load(&config.rules_path)?;
    tracing::info!(
        users = rules.user_count(),
        path = %config.rules_path.display(),
        "pricing rules loaded"
    );

    let storefront = pricegate_shopify::StorefrontClient::new(
        config.storefront_endpoint_url(),
        &config.storefront_token,
        config.shopify_request_timeout_secs,
        config.shopify_max_retries,
        config.shopify_retry_backoff_base_secs,
    )?;

    let app = build_app(AppState {
        rules: Arc::new(rules),
        storefront: Arc::new(storefront),
        notifier: Arc::new(LogNotifier),
        page_size: config.catalog_page_size,
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
