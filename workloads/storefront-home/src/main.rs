use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use edge_data::{DependencyTag, HttpStorefrontClient};
use edge_kv::MemoryStore;
use storefront_home::{router, AppState, StorefrontConfig};

#[derive(Parser)]
#[command(name = "storefront-home")]
#[command(about = "Wicked Works storefront home page server", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (TOML, or JSON by extension)
    #[arg(short, long, env = "STOREFRONT_CONFIG")]
    config: Option<String>,

    /// Address to listen on, overrides the config
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,storefront_home=debug"));
        fmt().with_env_filter(filter).init();
    }

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StorefrontConfig::load(path)?,
        None => StorefrontConfig::default(),
    };
    config.apply_env();
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    config.validate().context("Invalid configuration")?;

    let client = HttpStorefrontClient::new(
        &config.storefront.domain,
        &config.storefront.api_version,
        config.storefront.token(),
    )
    .with_policy(DependencyTag::Catalog, config.loader.critical_policy())
    .with_policy(DependencyTag::Recommendations, config.loader.deferred_policy());

    tracing::info!(
        endpoint = client.endpoint(),
        ordering = ?config.loader.ordering,
        "storefront client ready"
    );

    let state = AppState::new(
        &config,
        Arc::new(client),
        Arc::new(MemoryStore::new().with_expiring_capacity(config.visitor.max_sessions)),
    )?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
