use anyhow::Result;
use carebot_lingua::app::AppContext;
use carebot_lingua::config::Config;
use carebot_lingua::server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carebot_lingua=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Starting {} {} (git {})",
        config.service_name,
        env!("CARGO_PKG_VERSION"),
        if config.git_sha.is_empty() { "unknown" } else { config.git_sha.as_str() }
    );

    let context = AppContext::from_config(&config)?;
    server::serve(context, config.port).await
}
