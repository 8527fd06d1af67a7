use std::sync::Arc;

use chapelcast_api::config;
use chapelcast_api::crypto::Aes256GcmCipher;
use chapelcast_api::routes;
use chapelcast_api::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = config::config();
    tracing::info!("Starting Chapelcast API in {:?} mode", config.environment);

    let cipher = Arc::new(Aes256GcmCipher::new(
        &config.security.db_encryption_key,
        &config.security.db_signing_key,
    ));

    let store = Store::connect(config, cipher).await?;
    store.run_migrations().await?;

    let app = routes::app(store);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Chapelcast API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
