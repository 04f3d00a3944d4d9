use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use tour_wizard::api::{HttpTourApi, TourApi};
use tour_wizard::auth::{MemoryTokenStore, TokenStore};
use tour_wizard::config::WizardConfig;
use tour_wizard::routes::wizard_routes;
use tour_wizard::store::{FlagStore, LibSqlFlagStore};
use tour_wizard::wizard::{DraftStatus, WizardController, WizardSession};

/// How often expired flags are swept from the database.
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WizardConfig::from_env().context("Invalid configuration")?;

    eprintln!("🧭 Tour Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api_url);
    eprintln!("   Flags: {}", config.db_path.display());
    eprintln!("   API: http://0.0.0.0:{}/api/wizard", config.port);
    if config.api_token.is_none() {
        eprintln!("   ⚠ TOUR_WIZARD_API_TOKEN not set, backend calls will be rejected");
    }

    // Flag store
    let store = if config.in_memory_store() {
        LibSqlFlagStore::new_memory().await
    } else {
        LibSqlFlagStore::new_local(&config.db_path).await
    }
    .context("Failed to open flag store")?;
    let store = Arc::new(store);

    // Backend client
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new(config.api_token.clone()));
    let api: Arc<dyn TourApi> = Arc::new(
        HttpTourApi::new(&config.api_url, tokens, config.http_timeout)
            .context("Failed to build backend client")?,
    );

    // Session
    let flag_store: Arc<dyn FlagStore> = store.clone();
    let controller = WizardController::new(flag_store, config.flag_ttl);
    let session = Arc::new(
        WizardSession::open(controller, api, config.retry.clone())
            .await
            .context("Failed to restore wizard flags")?,
    );
    match session.load_draft().await {
        DraftStatus::Loaded => {}
        status => tracing::warn!(?status, "Starting without a draft tour, reload via the API"),
    }

    // Sweep expired flags
    let purge_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(purged = n, "Purged expired wizard flags"),
                Err(e) => tracing::warn!(error = %e, "Flag purge failed"),
            }
        }
    });

    let app = wizard_routes(session);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Wizard server started");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
