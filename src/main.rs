//! Charge Recorder
//!
//! REST service for logging EV charging sessions.
//! Reads configuration from TOML file (~/.config/charge-recorder/config.toml),
//! then applies HOST, PORT, ALLOWED_ORIGINS, UNLOCK_PHRASE and DATABASE_URL.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use charge_recorder::application::{ChargingSessionService, PassphraseGate, SharedGate};
use charge_recorder::config::CONFIG_PATH_ENV;
use charge_recorder::support::shutdown::{run_with_timeout, ShutdownSignal};
use charge_recorder::{
    connect_and_migrate, create_api_router, default_config_path, AppConfig, DatabaseConfig,
    SeaOrmSessionRepository,
};

/// How often expired session tokens are dropped from memory
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let (mut app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&app_cfg.logging.level)),
        )
        .init();

    match load_error {
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
        None => info!("Configuration loaded from {}", config_path.display()),
    }

    if let Err(e) = app_cfg.apply_env() {
        error!("Invalid environment override: {}", e);
        return Err(e.into());
    }

    info!("Starting Charge Recorder...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = match metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to install Prometheus metrics recorder: {}", e);
            return Err(e.into());
        }
    };
    info!("Prometheus metrics recorder installed");

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.url.clone(),
    };
    let db = match connect_and_migrate(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // ── Services ───────────────────────────────────────────────
    let repo = Arc::new(SeaOrmSessionRepository::new(db.clone()));
    let service = Arc::new(ChargingSessionService::new(repo));
    let gate = PassphraseGate::shared(&app_cfg.security);
    if gate.is_enabled() {
        info!(
            "Passphrase gate enabled ({}h session tokens)",
            app_cfg.security.token_ttl_hours
        );
    }

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();
    spawn_token_purger(gate.clone(), shutdown.clone());

    let api_router = create_api_router(service, gate, &app_cfg.server, prometheus_handle);

    // ── REST API server with graceful shutdown ─────────────────
    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown.clone();
    let served = axum::serve(listener, api_router)
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        })
        .await;
    if let Err(e) = &served {
        error!("REST API server error: {}", e);
    }

    // ── Final cleanup ──────────────────────────────────────────
    info!("Performing final cleanup...");
    let closed = run_with_timeout(app_cfg.server.shutdown_timeout, async move {
        match db.close().await {
            Ok(()) => info!("Database connection closed"),
            Err(e) => warn!("Error closing database connection: {}", e),
        }
    })
    .await;
    if !closed {
        warn!("Database did not close in time");
    }

    info!("Charge Recorder shutdown complete");
    served.map_err(Into::into)
}

/// Periodically drop expired session tokens until shutdown
fn spawn_token_purger(gate: SharedGate, shutdown: ShutdownSignal) {
    if !gate.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = gate.purge_expired();
                    if removed > 0 {
                        debug!("Purged {} expired session tokens", removed);
                    }
                }
                _ = shutdown.wait() => break,
            }
        }
    });
}
