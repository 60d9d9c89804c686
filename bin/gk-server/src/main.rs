//! Gatekeeper Server
//!
//! Account registration, email verification, login and password reset over
//! REST. Configuration comes from `gatekeeper.toml` (or `GATEKEEPER_CONFIG`)
//! with `GATEKEEPER_*` environment overrides.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEKEEPER_CONFIG` | - | Path to the TOML config file |
//! | `GATEKEEPER_HTTP_PORT` | `8080` | HTTP API port |
//! | `GATEKEEPER_STORAGE_BACKEND` | `mongodb` | `mongodb` or `memory` |
//! | `GATEKEEPER_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `GATEKEEPER_MONGODB_DATABASE` | `gatekeeper` | MongoDB database name |
//! | `GATEKEEPER_JWT_SECRET` | - | HS256 signing secret (required outside dev mode) |
//! | `GATEKEEPER_DEV_MODE` | `false` | Relax validation for local runs |
//! | `RUST_LOG` | `info` | Log filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use gk_common::{init_logging, LogFormat};
use gk_config::{AppConfig, ConfigLoader};
use gk_platform::email::LogEmailSender;
use gk_platform::shared::indexes::initialize_indexes;
use gk_platform::{
    Collaborators, Gatekeeper, InMemoryTokenRepository, InMemoryUserRepository, MongoTokenRepository,
    MongoUserRepository, TokenRepository, UserRepository,
};

const DEV_JWT_SECRET: &str = "gatekeeper-dev-secret-do-not-use-in-production";

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = ConfigLoader::new().load()?;
    config.validate()?;

    let format = config.logging.format.parse().unwrap_or(LogFormat::Text);
    init_logging("gk-server", format, &config.logging.level);

    info!("Starting Gatekeeper Server");

    if config.auth.jwt.secret.is_empty() {
        warn!("No JWT secret configured, using the development secret");
        config.auth.jwt.secret = DEV_JWT_SECRET.to_string();
    }

    let (users, tokens) = storage(&config).await?;
    let collaborators = Collaborators::from_config(&config, users, tokens, Arc::new(LogEmailSender))?;
    let gatekeeper = Gatekeeper::assemble(collaborators)?;

    let app = gatekeeper
        .router()
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Gatekeeper API listening on http://{}", addr);
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutdown signal received, draining domain events...");

    let drain = Duration::from_secs(config.events.drain_timeout_secs);
    if tokio::time::timeout(drain, gatekeeper.bus.wait_idle()).await.is_err() {
        warn!(
            pending = gatekeeper.bus.in_flight(),
            "Domain event deliveries still pending at shutdown"
        );
    }

    info!("Gatekeeper Server shutdown complete");
    Ok(())
}

async fn storage(config: &AppConfig) -> Result<(Arc<dyn UserRepository>, Arc<dyn TokenRepository>)> {
    match config.storage.backend.as_str() {
        "memory" => {
            warn!("Using in-memory storage, data is lost on restart");
            Ok((
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryTokenRepository::new()),
            ))
        }
        "mongodb" => {
            info!("Connecting to MongoDB: {}/{}", config.mongodb.uri, config.mongodb.database);
            let client = mongodb::Client::with_uri_str(&config.mongodb.uri).await?;
            let db = client.database(&config.mongodb.database);
            initialize_indexes(&db).await?;
            Ok((
                Arc::new(MongoUserRepository::new(&db)),
                Arc::new(MongoTokenRepository::new(&db)),
            ))
        }
        other => anyhow::bail!("unknown storage backend '{}'", other),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
