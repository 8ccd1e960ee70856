//! Startup orchestration.
//!
//! Order: config → logging → metrics → store → listener → serve. Config and
//! bind failures are fatal; an unreachable database is not.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;

use crate::config::{load_config, TrackerConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};
use crate::store;

/// Command-line choices that feed startup.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    /// Overrides `listener.bind_address` after env overrides.
    pub bind_address: Option<String>,
}

/// Resolve the final configuration from file, environment and flags.
pub fn resolve_config(options: &StartupOptions) -> Result<TrackerConfig, crate::config::ConfigError> {
    let mut config = load_config(options.config_path.as_deref())?;
    if let Some(bind) = &options.bind_address {
        config.listener.bind_address = bind.clone();
        crate::config::validation::validate_config(&config)
            .map_err(crate::config::ConfigError::Validation)?;
    }
    Ok(config)
}

/// Run the service until a termination signal arrives.
pub async fn run(options: StartupOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&options)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "issue-tracker starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.database.backend,
        database = %config.database.database,
        collection = %config.database.collection,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let store = store::connect(&config.database).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(&config, store);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_flag_overrides_and_is_validated() {
        let options = StartupOptions {
            config_path: None,
            bind_address: Some("127.0.0.1:4000".into()),
        };
        assert_eq!(
            resolve_config(&options).unwrap().listener.bind_address,
            "127.0.0.1:4000"
        );

        let options = StartupOptions {
            config_path: None,
            bind_address: Some("localhost".into()),
        };
        assert!(resolve_config(&options).is_err());
    }
}
