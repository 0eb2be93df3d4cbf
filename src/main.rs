//! session-ledger daemon.
//!
//! Loads configuration, starts the idle-session sweeper and runs until
//! interrupted. Request handling is embedded by the surrounding service through
//! the library's `TabService`.

use std::sync::Arc;

use session_ledger::adapters::cleanup::NoopCleaner;
use session_ledger::adapters::session::{SweeperConfig, SweeperHandle};
use session_ledger::application::TabService;
use session_ledger::config::AppConfig;
use session_ledger::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init_tracing(&config.logging)?;

    tracing::info!(
        max_sessions = config.session.max_sessions,
        idle_expiry_secs = config.session.idle_expiry_secs,
        session_rpm = config.admission.session_requests_per_minute,
        global_rpm = config.admission.global_requests_per_minute,
        starting_balance = %config.ledger.starting_balance,
        "session ledger starting"
    );

    let service = TabService::from_config(&config);
    let sweeper = Arc::new(service.sweeper(
        Arc::new(NoopCleaner),
        SweeperConfig::from(&config.session),
    ));
    let handle = SweeperHandle::start(sweeper);

    shutdown_signal().await;
    tracing::info!("shutdown signal received");

    handle.shutdown().await;
    tracing::info!(sessions = service.locks().len(), "session ledger stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
