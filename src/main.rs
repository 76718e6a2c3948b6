//! Auto-welcome daemon
//!
//! Watches an operator-staffed chat account and sends a single automatic
//! acknowledgment when a customer writes in and no operator has picked the
//! conversation up yet.

mod config;
mod db;
mod maintenance;
mod rate_gate;
mod runtime;
mod state_machine;
mod transport;

use config::Config;
use db::ContactDb;
use rate_gate::RateGate;
use runtime::{supervise, Clock, ConversationController, SupervisorExit, SystemClock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::BridgeTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auto_welcome=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config_path = Config::path_from_env();
    let config = Config::load(&config_path)?;
    let welcome = config.welcome_settings()?;
    tracing::info!(
        path = %config_path.display(),
        db_file = %config.db_file.display(),
        cooldown_secs = welcome.policy.cooldown.as_secs(),
        rate_limit_per_minute = config.rate_limit_per_minute,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = ContactDb::open(&config.db_file);
    let gate = Arc::new(RateGate::new(config.rate_limit_per_minute, clock.clone()));

    let token = BridgeTransport::load_token(&config.auth_folder);
    let transport = Arc::new(BridgeTransport::new(&config.bridge_url, token)?);

    let cancel = CancellationToken::new();
    let sweep = maintenance::spawn_eviction_sweep(
        store.clone(),
        clock.clone(),
        config.sweep_settings(),
        cancel.clone(),
    );

    let controller = ConversationController::new(store.clone(), gate, transport.clone(), clock, welcome);

    tracing::info!(bridge = %config.bridge_url, "Starting auto-welcome");
    let exit = supervise(&*transport, &controller, &config.reconnect_policy()).await;

    cancel.cancel();
    sweep.await?;
    store.lock().await.persist();

    match exit {
        SupervisorExit::Unauthorized => {
            Err("chat session unauthorized; re-pair the bridge and restart".into())
        }
        SupervisorExit::AttemptsExhausted { attempts } => {
            Err(format!("chat transport unreachable after {attempts} attempts").into())
        }
    }
}
