//! Loyalty Mart service entry point
//!
//! ```text
//! ┌──────────┐   upload   ┌────────────┐   poll    ┌────────────────┐
//! │  Client  │──────────▶│ OrderStore │◀─────────│ Reconciliation │──▶ accrual oracle
//! └──────────┘            └────────────┘  credit   │     Worker     │
//!      │ withdraw               │                  └────────────────┘
//!      ▼                        ▼
//! ┌──────────────────┐    ┌──────────┐
//! │ WithdrawalGuard  │──▶│  Ledger  │
//! └──────────────────┘    └──────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use loyalty_mart::accrual::{AccrualOracle, HttpAccrualClient};
use loyalty_mart::config::AppConfig;
use loyalty_mart::db::{Database, schema};
use loyalty_mart::gateway::{self, state::AppState};
use loyalty_mart::intake::OrderIntake;
use loyalty_mart::ledger::LedgerService;
use loyalty_mart::reconciliation::{ReconciliationWorker, WorkerConfig};
use loyalty_mart::repository::{LoyaltyRepository, MemoryRepository, PgRepository};
use loyalty_mart::user_auth::UserAuthService;
use loyalty_mart::withdrawal::WithdrawalGuard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env_and_args().context("Failed to load configuration")?;
    let _log_guard = loyalty_mart::logging::init_logging(&config);

    tracing::info!(version = env!("GIT_HASH"), "Starting Loyalty Mart");

    // ========================================================================
    // Storage
    // ========================================================================
    let (repo, pg_db): (Arc<dyn LoyaltyRepository>, Option<Arc<Database>>) =
        if config.uses_postgres() {
            let db = Database::connect(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            schema::init_schema(db.pool())
                .await
                .context("Failed to initialize schema")?;
            let repo = PgRepository::new(db.pool().clone());
            (Arc::new(repo), Some(Arc::new(db)))
        } else {
            tracing::warn!("No database URL configured, using in-memory store");
            (Arc::new(MemoryRepository::new()), None)
        };

    // ========================================================================
    // Services
    // ========================================================================
    let intake = Arc::new(OrderIntake::new(repo.clone(), config.history.sort));
    let withdrawals = Arc::new(WithdrawalGuard::new(repo.clone()));
    let ledger = Arc::new(LedgerService::new(repo.clone()));
    let user_auth = Arc::new(UserAuthService::new(
        repo.clone(),
        config.auth.jwt_secret.clone(),
        config.token_ttl(),
    ));

    let oracle: Arc<dyn AccrualOracle> = Arc::new(
        HttpAccrualClient::new(
            &config.accrual.base_url,
            config.request_timeout(),
            config.default_retry_after(),
        )
        .context("Failed to build accrual client")?,
    );

    let shutdown = CancellationToken::new();

    // ========================================================================
    // Reconciliation worker
    // ========================================================================
    let worker = ReconciliationWorker::new(
        repo.clone(),
        oracle,
        WorkerConfig {
            tick_interval: config.tick_interval(),
            batch_size: config.reconciliation.batch_size,
        },
    );
    let worker_shutdown = shutdown.clone();
    let worker_handle = tokio::spawn(async move { worker.run(worker_shutdown).await });

    // ========================================================================
    // Gateway
    // ========================================================================
    let state = Arc::new(AppState::new(intake, withdrawals, ledger, user_auth, pg_db));
    let listener = TcpListener::bind(&config.server.run_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.run_address))?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    let served = gateway::serve(listener, state, shutdown.clone()).await;

    // Gateway may exit on its own (I/O error); stop the worker either way
    shutdown.cancel();
    if let Err(e) = worker_handle.await {
        tracing::error!("Reconciliation worker task failed: {}", e);
    }

    served.context("Gateway failed")?;
    tracing::info!("Loyalty Mart stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
