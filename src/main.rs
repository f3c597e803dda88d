//! Fee Reconciler server entry point.

use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fee_reconciler::adapters::http::{reconciliation_router, ReconciliationAppState};
use fee_reconciler::adapters::{
    AesGcmCipher, PostgresAuditLog, PostgresCredentialVault, PostgresLedgerStore,
    PostgresPaymentIntentLedger,
};
use fee_reconciler::application::ReconcilePaymentHandler;
use fee_reconciler::config::AppConfig;
use fee_reconciler::ports::ServiceRole;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        "Starting fee reconciler"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let cipher = Arc::new(AesGcmCipher::from_base64_key(&config.vault.master_key)?);
    let vault = Arc::new(PostgresCredentialVault::new(pool.clone(), cipher));
    let intents = Arc::new(PostgresPaymentIntentLedger::new(pool.clone()));
    let ledger = Arc::new(PostgresLedgerStore::new(
        pool.clone(),
        config.database.lock_timeout_ms,
    ));
    let audit = Arc::new(PostgresAuditLog::new(pool.clone()));

    let reconciler = ReconcilePaymentHandler::new(intents, ledger, vault, audit, ServiceRole::assume())
        .with_handled_events(config.webhook.handled_events_list());

    let state = ReconciliationAppState {
        reconciler: Arc::new(reconciler),
        signature_header: config.webhook.signature_header_name()?,
    };

    let app = reconciliation_router()
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.webhook.max_body_bytes))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Fee reconciler stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
