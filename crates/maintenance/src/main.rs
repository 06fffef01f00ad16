//! `quire-chain-audit`: verify every draft's revision chain.
//!
//! Reads its connection settings through [`DatabaseConfig::from_env`] and
//! exits with status 1 when any draft breaks the chain invariant.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quire_db::DatabaseConfig;
use quire_drafts::audit::ChainAuditor;
use quire_drafts::store::PgDraftStore;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quire_chain_audit=info,quire_drafts=info,quire_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");

    let pool = quire_db::create_pool(&config.url, config.max_connections)
        .await
        .expect("Failed to connect to database");
    quire_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    quire_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!(max_connections = config.max_connections, "Database ready");

    // --- Audit ---
    let auditor = ChainAuditor::new(Arc::new(PgDraftStore::new(pool)));
    let report = match auditor.audit_all().await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(error = %err, "Chain audit failed");
            return ExitCode::FAILURE;
        }
    };

    for found in &report.violations {
        tracing::error!(
            draft_id = found.draft_id,
            violation = %found.violation,
            "Draft chain is broken"
        );
    }

    if report.is_clean() {
        tracing::info!(drafts_checked = report.drafts_checked, "All chains intact");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
