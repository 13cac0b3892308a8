use {
    crate::infra::postgres::event_repo,
    chrono::Utc,
    sqlx::PgPool,
    std::time::Duration,
    tokio::sync::watch,
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Periodically purge processed-event rows past the retention window.
/// The dedup table only needs to cover the provider's redelivery horizon.
pub async fn run_retention_sweeper(
    pool: PgPool,
    retention: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("retention sweeper started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("retention sweeper shutting down");
                return;
            }
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
        }

        let cutoff = Utc::now() - chrono::Duration::seconds(retention.as_secs() as i64);
        match event_repo::purge_older_than(&pool, cutoff).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "purged processed events past retention"),
            Err(e) => tracing::error!(error = %e, "retention sweep error"),
        }
    }
}
