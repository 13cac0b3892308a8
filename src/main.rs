use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    settle_sync::{
        AppState, config::Config, domain::collaborators::LogNotifier,
        infra::postgres::grant_repo::PgContentGrants, services::retention,
    },
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let state = AppState {
        pool: pool.clone(),
        webhook_secret: config.webhook_secret.clone().into(),
        signature_tolerance_secs: config.signature_tolerance.as_secs() as i64,
        scheduler_token: config.scheduler_token.clone().into(),
        swap_expiry_age: config.swap_expiry_age,
        grants: Arc::new(PgContentGrants::new(pool.clone())),
        notifier: Arc::new(LogNotifier),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(retention::run_retention_sweeper(
        pool,
        config.event_retention,
        shutdown_rx,
    ));

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/webhook",
            post(settle_sync::adapters::webhook::provider_webhook_handler),
        )
        .route(
            "/swaps/{id}/{action}",
            post(settle_sync::adapters::swaps::swap_action_handler),
        )
        .route(
            "/internal/swaps/expire",
            post(settle_sync::adapters::swaps::expire_sweep_handler),
        )
        .layer(DefaultBodyLimit::max(64 * 1024)) // provider events are typically <20 KB
        .layer(TimeoutLayer::new(Duration::from_secs(25)))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    shutdown_tx.send(true).ok();
    sweeper.await.ok();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
