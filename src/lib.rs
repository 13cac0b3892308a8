pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    crate::domain::collaborators::{ContentGrants, NotificationSink},
    std::{sync::Arc, time::Duration},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub webhook_secret: Arc<str>,
    pub signature_tolerance_secs: i64,
    pub scheduler_token: Arc<str>,
    pub swap_expiry_age: Duration,
    pub grants: Arc<dyn ContentGrants>,
    pub notifier: Arc<dyn NotificationSink>,
}
