use {crate::domain::error::CoreError, std::env, std::time::Duration};

const DEFAULT_TOLERANCE_SECS: u64 = 300;
const DEFAULT_EXPIRY_HOURS: u64 = 72;
const DEFAULT_RETENTION_DAYS: u64 = 90;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub webhook_secret: String,
    pub scheduler_token: String,
    /// Accepted clock skew for webhook signature timestamps.
    pub signature_tolerance: Duration,
    /// Age after which a `requested` swap is eligible for expiry.
    pub swap_expiry_age: Duration,
    /// Retention window for processed-event dedup rows.
    pub event_retention: Duration,
}

fn required(name: &str) -> Result<String, CoreError> {
    env::var(name).map_err(|_| CoreError::Validation(format!("{name} must be set")))
}

fn parse_secs(name: &str, default: u64, scale: u64) -> Result<Duration, CoreError> {
    match env::var(name) {
        Err(_) => Ok(Duration::from_secs(default * scale)),
        Ok(raw) => raw
            .parse::<u64>()
            .map(|v| Duration::from_secs(v * scale))
            .map_err(|_| CoreError::Validation(format!("{name} must be an integer, got: {raw}"))),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            webhook_secret: required("WEBHOOK_SECRET")?,
            scheduler_token: required("SCHEDULER_TOKEN")?,
            signature_tolerance: parse_secs("WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS, 1)?,
            swap_expiry_age: parse_secs("SWAP_EXPIRY_HOURS", DEFAULT_EXPIRY_HOURS, 3600)?,
            event_retention: parse_secs("EVENT_RETENTION_DAYS", DEFAULT_RETENTION_DAYS, 86400)?,
        })
    }
}
