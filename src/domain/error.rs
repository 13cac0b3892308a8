use thiserror::Error;

/// Error categories for the reconciliation core. The first five are
/// operational: stable code, message safe to surface. Database and
/// serialization failures are logged in full server-side and surfaced
/// as a generic internal error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("webhook signature: {0}")]
    SignatureRejected(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("external: {0}")]
    External(String),
}
