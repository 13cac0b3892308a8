use {
    super::error::CoreError,
    super::id::EventId,
    super::ledger::{NewPayout, NewPurchase},
    serde::Deserialize,
    sha2::{Digest, Sha256},
    uuid::Uuid,
};

/// Raw provider-event envelope as delivered on the wire.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// SHA-256 hex of the raw body, stored for audit alongside the dedup row.
pub fn payload_fingerprint(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// A validated provider event, ready for dedup and ledger application.
#[derive(Debug)]
pub struct ProviderEvent {
    pub event_id: EventId,
    pub event_type: String,
    pub provider_ts: i64,
    pub fingerprint: String,
    pub correlation_id: Uuid,
    pub command: LedgerCommand,
}

/// What the event means for the ledger. Event types we don't settle are
/// still deduplicated and audit-logged as passthrough.
#[derive(Debug)]
pub enum LedgerCommand {
    Purchase(NewPurchase),
    Payout(NewPayout),
    Passthrough,
}

impl LedgerCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Purchase(_) => "purchase",
            Self::Payout(_) => "payout",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Outcome of applying one provider event, as acknowledged to the provider.
#[derive(Debug)]
pub enum EventOutcome {
    /// New ledger row written.
    Created(Uuid),
    /// Row already existed — retried or racing delivery, treated as success.
    Exists(Uuid),
    /// Passthrough event recorded for audit only.
    Logged,
    /// Event id already fully applied (duplicate delivery).
    Duplicate,
}

impl EventOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Exists(_) => "exists",
            Self::Logged => "logged",
            Self::Duplicate => "duplicate",
        }
    }
}

impl EventEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(body).map_err(CoreError::from)
    }
}
