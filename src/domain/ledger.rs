use {
    super::audit::NewAuditEntry,
    super::error::CoreError,
    super::id::{CheckoutSessionId, TransferId},
    super::money::Money,
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Completed,
    Refunded,
    PartiallyRefunded,
    Disputed,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Refunded => "refunded",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Disputed => "disputed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PurchaseStatus {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "completed" => Ok(Self::Completed),
            "refunded" => Ok(Self::Refunded),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "disputed" => Ok(Self::Disputed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "unknown purchase status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Paid,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PayoutStatus {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "unknown payout status: {other}"
            ))),
        }
    }
}

/// Ledger row to insert — id generated in Rust via `Uuid::now_v7()`.
/// Exactly-once creation keyed on `(buyer_id, prompt_id, checkout_session_id)`.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub prompt_id: Uuid,
    pub checkout_session_id: CheckoutSessionId,
    pub money: Money,
    pub status: PurchaseStatus,
    pub metadata: serde_json::Value,
}

impl NewPurchase {
    pub fn audit_entry(&self, actor: &str, event_id: &str, action: &str) -> NewAuditEntry {
        NewAuditEntry {
            id: Uuid::now_v7(),
            entity_type: "purchase".to_string(),
            entity_id: Some(self.id),
            external_id: Some(self.checkout_session_id.as_str().to_string()),
            event_id: Some(event_id.to_string()),
            action: action.to_string(),
            actor: actor.to_string(),
            detail: serde_json::json!({
                "buyer_id": self.buyer_id,
                "prompt_id": self.prompt_id,
                "amount": self.money.amount().minor_units(),
                "currency": self.money.currency().as_str(),
                "status": self.status.as_str(),
            }),
        }
    }
}

/// Payout row to insert, keyed on the provider's transfer id.
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub transfer_id: TransferId,
    pub money: Money,
    pub destination_account: String,
    pub status: PayoutStatus,
}

impl NewPayout {
    pub fn audit_entry(&self, actor: &str, event_id: &str, action: &str) -> NewAuditEntry {
        NewAuditEntry {
            id: Uuid::now_v7(),
            entity_type: "payout".to_string(),
            entity_id: Some(self.id),
            external_id: Some(self.transfer_id.as_str().to_string()),
            event_id: Some(event_id.to_string()),
            action: action.to_string(),
            actor: actor.to_string(),
            detail: serde_json::json!({
                "seller_id": self.seller_id,
                "amount": self.money.amount().minor_units(),
                "currency": self.money.currency().as_str(),
                "status": self.status.as_str(),
            }),
        }
    }
}

/// Result of an exactly-once ledger write. `created: false` means an
/// identical row already existed (retried or concurrent delivery) — the
/// common path, not an error.
#[derive(Debug, Clone, Copy)]
pub struct CreateOutcome {
    pub created: bool,
    pub id: Uuid,
}
