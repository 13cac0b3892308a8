use {
    super::error::CoreError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Requested,
    Accepted,
    Declined,
    Cancelled,
    Fulfilled,
    Expired,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
            Self::Fulfilled => "fulfilled",
            Self::Expired => "expired",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Declined | Self::Cancelled | Self::Fulfilled | Self::Expired
        )
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SwapStatus {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "requested" => Ok(Self::Requested),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "cancelled" => Ok(Self::Cancelled),
            "fulfilled" => Ok(Self::Fulfilled),
            "expired" => Ok(Self::Expired),
            other => Err(CoreError::Validation(format!(
                "unknown swap status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAction {
    Accept,
    Decline,
    Cancel,
    Fulfill,
    Expire,
}

impl SwapAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Cancel => "cancel",
            Self::Fulfill => "fulfill",
            Self::Expire => "expire",
        }
    }

    /// States this action may legally start from.
    pub fn legal_from(&self) -> &'static [SwapStatus] {
        match self {
            Self::Accept | Self::Decline | Self::Cancel | Self::Expire => {
                &[SwapStatus::Requested]
            }
            Self::Fulfill => &[SwapStatus::Accepted],
        }
    }

    pub fn target(&self) -> SwapStatus {
        match self {
            Self::Accept => SwapStatus::Accepted,
            Self::Decline => SwapStatus::Declined,
            Self::Cancel => SwapStatus::Cancelled,
            Self::Fulfill => SwapStatus::Fulfilled,
            Self::Expire => SwapStatus::Expired,
        }
    }

    pub fn required_actor(&self) -> RequiredActor {
        match self {
            Self::Accept | Self::Decline => RequiredActor::Responder,
            Self::Cancel => RequiredActor::Requester,
            Self::Fulfill => RequiredActor::Participant,
            Self::Expire => RequiredActor::System,
        }
    }
}

impl fmt::Display for SwapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SwapAction {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "accept" => Ok(Self::Accept),
            "decline" => Ok(Self::Decline),
            "cancel" => Ok(Self::Cancel),
            "fulfill" => Ok(Self::Fulfill),
            "expire" => Ok(Self::Expire),
            other => Err(CoreError::Validation(format!(
                "unknown swap action: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredActor {
    Requester,
    Responder,
    /// Requester or responder.
    Participant,
    /// No human actor — scheduler only.
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Requester,
    Responder,
    Outsider,
    System,
}

#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    pub requested_item_id: Uuid,
    pub offered_item_id: Uuid,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
}

impl SwapRequest {
    /// `None` is the system actor (scheduler-driven expiry).
    pub fn classify(&self, actor: Option<Uuid>) -> ActorRole {
        match actor {
            None => ActorRole::System,
            Some(id) if id == self.requester_id => ActorRole::Requester,
            Some(id) if id == self.responder_id => ActorRole::Responder,
            Some(_) => ActorRole::Outsider,
        }
    }

    /// Actor/role gate. Runs before the state-legality check so an
    /// unauthorized caller learns nothing about the swap's current state.
    pub fn authorize(&self, role: ActorRole, action: SwapAction) -> Result<(), CoreError> {
        let allowed = match action.required_actor() {
            RequiredActor::Requester => role == ActorRole::Requester,
            RequiredActor::Responder => role == ActorRole::Responder,
            RequiredActor::Participant => {
                matches!(role, ActorRole::Requester | ActorRole::Responder)
            }
            RequiredActor::System => role == ActorRole::System,
        };
        if allowed {
            Ok(())
        } else {
            Err(CoreError::Auth(format!(
                "actor role {role:?} may not {action} this swap"
            )))
        }
    }

    /// State-legality gate: returns the target status, or a conflict if
    /// the action is not legal from the current status.
    pub fn check_transition(&self, action: SwapAction) -> Result<SwapStatus, CoreError> {
        if action.legal_from().contains(&self.status) {
            Ok(action.target())
        } else {
            Err(CoreError::Conflict(format!(
                "cannot {action} a swap in status {}",
                self.status
            )))
        }
    }
}
