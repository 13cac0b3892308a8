use {
    super::error::CoreError,
    std::{future::Future, pin::Pin},
    uuid::Uuid,
};

/// Content-grant service: unlocks an item for a user. Grants are
/// idempotent — granting twice is a no-op.
pub trait ContentGrants: Send + Sync {
    fn grant_access(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + '_>>;
}

/// Notification sink. Fire-and-forget: a failure here must never block
/// or reverse the transition that triggered it.
pub trait NotificationSink: Send + Sync {
    fn notify(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + '_>>;
}

/// Default sink: writes notifications to the log. The real fan-out
/// service is an external collaborator.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + '_>> {
        let kind = kind.to_string();
        let title = title.to_string();
        let body = body.to_string();
        Box::pin(async move {
            tracing::info!(%user_id, %kind, %title, %body, "notification");
            Ok(())
        })
    }
}
