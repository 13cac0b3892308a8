use {
    crate::domain::{collaborators::ContentGrants, error::CoreError},
    sqlx::PgPool,
    std::{future::Future, pin::Pin},
    uuid::Uuid,
};

/// Idempotent grant write: granting an item the user already holds is a
/// no-op via the unique `(user_id, item_id)` constraint.
pub async fn insert_grant(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> Result<(), CoreError> {
    sqlx::query(
        r#"
        INSERT INTO content_grants (id, user_id, item_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, item_id) DO NOTHING
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(item_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn has_grant(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> Result<bool, CoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM content_grants WHERE user_id = $1 AND item_id = $2)",
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Postgres-backed content-grant collaborator.
pub struct PgContentGrants {
    pool: PgPool,
}

impl PgContentGrants {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ContentGrants for PgContentGrants {
    fn grant_access(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + '_>> {
        Box::pin(insert_grant(&self.pool, user_id, item_id))
    }
}
