use {crate::domain::audit::NewAuditEntry, crate::domain::error::CoreError, sqlx::PgPool};

pub async fn insert_audit_entry(pool: &PgPool, entry: &NewAuditEntry) -> Result<(), CoreError> {
    sqlx::query(
        r#"
        INSERT INTO audit_log
            (id, entity_type, entity_id, external_id, event_id, action, actor, detail)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.id)
    .bind(&entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.external_id.as_deref())
    .bind(entry.event_id.as_deref())
    .bind(&entry.action)
    .bind(&entry.actor)
    .bind(&entry.detail)
    .execute(pool)
    .await?;
    Ok(())
}
