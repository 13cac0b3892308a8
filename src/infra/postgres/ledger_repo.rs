use {
    crate::domain::{
        error::CoreError,
        ledger::{CreateOutcome, NewPayout, NewPurchase},
    },
    sqlx::PgPool,
    uuid::Uuid,
};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

async fn find_purchase(
    pool: &PgPool,
    buyer_id: Uuid,
    prompt_id: Uuid,
    session_id: &str,
) -> Result<Option<Uuid>, CoreError> {
    let id: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM purchases
        WHERE buyer_id = $1 AND prompt_id = $2 AND checkout_session_id = $3
        "#,
    )
    .bind(buyer_id)
    .bind(prompt_id)
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Exactly-once purchase creation: check, insert, and recover from the
/// insert race via the unique constraint on
/// `(buyer_id, prompt_id, checkout_session_id)`. No application-level lock.
pub async fn create_purchase(
    pool: &PgPool,
    purchase: &NewPurchase,
) -> Result<CreateOutcome, CoreError> {
    // Common path on retried delivery: the row already exists.
    if let Some(id) = find_purchase(
        pool,
        purchase.buyer_id,
        purchase.prompt_id,
        purchase.checkout_session_id.as_str(),
    )
    .await?
    {
        return Ok(CreateOutcome { created: false, id });
    }

    let insert = sqlx::query(
        r#"
        INSERT INTO purchases
            (id, buyer_id, seller_id, prompt_id, checkout_session_id,
             amount, currency, status, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(purchase.id)
    .bind(purchase.buyer_id)
    .bind(purchase.seller_id)
    .bind(purchase.prompt_id)
    .bind(purchase.checkout_session_id.as_str())
    .bind(purchase.money.amount().minor_units())
    .bind(purchase.money.currency().as_str())
    .bind(purchase.status.as_str())
    .bind(&purchase.metadata)
    .execute(pool)
    .await;

    match insert {
        Ok(_) => Ok(CreateOutcome {
            created: true,
            id: purchase.id,
        }),
        // A concurrent duplicate delivery won the race between the check
        // and the insert. Re-query and return the winner.
        Err(e) if is_unique_violation(&e) => {
            let id = find_purchase(
                pool,
                purchase.buyer_id,
                purchase.prompt_id,
                purchase.checkout_session_id.as_str(),
            )
            .await?
            .ok_or_else(|| {
                CoreError::External("purchase vanished after unique violation".into())
            })?;
            Ok(CreateOutcome { created: false, id })
        }
        Err(e) => Err(e.into()),
    }
}

async fn find_payout(pool: &PgPool, transfer_id: &str) -> Result<Option<Uuid>, CoreError> {
    let id: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM payouts WHERE transfer_id = $1")
            .bind(transfer_id)
            .fetch_optional(pool)
            .await?;
    Ok(id)
}

/// Same check-then-insert-then-recover pattern, keyed on the provider's
/// transfer id.
pub async fn create_payout(pool: &PgPool, payout: &NewPayout) -> Result<CreateOutcome, CoreError> {
    if let Some(id) = find_payout(pool, payout.transfer_id.as_str()).await? {
        return Ok(CreateOutcome { created: false, id });
    }

    let insert = sqlx::query(
        r#"
        INSERT INTO payouts
            (id, seller_id, transfer_id, amount, currency, destination_account, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(payout.id)
    .bind(payout.seller_id)
    .bind(payout.transfer_id.as_str())
    .bind(payout.money.amount().minor_units())
    .bind(payout.money.currency().as_str())
    .bind(&payout.destination_account)
    .bind(payout.status.as_str())
    .execute(pool)
    .await;

    match insert {
        Ok(_) => Ok(CreateOutcome {
            created: true,
            id: payout.id,
        }),
        Err(e) if is_unique_violation(&e) => {
            let id = find_payout(pool, payout.transfer_id.as_str())
                .await?
                .ok_or_else(|| {
                    CoreError::External("payout vanished after unique violation".into())
                })?;
            Ok(CreateOutcome { created: false, id })
        }
        Err(e) => Err(e.into()),
    }
}
