use sqlx::{PgPool, Postgres, Result, Transaction};

use crate::db::models::{Account, Entry, Transfer};

// --- Account Queries ---

pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

pub async fn create_account(pool: &PgPool, params: &CreateAccountParams) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (owner, balance, currency)
        VALUES ($1, $2, $3)
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(&params.owner)
    .bind(params.balance)
    .bind(&params.currency)
    .fetch_one(pool)
    .await
}

pub async fn get_account(pool: &PgPool, id: i64) -> Result<Account> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Fetches an account under an exclusive row lock held until the enclosing
/// transaction ends. `FOR NO KEY UPDATE` rather than `FOR UPDATE`: the
/// entry and transfer inserts hold KEY SHARE locks on the referenced
/// account rows, and the stronger mode would block on them.
pub async fn get_account_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, owner, balance, currency, created_at
        FROM accounts
        WHERE id = $1
        FOR NO KEY UPDATE
        "#,
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

/// Applies a relative balance change as a single read-modify-write so
/// concurrent callers never act on a stale balance.
pub async fn add_account_balance(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    delta: i64,
) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET balance = balance + $1
        WHERE id = $2
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(delta)
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

/// Administrative overwrite of the stored balance. Never used by the
/// transfer path, which goes through `add_account_balance`.
pub async fn update_account(pool: &PgPool, id: i64, balance: i64) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET balance = $1
        WHERE id = $2
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(balance)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn delete_account(pool: &PgPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    Ok(())
}

pub async fn list_accounts(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY id LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

// --- Entry Queries ---

pub async fn create_entry(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    amount: i64,
) -> Result<Entry> {
    sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (account_id, amount)
        VALUES ($1, $2)
        RETURNING id, account_id, amount, created_at
        "#,
    )
    .bind(account_id)
    .bind(amount)
    .fetch_one(&mut **tx)
    .await
}

pub async fn get_entry(pool: &PgPool, id: i64) -> Result<Entry> {
    sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_entries(
    pool: &PgPool,
    account_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Entry>> {
    sqlx::query_as::<_, Entry>(
        r#"
        SELECT * FROM entries
        WHERE account_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

// --- Transfer Queries ---

pub async fn create_transfer(
    tx: &mut Transaction<'_, Postgres>,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
) -> Result<Transfer> {
    sqlx::query_as::<_, Transfer>(
        r#"
        INSERT INTO transfers (from_account_id, to_account_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, from_account_id, to_account_id, amount, created_at
        "#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(amount)
    .fetch_one(&mut **tx)
    .await
}

pub async fn get_transfer(pool: &PgPool, id: i64) -> Result<Transfer> {
    sqlx::query_as::<_, Transfer>("SELECT * FROM transfers WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_transfers(
    pool: &PgPool,
    from_account_id: i64,
    to_account_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transfer>> {
    sqlx::query_as::<_, Transfer>(
        r#"
        SELECT * FROM transfers
        WHERE from_account_id = $1 AND to_account_id = $2
        ORDER BY id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
