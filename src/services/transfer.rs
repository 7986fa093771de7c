use std::time::Duration;

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use crate::db::models::{Account, Entry, Transfer};
use crate::db::queries;
use crate::error::{self, LedgerError};
use crate::validation;

/// Fresh attempts allowed after a transient store conflict.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct TransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Everything a successful transfer produced: the transfer record, both
/// ledger entries and both account rows as they stood after the commit.
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: Account,
    pub to_account: Account,
}

/// The transaction boundary for moving funds between accounts. Stateless
/// between calls; all shared mutable state lives in the store.
#[derive(Clone)]
pub struct TransferService {
    pool: PgPool,
    max_retries: u32,
}

impl TransferService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(pool: PgPool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }

    /// Moves `amount` from one account to the other as one atomic unit of
    /// work: the transfer record, both entries and both balance updates all
    /// commit together or not at all. Transient store conflicts are retried
    /// up to the configured budget; a failed attempt leaves no trace.
    pub async fn transfer_tx(&self, params: TransferParams) -> Result<TransferResult, LedgerError> {
        validation::validate_distinct_accounts(params.from_account_id, params.to_account_id)?;
        validation::validate_positive_amount(params.amount)?;

        let mut attempts = 0u32;
        loop {
            match self.try_transfer(&params).await {
                Err(err) if err.is_transient() => {
                    attempts += 1;
                    if attempts > self.max_retries {
                        return Err(LedgerError::Conflict { attempts });
                    }
                    warn!(
                        from_account_id = params.from_account_id,
                        to_account_id = params.to_account_id,
                        attempts,
                        "transient conflict, retrying transfer"
                    );
                }
                other => return other,
            }
        }
    }

    /// Same as [`transfer_tx`](Self::transfer_tx), but abandons the call when
    /// `deadline` expires before the commit. The in-flight unit of work is
    /// rolled back by the transaction guard.
    pub async fn transfer_tx_with_deadline(
        &self,
        params: TransferParams,
        deadline: Duration,
    ) -> Result<TransferResult, LedgerError> {
        match tokio::time::timeout(deadline, self.transfer_tx(params)).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Cancelled),
        }
    }

    async fn try_transfer(&self, params: &TransferParams) -> Result<TransferResult, LedgerError> {
        // Rolls back on every exit path unless committed below.
        let mut tx = self.pool.begin().await?;

        let transfer = queries::create_transfer(
            &mut tx,
            params.from_account_id,
            params.to_account_id,
            params.amount,
        )
        .await
        .map_err(|err| map_account_ref_error(err, params))?;

        let from_entry = queries::create_entry(&mut tx, params.from_account_id, -params.amount)
            .await
            .map_err(|err| map_account_ref_error(err, params))?;

        let to_entry = queries::create_entry(&mut tx, params.to_account_id, params.amount)
            .await
            .map_err(|err| map_account_ref_error(err, params))?;

        // Always lock the lower account id first, regardless of direction.
        // Every transfer touching an overlapping pair then acquires its row
        // locks in the same global order, so no circular wait can form.
        let (from_account, to_account) = if params.from_account_id < params.to_account_id {
            let from_account =
                apply_delta(&mut tx, params.from_account_id, -params.amount).await?;
            let to_account = apply_delta(&mut tx, params.to_account_id, params.amount).await?;
            (from_account, to_account)
        } else {
            let to_account = apply_delta(&mut tx, params.to_account_id, params.amount).await?;
            let from_account =
                apply_delta(&mut tx, params.from_account_id, -params.amount).await?;
            (from_account, to_account)
        };

        tx.commit().await?;

        debug!(
            transfer_id = transfer.id,
            from_account_id = from_account.id,
            to_account_id = to_account.id,
            amount = params.amount,
            "transfer committed"
        );

        Ok(TransferResult {
            transfer,
            from_entry,
            to_entry,
            from_account,
            to_account,
        })
    }
}

/// Locks one account row, then applies its signed balance change.
async fn apply_delta(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    delta: i64,
) -> Result<Account, LedgerError> {
    queries::get_account_for_update(tx, account_id)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => LedgerError::NotFound(format!("account {account_id}")),
            other => other.into(),
        })?;

    queries::add_account_balance(tx, account_id, delta)
        .await
        .map_err(|err| {
            if error::is_check_violation(&err) {
                LedgerError::InsufficientFunds { account_id }
            } else {
                err.into()
            }
        })
}

/// The transfer and entry inserts reference both account rows; a missing
/// account surfaces there as a foreign-key violation rather than an empty
/// read.
fn map_account_ref_error(err: sqlx::Error, params: &TransferParams) -> LedgerError {
    if error::is_foreign_key_violation(&err) {
        LedgerError::NotFound(format!(
            "account {} or {}",
            params.from_account_id, params.to_account_id
        ))
    } else {
        err.into()
    }
}
