mod common;

use ledger_core::db::queries::{self, CreateAccountParams};

#[tokio::test]
async fn create_account_persists_fields() {
    let (pool, _container) = common::setup_ledger().await;

    let params = CreateAccountParams {
        owner: common::random_owner(),
        balance: common::random_money(),
        currency: common::random_currency(),
    };
    let account = queries::create_account(&pool, &params).await.unwrap();

    assert!(account.id > 0);
    assert_eq!(account.owner, params.owner);
    assert_eq!(account.balance, params.balance);
    assert_eq!(account.currency, params.currency);
}

#[tokio::test]
async fn get_account_round_trips() {
    let (pool, _container) = common::setup_ledger().await;

    let account = common::create_random_account(&pool).await;
    let fetched = queries::get_account(&pool, account.id).await.unwrap();

    assert_eq!(fetched, account);
}

#[tokio::test]
async fn get_account_unknown_id_is_not_found() {
    let (pool, _container) = common::setup_ledger().await;

    let err = queries::get_account(&pool, 9999).await.unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));
}

#[tokio::test]
async fn update_account_overwrites_balance() {
    let (pool, _container) = common::setup_ledger().await;

    let account = common::create_random_account(&pool).await;
    let new_balance = common::random_money();

    let updated = queries::update_account(&pool, account.id, new_balance)
        .await
        .unwrap();

    assert_eq!(updated.id, account.id);
    assert_eq!(updated.owner, account.owner);
    assert_eq!(updated.balance, new_balance);
    assert_eq!(updated.currency, account.currency);
    assert_eq!(updated.created_at, account.created_at);
}

#[tokio::test]
async fn delete_account_removes_row() {
    let (pool, _container) = common::setup_ledger().await;

    let account = common::create_random_account(&pool).await;
    queries::delete_account(&pool, account.id).await.unwrap();

    let err = queries::get_account(&pool, account.id).await.unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));
}

#[tokio::test]
async fn delete_account_unknown_id_is_not_found() {
    let (pool, _container) = common::setup_ledger().await;

    let err = queries::delete_account(&pool, 9999).await.unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));
}

#[tokio::test]
async fn list_accounts_paginates() {
    let (pool, _container) = common::setup_ledger().await;

    for _ in 0..10 {
        common::create_random_account(&pool).await;
    }

    let accounts = queries::list_accounts(&pool, 5, 5).await.unwrap();
    assert_eq!(accounts.len(), 5);
}
