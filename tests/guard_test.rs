mod common;

use anyhow::Result;
use common::{
    create_account, current_balance, db_path, expense, linked_account, parse_date, sign_up,
    test_service,
};
use fintrack::application::AppError;
use fintrack::domain::{AccountLink, ExpenseEdit, Field};
use fintrack::storage::Repository;
use sqlx::sqlite::SqliteConnectOptions;

#[tokio::test]
async fn test_unlinked_account_writes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let linked = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;
    let stranger = create_account(&service, "Not mine", 0, "2024-01-01").await?;

    let err = service
        .record_expense(&session, expense(&stranger, "2024-03-01", 0, 1_000, "misc"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotLinked(id) if id == stranger.id));
    assert_eq!(err.status_code(), 400);

    assert!(service.list_expenses(&session).await?.is_empty());
    assert_eq!(current_balance(&service, &session, &linked).await?, 10_000);

    Ok(())
}

#[tokio::test]
async fn test_missing_account_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let ghost = create_account(&service, "Ghost", 0, "2024-01-01").await?;

    let mut request = expense(&ghost, "2024-03-01", 0, 1_000, "misc");
    request.account_id = uuid::Uuid::new_v4();

    let err = service.record_expense(&session, request).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_validation_runs_before_link_check() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let stranger = create_account(&service, "Not mine", 0, "2024-01-01").await?;

    let err = service
        .record_expense(&session, expense(&stranger, "2024-03-01", -5, 0, " "))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            let fields: Vec<_> = errors.iter().map(|e| e.name).collect();
            assert_eq!(fields, vec![Field::Credit, Field::Category]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_duplicate_link_in_store() -> Result<()> {
    let (service, temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let account = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;

    let repo = Repository::connect(SqliteConnectOptions::new().filename(db_path(&temp)), 1).await?;
    let again = AccountLink::new(session.user_id(), account.id, 0, parse_date("2024-06-01"));
    assert!(!repo.save_link(&again).await?);

    let stored = repo
        .get_link(session.user_id(), account.id)
        .await?
        .expect("link should still exist");
    assert_eq!(stored.initial_balance_cents, 10_000);
    assert_eq!(stored.date_of_initial_balance, parse_date("2024-01-01"));

    Ok(())
}

#[tokio::test]
async fn test_failed_insert_rolls_back_balance() -> Result<()> {
    let (service, temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;

    // Make every expense insert fail after the balance has been adjusted
    let saboteur = sqlx::SqlitePool::connect_with(
        SqliteConnectOptions::new().filename(db_path(&temp)),
    )
    .await?;
    sqlx::raw_sql(
        "CREATE TRIGGER fail_expense_insert BEFORE INSERT ON expenses
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .execute(&saboteur)
    .await?;

    let err = service
        .record_expense(&session, expense(&checking, "2024-03-01", 0, 4_000, "rent"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));
    assert_eq!(err.status_code(), 503);

    assert_eq!(current_balance(&service, &session, &checking).await?, 10_000);
    assert!(service.list_expenses(&session).await?.is_empty());

    // Once the store recovers, writes go through again
    sqlx::raw_sql("DROP TRIGGER fail_expense_insert")
        .execute(&saboteur)
        .await?;
    service
        .record_expense(&session, expense(&checking, "2024-03-01", 0, 4_000, "rent"))
        .await?;
    assert_eq!(current_balance(&service, &session, &checking).await?, 6_000);

    Ok(())
}

#[tokio::test]
async fn test_failed_update_rolls_back_balances() -> Result<()> {
    let (service, temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;
    let card = linked_account(&service, &session, "Visa", 0, "2024-01-01").await?;

    let recorded = service
        .record_expense(&session, expense(&checking, "2024-03-01", 0, 2_000, "fuel"))
        .await?;

    // Fails the row rewrite, after both balances have been moved
    let saboteur = sqlx::SqlitePool::connect_with(
        SqliteConnectOptions::new().filename(db_path(&temp)),
    )
    .await?;
    sqlx::raw_sql(
        "CREATE TRIGGER fail_expense_update BEFORE UPDATE OF account_id ON expenses
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .execute(&saboteur)
    .await?;

    let err = service
        .update_expense(
            &session,
            recorded.id,
            vec![
                ExpenseEdit::Account(card.id.to_string()),
                ExpenseEdit::Debit("35".into()),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));

    assert_eq!(current_balance(&service, &session, &checking).await?, 8_000);
    assert_eq!(current_balance(&service, &session, &card).await?, 0);
    assert_eq!(service.get_expense(&session, recorded.id).await?, recorded);
    let checks = service.check_balances(&session).await?;
    assert!(checks.iter().all(|c| c.is_consistent()));

    Ok(())
}

#[tokio::test]
async fn test_failed_delete_keeps_expense() -> Result<()> {
    let (service, temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;

    let recorded = service
        .record_expense(&session, expense(&checking, "2024-03-01", 0, 2_000, "fuel"))
        .await?;

    // The row is removed first; failing the balance revert must bring it back
    let saboteur = sqlx::SqlitePool::connect_with(
        SqliteConnectOptions::new().filename(db_path(&temp)),
    )
    .await?;
    sqlx::raw_sql(
        "CREATE TRIGGER fail_balance_update BEFORE UPDATE OF current_balance_cents ON account_links
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .execute(&saboteur)
    .await?;

    let err = service.delete_expense(&session, recorded.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));

    sqlx::raw_sql("DROP TRIGGER fail_balance_update")
        .execute(&saboteur)
        .await?;

    assert_eq!(service.get_expense(&session, recorded.id).await?, recorded);
    assert_eq!(current_balance(&service, &session, &checking).await?, 8_000);
    let checks = service.check_balances(&session).await?;
    assert!(checks.iter().all(|c| c.is_consistent()));

    // A rejected delete statement leaves the balance alone as well
    sqlx::raw_sql(
        "CREATE TRIGGER fail_expense_delete BEFORE DELETE ON expenses
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .execute(&saboteur)
    .await?;

    let err = service.delete_expense(&session, recorded.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)));
    assert_eq!(service.get_expense(&session, recorded.id).await?, recorded);
    assert_eq!(current_balance(&service, &session, &checking).await?, 8_000);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_expenses_lose_no_updates() -> Result<()> {
    const WRITERS: usize = 25;

    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let wallet = linked_account(&service, &session, "Wallet", 0, "2024-01-01").await?;

    let mut handles = Vec::with_capacity(WRITERS);
    for _ in 0..WRITERS {
        let service = service.clone();
        let session = session.clone();
        let request = expense(&wallet, "2024-03-15", 10, 0, "tips");
        handles.push(tokio::spawn(async move {
            service.record_expense(&session, request).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(
        current_balance(&service, &session, &wallet).await?,
        10 * WRITERS as i64
    );

    let expenses = service.list_expenses(&session).await?;
    assert_eq!(expenses.len(), WRITERS);
    let mut sequences: Vec<_> = expenses.iter().map(|e| e.sequence).collect();
    sequences.dedup();
    assert_eq!(sequences.len(), WRITERS);

    let checks = service.check_balances(&session).await?;
    assert!(checks.iter().all(|c| c.is_consistent()));

    Ok(())
}

#[tokio::test]
async fn test_balance_cache_matches_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 50_000, "2024-01-01").await?;

    for (date, credit, debit) in [
        ("2024-01-10", 0, 12_000),
        ("2024-02-10", 80_000, 0),
        ("2024-03-10", 0, 3_300),
    ] {
        service
            .record_expense(&session, expense(&checking, date, credit, debit, "misc"))
            .await?;
    }

    let cached = current_balance(&service, &session, &checking).await?;
    let ledger = service.monthly_ledger(&session, 2024, 3).await?;
    assert_eq!(cached, ledger.summaries[&checking.id].balance_at_month_end);
    assert_eq!(cached, 114_700);

    Ok(())
}
