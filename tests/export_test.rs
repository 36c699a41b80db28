mod common;

use anyhow::Result;
use common::{expense, linked_account, sign_up, test_service};
use fintrack::io::{Exporter, LedgerExport};

#[tokio::test]
async fn test_export_ledger_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;

    service
        .record_expense(&session, expense(&checking, "2024-03-05", 0, 2_000, "coffee"))
        .await?;
    service
        .record_expense(&session, expense(&checking, "2024-03-06", 500, 0, "refund"))
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_ledger_csv(&session, 2024, 3, &mut buffer)
        .await?;
    assert_eq!(count, 2);

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let headers = reader.headers()?.clone();
    assert_eq!(&headers[2], "date");
    assert_eq!(&headers[7], "balance_cents");

    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][3], "Checking");
    assert_eq!(&records[0][7], "8000");
    assert_eq!(&records[1][4], "refund");
    assert_eq!(&records[1][7], "8500");

    Ok(())
}

#[tokio::test]
async fn test_export_summaries_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;

    service
        .record_expense(&session, expense(&checking, "2024-02-05", 0, 1_000, "books"))
        .await?;
    service
        .record_expense(&session, expense(&checking, "2024-03-05", 0, 2_000, "coffee"))
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_summaries_csv(&session, 2024, 3, &mut buffer)
        .await?;
    assert_eq!(count, 1);

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let record = reader
        .records()
        .next()
        .expect("one summary row")?;
    assert_eq!(&record[1], "Checking");
    assert_eq!(&record[2], "9000");
    assert_eq!(&record[4], "2000");
    assert_eq!(&record[5], "7000");

    Ok(())
}

#[tokio::test]
async fn test_export_ledger_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = sign_up(&service, "Ana", "ana@example.com").await?;
    let checking = linked_account(&service, &session, "Checking", 10_000, "2024-01-01").await?;

    service
        .record_expense(&session, expense(&checking, "2024-03-05", 0, 2_000, "coffee"))
        .await?;

    let mut buffer = Vec::new();
    let export = Exporter::new(&service)
        .export_ledger_json(&session, 2024, 3, &mut buffer)
        .await?;
    assert_eq!(export.rows.len(), 1);
    assert_eq!(export.user, "ana@example.com");

    let parsed: LedgerExport = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed.month.to_string(), "2024-03");
    assert_eq!(parsed.rows[0].balance_cents, 8_000);
    assert_eq!(parsed.summaries[&checking.id].balance_at_month_end, 8_000);

    Ok(())
}
