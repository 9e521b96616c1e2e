use rust_decimal_macros::dec;
use strata_core::accounts::FundType;
use strata_core::ledger::{LedgerError, LineSide, TransactionFilter, TransactionType};
use strata_core::reports::ReportError;
use strata_db::{ReportRepository, RepositoryError, TransactionRepository};
use strata_shared::config::LedgerConfig;
use strata_shared::types::{SchemeId, TransactionId};

use crate::common::{account, cash_input, connect, date};

// ============================================================================
// Recording and voiding
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_receipt_posts_to_trial_balance_and_void_removes_it() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let transactions = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let reports = ReportRepository::new(db.clone());
    let levy = account(&db, scheme_id, "4000").await;
    let cash = account(&db, scheme_id, "1000").await;

    let mut input = cash_input(
        scheme_id,
        TransactionType::Receipt,
        FundType::Admin,
        &levy,
        date(2026, 8, 1),
        dec!(100.00),
    );
    input.gst_amount = dec!(9.09);
    let recorded = transactions.record(input).await.unwrap();

    assert_eq!(recorded.lines.len(), 2);
    let debit = recorded
        .lines
        .iter()
        .find(|l| l.side == LineSide::Debit)
        .unwrap();
    assert_eq!(debit.account_id, cash.id);
    assert_eq!(debit.amount, dec!(100.00));

    let tb = reports.checked_trial_balance(scheme_id, None).await.unwrap();
    assert_eq!(tb.row("4000").unwrap().total_credit, dec!(100.00));
    assert_eq!(tb.row("1000").unwrap().total_debit, dec!(100.00));
    assert!(tb.totals.is_balanced);

    transactions
        .void(scheme_id, recorded.transaction.id)
        .await
        .unwrap();
    let tb = reports.trial_balance(scheme_id, None).await.unwrap();
    assert_eq!(tb.row_count(), 0);

    let again = transactions.void(scheme_id, recorded.transaction.id).await;
    assert!(matches!(
        again,
        Err(RepositoryError::Ledger(LedgerError::TransactionNotFound(_)))
    ));
    assert!(
        transactions
            .find_unbalanced_transactions(scheme_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_cross_fund_category_is_rejected() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let transactions = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let capital_levy = account(&db, scheme_id, "4100").await;

    let err = transactions
        .record(cash_input(
            scheme_id,
            TransactionType::Receipt,
            FundType::Admin,
            &capital_levy,
            date(2026, 8, 1),
            dec!(50.00),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::FundMismatch { .. })
    ));
    let listed = transactions
        .list_transactions(scheme_id, TransactionFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty(), "nothing written on error");
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_payment_defaults_method_and_filters() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let transactions = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let insurance = account(&db, scheme_id, "6000").await;
    let levy = account(&db, scheme_id, "4000").await;

    let mut payment = cash_input(
        scheme_id,
        TransactionType::Payment,
        FundType::Admin,
        &insurance,
        date(2026, 8, 3),
        dec!(1200.00),
    );
    payment.payment_method = Some("carrier pigeon".to_string());
    let payment = transactions.record(payment).await.unwrap();
    assert_eq!(
        payment.transaction.payment_method.map(|m| m.as_str()),
        Some("eft")
    );

    transactions
        .record(cash_input(
            scheme_id,
            TransactionType::Receipt,
            FundType::Admin,
            &levy,
            date(2026, 8, 1),
            dec!(300.00),
        ))
        .await
        .unwrap();

    let payments = transactions
        .list_transactions(
            scheme_id,
            TransactionFilter {
                transaction_type: Some(TransactionType::Payment),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);

    let all = transactions
        .list_transactions(scheme_id, TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, payment.transaction.id, "newest date first");

    let found = transactions
        .find_transaction(scheme_id, payment.transaction.id)
        .await
        .unwrap();
    assert_eq!(found.lines.len(), 2);

    let missing = transactions
        .find_transaction(scheme_id, TransactionId::new())
        .await;
    assert!(matches!(
        missing,
        Err(RepositoryError::Ledger(LedgerError::TransactionNotFound(_)))
    ));
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_fund_balance_summary_uses_current_year() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let reports = ReportRepository::new(db.clone());

    let missing = reports.fund_balance_summary(scheme_id, None).await;
    assert!(matches!(
        missing,
        Err(RepositoryError::Report(ReportError::NoCurrentYear))
    ));

    strata_db::FinancialYearRepository::new(db.clone())
        .create_year(
            scheme_id,
            strata_core::fiscal::NewFinancialYear {
                year_label: "FY2027".to_string(),
                start_date: date(2026, 7, 1),
                end_date: date(2027, 6, 30),
                admin_opening_balance: dec!(1000.00),
                capital_opening_balance: dec!(0.00),
                is_current: true,
            },
        )
        .await
        .unwrap();

    let transactions = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let levy = account(&db, scheme_id, "4000").await;
    let repairs = account(&db, scheme_id, "6100").await;
    transactions
        .record(cash_input(
            scheme_id,
            TransactionType::Receipt,
            FundType::Admin,
            &levy,
            date(2026, 7, 15),
            dec!(500.00),
        ))
        .await
        .unwrap();
    transactions
        .record(cash_input(
            scheme_id,
            TransactionType::Payment,
            FundType::Admin,
            &repairs,
            date(2026, 8, 15),
            dec!(200.00),
        ))
        .await
        .unwrap();

    let summary = reports.fund_balance_summary(scheme_id, None).await.unwrap();
    let admin = summary.fund(FundType::Admin).unwrap();
    assert_eq!(admin.total_receipts, dec!(500.00));
    assert_eq!(admin.total_payments, dec!(200.00));
    assert_eq!(admin.closing_balance, dec!(1300.00));

    let statement = reports
        .income_statement(scheme_id, date(2026, 7, 1), date(2026, 7, 31))
        .await
        .unwrap();
    assert_eq!(statement.combined.total_income, dec!(500.00));
    assert_eq!(statement.combined.total_expenses, dec!(0));
}
