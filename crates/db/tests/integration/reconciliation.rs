use futures::future::join_all;
use rust_decimal_macros::dec;
use strata_core::accounts::FundType;
use strata_core::ledger::{LedgerError, TransactionType};
use strata_core::reconciliation::{
    IngestStatementInput, MatchOutcome, NonLedgerCategory, ReconciliationError, StatementStatus,
};
use strata_db::{ReconciliationRepository, RepositoryError, TransactionRepository};
use strata_shared::config::{LedgerConfig, ReconciliationConfig};
use strata_shared::types::SchemeId;

use crate::common::{account, cash_input, connect, date};

const MARCH_STATEMENT: &str = "Date,Description,Debit,Credit,Balance\n\
                               01/03/2026,Levy lot 1,,450.00,10450.00\n\
                               02/03/2026,Levy lot 2,,450.00,10900.00\n\
                               ,Unknown,,,\n\
                               04/03/2026,Insurance premium,880.00,,10020.00\n\
                               05/03/2026,Account fee,2.50,,10017.50\n";

fn march_input(scheme_id: SchemeId) -> IngestStatementInput {
    IngestStatementInput {
        scheme_id,
        fund_type: FundType::Admin,
        statement_date: date(2026, 3, 31),
        raw_text: MARCH_STATEMENT.to_string(),
        opening_balance: None,
        closing_balance: None,
    }
}

// ============================================================================
// Full cycle: ingest, propose, apply, resolve, finalise
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_statement_reconciles_end_to_end() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let ledger = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let repo = ReconciliationRepository::new(db.clone(), &ReconciliationConfig::default());
    let levy = account(&db, scheme_id, "4000").await;
    let insurance = account(&db, scheme_id, "6000").await;

    let mut ids = Vec::new();
    for (day, amount, category, kind) in [
        (1, dec!(450.00), &levy, TransactionType::Receipt),
        (2, dec!(450.00), &levy, TransactionType::Receipt),
        (3, dec!(880.00), &insurance, TransactionType::Payment),
    ] {
        let recorded = ledger
            .record(cash_input(
                scheme_id,
                kind,
                FundType::Admin,
                category,
                date(2026, 3, day),
                amount,
            ))
            .await
            .unwrap();
        ids.push(recorded.transaction.id);
    }

    let import = repo.ingest_statement(march_input(scheme_id)).await.unwrap();
    assert_eq!(import.lines.len(), 4);
    assert_eq!(import.skipped.len(), 1);
    assert_eq!(import.statement.opening_balance, dec!(10000.00));
    let statement_id = import.statement.id;

    let view = repo.statement_state(scheme_id, statement_id).await.unwrap();
    assert_eq!(view.status(), StatementStatus::LinesImported);

    let proposals = repo.propose_matches(scheme_id, statement_id).await.unwrap();
    let proposed: Vec<_> = proposals
        .iter()
        .filter_map(|p| p.proposed_transaction())
        .collect();
    assert_eq!(proposed, ids);
    assert_eq!(
        proposals.last().map(|p| &p.outcome),
        Some(&MatchOutcome::NoCandidate)
    );

    let changed = repo
        .apply_proposals(scheme_id, statement_id, &proposals)
        .await
        .unwrap();
    assert_eq!(changed.len(), 3);

    let premature = repo.reconcile(scheme_id, statement_id).await.unwrap_err();
    match premature {
        RepositoryError::Reconciliation(ReconciliationError::UnresolvedLines {
            line_numbers,
            ..
        }) => assert_eq!(line_numbers, vec![5]),
        other => panic!("Expected UnresolvedLines, got {other:?}"),
    }

    let fee_line = import.lines.last().unwrap().id;
    repo.mark_non_ledger(scheme_id, statement_id, fee_line, NonLedgerCategory::BankFee)
        .await
        .unwrap();

    let summary = repo.summary(scheme_id, statement_id).await.unwrap();
    assert_eq!(summary.status, StatementStatus::InProgress);
    assert!(summary.is_complete());
    assert_eq!(summary.balance_difference, dec!(0));

    let reconciliation = repo.reconcile(scheme_id, statement_id).await.unwrap();
    assert!(reconciliation.reconciled_at.is_some());

    let frozen = repo
        .unmatch_line(scheme_id, statement_id, import.lines[0].id)
        .await;
    assert!(matches!(
        frozen,
        Err(RepositoryError::Reconciliation(
            ReconciliationError::StatementFinalized(_)
        ))
    ));

    let void = ledger.void(scheme_id, ids[0]).await;
    assert!(matches!(
        void,
        Err(RepositoryError::Ledger(LedgerError::TransactionReconciled(_)))
    ));
}

// ============================================================================
// Manual overrides
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_manual_match_and_unmatch_toggle_reconciled_flag() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let ledger = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let repo = ReconciliationRepository::new(db.clone(), &ReconciliationConfig::default());
    let levy = account(&db, scheme_id, "4000").await;

    let receipt = ledger
        .record(cash_input(
            scheme_id,
            TransactionType::Receipt,
            FundType::Admin,
            &levy,
            date(2026, 2, 20),
            dec!(450.00),
        ))
        .await
        .unwrap();
    let import = repo.ingest_statement(march_input(scheme_id)).await.unwrap();
    let statement_id = import.statement.id;
    let first = import.lines[0].id;
    let second = import.lines[1].id;

    repo.match_line(scheme_id, statement_id, first, receipt.transaction.id)
        .await
        .unwrap();
    let tx = ledger
        .find_transaction(scheme_id, receipt.transaction.id)
        .await
        .unwrap();
    assert!(tx.transaction.is_reconciled);

    let taken = repo
        .match_line(scheme_id, statement_id, second, receipt.transaction.id)
        .await;
    assert!(matches!(
        taken,
        Err(RepositoryError::Reconciliation(
            ReconciliationError::TransactionAlreadyMatched(_)
        ))
    ));

    let insurance_line = import.lines[2].id;
    let wrong_direction = repo
        .match_line(scheme_id, statement_id, insurance_line, receipt.transaction.id)
        .await;
    assert!(matches!(
        wrong_direction,
        Err(RepositoryError::Reconciliation(
            ReconciliationError::IncompatibleTransaction { .. }
        ))
    ));

    let line = repo.unmatch_line(scheme_id, statement_id, first).await.unwrap();
    assert_eq!(line.matched_transaction_id, None);
    let tx = ledger
        .find_transaction(scheme_id, receipt.transaction.id)
        .await
        .unwrap();
    assert!(!tx.transaction.is_reconciled);

    let again = repo.start_reconciliation(scheme_id, statement_id).await;
    assert!(matches!(
        again,
        Err(RepositoryError::Reconciliation(
            ReconciliationError::AlreadyStarted(_)
        ))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_equidistant_candidates_need_manual_selection() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let ledger = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let repo = ReconciliationRepository::new(db.clone(), &ReconciliationConfig::default());
    let repairs = account(&db, scheme_id, "6100").await;

    for day in [8, 12] {
        ledger
            .record(cash_input(
                scheme_id,
                TransactionType::Payment,
                FundType::Admin,
                &repairs,
                date(2026, 4, day),
                dec!(250.00),
            ))
            .await
            .unwrap();
    }
    let import = repo
        .ingest_statement(IngestStatementInput {
            scheme_id,
            fund_type: FundType::Admin,
            statement_date: date(2026, 4, 30),
            raw_text: "Date,Description,Debit,Credit\n10/04/2026,Plumber,250.00,\n".to_string(),
            opening_balance: Some(dec!(1000.00)),
            closing_balance: Some(dec!(750.00)),
        })
        .await
        .unwrap();

    let proposals = repo
        .propose_matches(scheme_id, import.statement.id)
        .await
        .unwrap();
    assert_eq!(proposals.len(), 1);
    assert!(matches!(
        &proposals[0].outcome,
        MatchOutcome::Ambiguous { transaction_ids } if transaction_ids.len() == 2
    ));

    let applied = repo
        .apply_proposals(scheme_id, import.statement.id, &proposals)
        .await
        .unwrap();
    assert!(applied.is_empty());
}

// ============================================================================
// Concurrency: one transaction, two lines, simultaneous matches
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_concurrent_matches_claim_transaction_once() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let ledger = TransactionRepository::new(db.clone(), &LedgerConfig::default());
    let repo = ReconciliationRepository::new(db.clone(), &ReconciliationConfig::default());
    let levy = account(&db, scheme_id, "4000").await;

    let receipt = ledger
        .record(cash_input(
            scheme_id,
            TransactionType::Receipt,
            FundType::Admin,
            &levy,
            date(2026, 3, 1),
            dec!(450.00),
        ))
        .await
        .unwrap();
    let import = repo.ingest_statement(march_input(scheme_id)).await.unwrap();
    let statement_id = import.statement.id;

    let attempts = import.lines[..2].iter().map(|line| {
        let repo = repo.clone();
        let line_id = line.id;
        let transaction_id = receipt.transaction.id;
        async move {
            repo.match_line(scheme_id, statement_id, line_id, transaction_id)
                .await
        }
    });
    let results = join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(RepositoryError::Reconciliation(
            ReconciliationError::TransactionAlreadyMatched(_)
        ))
    )));

    let view = repo.statement_state(scheme_id, statement_id).await.unwrap();
    assert_eq!(view.summary.matched_lines, 1);
}
