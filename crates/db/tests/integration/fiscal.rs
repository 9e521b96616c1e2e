use futures::future::join_all;
use rust_decimal_macros::dec;
use strata_core::accounts::{AccountChanges, AccountType, ChartError, FundType, NewAccount};
use strata_core::fiscal::{FiscalError, NewFinancialYear};
use strata_db::{AccountRepository, FinancialYearRepository, RepositoryError};
use strata_shared::types::SchemeId;

use crate::common::{account, connect, date};

fn year(label: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> NewFinancialYear {
    NewFinancialYear {
        year_label: label.to_string(),
        start_date: date(start.0, start.1, start.2),
        end_date: date(end.0, end.1, end.2),
        admin_opening_balance: dec!(1000.00),
        capital_opening_balance: dec!(5000.00),
        is_current: false,
    }
}

// ============================================================================
// Financial years
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_first_year_becomes_current() {
    let db = connect().await;
    let repo = FinancialYearRepository::new(db);
    let scheme_id = SchemeId::new();

    let fy = repo
        .create_year(scheme_id, year("FY2026", (2025, 7, 1), (2026, 6, 30)))
        .await
        .unwrap();

    assert!(fy.is_current);
    assert_eq!(repo.current_year(scheme_id).await.unwrap(), Some(fy));
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_overlapping_year_is_rejected_with_label() {
    let db = connect().await;
    let repo = FinancialYearRepository::new(db);
    let scheme_id = SchemeId::new();

    repo.create_year(scheme_id, year("FY2026", (2025, 7, 1), (2026, 6, 30)))
        .await
        .unwrap();
    let err = repo
        .create_year(scheme_id, year("CY2026", (2026, 1, 1), (2026, 12, 31)))
        .await
        .unwrap_err();

    match err {
        RepositoryError::Fiscal(FiscalError::Overlap { year_label, .. }) => {
            assert_eq!(year_label, "FY2026");
        }
        other => panic!("Expected Overlap, got {other:?}"),
    }
    assert_eq!(repo.list_years(scheme_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_set_current_moves_the_marker() {
    let db = connect().await;
    let repo = FinancialYearRepository::new(db);
    let scheme_id = SchemeId::new();

    let first = repo
        .create_year(scheme_id, year("FY2026", (2025, 7, 1), (2026, 6, 30)))
        .await
        .unwrap();
    let second = repo
        .create_year(scheme_id, year("FY2027", (2026, 7, 1), (2027, 6, 30)))
        .await
        .unwrap();
    assert!(!second.is_current);

    repo.set_current(scheme_id, second.id).await.unwrap();

    let years = repo.list_years(scheme_id).await.unwrap();
    let current: Vec<_> = years.iter().filter(|y| y.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, second.id);
    assert_eq!(years[0].id, second.id, "newest first");
    assert!(!repo.find_year(scheme_id, first.id).await.unwrap().is_current);

    let containing = repo
        .year_containing(scheme_id, date(2025, 12, 25))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(containing.id, first.id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_concurrent_set_current_leaves_one_current_year() {
    let db = connect().await;
    let repo = FinancialYearRepository::new(db);
    let scheme_id = SchemeId::new();

    let mut years = Vec::new();
    for (label, start_year) in [("FY2025", 2024), ("FY2026", 2025), ("FY2027", 2026)] {
        let fy = repo
            .create_year(
                scheme_id,
                year(label, (start_year, 7, 1), (start_year + 1, 6, 30)),
            )
            .await
            .unwrap();
        years.push(fy.id);
    }

    for _ in 0..10 {
        let results = join_all(years.iter().map(|id| repo.set_current(scheme_id, *id))).await;
        assert!(results.iter().all(Result::is_ok), "{results:?}");

        let current = repo
            .list_years(scheme_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|y| y.is_current)
            .count();
        assert_eq!(current, 1);
    }
}

// ============================================================================
// Chart of accounts
// ============================================================================

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_scheme_account_lifecycle() {
    let db = connect().await;
    let repo = AccountRepository::new(db);
    let scheme_id = SchemeId::new();

    let created = repo
        .create_account(
            scheme_id,
            NewAccount {
                code: "6500".to_string(),
                name: "Gardening".to_string(),
                account_type: AccountType::Expense,
                fund_type: Some(FundType::Admin),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.scheme_id, Some(scheme_id));

    let duplicate = repo
        .create_account(
            scheme_id,
            NewAccount {
                code: "6500".to_string(),
                name: "Landscaping".to_string(),
                account_type: AccountType::Expense,
                fund_type: None,
                parent_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        duplicate,
        RepositoryError::Chart(ChartError::DuplicateCode(_))
    ));

    let renamed = repo
        .update_account(
            scheme_id,
            created.id,
            AccountChanges {
                name: Some("Grounds Maintenance".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Grounds Maintenance");

    repo.soft_delete_account(scheme_id, created.id).await.unwrap();
    let active = repo.list_effective_accounts(scheme_id).await.unwrap();
    assert!(active.iter().all(|a| a.id != created.id));
    assert!(active.iter().any(|a| a.code == "1000"), "defaults stay visible");

    // Another scheme never sees it.
    let other = repo.find_account(SchemeId::new(), created.id).await;
    assert!(matches!(
        other,
        Err(RepositoryError::Chart(ChartError::AccountNotFound(_)))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_organisation_defaults_are_read_only_for_schemes() {
    let db = connect().await;
    let repo = AccountRepository::new(db.clone());
    let scheme_id = SchemeId::new();
    let neighbour = SchemeId::new();
    let management_fees = account(&db, scheme_id, "6200").await;
    assert_eq!(management_fees.scheme_id, None);

    let err = repo
        .update_account(
            scheme_id,
            management_fees.id,
            AccountChanges {
                name: Some("Renamed by one scheme".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Chart(ChartError::DefaultAccountReadOnly(ref code)) if code == "6200"
    ));

    let err = repo
        .soft_delete_account(scheme_id, management_fees.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Chart(ChartError::DefaultAccountReadOnly(_))
    ));

    let seen_by_neighbour = account(&db, neighbour, "6200").await;
    assert_eq!(seen_by_neighbour.id, management_fees.id);
    assert_eq!(seen_by_neighbour.name, management_fees.name);
    assert!(seen_by_neighbour.is_active);

    // The scheme customises the default by overriding its code instead.
    let own = repo
        .create_account(
            scheme_id,
            NewAccount {
                code: "6200".to_string(),
                name: "Strata Management Fees".to_string(),
                account_type: AccountType::Expense,
                fund_type: Some(FundType::Admin),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(account(&db, scheme_id, "6200").await.id, own.id);
    assert_eq!(account(&db, neighbour, "6200").await.id, management_fees.id);
}
