//! Report tests, including property tests over generated ledgers.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strata_shared::types::{AccountId, FinancialYearId, SchemeId, TransactionId, TransactionLineId};

use super::error::ReportError;
use super::service::ReportService;
use super::types::{FundMovement, PostedLine};
use crate::accounts::{Account, AccountType, EffectiveChart, FundType};
use crate::fiscal::FinancialYear;
use crate::ledger::{
    LedgerService, LineSide, PaymentMethod, PreparedTransaction, RecordTransactionInput,
    TransactionLine, TransactionType,
};

struct Ledger {
    scheme_id: SchemeId,
    chart: EffectiveChart,
    levy_income: AccountId,
    interest: AccountId,
    insurance: AccountId,
    capital_works: AccountId,
}

fn account(code: &str, account_type: AccountType, fund_type: Option<FundType>) -> Account {
    Account {
        id: AccountId::new(),
        scheme_id: None,
        code: code.to_string(),
        name: format!("Account {code}"),
        account_type,
        fund_type,
        parent_id: None,
        is_system: false,
        is_active: true,
    }
}

fn ledger() -> Ledger {
    let scheme_id = SchemeId::new();
    let levy_income = account("4000", AccountType::Income, Some(FundType::Admin));
    let interest = account("4200", AccountType::Income, None);
    let insurance = account("6000", AccountType::Expense, Some(FundType::Admin));
    let capital_works = account("7000", AccountType::Expense, Some(FundType::CapitalWorks));
    let ids = (levy_income.id, interest.id, insurance.id, capital_works.id);

    let chart = EffectiveChart::merge(
        scheme_id,
        vec![
            account("1000", AccountType::Asset, Some(FundType::Admin)),
            account("1100", AccountType::Asset, Some(FundType::CapitalWorks)),
            levy_income,
            interest,
            insurance,
            capital_works,
        ],
        vec![],
    );

    Ledger {
        scheme_id,
        chart,
        levy_income: ids.0,
        interest: ids.1,
        insurance: ids.2,
        capital_works: ids.3,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(
    ledger: &Ledger,
    on: NaiveDate,
    transaction_type: TransactionType,
    fund_type: FundType,
    category_id: AccountId,
    amount: Decimal,
) -> PreparedTransaction {
    LedgerService::prepare(
        &RecordTransactionInput {
            scheme_id: ledger.scheme_id,
            transaction_date: on,
            transaction_type,
            fund_type,
            category_id: Some(category_id),
            journal: None,
            amount,
            gst_amount: Decimal::ZERO,
            description: "Test".to_string(),
            reference: None,
            payment_method: None,
        },
        &ledger.chart,
        PaymentMethod::Eft,
    )
    .unwrap()
}

fn posted(prepared: &[PreparedTransaction]) -> Vec<PostedLine> {
    prepared
        .iter()
        .flat_map(|tx| {
            let transaction_id = TransactionId::new();
            tx.lines.iter().map(move |l| PostedLine {
                transaction_id,
                transaction_date: tx.transaction_date,
                fund_type: tx.fund_type,
                account_id: l.account_id,
                side: l.side,
                amount: l.amount,
            })
        })
        .collect()
}

#[test]
fn test_levy_receipt_appears_then_disappears_when_voided() {
    let ledger = ledger();
    let receipt_input = RecordTransactionInput {
        scheme_id: ledger.scheme_id,
        transaction_date: date(2026, 2, 1),
        transaction_type: TransactionType::Receipt,
        fund_type: FundType::Admin,
        category_id: Some(ledger.levy_income),
        journal: None,
        amount: dec!(100.00),
        gst_amount: dec!(9.09),
        description: "Levy lot 4".to_string(),
        reference: None,
        payment_method: None,
    };
    let receipt = LedgerService::prepare(&receipt_input, &ledger.chart, PaymentMethod::Eft).unwrap();
    let lines = posted(&[receipt]);

    let report =
        ReportService::trial_balance(Some(date(2026, 2, 1)), &lines, ledger.chart.all()).unwrap();
    let levy = report.row("4000").unwrap();
    assert_eq!(levy.total_credit, dec!(100.00));
    assert_eq!(levy.total_debit, dec!(0));
    assert_eq!(levy.balance, dec!(-100.00));
    let cash = report.row("1000").unwrap();
    assert_eq!(cash.total_debit, dec!(100.00));
    assert!(report.totals.is_balanced);

    // Voided transactions never reach the service.
    let report = ReportService::trial_balance(Some(date(2026, 2, 1)), &[], ledger.chart.all()).unwrap();
    assert!(report.row("4000").is_none());
    assert!(report.row("1000").is_none());
    assert_eq!(report.row_count(), 0);
}

#[test]
fn test_trial_balance_respects_as_of_and_section_order() {
    let ledger = ledger();
    let lines = posted(&[
        record(&ledger, date(2026, 1, 10), TransactionType::Receipt, FundType::Admin, ledger.levy_income, dec!(500.00)),
        record(&ledger, date(2026, 1, 20), TransactionType::Payment, FundType::Admin, ledger.insurance, dec!(120.00)),
        record(&ledger, date(2026, 3, 1), TransactionType::Payment, FundType::CapitalWorks, ledger.capital_works, dec!(900.00)),
    ]);

    let report =
        ReportService::trial_balance(Some(date(2026, 1, 31)), &lines, ledger.chart.all()).unwrap();
    let order: Vec<AccountType> = report.sections.iter().map(|s| s.account_type).collect();
    assert_eq!(order, vec![AccountType::Asset, AccountType::Income, AccountType::Expense]);
    assert!(report.row("7000").is_none());
    assert_eq!(report.row("1000").unwrap().balance, dec!(380.00));
    assert_eq!(report.totals.total_debit, dec!(620.00));
    assert!(ReportService::ensure_balanced(&report).is_ok());

    let all = ReportService::trial_balance(None, &lines, ledger.chart.all()).unwrap();
    assert_eq!(all.row("1100").unwrap().balance, dec!(-900.00));
}

#[test]
fn test_unbalanced_trial_balance_is_reported() {
    let ledger = ledger();
    let mut lines = posted(&[record(
        &ledger,
        date(2026, 1, 10),
        TransactionType::Receipt,
        FundType::Admin,
        ledger.levy_income,
        dec!(500.00),
    )]);
    lines[0].amount = dec!(499.99);

    let report = ReportService::trial_balance(None, &lines, ledger.chart.all()).unwrap();
    assert!(!report.totals.is_balanced);
    let err = ReportService::ensure_balanced(&report).unwrap_err();
    assert!(matches!(err, ReportError::TrialBalanceImbalance { .. }));
}

#[test]
fn test_trial_balance_unknown_account() {
    let ledger = ledger();
    let line = PostedLine {
        transaction_id: TransactionId::new(),
        transaction_date: date(2026, 1, 1),
        fund_type: FundType::Admin,
        account_id: AccountId::new(),
        side: LineSide::Debit,
        amount: dec!(1.00),
    };
    let err = ReportService::trial_balance(None, &[line], ledger.chart.all()).unwrap_err();
    assert!(matches!(err, ReportError::AccountNotFound(_)));
}

#[test]
fn test_fund_balance_summary() {
    let year = FinancialYear {
        id: FinancialYearId::new(),
        scheme_id: SchemeId::new(),
        year_label: "FY2026".to_string(),
        start_date: date(2025, 7, 1),
        end_date: date(2026, 6, 30),
        admin_opening_balance: dec!(10000.00),
        capital_opening_balance: dec!(50000.00),
        is_current: true,
    };
    let movement = |d, t, f, a| FundMovement {
        transaction_date: d,
        transaction_type: t,
        fund_type: f,
        amount: a,
    };
    let movements = vec![
        movement(date(2025, 8, 1), TransactionType::Receipt, FundType::Admin, dec!(3000.00)),
        movement(date(2025, 9, 1), TransactionType::Payment, FundType::Admin, dec!(1200.00)),
        movement(date(2025, 9, 2), TransactionType::Journal, FundType::Admin, dec!(999.00)),
        movement(date(2026, 1, 1), TransactionType::Payment, FundType::CapitalWorks, dec!(20000.00)),
        movement(date(2026, 7, 1), TransactionType::Receipt, FundType::Admin, dec!(5000.00)),
    ];

    let summary = ReportService::fund_balance_summary(&year, &movements);
    let admin = summary.fund(FundType::Admin).unwrap();
    assert_eq!(admin.total_receipts, dec!(3000.00));
    assert_eq!(admin.total_payments, dec!(1200.00));
    assert_eq!(admin.closing_balance, dec!(11800.00));
    let capital = summary.fund(FundType::CapitalWorks).unwrap();
    assert_eq!(capital.closing_balance, dec!(30000.00));
}

#[test]
fn test_income_statement_per_fund() {
    let ledger = ledger();
    let lines = posted(&[
        record(&ledger, date(2026, 1, 10), TransactionType::Receipt, FundType::Admin, ledger.levy_income, dec!(500.00)),
        record(&ledger, date(2026, 1, 11), TransactionType::Receipt, FundType::CapitalWorks, ledger.interest, dec!(12.50)),
        record(&ledger, date(2026, 1, 20), TransactionType::Payment, FundType::Admin, ledger.insurance, dec!(120.00)),
        record(&ledger, date(2026, 1, 25), TransactionType::Payment, FundType::CapitalWorks, ledger.capital_works, dec!(300.00)),
    ]);

    let report = ReportService::income_statement(date(2026, 1, 1), date(2026, 1, 31), &lines, ledger.chart.all())
        .unwrap();
    assert_eq!(report.funds.len(), 2);

    let admin = &report.funds[0];
    assert_eq!(admin.fund_type, FundType::Admin);
    assert_eq!(admin.total_income, dec!(500.00));
    assert_eq!(admin.total_expenses, dec!(120.00));
    assert_eq!(admin.net, dec!(380.00));

    let capital = &report.funds[1];
    assert_eq!(capital.income[0].code, "4200");
    assert_eq!(capital.net, dec!(-287.50));

    assert_eq!(report.combined.total_income, dec!(512.50));
    assert_eq!(report.combined.total_expenses, dec!(420.00));
    assert_eq!(report.combined.net, dec!(92.50));
}

#[test]
fn test_income_statement_empty_period() {
    let ledger = ledger();
    let lines = posted(&[record(
        &ledger,
        date(2026, 1, 10),
        TransactionType::Receipt,
        FundType::Admin,
        ledger.levy_income,
        dec!(500.00),
    )]);
    let report =
        ReportService::income_statement(date(2026, 2, 1), date(2026, 2, 28), &lines, ledger.chart.all())
            .unwrap();
    assert!(report.is_empty());
    assert_eq!(report.combined.net, dec!(0));
}

#[test]
fn test_income_statement_rejects_inverted_range() {
    let err = ReportService::income_statement(date(2026, 2, 1), date(2026, 1, 1), &[], &[])
        .unwrap_err();
    assert!(matches!(err, ReportError::InvalidDateRange { .. }));
}

#[test]
fn test_find_unbalanced_transactions() {
    let balanced = TransactionId::new();
    let broken = TransactionId::new();
    let acct = AccountId::new();
    let line = |transaction_id, side, amount| TransactionLine {
        id: TransactionLineId::new(),
        transaction_id,
        account_id: acct,
        side,
        amount,
    };
    let lines = vec![
        line(balanced, LineSide::Debit, dec!(10.00)),
        line(balanced, LineSide::Credit, dec!(10.00)),
        line(broken, LineSide::Debit, dec!(10.00)),
    ];
    let found = ReportService::find_unbalanced(&lines);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].transaction_id, broken);
    assert_eq!(found[0].total_credit, dec!(0));
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    /// Trial balance debits equal credits for any mix of kept and voided transactions.
    #[test]
    fn prop_trial_balance_always_balances(
        entries in prop::collection::vec((amount_strategy(), 0u8..4, any::<bool>(), 0u32..28), 1..40),
    ) {
        let ledger = ledger();
        let mut kept = Vec::new();
        for (amount, kind, voided, day) in entries {
            let on = date(2026, 1, day + 1);
            let tx = match kind {
                0 => record(&ledger, on, TransactionType::Receipt, FundType::Admin, ledger.levy_income, amount),
                1 => record(&ledger, on, TransactionType::Receipt, FundType::CapitalWorks, ledger.interest, amount),
                2 => record(&ledger, on, TransactionType::Payment, FundType::Admin, ledger.insurance, amount),
                _ => record(&ledger, on, TransactionType::Payment, FundType::CapitalWorks, ledger.capital_works, amount),
            };
            if !voided {
                kept.push(tx);
            }
        }

        let lines = posted(&kept);
        let report = ReportService::trial_balance(Some(date(2026, 1, 15)), &lines, ledger.chart.all()).unwrap();
        prop_assert!(report.totals.is_balanced);
        prop_assert_eq!(report.totals.total_debit, report.totals.total_credit);
        prop_assert!(ReportService::find_unbalanced(&[]).is_empty());
    }
}
