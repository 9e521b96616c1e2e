//! Property-based tests for LedgerService.
//!
//! - Every accepted transaction has exactly two balanced lines of the gross amount.
//! - GST outside `[0, amount]` is always rejected.

use proptest::prelude::*;
use rust_decimal::Decimal;
use strata_shared::types::{AccountId, SchemeId};

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{LineSide, PaymentMethod, RecordTransactionInput, TransactionType};
use crate::accounts::{Account, AccountType, EffectiveChart, FundType};

/// Strategy to generate positive cent amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn fund_strategy() -> impl Strategy<Value = FundType> {
    prop_oneof![Just(FundType::Admin), Just(FundType::CapitalWorks)]
}

fn cash_type_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Receipt), Just(TransactionType::Payment)]
}

fn account(code: &str, account_type: AccountType, fund_type: Option<FundType>) -> Account {
    Account {
        id: AccountId::new(),
        scheme_id: None,
        code: code.to_string(),
        name: code.to_string(),
        account_type,
        fund_type,
        parent_id: None,
        is_system: false,
        is_active: true,
    }
}

/// Chart with both trust accounts and one unrestricted income and expense category.
fn chart(scheme_id: SchemeId) -> (EffectiveChart, AccountId, AccountId) {
    let income = account("4300", AccountType::Income, None);
    let expense = account("6400", AccountType::Expense, None);
    let ids = (income.id, expense.id);
    let chart = EffectiveChart::merge(
        scheme_id,
        vec![
            account("1000", AccountType::Asset, Some(FundType::Admin)),
            account("1100", AccountType::Asset, Some(FundType::CapitalWorks)),
            income,
            expense,
        ],
        vec![],
    );
    (chart, ids.0, ids.1)
}

fn make_input(
    scheme_id: SchemeId,
    transaction_type: TransactionType,
    fund_type: FundType,
    category_id: AccountId,
    amount: Decimal,
    gst_amount: Decimal,
) -> RecordTransactionInput {
    RecordTransactionInput {
        scheme_id,
        transaction_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        transaction_type,
        fund_type,
        category_id: Some(category_id),
        journal: None,
        amount,
        gst_amount,
        description: "Generated".to_string(),
        reference: None,
        payment_method: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_prepared_lines_balance(
        amount in positive_amount(),
        fund in fund_strategy(),
        tx_type in cash_type_strategy(),
    ) {
        let scheme_id = SchemeId::new();
        let (chart, income, expense) = chart(scheme_id);
        let category = if tx_type == TransactionType::Receipt { income } else { expense };

        let prepared = LedgerService::prepare(
            &make_input(scheme_id, tx_type, fund, category, amount, Decimal::ZERO),
            &chart,
            PaymentMethod::Eft,
        ).unwrap();

        prop_assert_eq!(prepared.lines.len(), 2);
        prop_assert!(prepared.totals.is_balanced);
        prop_assert_eq!(prepared.totals.total_debit, amount);
        prop_assert_eq!(
            prepared.lines.iter().filter(|l| l.side == LineSide::Debit).count(),
            1
        );

        let trust = chart.trust_account(fund).unwrap().id;
        prop_assert!(prepared.lines.iter().any(|l| l.account_id == trust));
    }

    #[test]
    fn prop_gst_above_amount_rejected(
        amount in positive_amount(),
        excess in 1i64..10_000i64,
    ) {
        let gst = amount + Decimal::new(excess, 2);
        let result = LedgerService::validate_amounts(amount, gst);
        prop_assert!(matches!(result, Err(LedgerError::InvalidGst { .. })), "expected InvalidGst");
    }

    #[test]
    fn prop_gst_within_amount_accepted(
        cents in 1i64..100_000_000i64,
        share in 0i64..=100i64,
    ) {
        let amount = Decimal::new(cents, 2);
        let gst = Decimal::new(cents * share / 100, 2);
        prop_assert!(LedgerService::validate_amounts(amount, gst).is_ok());
    }
}
