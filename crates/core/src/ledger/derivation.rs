//! Double-entry line derivation.
//!
//! Every transaction produces exactly one debit line and one credit line of
//! the full gross amount:
//!
//! | type    | debit            | credit           |
//! |---------|------------------|------------------|
//! | receipt | trust account    | category         |
//! | payment | category         | trust account    |
//! | journal | journal debit    | journal credit   |

use rust_decimal::Decimal;
use strata_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{DerivedLine, LineSide, LineTotals, TransactionType};

/// The accounts a transaction posts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingAccounts {
    /// Receipts and payments: the fund's cash account and the category.
    Cash {
        /// Fund's cash-at-bank account.
        trust_account_id: AccountId,
        /// Income or expense category.
        category_id: AccountId,
    },
    /// Journals: explicit debit and credit accounts.
    Journal {
        /// Account debited.
        debit_account_id: AccountId,
        /// Account credited.
        credit_account_id: AccountId,
    },
}

/// Derives the two ledger lines of a transaction.
#[must_use]
pub fn derive_lines(
    transaction_type: TransactionType,
    amount: Decimal,
    accounts: PostingAccounts,
) -> Vec<DerivedLine> {
    let (debit, credit) = match accounts {
        PostingAccounts::Cash {
            trust_account_id,
            category_id,
        } => match transaction_type {
            TransactionType::Receipt => (trust_account_id, category_id),
            TransactionType::Payment | TransactionType::Journal => (category_id, trust_account_id),
        },
        PostingAccounts::Journal {
            debit_account_id,
            credit_account_id,
        } => (debit_account_id, credit_account_id),
    };

    vec![
        DerivedLine {
            account_id: debit,
            side: LineSide::Debit,
            amount,
        },
        DerivedLine {
            account_id: credit,
            side: LineSide::Credit,
            amount,
        },
    ]
}

/// Sums debit and credit lines.
pub fn calculate_totals<'a, I>(lines: I) -> LineTotals
where
    I: IntoIterator<Item = (LineSide, &'a Decimal)>,
{
    let (total_debit, total_credit) =
        lines
            .into_iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(dr, cr), (side, amount)| match side {
                LineSide::Debit => (dr + *amount, cr),
                LineSide::Credit => (dr, cr + *amount),
            });

    LineTotals {
        total_debit,
        total_credit,
        is_balanced: total_debit == total_credit,
    }
}

/// Checks that derived lines balance.
///
/// # Errors
///
/// Returns `LedgerError::Imbalance` with both totals when they differ.
pub fn ensure_balanced(lines: &[DerivedLine]) -> Result<LineTotals, LedgerError> {
    let totals = calculate_totals(lines.iter().map(|l| (l.side, &l.amount)));
    if totals.is_balanced {
        Ok(totals)
    } else {
        Err(LedgerError::Imbalance {
            debit: totals.total_debit,
            credit: totals.total_credit,
        })
    }
}
