//! Ledger service for transaction validation and line derivation.
//!
//! Pure business logic: the repository loads the scheme's effective chart,
//! calls [`LedgerService::prepare`], and stores the result together with its
//! lines in one database transaction.

use rust_decimal::Decimal;
use strata_shared::types::{AccountId, has_cent_precision};

use super::derivation::{PostingAccounts, derive_lines, ensure_balanced};
use super::error::LedgerError;
use super::types::{
    PaymentMethod, PreparedTransaction, RecordTransactionInput, Transaction, TransactionType,
};
use crate::accounts::{Account, AccountType, EffectiveChart, FundType};

/// Ledger service for transaction validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates a transaction and derives its ledger lines.
    ///
    /// Steps:
    /// 1. Amount is positive with cent precision; GST lies in `[0, amount]`
    /// 2. Receipts and payments name a category of the right type;
    ///    journals name two distinct accounts
    /// 3. Every account is visible, active and allowed in the fund
    /// 4. The fund's trust account exists
    /// 5. Lines are derived and must balance
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` encountered. Nothing is written on error.
    pub fn prepare(
        input: &RecordTransactionInput,
        chart: &EffectiveChart,
        default_payment_method: PaymentMethod,
    ) -> Result<PreparedTransaction, LedgerError> {
        Self::validate_amounts(input.amount, input.gst_amount)?;

        let description = input.description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        let fund = input.fund_type;
        let (posting, category_id) = match input.transaction_type {
            TransactionType::Receipt | TransactionType::Payment => {
                if input.journal.is_some() {
                    return Err(LedgerError::UnexpectedJournalAccounts(
                        input.transaction_type,
                    ));
                }
                let category_id = input
                    .category_id
                    .ok_or(LedgerError::MissingCategory(input.transaction_type))?;
                let category = Self::postable_account(chart, category_id, fund)?;
                Self::check_category_type(category, input.transaction_type)?;

                let trust = chart
                    .trust_account(fund)
                    .ok_or(LedgerError::TrustAccountMissing(fund))?;

                (
                    PostingAccounts::Cash {
                        trust_account_id: trust.id,
                        category_id,
                    },
                    category_id,
                )
            }
            TransactionType::Journal => {
                let journal = input.journal.ok_or(LedgerError::MissingJournalAccounts)?;
                if journal.debit_account_id == journal.credit_account_id {
                    return Err(LedgerError::SameJournalAccount(journal.debit_account_id));
                }
                Self::postable_account(chart, journal.debit_account_id, fund)?;
                Self::postable_account(chart, journal.credit_account_id, fund)?;

                (
                    PostingAccounts::Journal {
                        debit_account_id: journal.debit_account_id,
                        credit_account_id: journal.credit_account_id,
                    },
                    journal.debit_account_id,
                )
            }
        };

        let lines = derive_lines(input.transaction_type, input.amount, posting);
        let totals = ensure_balanced(&lines)?;

        let payment_method = (input.transaction_type == TransactionType::Payment).then(|| {
            PaymentMethod::resolve(input.payment_method.as_deref(), default_payment_method)
        });

        Ok(PreparedTransaction {
            scheme_id: input.scheme_id,
            transaction_date: input.transaction_date,
            transaction_type: input.transaction_type,
            fund_type: fund,
            category_id,
            amount: input.amount,
            gst_amount: input.gst_amount,
            description: description.to_string(),
            reference: input
                .reference
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            payment_method,
            lines,
            totals,
        })
    }

    /// Checks that a stored transaction may be voided.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if already voided and
    /// `TransactionReconciled` if it has been reconciled.
    pub fn validate_void(transaction: &Transaction) -> Result<(), LedgerError> {
        if transaction.is_voided() {
            return Err(LedgerError::TransactionNotFound(transaction.id));
        }
        if transaction.is_reconciled {
            return Err(LedgerError::TransactionReconciled(transaction.id));
        }
        Ok(())
    }

    /// Validates the gross amount and GST component.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount`, `NegativeAmount`, `ExcessPrecision` or `InvalidGst`.
    pub fn validate_amounts(amount: Decimal, gst: Decimal) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount(amount));
        }
        if !has_cent_precision(amount) {
            return Err(LedgerError::ExcessPrecision(amount));
        }
        if gst.is_sign_negative() || gst > amount {
            return Err(LedgerError::InvalidGst { gst, amount });
        }
        if !has_cent_precision(gst) {
            return Err(LedgerError::ExcessPrecision(gst));
        }
        Ok(())
    }

    fn postable_account(
        chart: &EffectiveChart,
        account_id: AccountId,
        fund: FundType,
    ) -> Result<&Account, LedgerError> {
        let account = chart
            .find(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        if !account.is_active {
            return Err(LedgerError::AccountInactive(account_id));
        }
        if !account.accepts_fund(fund)
            && let Some(account_fund) = account.fund_type
        {
            return Err(LedgerError::FundMismatch {
                account_id,
                account_fund,
                transaction_fund: fund,
            });
        }
        Ok(account)
    }

    fn check_category_type(
        category: &Account,
        transaction_type: TransactionType,
    ) -> Result<(), LedgerError> {
        let expected = match transaction_type {
            TransactionType::Receipt => AccountType::Income,
            TransactionType::Payment => AccountType::Expense,
            TransactionType::Journal => return Ok(()),
        };
        if category.account_type == expected {
            Ok(())
        } else {
            Err(LedgerError::InvalidCategoryType {
                account_id: category.id,
                transaction_type,
                expected,
                actual: category.account_type,
            })
        }
    }
}
