//! Reconciliation state machine and manual override rules.
//!
//! `uploaded -> lines_imported -> in_progress -> reconciled`. Once a
//! statement is reconciled every mutation is rejected.

use rust_decimal::Decimal;
use strata_shared::types::{BankStatementId, TransactionId};

use super::error::ReconciliationError;
use super::types::{
    BankStatement, BankStatementLine, LineAmount, Reconciliation, ReconciliationStatus,
    ReconciliationSummary, StatementStatus,
};
use crate::ledger::Transaction;

/// Outcome of validating a manual match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchChange {
    /// The line already points at this transaction.
    Unchanged,
    /// The link must be written.
    Link(TransactionId),
}

/// Stateless reconciliation rules.
pub struct ReconciliationWorkflow;

impl ReconciliationWorkflow {
    /// Derives the statement's place in the lifecycle.
    #[must_use]
    pub fn status(
        statement: &BankStatement,
        reconciliation: Option<&Reconciliation>,
    ) -> StatementStatus {
        match reconciliation.map(|r| r.status) {
            Some(ReconciliationStatus::Reconciled) => StatementStatus::Reconciled,
            Some(ReconciliationStatus::InProgress) => StatementStatus::InProgress,
            None if statement.imported_at.is_some() => StatementStatus::LinesImported,
            None => StatementStatus::Uploaded,
        }
    }

    /// Rejects changes to a finalised statement.
    ///
    /// # Errors
    ///
    /// Returns `StatementFinalized` once reconciled.
    pub fn ensure_open(
        statement_id: BankStatementId,
        reconciliation: Option<&Reconciliation>,
    ) -> Result<(), ReconciliationError> {
        if reconciliation.is_some_and(Reconciliation::is_finalized) {
            return Err(ReconciliationError::StatementFinalized(statement_id));
        }
        Ok(())
    }

    /// Validates starting a reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `StatementFinalized` or `AlreadyStarted` when a
    /// reconciliation exists.
    pub fn validate_start(
        statement_id: BankStatementId,
        reconciliation: Option<&Reconciliation>,
    ) -> Result<(), ReconciliationError> {
        Self::ensure_open(statement_id, reconciliation)?;
        if reconciliation.is_some() {
            return Err(ReconciliationError::AlreadyStarted(statement_id));
        }
        Ok(())
    }

    /// Validates linking `line` to `transaction`.
    ///
    /// `other_line` is the line the transaction is currently matched to,
    /// if any.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for a voided transaction, `FundMismatch`
    /// when scheme or fund differ from the statement's, `IncompatibleTransaction`
    /// when the direction disagrees, `LineMarkedNonLedger`,
    /// `LineAlreadyMatched` when the line points elsewhere and
    /// `TransactionAlreadyMatched` when the transaction is taken.
    pub fn validate_match(
        statement: &BankStatement,
        line: &BankStatementLine,
        transaction: &Transaction,
        other_line: Option<&BankStatementLine>,
    ) -> Result<MatchChange, ReconciliationError> {
        if transaction.is_voided() {
            return Err(ReconciliationError::TransactionNotFound(transaction.id));
        }
        if transaction.scheme_id != statement.scheme_id
            || transaction.fund_type != statement.fund_type
        {
            return Err(ReconciliationError::FundMismatch {
                transaction_id: transaction.id,
                statement_fund: statement.fund_type,
            });
        }

        let compatible = line
            .amount()
            .is_some_and(|a| a.expected_transaction_type() == transaction.transaction_type);
        if !compatible {
            return Err(ReconciliationError::IncompatibleTransaction {
                line_id: line.id,
                transaction_type: transaction.transaction_type,
            });
        }

        if line.non_ledger_category.is_some() {
            return Err(ReconciliationError::LineMarkedNonLedger(line.id));
        }

        match line.matched_transaction_id {
            Some(current) if current == transaction.id => return Ok(MatchChange::Unchanged),
            Some(current) => {
                return Err(ReconciliationError::LineAlreadyMatched {
                    line_id: line.id,
                    transaction_id: current,
                });
            }
            None => {}
        }

        if other_line.is_some_and(|other| other.id != line.id) || transaction.is_reconciled {
            return Err(ReconciliationError::TransactionAlreadyMatched(transaction.id));
        }

        Ok(MatchChange::Link(transaction.id))
    }

    /// Validates clearing a line's match, returning the transaction to unmark.
    ///
    /// # Errors
    ///
    /// Returns `LineNotMatched` if the line has no match.
    pub fn validate_unmatch(line: &BankStatementLine) -> Result<TransactionId, ReconciliationError> {
        line.matched_transaction_id
            .ok_or(ReconciliationError::LineNotMatched(line.id))
    }

    /// Validates marking a line as a non-ledger item.
    ///
    /// # Errors
    ///
    /// Returns `LineAlreadyMatched` if the line is matched.
    pub fn validate_mark_non_ledger(line: &BankStatementLine) -> Result<(), ReconciliationError> {
        match line.matched_transaction_id {
            Some(transaction_id) => Err(ReconciliationError::LineAlreadyMatched {
                line_id: line.id,
                transaction_id,
            }),
            None => Ok(()),
        }
    }

    /// Validates finalisation: every line matched or marked non-ledger.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedLines` listing the outstanding line numbers.
    pub fn validate_finalize(lines: &[BankStatementLine]) -> Result<(), ReconciliationError> {
        let mut line_numbers: Vec<u32> = lines
            .iter()
            .filter(|l| !l.is_resolved())
            .map(|l| l.line_number)
            .collect();
        if line_numbers.is_empty() {
            return Ok(());
        }
        line_numbers.sort_unstable();
        Err(ReconciliationError::UnresolvedLines {
            count: line_numbers.len(),
            line_numbers,
        })
    }

    /// Summarises progress and checks the statement's own arithmetic.
    #[must_use]
    pub fn summary(
        statement: &BankStatement,
        reconciliation: Option<&Reconciliation>,
        lines: &[BankStatementLine],
    ) -> ReconciliationSummary {
        let (total_debits, total_credits) = lines.iter().filter_map(BankStatementLine::amount).fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(dr, cr), amount| match amount {
                LineAmount::Debit(v) => (dr + v, cr),
                LineAmount::Credit(v) => (dr, cr + v),
            },
        );
        let matched_lines = lines.iter().filter(|l| l.is_matched()).count();
        let non_ledger_lines = lines
            .iter()
            .filter(|l| !l.is_matched() && l.non_ledger_category.is_some())
            .count();
        let expected_closing_balance = statement.opening_balance + total_credits - total_debits;

        ReconciliationSummary {
            status: Self::status(statement, reconciliation),
            total_lines: lines.len(),
            matched_lines,
            non_ledger_lines,
            outstanding_lines: lines.len() - matched_lines - non_ledger_lines,
            total_debits,
            total_credits,
            expected_closing_balance,
            balance_difference: statement.closing_balance - expected_closing_balance,
        }
    }
}
