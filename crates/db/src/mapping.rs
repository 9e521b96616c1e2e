//! Conversions from stored rows to `strata-core` domain types.

use chrono::{DateTime, FixedOffset, Utc};
use strata_core::accounts::Account;
use strata_core::fiscal::FinancialYear;
use strata_core::ledger::{Transaction, TransactionLine};
use strata_core::reconciliation::{BankStatement, BankStatementLine, MatchCandidate, Reconciliation};
use strata_shared::types::{
    AccountId, BankStatementId, BankStatementLineId, FinancialYearId, ReconciliationId, SchemeId,
    TransactionId, TransactionLineId,
};

use crate::entities::{
    accounts, bank_statement_lines, bank_statements, financial_years, reconciliations,
    transaction_lines, transactions,
};

fn utc(timestamp: DateTime<FixedOffset>) -> DateTime<Utc> {
    timestamp.with_timezone(&Utc)
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            scheme_id: model.scheme_id.map(SchemeId::from_uuid),
            code: model.code,
            name: model.name,
            account_type: model.account_type.into(),
            fund_type: model.fund_type.map(Into::into),
            parent_id: model.parent_id.map(AccountId::from_uuid),
            is_system: model.is_system,
            is_active: model.is_active,
        }
    }
}

impl From<financial_years::Model> for FinancialYear {
    fn from(model: financial_years::Model) -> Self {
        Self {
            id: FinancialYearId::from_uuid(model.id),
            scheme_id: SchemeId::from_uuid(model.scheme_id),
            year_label: model.year_label,
            start_date: model.start_date,
            end_date: model.end_date,
            admin_opening_balance: model.admin_opening_balance,
            capital_opening_balance: model.capital_opening_balance,
            is_current: model.is_current,
        }
    }
}

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: TransactionId::from_uuid(model.id),
            scheme_id: SchemeId::from_uuid(model.scheme_id),
            transaction_date: model.transaction_date,
            transaction_type: model.transaction_type.into(),
            fund_type: model.fund_type.into(),
            category_id: AccountId::from_uuid(model.category_id),
            amount: model.amount,
            gst_amount: model.gst_amount,
            description: model.description,
            reference: model.reference,
            payment_method: model.payment_method.map(Into::into),
            is_reconciled: model.is_reconciled,
            deleted_at: model.deleted_at.map(utc),
            created_at: utc(model.created_at),
        }
    }
}

impl From<&transactions::Model> for MatchCandidate {
    fn from(model: &transactions::Model) -> Self {
        Self {
            transaction_id: TransactionId::from_uuid(model.id),
            transaction_type: model.transaction_type.into(),
            transaction_date: model.transaction_date,
            amount: model.amount,
        }
    }
}

impl From<transaction_lines::Model> for TransactionLine {
    fn from(model: transaction_lines::Model) -> Self {
        Self {
            id: TransactionLineId::from_uuid(model.id),
            transaction_id: TransactionId::from_uuid(model.transaction_id),
            account_id: AccountId::from_uuid(model.account_id),
            side: model.side.into(),
            amount: model.amount,
        }
    }
}

impl From<bank_statements::Model> for BankStatement {
    fn from(model: bank_statements::Model) -> Self {
        Self {
            id: BankStatementId::from_uuid(model.id),
            scheme_id: SchemeId::from_uuid(model.scheme_id),
            fund_type: model.fund_type.into(),
            statement_date: model.statement_date,
            opening_balance: model.opening_balance,
            closing_balance: model.closing_balance,
            skipped_rows: model.skipped_rows.cast_unsigned(),
            imported_at: model.imported_at.map(utc),
            uploaded_at: utc(model.uploaded_at),
        }
    }
}

impl From<bank_statement_lines::Model> for BankStatementLine {
    fn from(model: bank_statement_lines::Model) -> Self {
        Self {
            id: BankStatementLineId::from_uuid(model.id),
            statement_id: BankStatementId::from_uuid(model.statement_id),
            line_number: model.line_number.cast_unsigned(),
            line_date: model.line_date,
            description: model.description,
            debit_amount: model.debit_amount,
            credit_amount: model.credit_amount,
            running_balance: model.running_balance,
            matched_transaction_id: model.matched_transaction_id.map(TransactionId::from_uuid),
            non_ledger_category: model.non_ledger_category.map(Into::into),
        }
    }
}

impl From<reconciliations::Model> for Reconciliation {
    fn from(model: reconciliations::Model) -> Self {
        Self {
            id: ReconciliationId::from_uuid(model.id),
            bank_statement_id: BankStatementId::from_uuid(model.bank_statement_id),
            status: model.status.into(),
            reconciled_at: model.reconciled_at.map(utc),
        }
    }
}
