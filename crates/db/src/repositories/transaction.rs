//! Transaction repository for ledger database operations.
//!
//! Recording a transaction inserts the header and its derived lines in one
//! database transaction. Nothing is updated in place afterwards except the
//! void timestamp and the reconciliation flag.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use strata_core::ledger::{
    LedgerError, LedgerService, PaymentMethod, RecordTransactionInput, Transaction,
    TransactionFilter, TransactionLine,
};
use strata_core::reports::{ReportService, UnbalancedTransaction};
use strata_shared::config::LedgerConfig;
use strata_shared::types::{SchemeId, TransactionId, TransactionLineId};
use tracing::{error, info};

use super::account::load_effective_chart;
use crate::entities::{transaction_lines, transactions};
use crate::error::RepositoryError;

/// A transaction with its ledger lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithLines {
    /// Transaction header.
    pub transaction: Transaction,
    /// Debit and credit lines.
    pub lines: Vec<TransactionLine>,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    default_payment_method: PaymentMethod,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    ///
    /// An unrecognised configured payment method falls back to EFT.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            default_payment_method: PaymentMethod::resolve(
                Some(&config.default_payment_method),
                PaymentMethod::Eft,
            ),
        }
    }

    /// Records a receipt, payment or journal with its derived lines.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if validation fails, or a database error.
    /// Nothing is written on error.
    pub async fn record(
        &self,
        input: RecordTransactionInput,
    ) -> Result<TransactionWithLines, RepositoryError> {
        let txn = self.db.begin().await?;
        let recorded = record_in(&txn, &input, self.default_payment_method).await?;
        txn.commit().await?;

        info!(
            scheme_id = %input.scheme_id,
            transaction_id = %recorded.transaction.id,
            transaction_type = %recorded.transaction.transaction_type,
            fund_type = %recorded.transaction.fund_type,
            amount = %recorded.transaction.amount,
            "Transaction recorded"
        );
        Ok(recorded)
    }

    /// Voids an unreconciled transaction, removing it and its lines from
    /// reports and matching.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` (including when already voided),
    /// `TransactionReconciled`, or a database error.
    pub async fn void(
        &self,
        scheme_id: SchemeId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, RepositoryError> {
        let txn = self.db.begin().await?;
        let transaction = transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(transactions::Column::SchemeId.eq(scheme_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await?
            .map(Transaction::from)
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
        LedgerService::validate_void(&transaction)?;

        let now = Utc::now().fixed_offset();
        let active = transactions::ActiveModel {
            id: Set(transaction_id.into_inner()),
            deleted_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };
        let voided = Transaction::from(active.update(&txn).await?);
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            transaction_id = %transaction_id,
            "Transaction voided"
        );
        Ok(voided)
    }

    /// Finds a transaction with its lines. Voided transactions are returned
    /// with `deleted_at` set.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a database error.
    pub async fn find_transaction(
        &self,
        scheme_id: SchemeId,
        transaction_id: TransactionId,
    ) -> Result<TransactionWithLines, RepositoryError> {
        let transaction = transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(transactions::Column::SchemeId.eq(scheme_id.into_inner()))
            .one(&self.db)
            .await?
            .map(Transaction::from)
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;

        let lines = transaction_lines::Entity::find()
            .filter(transaction_lines::Column::TransactionId.eq(transaction_id.into_inner()))
            .order_by_asc(transaction_lines::Column::CreatedAt)
            .order_by_asc(transaction_lines::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(TransactionLine::from)
            .collect();

        Ok(TransactionWithLines { transaction, lines })
    }

    /// Lists the scheme's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        scheme_id: SchemeId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::SchemeId.eq(scheme_id.into_inner()));

        if !filter.include_voided {
            query = query.filter(transactions::Column::DeletedAt.is_null());
        }
        if let Some(fund_type) = filter.fund_type {
            query = query.filter(
                transactions::Column::FundType
                    .eq(crate::entities::sea_orm_active_enums::FundType::from(fund_type)),
            );
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query.filter(transactions::Column::TransactionType.eq(
                crate::entities::sea_orm_active_enums::TransactionType::from(transaction_type),
            ));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }
        if let Some(is_reconciled) = filter.is_reconciled {
            query = query.filter(transactions::Column::IsReconciled.eq(is_reconciled));
        }

        Ok(query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Transaction::from)
            .collect())
    }

    /// Checks every non-voided transaction of the scheme for unequal
    /// debit and credit totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_unbalanced_transactions(
        &self,
        scheme_id: SchemeId,
    ) -> Result<Vec<UnbalancedTransaction>, RepositoryError> {
        let lines: Vec<TransactionLine> = transaction_lines::Entity::find()
            .inner_join(transactions::Entity)
            .filter(transactions::Column::SchemeId.eq(scheme_id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?
            .into_iter()
            .map(TransactionLine::from)
            .collect();

        let unbalanced = ReportService::find_unbalanced(&lines);
        for tx in &unbalanced {
            error!(
                scheme_id = %scheme_id,
                transaction_id = %tx.transaction_id,
                total_debit = %tx.total_debit,
                total_credit = %tx.total_credit,
                "Unbalanced transaction detected"
            );
        }
        Ok(unbalanced)
    }
}

/// Validates and inserts a transaction and its lines on `db`, which the
/// caller wraps in a database transaction.
async fn record_in<C: ConnectionTrait>(
    db: &C,
    input: &RecordTransactionInput,
    default_payment_method: PaymentMethod,
) -> Result<TransactionWithLines, RepositoryError> {
    let chart = load_effective_chart(db, input.scheme_id).await?;
    let prepared = LedgerService::prepare(input, &chart, default_payment_method)?;

    let now = Utc::now().fixed_offset();
    let transaction_id = TransactionId::new();
    let header = transactions::ActiveModel {
        id: Set(transaction_id.into_inner()),
        scheme_id: Set(prepared.scheme_id.into_inner()),
        transaction_date: Set(prepared.transaction_date),
        transaction_type: Set(prepared.transaction_type.into()),
        fund_type: Set(prepared.fund_type.into()),
        category_id: Set(prepared.category_id.into_inner()),
        amount: Set(prepared.amount),
        gst_amount: Set(prepared.gst_amount),
        description: Set(prepared.description.clone()),
        reference: Set(prepared.reference.clone()),
        payment_method: Set(prepared.payment_method.map(Into::into)),
        is_reconciled: Set(false),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let transaction = Transaction::from(header.insert(db).await?);

    let mut lines = Vec::with_capacity(prepared.lines.len());
    for derived in &prepared.lines {
        let line = transaction_lines::ActiveModel {
            id: Set(TransactionLineId::new().into_inner()),
            transaction_id: Set(transaction_id.into_inner()),
            account_id: Set(derived.account_id.into_inner()),
            side: Set(derived.side.into()),
            amount: Set(derived.amount),
            created_at: Set(now),
        };
        lines.push(TransactionLine::from(line.insert(db).await?));
    }

    Ok(TransactionWithLines { transaction, lines })
}
