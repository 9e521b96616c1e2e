//! Bank statement and reconciliation repository.
//!
//! Every mutation locks the statement row first, so concurrent edits of one
//! statement are serialised and a finalised statement is observed as such.

use chrono::{Days, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use strata_core::ledger::Transaction;
use strata_core::reconciliation::{
    BankStatement, BankStatementLine, IngestStatementInput, MatchCandidate, MatchChange,
    MatchProposal, MatchingEngine, NonLedgerCategory, Reconciliation, ReconciliationError,
    ReconciliationStatus, ReconciliationSummary, ReconciliationWorkflow, SkippedRow,
    StatementParser, StatementStatus,
};
use strata_shared::config::ReconciliationConfig;
use strata_shared::types::{
    BankStatementId, BankStatementLineId, ReconciliationId, SchemeId, TransactionId,
};
use tracing::{info, warn};

use crate::entities::sea_orm_active_enums as db_enums;
use crate::entities::{bank_statement_lines, bank_statements, reconciliations, transactions};
use crate::error::{RepositoryError, violates};

const LINE_TRANSACTION_UNIQUE: &str = "uq_statement_line_transaction";
const STATEMENT_RECONCILIATION_UNIQUE: &str = "uq_reconciliations_statement";

/// Result of ingesting a statement.
#[derive(Debug, Clone, Serialize)]
pub struct StatementImport {
    /// The stored statement.
    pub statement: BankStatement,
    /// Imported lines in line-number order.
    pub lines: Vec<BankStatementLine>,
    /// Rows that were not imported, with reasons.
    pub skipped: Vec<SkippedRow>,
}

/// A statement with its lines and reconciliation progress.
#[derive(Debug, Clone, Serialize)]
pub struct StatementView {
    /// The statement.
    pub statement: BankStatement,
    /// Its reconciliation, once started.
    pub reconciliation: Option<Reconciliation>,
    /// Lines in line-number order.
    pub lines: Vec<BankStatementLine>,
    /// Progress and balance check.
    pub summary: ReconciliationSummary,
}

impl StatementView {
    /// Derived lifecycle state.
    #[must_use]
    pub const fn status(&self) -> StatementStatus {
        self.summary.status
    }
}

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    engine: MatchingEngine,
    window_days: u32,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &ReconciliationConfig) -> Self {
        Self {
            db,
            engine: MatchingEngine::new(config.match_window_days, config.amount_tolerance),
            window_days: config.match_window_days,
        }
    }

    /// Parses and stores a bank statement with its lines.
    ///
    /// Malformed rows are skipped and reported; the import fails only when
    /// the layout is unrecognisable or no row survives.
    ///
    /// # Errors
    ///
    /// Returns `EmptyStatement`, `UnrecognisedLayout`, `NoImportableLines`,
    /// or a database error.
    pub async fn ingest_statement(
        &self,
        input: IngestStatementInput,
    ) -> Result<StatementImport, RepositoryError> {
        let parsed = StatementParser::parse(&input.raw_text)?;
        parsed.ensure_importable()?;
        let (opening_balance, closing_balance) =
            parsed.balances(input.opening_balance, input.closing_balance);

        let statement_id = BankStatementId::new();
        for row in &parsed.skipped {
            warn!(
                scheme_id = %input.scheme_id,
                statement_id = %statement_id,
                row_number = row.row_number,
                reason = %row.reason,
                "Skipped statement row"
            );
        }

        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;
        let statement = bank_statements::ActiveModel {
            id: Set(statement_id.into_inner()),
            scheme_id: Set(input.scheme_id.into_inner()),
            fund_type: Set(input.fund_type.into()),
            statement_date: Set(input.statement_date),
            opening_balance: Set(opening_balance),
            closing_balance: Set(closing_balance),
            skipped_rows: Set(to_db_count(parsed.skipped.len())?),
            imported_at: Set(Some(now)),
            uploaded_at: Set(now),
        };
        let statement = BankStatement::from(statement.insert(&txn).await?);

        let mut lines = Vec::with_capacity(parsed.lines.len());
        for parsed_line in &parsed.lines {
            let (debit_amount, credit_amount) = parsed_line.amount.columns();
            let line = bank_statement_lines::ActiveModel {
                id: Set(BankStatementLineId::new().into_inner()),
                statement_id: Set(statement_id.into_inner()),
                line_number: Set(to_db_count(parsed_line.row_number)?),
                line_date: Set(parsed_line.line_date),
                description: Set(parsed_line.description.clone()),
                debit_amount: Set(debit_amount),
                credit_amount: Set(credit_amount),
                running_balance: Set(parsed_line.running_balance),
                matched: Set(false),
                matched_transaction_id: Set(None),
                non_ledger_category: Set(None),
            };
            lines.push(BankStatementLine::from(line.insert(&txn).await?));
        }
        txn.commit().await?;

        info!(
            scheme_id = %input.scheme_id,
            statement_id = %statement_id,
            fund_type = %input.fund_type,
            imported = lines.len(),
            skipped = parsed.skipped.len(),
            "Bank statement imported"
        );

        Ok(StatementImport {
            statement,
            lines,
            skipped: parsed.skipped,
        })
    }

    /// Loads a statement with its lines, reconciliation and summary.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` or a database error.
    pub async fn statement_state(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
    ) -> Result<StatementView, RepositoryError> {
        let statement = load_statement(&self.db, scheme_id, statement_id, false).await?;
        let reconciliation = load_reconciliation(&self.db, statement_id).await?;
        let lines = load_lines(&self.db, statement_id).await?;
        let summary = ReconciliationWorkflow::summary(&statement, reconciliation.as_ref(), &lines);

        Ok(StatementView {
            statement,
            reconciliation,
            lines,
            summary,
        })
    }

    /// Summarises a statement's reconciliation progress.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` or a database error.
    pub async fn summary(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
    ) -> Result<ReconciliationSummary, RepositoryError> {
        Ok(self.statement_state(scheme_id, statement_id).await?.summary)
    }

    /// Starts reconciling a statement.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound`, `StatementFinalized`, `AlreadyStarted`,
    /// or a database error.
    pub async fn start_reconciliation(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
    ) -> Result<Reconciliation, RepositoryError> {
        let txn = self.db.begin().await?;
        load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::validate_start(statement_id, existing.as_ref())?;

        let reconciliation = insert_reconciliation(&txn, statement_id).await?;
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            reconciliation_id = %reconciliation.id,
            "Reconciliation started"
        );
        Ok(reconciliation)
    }

    /// Proposes a transaction for every unresolved line. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` or a database error.
    pub async fn propose_matches(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
    ) -> Result<Vec<MatchProposal>, RepositoryError> {
        let statement = load_statement(&self.db, scheme_id, statement_id, false).await?;
        let lines = load_lines(&self.db, statement_id).await?;
        let candidates = self.load_candidates(&self.db, &statement, &lines).await?;
        Ok(self.engine.propose(&lines, &candidates))
    }

    /// Commits the unambiguous proposals as matches.
    ///
    /// Each proposal is re-validated under lock; a stale proposal fails the
    /// whole batch and nothing is written. Returns the lines that changed.
    ///
    /// # Errors
    ///
    /// Returns any manual-match error, `StatementFinalized`, or a database
    /// error.
    pub async fn apply_proposals(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
        proposals: &[MatchProposal],
    ) -> Result<Vec<BankStatementLine>, RepositoryError> {
        let txn = self.db.begin().await?;
        let statement = load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::ensure_open(statement_id, existing.as_ref())?;

        let mut changed = Vec::new();
        for proposal in proposals {
            let Some(transaction_id) = proposal.proposed_transaction() else {
                continue;
            };
            if let Some(line) = link(&txn, &statement, proposal.line_id, transaction_id).await? {
                changed.push(line);
            }
        }
        if !changed.is_empty() && existing.is_none() {
            insert_reconciliation(&txn, statement_id).await?;
        }
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            matched = changed.len(),
            "Match proposals applied"
        );
        Ok(changed)
    }

    /// Links a line to a transaction and marks the transaction reconciled.
    ///
    /// Matching a line to the transaction it already points at is a no-op.
    /// Starts the reconciliation if none exists.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound`, `LineNotFound`, `TransactionNotFound`,
    /// `StatementFinalized`, `FundMismatch`, `IncompatibleTransaction`,
    /// `LineMarkedNonLedger`, `LineAlreadyMatched`,
    /// `TransactionAlreadyMatched`, or a database error.
    pub async fn match_line(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
        line_id: BankStatementLineId,
        transaction_id: TransactionId,
    ) -> Result<BankStatementLine, RepositoryError> {
        let txn = self.db.begin().await?;
        let statement = load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::ensure_open(statement_id, existing.as_ref())?;

        let Some(line) = link(&txn, &statement, line_id, transaction_id).await? else {
            let line = load_line(&txn, statement_id, line_id).await?;
            txn.commit().await?;
            return Ok(line);
        };
        if existing.is_none() {
            insert_reconciliation(&txn, statement_id).await?;
        }
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            line_id = %line_id,
            transaction_id = %transaction_id,
            "Statement line matched"
        );
        Ok(line)
    }

    /// Clears a line's match and unmarks the transaction.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound`, `LineNotFound`, `StatementFinalized`,
    /// `LineNotMatched`, or a database error.
    pub async fn unmatch_line(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
        line_id: BankStatementLineId,
    ) -> Result<BankStatementLine, RepositoryError> {
        let txn = self.db.begin().await?;
        load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::ensure_open(statement_id, existing.as_ref())?;

        let line = load_line(&txn, statement_id, line_id).await?;
        let transaction_id = ReconciliationWorkflow::validate_unmatch(&line)?;

        let updated = bank_statement_lines::ActiveModel {
            id: Set(line_id.into_inner()),
            matched: Set(false),
            matched_transaction_id: Set(None),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        set_reconciled_flag(&txn, transaction_id, false).await?;
        if existing.is_none() {
            insert_reconciliation(&txn, statement_id).await?;
        }
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            line_id = %line_id,
            transaction_id = %transaction_id,
            "Statement line unmatched"
        );
        Ok(BankStatementLine::from(updated))
    }

    /// Accepts a line as having no ledger counterpart.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound`, `LineNotFound`, `StatementFinalized`,
    /// `LineAlreadyMatched`, or a database error.
    pub async fn mark_non_ledger(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
        line_id: BankStatementLineId,
        category: NonLedgerCategory,
    ) -> Result<BankStatementLine, RepositoryError> {
        let txn = self.db.begin().await?;
        load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::ensure_open(statement_id, existing.as_ref())?;

        let line = load_line(&txn, statement_id, line_id).await?;
        ReconciliationWorkflow::validate_mark_non_ledger(&line)?;

        let updated = set_non_ledger(&txn, line_id, Some(category)).await?;
        if existing.is_none() {
            insert_reconciliation(&txn, statement_id).await?;
        }
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            line_id = %line_id,
            category = %category,
            "Statement line marked non-ledger"
        );
        Ok(updated)
    }

    /// Removes a line's non-ledger mark. Clearing an unmarked line is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound`, `LineNotFound`, `StatementFinalized`,
    /// or a database error.
    pub async fn clear_non_ledger(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
        line_id: BankStatementLineId,
    ) -> Result<BankStatementLine, RepositoryError> {
        let txn = self.db.begin().await?;
        load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::ensure_open(statement_id, existing.as_ref())?;

        let line = load_line(&txn, statement_id, line_id).await?;
        if line.non_ledger_category.is_none() {
            txn.commit().await?;
            return Ok(line);
        }

        let updated = set_non_ledger(&txn, line_id, None).await?;
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            line_id = %line_id,
            "Statement line non-ledger mark cleared"
        );
        Ok(updated)
    }

    /// Finalises the statement once every line is resolved.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound`, `StatementFinalized`, `UnresolvedLines`,
    /// or a database error.
    pub async fn reconcile(
        &self,
        scheme_id: SchemeId,
        statement_id: BankStatementId,
    ) -> Result<Reconciliation, RepositoryError> {
        let txn = self.db.begin().await?;
        load_statement(&txn, scheme_id, statement_id, true).await?;
        let existing = load_reconciliation(&txn, statement_id).await?;
        ReconciliationWorkflow::ensure_open(statement_id, existing.as_ref())?;

        let lines = load_lines(&txn, statement_id).await?;
        ReconciliationWorkflow::validate_finalize(&lines)?;

        let reconciliation_id = match existing {
            Some(r) => r.id,
            None => insert_reconciliation(&txn, statement_id).await?.id,
        };
        let finalised = reconciliations::ActiveModel {
            id: Set(reconciliation_id.into_inner()),
            status: Set(ReconciliationStatus::Reconciled.into()),
            reconciled_at: Set(Some(Utc::now().fixed_offset())),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        txn.commit().await?;

        info!(
            scheme_id = %scheme_id,
            statement_id = %statement_id,
            lines = lines.len(),
            "Bank statement reconciled"
        );
        Ok(Reconciliation::from(finalised))
    }

    /// Unreconciled, non-voided transactions of the statement's scheme and
    /// fund dated within the window around any of its lines.
    async fn load_candidates<C: ConnectionTrait>(
        &self,
        db: &C,
        statement: &BankStatement,
        lines: &[BankStatementLine],
    ) -> Result<Vec<MatchCandidate>, RepositoryError> {
        let (Some(earliest), Some(latest)) = (
            lines.iter().map(|l| l.line_date).min(),
            lines.iter().map(|l| l.line_date).max(),
        ) else {
            return Ok(Vec::new());
        };
        let window = Days::new(u64::from(self.window_days));
        let from = earliest.checked_sub_days(window).unwrap_or(NaiveDate::MIN);
        let to = latest.checked_add_days(window).unwrap_or(NaiveDate::MAX);

        Ok(transactions::Entity::find()
            .filter(transactions::Column::SchemeId.eq(statement.scheme_id.into_inner()))
            .filter(
                transactions::Column::FundType.eq(db_enums::FundType::from(statement.fund_type)),
            )
            .filter(transactions::Column::DeletedAt.is_null())
            .filter(transactions::Column::IsReconciled.eq(false))
            .filter(transactions::Column::TransactionDate.between(from, to))
            .all(db)
            .await?
            .iter()
            .map(MatchCandidate::from)
            .collect())
    }
}

fn to_db_count(value: usize) -> Result<i32, DbErr> {
    i32::try_from(value).map_err(|e| DbErr::Custom(format!("count out of range: {e}")))
}

async fn load_statement<C: ConnectionTrait>(
    db: &C,
    scheme_id: SchemeId,
    statement_id: BankStatementId,
    lock: bool,
) -> Result<BankStatement, RepositoryError> {
    let mut query = bank_statements::Entity::find_by_id(statement_id.into_inner())
        .filter(bank_statements::Column::SchemeId.eq(scheme_id.into_inner()));
    if lock {
        query = query.lock_exclusive();
    }
    Ok(query
        .one(db)
        .await?
        .map(BankStatement::from)
        .ok_or(ReconciliationError::StatementNotFound(statement_id))?)
}

async fn load_reconciliation<C: ConnectionTrait>(
    db: &C,
    statement_id: BankStatementId,
) -> Result<Option<Reconciliation>, DbErr> {
    Ok(reconciliations::Entity::find()
        .filter(reconciliations::Column::BankStatementId.eq(statement_id.into_inner()))
        .one(db)
        .await?
        .map(Reconciliation::from))
}

async fn load_lines<C: ConnectionTrait>(
    db: &C,
    statement_id: BankStatementId,
) -> Result<Vec<BankStatementLine>, DbErr> {
    Ok(bank_statement_lines::Entity::find()
        .filter(bank_statement_lines::Column::StatementId.eq(statement_id.into_inner()))
        .order_by_asc(bank_statement_lines::Column::LineNumber)
        .all(db)
        .await?
        .into_iter()
        .map(BankStatementLine::from)
        .collect())
}

async fn load_line<C: ConnectionTrait>(
    db: &C,
    statement_id: BankStatementId,
    line_id: BankStatementLineId,
) -> Result<BankStatementLine, RepositoryError> {
    Ok(bank_statement_lines::Entity::find_by_id(line_id.into_inner())
        .filter(bank_statement_lines::Column::StatementId.eq(statement_id.into_inner()))
        .one(db)
        .await?
        .map(BankStatementLine::from)
        .ok_or(ReconciliationError::LineNotFound(line_id))?)
}

async fn insert_reconciliation<C: ConnectionTrait>(
    db: &C,
    statement_id: BankStatementId,
) -> Result<Reconciliation, RepositoryError> {
    let model = reconciliations::ActiveModel {
        id: Set(ReconciliationId::new().into_inner()),
        bank_statement_id: Set(statement_id.into_inner()),
        status: Set(ReconciliationStatus::InProgress.into()),
        reconciled_at: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    };
    match model.insert(db).await {
        Ok(inserted) => Ok(Reconciliation::from(inserted)),
        Err(e) if violates(&e, STATEMENT_RECONCILIATION_UNIQUE) => {
            Err(ReconciliationError::AlreadyStarted(statement_id).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Validates and writes a match. Returns `None` when the line already
/// points at the transaction.
async fn link<C: ConnectionTrait>(
    db: &C,
    statement: &BankStatement,
    line_id: BankStatementLineId,
    transaction_id: TransactionId,
) -> Result<Option<BankStatementLine>, RepositoryError> {
    let line = load_line(db, statement.id, line_id).await?;
    let transaction = transactions::Entity::find_by_id(transaction_id.into_inner())
        .lock_exclusive()
        .one(db)
        .await?
        .map(Transaction::from)
        .ok_or(ReconciliationError::TransactionNotFound(transaction_id))?;
    let other_line = bank_statement_lines::Entity::find()
        .filter(bank_statement_lines::Column::MatchedTransactionId.eq(transaction_id.into_inner()))
        .one(db)
        .await?
        .map(BankStatementLine::from);

    let change = ReconciliationWorkflow::validate_match(
        statement,
        &line,
        &transaction,
        other_line.as_ref(),
    )?;
    match change {
        MatchChange::Unchanged => Ok(None),
        MatchChange::Link(transaction_id) => {
            let updated = bank_statement_lines::ActiveModel {
                id: Set(line_id.into_inner()),
                matched: Set(true),
                matched_transaction_id: Set(Some(transaction_id.into_inner())),
                ..Default::default()
            }
            .update(db)
            .await
            .map_err(|e| {
                if violates(&e, LINE_TRANSACTION_UNIQUE) {
                    RepositoryError::from(ReconciliationError::TransactionAlreadyMatched(
                        transaction_id,
                    ))
                } else {
                    e.into()
                }
            })?;
            set_reconciled_flag(db, transaction_id, true).await?;
            Ok(Some(BankStatementLine::from(updated)))
        }
    }
}

async fn set_reconciled_flag<C: ConnectionTrait>(
    db: &C,
    transaction_id: TransactionId,
    is_reconciled: bool,
) -> Result<(), DbErr> {
    transactions::ActiveModel {
        id: Set(transaction_id.into_inner()),
        is_reconciled: Set(is_reconciled),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

async fn set_non_ledger<C: ConnectionTrait>(
    db: &C,
    line_id: BankStatementLineId,
    category: Option<NonLedgerCategory>,
) -> Result<BankStatementLine, DbErr> {
    let updated = bank_statement_lines::ActiveModel {
        id: Set(line_id.into_inner()),
        non_ledger_category: Set(category.map(Into::into)),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(BankStatementLine::from(updated))
}
