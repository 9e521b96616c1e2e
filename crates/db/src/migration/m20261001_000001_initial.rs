//! Initial database migration.
//!
//! Creates the ledger tables, enums, integrity constraints and the
//! organisation-wide chart of accounts.

use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;
use strata_core::accounts::DEFAULT_CHART;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS & ENUMS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS & FINANCIAL YEARS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(FINANCIAL_YEARS_SQL).await?;

        // ============================================================
        // PART 3: TRANSACTIONS & LINES
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(TRANSACTION_LINES_SQL).await?;

        // ============================================================
        // PART 4: BANK RECONCILIATION
        // ============================================================
        db.execute_unprepared(BANK_STATEMENTS_SQL).await?;
        db.execute_unprepared(BANK_STATEMENT_LINES_SQL).await?;
        db.execute_unprepared(RECONCILIATIONS_SQL).await?;

        // ============================================================
        // PART 5: MAINTENANCE INVOICES
        // ============================================================
        db.execute_unprepared(MAINTENANCE_INVOICES_SQL).await?;

        // ============================================================
        // PART 6: SEED DATA
        // ============================================================
        seed_default_chart(db).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

/// Inserts the organisation-wide accounts every scheme inherits.
async fn seed_default_chart<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    for account in DEFAULT_CHART {
        let statement = Statement::from_sql_and_values(
            backend,
            r"
INSERT INTO accounts (id, scheme_id, code, name, account_type, fund_type, is_system)
VALUES (gen_random_uuid(), NULL, $1, $2, CAST($3 AS account_type), CAST($4 AS fund_type), $5)
ON CONFLICT DO NOTHING
",
            [
                account.code.into(),
                account.name.into(),
                account.account_type.as_str().into(),
                account.fund_type.map(|f| f.as_str().to_string()).into(),
                account.is_system.into(),
            ],
        );
        db.execute(statement).await?;
    }
    Ok(())
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EXTENSIONS_SQL: &str = r"
-- gen_random_uuid() for seeds, btree_gist for the financial year exclusion constraint
CREATE EXTENSION IF NOT EXISTS pgcrypto;
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'income', 'expense');

CREATE TYPE fund_type AS ENUM ('admin', 'capital_works');

CREATE TYPE transaction_type AS ENUM ('receipt', 'payment', 'journal');

CREATE TYPE line_side AS ENUM ('debit', 'credit');

CREATE TYPE payment_method AS ENUM (
    'eft',
    'bpay',
    'cheque',
    'direct_debit',
    'credit_card',
    'cash'
);

CREATE TYPE reconciliation_status AS ENUM ('in_progress', 'reconciled');

CREATE TYPE non_ledger_category AS ENUM ('bank_fee', 'interest', 'other');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    scheme_id UUID,
    code VARCHAR(10) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    fund_type fund_type,
    parent_id UUID REFERENCES accounts(id) ON DELETE SET NULL,
    is_system BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_code CHECK (code ~ '^[0-9]{1,10}$'),
    CONSTRAINT chk_system_is_default CHECK (NOT is_system OR scheme_id IS NULL),
    CONSTRAINT chk_parent_not_self CHECK (parent_id IS NULL OR parent_id <> id)
);

-- Codes are unique per scheme, and separately among organisation defaults.
CREATE UNIQUE INDEX uq_accounts_scheme_code ON accounts(scheme_id, code) WHERE scheme_id IS NOT NULL;
CREATE UNIQUE INDEX uq_accounts_default_code ON accounts(code) WHERE scheme_id IS NULL;
CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const FINANCIAL_YEARS_SQL: &str = r"
CREATE TABLE financial_years (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    scheme_id UUID NOT NULL,
    year_label VARCHAR(50) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    admin_opening_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    capital_opening_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    is_current BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_financial_year_dates CHECK (end_date > start_date),
    CONSTRAINT uq_financial_years_label UNIQUE (scheme_id, year_label),
    -- start_a < end_b AND end_a > start_b
    CONSTRAINT excl_financial_years_overlap EXCLUDE USING gist (
        scheme_id WITH =,
        daterange(start_date, end_date, '[)') WITH &&
    )
);

CREATE UNIQUE INDEX uq_financial_years_current ON financial_years(scheme_id) WHERE is_current;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    scheme_id UUID NOT NULL,
    transaction_date DATE NOT NULL,
    transaction_type transaction_type NOT NULL,
    fund_type fund_type NOT NULL,
    category_id UUID NOT NULL REFERENCES accounts(id),
    amount NUMERIC(15, 2) NOT NULL,
    gst_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    description TEXT NOT NULL,
    reference VARCHAR(100),
    payment_method payment_method,
    is_reconciled BOOLEAN NOT NULL DEFAULT false,
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_amount CHECK (amount > 0),
    CONSTRAINT chk_transaction_gst CHECK (gst_amount >= 0 AND gst_amount <= amount),
    CONSTRAINT chk_payment_method CHECK (transaction_type = 'payment' OR payment_method IS NULL),
    CONSTRAINT chk_reconciled_not_voided CHECK (NOT (is_reconciled AND deleted_at IS NOT NULL))
);

CREATE INDEX idx_transactions_scheme_date ON transactions(scheme_id, transaction_date) WHERE deleted_at IS NULL;
CREATE INDEX idx_transactions_unreconciled ON transactions(scheme_id, fund_type, transaction_date)
    WHERE deleted_at IS NULL AND is_reconciled = false;
CREATE INDEX idx_transactions_category ON transactions(category_id);
";

const TRANSACTION_LINES_SQL: &str = r"
CREATE TABLE transaction_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transaction_id UUID NOT NULL REFERENCES transactions(id),
    account_id UUID NOT NULL REFERENCES accounts(id),
    side line_side NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_line_amount CHECK (amount > 0)
);

CREATE INDEX idx_transaction_lines_transaction ON transaction_lines(transaction_id);
CREATE INDEX idx_transaction_lines_account ON transaction_lines(account_id);
";

const BANK_STATEMENTS_SQL: &str = r"
CREATE TABLE bank_statements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    scheme_id UUID NOT NULL,
    fund_type fund_type NOT NULL,
    statement_date DATE NOT NULL,
    opening_balance NUMERIC(15, 2) NOT NULL,
    closing_balance NUMERIC(15, 2) NOT NULL,
    skipped_rows INTEGER NOT NULL DEFAULT 0,
    imported_at TIMESTAMPTZ,
    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_skipped_rows CHECK (skipped_rows >= 0)
);

CREATE INDEX idx_bank_statements_scheme ON bank_statements(scheme_id, fund_type, statement_date);
";

const BANK_STATEMENT_LINES_SQL: &str = r"
CREATE TABLE bank_statement_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    statement_id UUID NOT NULL REFERENCES bank_statements(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    line_date DATE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    debit_amount NUMERIC(15, 2),
    credit_amount NUMERIC(15, 2),
    running_balance NUMERIC(15, 2),
    matched BOOLEAN NOT NULL DEFAULT false,
    matched_transaction_id UUID REFERENCES transactions(id),
    non_ledger_category non_ledger_category,
    CONSTRAINT uq_statement_line_number UNIQUE (statement_id, line_number),
    -- A transaction explains at most one bank line.
    CONSTRAINT uq_statement_line_transaction UNIQUE (matched_transaction_id),
    CONSTRAINT chk_line_number CHECK (line_number > 0),
    CONSTRAINT chk_one_side CHECK (
        (debit_amount IS NOT NULL AND debit_amount > 0 AND credit_amount IS NULL)
        OR (credit_amount IS NOT NULL AND credit_amount > 0 AND debit_amount IS NULL)
    ),
    CONSTRAINT chk_matched_flag CHECK (matched = (matched_transaction_id IS NOT NULL)),
    CONSTRAINT chk_matched_or_non_ledger CHECK (
        matched_transaction_id IS NULL OR non_ledger_category IS NULL
    )
);
";

const RECONCILIATIONS_SQL: &str = r"
CREATE TABLE reconciliations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bank_statement_id UUID NOT NULL REFERENCES bank_statements(id) ON DELETE CASCADE,
    status reconciliation_status NOT NULL DEFAULT 'in_progress',
    reconciled_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_reconciliations_statement UNIQUE (bank_statement_id),
    CONSTRAINT chk_reconciled_at CHECK ((status = 'reconciled') = (reconciled_at IS NOT NULL))
);
";

const MAINTENANCE_INVOICES_SQL: &str = r"
CREATE TABLE maintenance_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    scheme_id UUID NOT NULL,
    invoice_number VARCHAR(100),
    amount NUMERIC(15, 2) NOT NULL,
    payment_reference UUID REFERENCES transactions(id),
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoice_amount CHECK (amount > 0)
);

CREATE INDEX idx_maintenance_invoices_scheme ON maintenance_invoices(scheme_id);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS maintenance_invoices CASCADE;
DROP TABLE IF EXISTS reconciliations CASCADE;
DROP TABLE IF EXISTS bank_statement_lines CASCADE;
DROP TABLE IF EXISTS bank_statements CASCADE;
DROP TABLE IF EXISTS transaction_lines CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS financial_years CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP TYPE IF EXISTS non_ledger_category CASCADE;
DROP TYPE IF EXISTS reconciliation_status CASCADE;
DROP TYPE IF EXISTS payment_method CASCADE;
DROP TYPE IF EXISTS line_side CASCADE;
DROP TYPE IF EXISTS transaction_type CASCADE;
DROP TYPE IF EXISTS fund_type CASCADE;
DROP TYPE IF EXISTS account_type CASCADE;
";
