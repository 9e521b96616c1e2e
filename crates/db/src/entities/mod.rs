//! `SeaORM` entities, one module per table.

#![allow(missing_docs)]

pub mod prelude;

pub mod accounts;
pub mod bank_statement_lines;
pub mod bank_statements;
pub mod financial_years;
pub mod maintenance_invoices;
pub mod reconciliations;
pub mod sea_orm_active_enums;
pub mod transaction_lines;
pub mod transactions;
