//! Repositories for ledger data access.
//!
//! Each repository runs the `strata-core` rules against rows loaded inside
//! a database transaction, so validation and writes see the same state.

pub mod account;
pub mod fiscal;
pub mod invoice;
pub mod reconciliation;
pub mod report;
pub mod transaction;

pub use account::AccountRepository;
pub use fiscal::FinancialYearRepository;
pub use invoice::{InvoicePaymentService, PayInvoiceInput};
pub use reconciliation::{ReconciliationRepository, StatementImport, StatementView};
pub use report::ReportRepository;
pub use transaction::{TransactionRepository, TransactionWithLines};
