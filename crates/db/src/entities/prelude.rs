//! Entity aliases.

pub use super::accounts::Entity as Accounts;
pub use super::bank_statement_lines::Entity as BankStatementLines;
pub use super::bank_statements::Entity as BankStatements;
pub use super::financial_years::Entity as FinancialYears;
pub use super::maintenance_invoices::Entity as MaintenanceInvoices;
pub use super::reconciliations::Entity as Reconciliations;
pub use super::transaction_lines::Entity as TransactionLines;
pub use super::transactions::Entity as Transactions;
