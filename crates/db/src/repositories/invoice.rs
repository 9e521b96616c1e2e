//! Maintenance invoice payment.
//!
//! Recording the payment and stamping the invoice are two commits. A stamp
//! that fails after the payment committed leaves the payment in place and
//! reports `PaymentStampFailed`; the invoice must then be linked manually.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use strata_core::accounts::FundType;
use strata_core::ledger::{RecordTransactionInput, TransactionType};
use strata_shared::config::LedgerConfig;
use strata_shared::types::{AccountId, InvoiceId, SchemeId};
use tracing::{info, warn};

use super::transaction::{TransactionRepository, TransactionWithLines};
use crate::entities::maintenance_invoices;
use crate::error::RepositoryError;

/// Details of an invoice payment. Amount and reference come from the invoice.
#[derive(Debug, Clone, Deserialize)]
pub struct PayInvoiceInput {
    /// Payment date.
    pub transaction_date: NaiveDate,
    /// Fund the payment is drawn from.
    pub fund_type: FundType,
    /// Expense account.
    pub category_id: AccountId,
    /// GST component of the invoice amount.
    #[serde(default)]
    pub gst_amount: Decimal,
    /// Payment method; the configured default applies when absent.
    pub payment_method: Option<String>,
}

/// Pays maintenance invoices through the ledger.
#[derive(Debug, Clone)]
pub struct InvoicePaymentService {
    db: DatabaseConnection,
    transactions: TransactionRepository,
}

impl InvoicePaymentService {
    /// Creates a new invoice payment service.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            transactions: TransactionRepository::new(db.clone(), config),
            db,
        }
    }

    /// Records a payment for the invoice and stamps the invoice with it.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `InvoiceAlreadyPaid`, any error from
    /// recording the payment (nothing is written), or `PaymentStampFailed`
    /// when the payment stands but the invoice was not stamped.
    pub async fn pay_invoice(
        &self,
        scheme_id: SchemeId,
        invoice_id: InvoiceId,
        input: PayInvoiceInput,
    ) -> Result<TransactionWithLines, RepositoryError> {
        let invoice = maintenance_invoices::Entity::find_by_id(invoice_id.into_inner())
            .filter(maintenance_invoices::Column::SchemeId.eq(scheme_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::InvoiceNotFound(invoice_id))?;
        if let Some(paid_by) = invoice.payment_reference {
            return Err(RepositoryError::InvoiceAlreadyPaid {
                invoice_id,
                transaction_id: paid_by.into(),
            });
        }

        let label = invoice
            .invoice_number
            .clone()
            .unwrap_or_else(|| invoice_id.to_string());
        let recorded = self
            .transactions
            .record(RecordTransactionInput {
                scheme_id,
                transaction_date: input.transaction_date,
                transaction_type: TransactionType::Payment,
                fund_type: input.fund_type,
                category_id: Some(input.category_id),
                journal: None,
                amount: invoice.amount,
                gst_amount: input.gst_amount,
                description: format!("Payment of maintenance invoice {label}"),
                reference: invoice.invoice_number,
                payment_method: input.payment_method,
            })
            .await?;
        let transaction_id = recorded.transaction.id;

        let stamped = maintenance_invoices::Entity::update_many()
            .col_expr(
                maintenance_invoices::Column::PaymentReference,
                Expr::value(transaction_id.into_inner()),
            )
            .col_expr(
                maintenance_invoices::Column::PaidAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(maintenance_invoices::Column::Id.eq(invoice_id.into_inner()))
            .filter(maintenance_invoices::Column::PaymentReference.is_null())
            .exec(&self.db)
            .await;

        let reason = match stamped {
            Ok(result) if result.rows_affected == 1 => None,
            Ok(_) => Some("invoice was paid concurrently".to_string()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            warn!(
                scheme_id = %scheme_id,
                invoice_id = %invoice_id,
                transaction_id = %transaction_id,
                reason = %reason,
                "Invoice payment recorded but invoice not stamped"
            );
            return Err(RepositoryError::PaymentStampFailed {
                invoice_id,
                transaction_id,
                reason,
            });
        }

        info!(
            scheme_id = %scheme_id,
            invoice_id = %invoice_id,
            transaction_id = %transaction_id,
            "Maintenance invoice paid"
        );
        Ok(recorded)
    }
}
