use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use strata_core::accounts::FundType;
use strata_db::entities::maintenance_invoices;
use strata_db::repositories::PayInvoiceInput;
use strata_db::{InvoicePaymentService, RepositoryError, TransactionRepository};
use strata_shared::config::LedgerConfig;
use strata_shared::types::{InvoiceId, SchemeId};

use crate::common::{account, connect, date};

/// Rejects updates to invoices numbered `STAMP-REJECT-*` so the stamp fails
/// after the payment has committed.
const REJECT_STAMP_TRIGGER: &str = r"
CREATE OR REPLACE FUNCTION reject_invoice_stamp() RETURNS trigger AS $$
BEGIN
    IF OLD.invoice_number LIKE 'STAMP-REJECT-%' THEN
        RAISE EXCEPTION 'invoice % is locked by the accounts team', OLD.invoice_number;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS reject_invoice_stamp ON maintenance_invoices;
CREATE TRIGGER reject_invoice_stamp
    BEFORE UPDATE ON maintenance_invoices
    FOR EACH ROW EXECUTE FUNCTION reject_invoice_stamp();
";

async fn insert_invoice(db: &DatabaseConnection, scheme_id: SchemeId, number: &str) -> InvoiceId {
    let invoice_id = InvoiceId::new();
    maintenance_invoices::ActiveModel {
        id: Set(invoice_id.into_inner()),
        scheme_id: Set(scheme_id.into_inner()),
        invoice_number: Set(Some(number.to_string())),
        amount: Set(dec!(330.00)),
        payment_reference: Set(None),
        paid_at: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .unwrap();
    invoice_id
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_pay_invoice_stamps_payment_reference() {
    let db = connect().await;
    let scheme_id = SchemeId::new();
    let repairs = account(&db, scheme_id, "6100").await;
    let invoice_id = insert_invoice(&db, scheme_id, "INV-0042").await;

    let service = InvoicePaymentService::new(db.clone(), &LedgerConfig::default());
    let input = PayInvoiceInput {
        transaction_date: date(2026, 9, 1),
        fund_type: FundType::Admin,
        category_id: repairs.id,
        gst_amount: dec!(30.00),
        payment_method: Some("bpay".to_string()),
    };
    let paid = service
        .pay_invoice(scheme_id, invoice_id, input.clone())
        .await
        .unwrap();
    assert_eq!(paid.transaction.amount, dec!(330.00));
    assert_eq!(paid.transaction.reference.as_deref(), Some("INV-0042"));

    let stored = maintenance_invoices::Entity::find_by_id(invoice_id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.payment_reference,
        Some(paid.transaction.id.into_inner())
    );
    assert!(stored.paid_at.is_some());

    let twice = service.pay_invoice(scheme_id, invoice_id, input).await;
    assert!(matches!(
        twice,
        Err(RepositoryError::InvoiceAlreadyPaid { .. })
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_unknown_invoice_is_not_found() {
    let db = connect().await;
    let service = InvoicePaymentService::new(db, &LedgerConfig::default());

    let result = service
        .pay_invoice(
            SchemeId::new(),
            InvoiceId::new(),
            PayInvoiceInput {
                transaction_date: date(2026, 9, 1),
                fund_type: FundType::Admin,
                category_id: strata_shared::types::AccountId::new(),
                gst_amount: dec!(0),
                payment_method: None,
            },
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::InvoiceNotFound(_))));
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_failed_stamp_keeps_the_recorded_payment() {
    let db = connect().await;
    db.execute_unprepared(REJECT_STAMP_TRIGGER).await.unwrap();
    let scheme_id = SchemeId::new();
    let repairs = account(&db, scheme_id, "6100").await;
    let invoice_id = insert_invoice(&db, scheme_id, &format!("STAMP-REJECT-{scheme_id}")).await;

    let service = InvoicePaymentService::new(db.clone(), &LedgerConfig::default());
    let err = service
        .pay_invoice(
            scheme_id,
            invoice_id,
            PayInvoiceInput {
                transaction_date: date(2026, 9, 1),
                fund_type: FundType::Admin,
                category_id: repairs.id,
                gst_amount: dec!(0),
                payment_method: None,
            },
        )
        .await
        .unwrap_err();

    let (transaction_id, reason) = match err {
        RepositoryError::PaymentStampFailed {
            invoice_id: unstamped,
            transaction_id,
            reason,
        } => {
            assert_eq!(unstamped, invoice_id);
            (transaction_id, reason)
        }
        other => panic!("Expected PaymentStampFailed, got {other:?}"),
    };
    assert!(reason.contains("locked by the accounts team"), "{reason}");

    let payment = TransactionRepository::new(db.clone(), &LedgerConfig::default())
        .find_transaction(scheme_id, transaction_id)
        .await
        .unwrap();
    assert!(!payment.transaction.is_voided());
    assert_eq!(payment.transaction.amount, dec!(330.00));
    assert_eq!(payment.lines.len(), 2);

    let stored = maintenance_invoices::Entity::find_by_id(invoice_id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.payment_reference, None);
    assert_eq!(stored.paid_at, None);
}
