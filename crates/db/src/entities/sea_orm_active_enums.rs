//! `SeaORM` active enums mirroring the PostgreSQL enum types.
//!
//! Each enum converts losslessly to and from its `strata-core` counterpart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strata_core::{accounts, ledger, reconciliation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fund_type")]
pub enum FundType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "capital_works")]
    CapitalWorks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "receipt")]
    Receipt,
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "journal")]
    Journal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "line_side")]
pub enum LineSide {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "eft")]
    Eft,
    #[sea_orm(string_value = "bpay")]
    Bpay,
    #[sea_orm(string_value = "cheque")]
    Cheque,
    #[sea_orm(string_value = "direct_debit")]
    DirectDebit,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "cash")]
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reconciliation_status")]
pub enum ReconciliationStatus {
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "reconciled")]
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "non_ledger_category")]
pub enum NonLedgerCategory {
    #[sea_orm(string_value = "bank_fee")]
    BankFee,
    #[sea_orm(string_value = "interest")]
    Interest,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Generates `From` conversions in both directions between a database
/// enum and its domain twin.
macro_rules! mirror_enum {
    ($db:ident, $module:ident :: $domain:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $module::$domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$domain> for $db {
            fn from(value: $module::$domain) -> Self {
                match value {
                    $($module::$domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType, accounts::AccountType, [Asset, Liability, Equity, Income, Expense]);
mirror_enum!(FundType, accounts::FundType, [Admin, CapitalWorks]);
mirror_enum!(TransactionType, ledger::TransactionType, [Receipt, Payment, Journal]);
mirror_enum!(LineSide, ledger::LineSide, [Debit, Credit]);
mirror_enum!(
    PaymentMethod,
    ledger::PaymentMethod,
    [Eft, Bpay, Cheque, DirectDebit, CreditCard, Cash]
);
mirror_enum!(
    ReconciliationStatus,
    reconciliation::ReconciliationStatus,
    [InProgress, Reconciled]
);
mirror_enum!(
    NonLedgerCategory,
    reconciliation::NonLedgerCategory,
    [BankFee, Interest, Other]
);
