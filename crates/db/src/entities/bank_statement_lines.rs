//! `SeaORM` Entity for bank_statement_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::NonLedgerCategory;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_statement_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub statement_id: Uuid,
    pub line_number: i32,
    pub line_date: Date,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub debit_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub credit_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub running_balance: Option<Decimal>,
    pub matched: bool,
    #[sea_orm(unique)]
    pub matched_transaction_id: Option<Uuid>,
    pub non_ledger_category: Option<NonLedgerCategory>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_statements::Entity",
        from = "Column::StatementId",
        to = "super::bank_statements::Column::Id"
    )]
    BankStatements,
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::MatchedTransactionId",
        to = "super::transactions::Column::Id"
    )]
    Transactions,
}

impl Related<super::bank_statements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankStatements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
