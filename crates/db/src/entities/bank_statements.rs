//! `SeaORM` Entity for bank_statements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::FundType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_statements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub scheme_id: Uuid,
    pub fund_type: FundType,
    pub statement_date: Date,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub closing_balance: Decimal,
    pub skipped_rows: i32,
    pub imported_at: Option<DateTimeWithTimeZone>,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bank_statement_lines::Entity")]
    BankStatementLines,
    #[sea_orm(has_one = "super::reconciliations::Entity")]
    Reconciliations,
}

impl Related<super::bank_statement_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankStatementLines.def()
    }
}

impl Related<super::reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
