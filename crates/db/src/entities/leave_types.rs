//! `SeaORM` Entity for leave_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    /// `VL`, `SL` or `ND`.
    pub charging_mode: String,
    #[sea_orm(column_type = "Decimal(Some((8, 4)))", nullable)]
    pub annual_entitlement: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::leave_transactions::Entity")]
    LeaveTransactions,
}

impl Related<super::leave_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
