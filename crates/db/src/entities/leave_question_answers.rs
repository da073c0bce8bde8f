//! `SeaORM` Entity for leave_question_answers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_question_answers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_id: Uuid,
    pub question_id: String,
    #[sea_orm(column_type = "Text")]
    pub answer: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_transactions::Entity",
        from = "Column::TransactionId",
        to = "super::leave_transactions::Column::Id",
        on_delete = "Cascade"
    )]
    LeaveTransactions,
}

impl Related<super::leave_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
