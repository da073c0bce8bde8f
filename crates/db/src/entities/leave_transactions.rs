//! `SeaORM` Entity for leave_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_no: String,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    /// Snapshot of the leave type's charging mode at filing time.
    pub charging_mode: String,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub deducted_credit: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub purpose: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::leave_types::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_types::Column::Id"
    )]
    LeaveTypes,
    #[sea_orm(has_many = "super::leave_transaction_details::Entity")]
    LeaveTransactionDetails,
    #[sea_orm(has_one = "super::leave_question_answers::Entity")]
    LeaveQuestionAnswers,
}

impl Related<super::leave_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTypes.def()
    }
}

impl Related<super::leave_transaction_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveTransactionDetails.def()
    }
}

impl Related<super::leave_question_answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveQuestionAnswers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
