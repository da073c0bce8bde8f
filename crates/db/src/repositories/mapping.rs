//! Conversions between leave rows and domain types.

use chrono::Utc;
use sea_orm::ActiveValue::Set;

use kawani_core::leave::{
    ChargingMode, LeaveBalance, LeaveError, LeaveStatus, LeaveTransaction, LeaveTransactionDetail,
    LeaveType, QuestionAnswer,
};
use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId, UserId};

use crate::entities::{
    leave_balances, leave_question_answers, leave_transaction_details, leave_transactions,
    leave_types,
};

fn charging_mode(raw: &str) -> Result<ChargingMode, LeaveError> {
    ChargingMode::parse(raw)
        .ok_or_else(|| LeaveError::Storage(format!("unknown charging mode in database: {raw}")))
}

pub(crate) fn leave_type(model: leave_types::Model) -> Result<LeaveType, LeaveError> {
    Ok(LeaveType {
        id: LeaveTypeId::from_uuid(model.id),
        charging_mode: charging_mode(&model.charging_mode)?,
        code: model.code,
        name: model.name,
        annual_entitlement: model.annual_entitlement,
    })
}

pub(crate) fn balance(model: leave_balances::Model) -> LeaveBalance {
    LeaveBalance {
        employee_id: EmployeeId::from_uuid(model.employee_id),
        vl: model.vl,
        sl: model.sl,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn balance_active(balance: &LeaveBalance) -> leave_balances::ActiveModel {
    leave_balances::ActiveModel {
        employee_id: Set(balance.employee_id.into_inner()),
        vl: Set(balance.vl),
        sl: Set(balance.sl),
        updated_at: Set(balance.updated_at.into()),
    }
}

pub(crate) fn transaction(model: leave_transactions::Model) -> Result<LeaveTransaction, LeaveError> {
    Ok(LeaveTransaction {
        id: LeaveTransactionId::from_uuid(model.id),
        charging_mode: charging_mode(&model.charging_mode)?,
        status: LeaveStatus::normalize(&model.status),
        transaction_no: model.transaction_no,
        employee_id: EmployeeId::from_uuid(model.employee_id),
        leave_type_id: LeaveTypeId::from_uuid(model.leave_type_id),
        deducted_credit: model.deducted_credit,
        purpose: model.purpose,
        remarks: model.remarks,
        created_by: model.created_by.map(UserId::from_uuid),
        created_at: model.created_at.with_timezone(&Utc),
        approved_by: model.approved_by.map(UserId::from_uuid),
        approved_at: model.approved_at.map(|at| at.with_timezone(&Utc)),
        updated_by: model.updated_by.map(UserId::from_uuid),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn transaction_active(tx: &LeaveTransaction) -> leave_transactions::ActiveModel {
    leave_transactions::ActiveModel {
        id: Set(tx.id.into_inner()),
        transaction_no: Set(tx.transaction_no.clone()),
        employee_id: Set(tx.employee_id.into_inner()),
        leave_type_id: Set(tx.leave_type_id.into_inner()),
        charging_mode: Set(tx.charging_mode.as_str().to_string()),
        deducted_credit: Set(tx.deducted_credit),
        purpose: Set(tx.purpose.clone()),
        remarks: Set(tx.remarks.clone()),
        status: Set(tx.status.as_str().to_string()),
        created_by: Set(tx.created_by.map(UserId::into_inner)),
        created_at: Set(tx.created_at.into()),
        approved_by: Set(tx.approved_by.map(UserId::into_inner)),
        approved_at: Set(tx.approved_at.map(Into::into)),
        updated_by: Set(tx.updated_by.map(UserId::into_inner)),
        updated_at: Set(tx.updated_at.into()),
    }
}

pub(crate) fn detail(model: leave_transaction_details::Model) -> LeaveTransactionDetail {
    LeaveTransactionDetail {
        transaction_id: LeaveTransactionId::from_uuid(model.transaction_id),
        leave_date: model.leave_date,
        credit_for_day: model.credit_for_day,
    }
}

pub(crate) fn detail_active(
    detail: &LeaveTransactionDetail,
) -> leave_transaction_details::ActiveModel {
    leave_transaction_details::ActiveModel {
        transaction_id: Set(detail.transaction_id.into_inner()),
        leave_date: Set(detail.leave_date),
        credit_for_day: Set(detail.credit_for_day),
    }
}

pub(crate) fn question_answer(model: leave_question_answers::Model) -> QuestionAnswer {
    QuestionAnswer {
        question_id: model.question_id,
        answer: model.answer,
    }
}
