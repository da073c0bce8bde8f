//! `SeaORM` entities for the leave ledger tables.

pub mod prelude;

pub mod leave_balances;
pub mod leave_question_answers;
pub mod leave_transaction_details;
pub mod leave_transactions;
pub mod leave_types;
