//! Entity re-exports.

pub use super::leave_balances::Entity as LeaveBalances;
pub use super::leave_question_answers::Entity as LeaveQuestionAnswers;
pub use super::leave_transaction_details::Entity as LeaveTransactionDetails;
pub use super::leave_transactions::Entity as LeaveTransactions;
pub use super::leave_types::Entity as LeaveTypes;
