//! Postgres leave store.
//!
//! Each unit of work is one database transaction. Balance rows and
//! transaction headers are read with `SELECT ... FOR UPDATE`; annual-cap
//! checks and daily numbering, which have no single row to lock, take a
//! transaction-scoped advisory lock instead.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set}, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Statement, TransactionTrait, sea_query::OnConflict,
};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use kawani_core::leave::{
    EmployeeLeaveSummary, LeaveBalance, LeaveError, LeaveStore, LeaveTransaction, LeaveTransactionDetail,
    LeaveTransactionRecord, LeaveType, LeaveUnitOfWork, QuestionAnswer, TransactionFilter,
};
use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId};

use super::mapping;
use crate::cache::LeaveTypeCache;
use crate::entities::{
    leave_balances, leave_question_answers, leave_transaction_details, leave_transactions,
    leave_types,
};

const ADVISORY_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

const ANNUAL_USAGE_SQL: &str = r"
SELECT COALESCE(SUM(t.deducted_credit), 0) AS used
FROM leave_transactions t
WHERE t.employee_id = $1
  AND t.leave_type_id = $2
  AND t.status IN ('Approved', 'For Approval', 'Returned')
  AND t.id IS DISTINCT FROM $4
  AND (
      SELECT EXTRACT(YEAR FROM MIN(d.leave_date))::int
      FROM leave_transaction_details d
      WHERE d.transaction_id = t.id
  ) = $3
";

#[derive(Debug, FromQueryResult)]
struct UsageRow {
    used: Decimal,
}

const EMPLOYEE_SUMMARY_SQL: &str = r"
SELECT b.employee_id,
       b.vl,
       b.sl,
       COALESCE(SUM(t.deducted_credit) FILTER (WHERE t.status <> 'Cancelled'), 0) AS filed_credit,
       COUNT(t.id) FILTER (WHERE t.status = 'Approved') AS approved_count
FROM leave_balances b
LEFT JOIN leave_transactions t ON t.employee_id = b.employee_id
GROUP BY b.employee_id, b.vl, b.sl
ORDER BY b.employee_id
";

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    employee_id: Uuid,
    vl: Decimal,
    sl: Decimal,
    filed_credit: Decimal,
    approved_count: i64,
}

#[allow(clippy::needless_pass_by_value)]
fn storage(e: DbErr) -> LeaveError {
    LeaveError::Storage(e.to_string())
}

/// Leave store backed by Postgres.
#[derive(Debug, Clone)]
pub struct LeaveRepository {
    db: DatabaseConnection,
    leave_types: LeaveTypeCache,
}

impl LeaveRepository {
    /// Creates a new leave repository with a default leave type cache.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_cache(db, LeaveTypeCache::new())
    }

    /// Creates a new leave repository sharing `leave_types`.
    #[must_use]
    pub const fn with_cache(db: DatabaseConnection, leave_types: LeaveTypeCache) -> Self {
        Self { db, leave_types }
    }

    /// Inserts or updates a leave type by code and returns the stored row.
    pub async fn upsert_leave_type(&self, leave_type: &LeaveType) -> Result<LeaveType, LeaveError> {
        let model = leave_types::ActiveModel {
            id: Set(leave_type.id.into_inner()),
            code: Set(leave_type.code.clone()),
            name: Set(leave_type.name.clone()),
            charging_mode: Set(leave_type.charging_mode.as_str().to_string()),
            annual_entitlement: Set(leave_type.annual_entitlement),
            created_at: NotSet,
        };

        leave_types::Entity::insert(model)
            .on_conflict(
                OnConflict::column(leave_types::Column::Code)
                    .update_columns([
                        leave_types::Column::Name,
                        leave_types::Column::ChargingMode,
                        leave_types::Column::AnnualEntitlement,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;

        let stored = leave_types::Entity::find()
            .filter(leave_types::Column::Code.eq(leave_type.code.as_str()))
            .one(&self.db)
            .await
            .map_err(storage)?
            .ok_or(LeaveError::LeaveTypeNotFound(leave_type.id))?;
        let stored = mapping::leave_type(stored)?;

        self.leave_types.invalidate(stored.id).await;
        Ok(stored)
    }

    /// Sets an employee's balances, creating the row if needed.
    pub async fn upsert_balance(&self, balance: &LeaveBalance) -> Result<(), LeaveError> {
        leave_balances::Entity::insert(mapping::balance_active(balance))
            .on_conflict(
                OnConflict::column(leave_balances::Column::EmployeeId)
                    .update_columns([
                        leave_balances::Column::Vl,
                        leave_balances::Column::Sl,
                        leave_balances::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn records(
        &self,
        headers: Vec<leave_transactions::Model>,
    ) -> Result<Vec<LeaveTransactionRecord>, LeaveError> {
        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut details: HashMap<Uuid, Vec<LeaveTransactionDetail>> = HashMap::new();
        for row in leave_transaction_details::Entity::find()
            .filter(leave_transaction_details::Column::TransactionId.is_in(ids.clone()))
            .order_by_asc(leave_transaction_details::Column::LeaveDate)
            .all(&self.db)
            .await
            .map_err(storage)?
        {
            details
                .entry(row.transaction_id)
                .or_default()
                .push(mapping::detail(row));
        }

        let mut answers: HashMap<Uuid, QuestionAnswer> = leave_question_answers::Entity::find()
            .filter(leave_question_answers::Column::TransactionId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(|row| (row.transaction_id, mapping::question_answer(row)))
            .collect();

        headers
            .into_iter()
            .map(|header| {
                let id = header.id;
                Ok(LeaveTransactionRecord {
                    transaction: mapping::transaction(header)?,
                    details: details.remove(&id).unwrap_or_default(),
                    question_answer: answers.remove(&id),
                })
            })
            .collect()
    }
}

/// Unit of work over one Postgres transaction.
pub struct PgUnitOfWork {
    txn: DatabaseTransaction,
    leave_types: LeaveTypeCache,
}

impl PgUnitOfWork {
    async fn advisory_lock(&self, key: String) -> Result<(), LeaveError> {
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                ADVISORY_LOCK_SQL,
                [key.into()],
            ))
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl LeaveUnitOfWork for PgUnitOfWork {
    async fn find_leave_type(&mut self, id: LeaveTypeId) -> Result<Option<LeaveType>, LeaveError> {
        // Served outside the transaction. Writes through `upsert_leave_type`
        // invalidate the entry; direct SQL edits show up within the cache TTL.
        if let Some(hit) = self.leave_types.get(id).await {
            return Ok(Some(hit));
        }

        let Some(model) = leave_types::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };

        let leave_type = mapping::leave_type(model)?;
        self.leave_types.insert(leave_type.clone()).await;
        Ok(Some(leave_type))
    }

    async fn lock_balance(
        &mut self,
        employee_id: EmployeeId,
    ) -> Result<Option<LeaveBalance>, LeaveError> {
        Ok(leave_balances::Entity::find_by_id(employee_id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(storage)?
            .map(mapping::balance))
    }

    async fn save_balance(&mut self, balance: &LeaveBalance) -> Result<(), LeaveError> {
        mapping::balance_active(balance)
            .update(&self.txn)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn lock_annual_usage(
        &mut self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
    ) -> Result<(), LeaveError> {
        self.advisory_lock(format!("leave-usage:{employee_id}:{leave_type_id}:{year}"))
            .await
    }

    async fn annual_usage(
        &mut self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
        exclude: Option<LeaveTransactionId>,
    ) -> Result<Decimal, LeaveError> {
        let row = UsageRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            ANNUAL_USAGE_SQL,
            [
                employee_id.into_inner().into(),
                leave_type_id.into_inner().into(),
                year.into(),
                exclude.map(LeaveTransactionId::into_inner).into(),
            ],
        ))
        .one(&self.txn)
        .await
        .map_err(storage)?;

        Ok(row.map_or(Decimal::ZERO, |r| r.used))
    }

    async fn lock_transaction(
        &mut self,
        id: LeaveTransactionId,
    ) -> Result<Option<LeaveTransaction>, LeaveError> {
        leave_transactions::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(storage)?
            .map(mapping::transaction)
            .transpose()
    }

    async fn detail_dates(&mut self, id: LeaveTransactionId) -> Result<Vec<NaiveDate>, LeaveError> {
        let rows = leave_transaction_details::Entity::find()
            .filter(leave_transaction_details::Column::TransactionId.eq(id.into_inner()))
            .order_by_asc(leave_transaction_details::Column::LeaveDate)
            .all(&self.txn)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(|r| r.leave_date).collect())
    }

    async fn count_created_on(&mut self, day: NaiveDate) -> Result<u64, LeaveError> {
        // Numbers are handed out in commit order per day.
        self.advisory_lock(format!("leave-number:{day}")).await?;

        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        leave_transactions::Entity::find()
            .filter(leave_transactions::Column::CreatedAt.gte(start))
            .filter(leave_transactions::Column::CreatedAt.lt(end))
            .count(&self.txn)
            .await
            .map_err(storage)
    }

    async fn insert_transaction(
        &mut self,
        transaction: &LeaveTransaction,
    ) -> Result<(), LeaveError> {
        leave_transactions::Entity::insert(mapping::transaction_active(transaction))
            .exec_without_returning(&self.txn)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn update_transaction(
        &mut self,
        transaction: &LeaveTransaction,
    ) -> Result<(), LeaveError> {
        mapping::transaction_active(transaction)
            .update(&self.txn)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => LeaveError::TransactionNotFound(transaction.id),
                other => storage(other),
            })?;
        Ok(())
    }

    async fn replace_details(
        &mut self,
        id: LeaveTransactionId,
        details: &[LeaveTransactionDetail],
    ) -> Result<(), LeaveError> {
        leave_transaction_details::Entity::delete_many()
            .filter(leave_transaction_details::Column::TransactionId.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(storage)?;

        if details.is_empty() {
            return Ok(());
        }

        leave_transaction_details::Entity::insert_many(details.iter().map(mapping::detail_active))
            .exec_without_returning(&self.txn)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn replace_question_answer(
        &mut self,
        id: LeaveTransactionId,
        answer: Option<&QuestionAnswer>,
    ) -> Result<(), LeaveError> {
        leave_question_answers::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(storage)?;

        if let Some(answer) = answer {
            leave_question_answers::ActiveModel {
                transaction_id: Set(id.into_inner()),
                question_id: Set(answer.question_id.clone()),
                answer: Set(answer.answer.clone()),
            }
            .insert(&self.txn)
            .await
            .map_err(storage)?;
        }
        Ok(())
    }

    async fn delete_transaction(&mut self, id: LeaveTransactionId) -> Result<(), LeaveError> {
        let id = id.into_inner();
        leave_question_answers::Entity::delete_by_id(id)
            .exec(&self.txn)
            .await
            .map_err(storage)?;
        leave_transaction_details::Entity::delete_many()
            .filter(leave_transaction_details::Column::TransactionId.eq(id))
            .exec(&self.txn)
            .await
            .map_err(storage)?;
        leave_transactions::Entity::delete_by_id(id)
            .exec(&self.txn)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), LeaveError> {
        self.txn.commit().await.map_err(storage)
    }
}

#[async_trait]
impl LeaveStore for LeaveRepository {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, LeaveError> {
        let txn = self.db.begin().await.map_err(storage)?;
        Ok(PgUnitOfWork {
            txn,
            leave_types: self.leave_types.clone(),
        })
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, LeaveError> {
        leave_types::Entity::find()
            .order_by_asc(leave_types::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(mapping::leave_type)
            .collect()
    }

    async fn find_balance(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<LeaveBalance>, LeaveError> {
        Ok(leave_balances::Entity::find_by_id(employee_id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(mapping::balance))
    }

    async fn find_transaction(
        &self,
        id: LeaveTransactionId,
    ) -> Result<Option<LeaveTransactionRecord>, LeaveError> {
        let Some(header) = leave_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };

        Ok(self.records(vec![header]).await?.pop())
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<LeaveTransactionRecord>, LeaveError> {
        let mut query = leave_transactions::Entity::find();

        if let Some(employee_id) = filter.employee_id {
            query = query.filter(leave_transactions::Column::EmployeeId.eq(employee_id.into_inner()));
        }
        if let Some(leave_type_id) = filter.leave_type_id {
            query =
                query.filter(leave_transactions::Column::LeaveTypeId.eq(leave_type_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(leave_transactions::Column::Status.eq(status.as_str()));
        }
        if filter.date_from.is_some() || filter.date_to.is_some() {
            let mut dates = leave_transaction_details::Entity::find()
                .select_only()
                .column(leave_transaction_details::Column::TransactionId);
            if let Some(from) = filter.date_from {
                dates = dates.filter(leave_transaction_details::Column::LeaveDate.gte(from));
            }
            if let Some(to) = filter.date_to {
                dates = dates.filter(leave_transaction_details::Column::LeaveDate.lte(to));
            }
            query = query.filter(leave_transactions::Column::Id.in_subquery(dates.into_query()));
        }

        let headers = query
            .order_by_desc(leave_transactions::Column::CreatedAt)
            .order_by_desc(leave_transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        debug!(count = headers.len(), "Leave transactions listed");
        self.records(headers).await
    }

    async fn employee_summaries(&self) -> Result<Vec<EmployeeLeaveSummary>, LeaveError> {
        let rows = SummaryRow::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            EMPLOYEE_SUMMARY_SQL,
        ))
        .all(&self.db)
        .await
        .map_err(storage)?;

        Ok(rows
            .into_iter()
            .map(|r| EmployeeLeaveSummary {
                employee_id: EmployeeId::from_uuid(r.employee_id),
                vl: r.vl,
                sl: r.sl,
                filed_credit: r.filed_credit,
                approved_count: u64::try_from(r.approved_count).unwrap_or_default(),
            })
            .collect())
    }
}
