//! Leave ledger schema.
//!
//! Creates leave types, per-employee balances, leave transaction headers,
//! their per-day details and the optional question answer.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEAVE_LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
            DROP TABLE IF EXISTS leave_question_answers CASCADE;
            DROP TABLE IF EXISTS leave_transaction_details CASCADE;
            DROP TABLE IF EXISTS leave_transactions CASCADE;
            DROP TABLE IF EXISTS leave_balances CASCADE;
            DROP TABLE IF EXISTS leave_types CASCADE;
            ",
        )
        .await?;
        Ok(())
    }
}

const LEAVE_LEDGER_SQL: &str = r"
-- Leave types and how they charge balances
CREATE TABLE leave_types (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(16) NOT NULL UNIQUE,
    name VARCHAR(100) NOT NULL,
    charging_mode VARCHAR(2) NOT NULL DEFAULT 'VL',
    annual_entitlement NUMERIC(8, 4),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_leave_type_charging_mode CHECK (charging_mode IN ('VL', 'SL', 'ND')),
    CONSTRAINT chk_leave_type_entitlement CHECK (annual_entitlement IS NULL OR annual_entitlement >= 0)
);

-- One running balance row per employee
CREATE TABLE leave_balances (
    employee_id UUID PRIMARY KEY,
    vl NUMERIC(10, 4) NOT NULL DEFAULT 0,
    sl NUMERIC(10, 4) NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_leave_balance_non_negative CHECK (vl >= 0 AND sl >= 0)
);

-- Leave transaction headers
CREATE TABLE leave_transactions (
    id UUID PRIMARY KEY,
    transaction_no VARCHAR(20) NOT NULL,
    employee_id UUID NOT NULL,
    leave_type_id UUID NOT NULL REFERENCES leave_types(id),
    charging_mode VARCHAR(2) NOT NULL,
    deducted_credit NUMERIC(10, 4) NOT NULL,
    purpose TEXT,
    remarks TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'For Approval',
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    updated_by UUID,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_leave_tx_charging_mode CHECK (charging_mode IN ('VL', 'SL', 'ND')),
    CONSTRAINT chk_leave_tx_credit CHECK (deducted_credit >= 0),
    CONSTRAINT chk_leave_tx_status CHECK (status IN ('For Approval', 'Approved', 'Returned', 'Cancelled')),
    CONSTRAINT chk_leave_tx_approval_stamp CHECK (
        status = 'Approved' OR (approved_by IS NULL AND approved_at IS NULL)
    )
);

-- Lookup by number; numbers are cosmetic and may repeat after a same-day delete
CREATE INDEX idx_leave_tx_number ON leave_transactions(transaction_no);

-- Annual usage and per-employee listing
CREATE INDEX idx_leave_tx_usage ON leave_transactions(employee_id, leave_type_id, status);

-- Daily transaction numbering and newest-first listing
CREATE INDEX idx_leave_tx_created ON leave_transactions(created_at DESC);

-- One row per leave date
CREATE TABLE leave_transaction_details (
    transaction_id UUID NOT NULL REFERENCES leave_transactions(id) ON DELETE CASCADE,
    leave_date DATE NOT NULL,
    credit_for_day NUMERIC(10, 4) NOT NULL,
    PRIMARY KEY (transaction_id, leave_date),
    CONSTRAINT chk_leave_detail_credit CHECK (credit_for_day >= 0)
);

CREATE INDEX idx_leave_detail_date ON leave_transaction_details(leave_date);

-- At most one answered question per transaction
CREATE TABLE leave_question_answers (
    transaction_id UUID PRIMARY KEY REFERENCES leave_transactions(id) ON DELETE CASCADE,
    question_id VARCHAR(64) NOT NULL,
    answer TEXT NOT NULL
);
";
