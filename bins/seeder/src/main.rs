//! Database seeder for local development.
//!
//! Seeds the standard leave types, a demo employee with opening VL and SL
//! balances, and prints access tokens for a demo HR user and the demo
//! employee. Re-running is safe: leave types upsert by code and the
//! balance row is overwritten.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use kawani_core::leave::{ChargingMode, LeaveBalance, LeaveType};
use kawani_db::LeaveRepository;
use kawani_shared::types::{EmployeeId, LeaveTypeId, UserId};
use kawani_shared::{AppConfig, JwtConfig, JwtService};

/// Demo employee ID (consistent for all seeds)
const DEMO_EMPLOYEE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0101);
/// Demo HR user ID
const DEMO_HR_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0201);
/// Demo employee's own user ID
const DEMO_EMPLOYEE_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0202);

/// Code, name, charging mode, annual entitlement.
const LEAVE_TYPES: [(&str, &str, ChargingMode, Option<Decimal>); 6] = [
    ("VL", "Vacation Leave", ChargingMode::Vl, None),
    ("SL", "Sick Leave", ChargingMode::Sl, None),
    ("LWOP", "Leave Without Pay", ChargingMode::Nd, None),
    ("SPL", "Special Privilege Leave", ChargingMode::Nd, Some(dec!(3))),
    ("SOLO", "Solo Parent Leave", ChargingMode::Nd, Some(dec!(7))),
    ("BDAY", "Birthday Leave", ChargingMode::Vl, Some(dec!(1))),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = kawani_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    let repo = LeaveRepository::new(db);

    println!("Seeding leave types...");
    for (code, name, charging_mode, annual_entitlement) in LEAVE_TYPES {
        let stored = repo
            .upsert_leave_type(&LeaveType {
                id: LeaveTypeId::new(),
                code: code.to_string(),
                name: name.to_string(),
                charging_mode,
                annual_entitlement,
            })
            .await?;
        println!("  {} {} ({})", stored.code, stored.name, stored.id);
    }

    println!("Seeding demo employee balance...");
    let employee_id = EmployeeId::from_uuid(DEMO_EMPLOYEE_ID);
    repo.upsert_balance(&LeaveBalance::new(employee_id, dec!(15), dec!(15)))
        .await?;
    println!("  {employee_id}: VL 15, SL 15");

    let jwt = JwtService::new(JwtConfig::from(&config.jwt));
    let hr_token = jwt.generate_access_token(UserId::from_uuid(DEMO_HR_USER_ID), None, "hr")?;
    let employee_token = jwt.generate_access_token(
        UserId::from_uuid(DEMO_EMPLOYEE_USER_ID),
        Some(employee_id),
        "employee",
    )?;

    println!("Demo tokens:");
    println!("  hr:       {hr_token}");
    println!("  employee: {employee_token}");
    println!("Seeding complete!");
    Ok(())
}
