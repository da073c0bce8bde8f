//! Repository implementations for data access.

mod mapping;

pub mod leave;

pub use leave::{LeaveRepository, PgUnitOfWork};
