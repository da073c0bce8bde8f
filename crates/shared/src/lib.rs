//! Shared types, errors, and configuration for Kawani.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for employees, users, leave types and leave transactions
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token handling

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, JwtSettings, LeaveSettings};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
