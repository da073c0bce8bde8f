//! Core business logic for Kawani.
//!
//! This crate has no web framework or database driver dependencies; storage
//! is reached through the `LeaveStore` trait. Domain types, validation rules
//! and calculations live here.
//!
//! # Modules
//!
//! - `leave` - Leave transaction ledger and approval state machine

pub mod leave;
