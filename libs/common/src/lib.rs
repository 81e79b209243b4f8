//! Shared infrastructure for the personnel bookkeeping application
//!
//! This crate holds what the API service needs but does not own: the
//! PostgreSQL connection pool with its environment-driven configuration,
//! and the database error taxonomy.

pub mod database;
pub mod error;
