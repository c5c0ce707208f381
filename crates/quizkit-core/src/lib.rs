//! quizkit-core: Question bank, attempt state machine, and dashboard aggregation.
//!
//! This crate defines the data model, the timed attempt session, and the
//! `ResultStore` seam that the storage, reporting, and CLI crates build on.

pub mod admin;
pub mod bank;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod parser;
pub mod session;
pub mod traits;
