//! quizkit-store: Persistence for questions and quiz results.
//!
//! Implements the `ResultStore` trait over append-only CSV tables, plus
//! an in-memory store for tests.

pub mod csv_store;
pub mod memory;
pub mod questions;
mod rows;

pub use csv_store::CsvResultStore;
pub use memory::MemoryStore;
pub use questions::{load_question_bank, seed_default_questions};
