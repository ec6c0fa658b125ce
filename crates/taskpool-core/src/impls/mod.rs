//! Impls - TaskStore implementations
//!
//! # Included
//! - **CsvTaskStore**: delimited text file per partition (production)
//! - **InMemoryTaskStore**: seeded rows with failure injection (tests, local runs)

pub mod csv_store;
pub mod memory_store;

pub use self::csv_store::CsvTaskStore;
pub use self::memory_store::InMemoryTaskStore;
