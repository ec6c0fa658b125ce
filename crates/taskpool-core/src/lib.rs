//! taskpool-core
//!
//! Core building blocks of the task-assignment server.
//!
//! # Modules
//! - **domain**: ids, tasks and their state machine, the four partitions
//! - **ports**: the `TaskStore` persistence seam
//! - **impls**: CSV and in-memory `TaskStore` implementations
//! - **store**: `PartitionStore`, one lock per partition
//! - **app**: registry, wire protocol, connection handler, accept loop
//! - **config**: listen address and partition file paths
//! - **observability**: per-partition counts
//! - **error**: error types

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
