//! App - application layer
//!
//! Combines the partition stores into the task-assignment service and
//! exposes it over TCP.
//!
//! # Components
//! - **RegistryBuilder**: wiring + startup validation
//! - **TaskRegistry**: id routing, assign-next and mark-completed policies
//! - **protocol**: command parsing and reply text
//! - **ConnectionHandler**: per-client protocol loop
//! - **Server**: accept loop and client id allocation

pub mod builder;
pub mod connection;
pub mod protocol;
pub mod registry;
pub mod server;

pub use self::builder::{BuildError, RegistryBuilder};
pub use self::connection::ConnectionHandler;
pub use self::protocol::Command;
pub use self::registry::{AssignOutcome, CompletionOutcome, TaskRegistry};
pub use self::server::{ClientIdAllocator, Server};
