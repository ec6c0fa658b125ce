//! Ports - abstraction layer
//!
//! Traits at the boundary between the task logic and the outside world.
//! Only persistence sits behind a port; networking is plain tokio I/O.

pub mod task_store;

pub use self::task_store::TaskStore;
