//! InMemoryTaskStore - development/test store
//!
//! Keeps the "persisted" sequence in memory, counts saves and can be told to
//! fail, which is how the unsynced-partition paths get exercised without
//! breaking a real filesystem.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::Task;
use crate::error::StoreError;
use crate::ports::TaskStore;

pub struct InMemoryTaskStore {
    name: String,
    rows: Mutex<Vec<Task>>,
    saves: AtomicUsize,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl InMemoryTaskStore {
    pub fn new(name: impl Into<String>, rows: Vec<Task>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(rows),
            saves: AtomicUsize::new(0),
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current stored sequence (what the last successful save wrote).
    pub async fn snapshot(&self) -> Vec<Task> {
        self.rows.lock().await.clone()
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn load(&self) -> Result<Vec<Task>, StoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} refused load", self.name)));
        }
        Ok(self.rows.lock().await.clone())
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{} refused save", self.name)));
        }
        *self.rows.lock().await = tasks.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}
