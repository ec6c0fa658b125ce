use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::app::builder::BuildError;
use crate::domain::{ClientId, TaskStatus};

/// Why a persisted row was rejected. Rejected rows are skipped, never fatal.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("cannot decode row: {0}")]
    Decode(#[from] csv::Error),

    #[error("owner {0} is neither -1 nor a client id")]
    InvalidOwner(i64),

    #[error("status '{status}' does not match owner {owner:?}")]
    OwnerMismatch {
        status: TaskStatus,
        owner: Option<ClientId>,
    },
}

/// Backing store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening or reading the backing file failed. Fatal to the partition at startup.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode rows for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Startup and accept-loop failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
