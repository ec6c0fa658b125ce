//! CsvTaskStore - partition table in a delimited text file.
//!
//! # Format
//! ```text
//! TarefaID,Descricao,Estado,ClienteID
//! 1,Rever relatorio,Nao alocado,-1
//! 2,Atualizar inventario,Em curso,3
//! ```
//! - the first line is always the header and is never interpreted as data
//! - `ClienteID` is `-1` when the task has no owner
//! - one physical line is one row; `"` is an ordinary character, so a stray
//!   quote cannot swallow the rows after it
//! - nothing is quoted or escaped, so a description never contains `,`

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::domain::{ClientId, Task, TaskId, TaskStatus};
use crate::error::{RowError, StoreError};
use crate::ports::TaskStore;

pub const HEADER: [&str; 4] = ["TarefaID", "Descricao", "Estado", "ClienteID"];

const NO_OWNER: i64 = -1;

/// Positional row layout. Field order matches [`HEADER`].
#[derive(Debug, Serialize, Deserialize)]
struct TaskRow {
    id: TaskId,
    description: String,
    status: TaskStatus,
    owner: i64,
}

impl TaskRow {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id(),
            description: task.description().to_string(),
            status: task.status(),
            owner: task.owner().map_or(NO_OWNER, |client| client.get() as i64),
        }
    }

    fn into_task(self) -> Result<Task, RowError> {
        let owner = match self.owner {
            NO_OWNER => None,
            n if n > 0 => Some(ClientId::new(n as u64)),
            n => return Err(RowError::InvalidOwner(n)),
        };
        Task::restore(self.id, self.description, self.status, owner)
    }
}

/// File-backed [`TaskStore`].
#[derive(Debug, Clone)]
pub struct CsvTaskStore {
    path: PathBuf,
}

impl CsvTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next save is staged in before it replaces `path`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TaskStore for CsvTaskStore {
    async fn load(&self) -> Result<Vec<Task>, StoreError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;
        Ok(decode(&bytes, &self.describe()))
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let bytes = encode(tasks).map_err(|source| StoreError::Encode {
            path: self.path.clone(),
            source,
        })?;

        let staging = self.staging_path();
        if let Err(source) = write_and_replace(&staging, &self.path, &bytes).await {
            // best effort: a stale staging file is harmless but untidy
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse a whole table. Rows that fail to parse are logged and skipped.
fn decode(bytes: &[u8], origin: &str) -> Vec<Task> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut tasks = Vec::new();
    for record in reader.records() {
        let line = match &record {
            Ok(record) => record.position().map(|p| p.line()),
            Err(err) => err.position().map(|p| p.line()),
        };
        let parsed = record
            .map_err(RowError::from)
            .and_then(|record| parse_record(&record));
        match parsed {
            Ok(task) => tasks.push(task),
            Err(err) => {
                tracing::warn!(store = origin, line, error = %err, "skipping malformed row");
            }
        }
    }
    tasks
}

fn parse_record(record: &csv::StringRecord) -> Result<Task, RowError> {
    if record.len() != HEADER.len() {
        return Err(RowError::FieldCount {
            expected: HEADER.len(),
            found: record.len(),
        });
    }
    let row: TaskRow = record.deserialize(None)?;
    row.into_task()
}

fn encode(tasks: &[Task]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    // header is written by hand so an empty partition still gets one
    writer.write_record(HEADER)?;
    for task in tasks {
        writer.serialize(TaskRow::from_task(task))?;
    }
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

async fn write_and_replace(staging: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(staging).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(staging, target).await
}
