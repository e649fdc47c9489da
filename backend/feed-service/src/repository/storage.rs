//! Durable medium for the post collection
//!
//! The medium has no partial-update primitive: callers read every row and
//! replace every row. `replace` must be atomic so a failed write never leaves
//! a half-written collection behind.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::codec::Row;
use super::legacy_csv;
use crate::error::{FeedError, FeedResult};

#[async_trait]
pub trait PostStorage: Send + Sync {
    /// Read every row in insertion order
    async fn load(&self) -> FeedResult<Vec<Row>>;

    /// Atomically replace the whole collection
    async fn replace(&self, rows: &[Row]) -> FeedResult<()>;
}

// ============================================
// File storage (JSON Lines)
// ============================================

/// One JSON array of cells per line.
///
/// Writes go to a sibling temp file which is synced and then renamed over the
/// target, so readers see either the old or the new collection.
///
/// With a legacy CSV file configured, `load` reads that file while the JSON
/// Lines file does not exist yet; the first `replace` then moves the
/// collection over to JSON Lines and the CSV file is no longer consulted.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    legacy_csv: Option<PathBuf>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy_csv: None,
        }
    }

    pub fn with_legacy_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_csv = Some(path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "posts".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
    }
}

#[async_trait]
impl PostStorage for FileStorage {
    async fn load(&self) -> FeedResult<Vec<Row>> {
        let raw = match read_if_exists(&self.path).await? {
            Some(raw) => raw,
            None => return self.load_legacy().await,
        };

        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| parse_line(line, idx + 1))
            .collect()
    }

    async fn replace(&self, rows: &[Row]) -> FeedResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut buf = String::new();
        for row in rows {
            let line = serde_json::to_string(row).map_err(|e| {
                FeedError::StoreIo(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;
            buf.push_str(&line);
            buf.push('\n');
        }

        let tmp = self.temp_path();
        if let Err(e) = write_synced(&tmp, buf.as_bytes()).await {
            remove_temp(&tmp).await;
            return Err(FeedError::StoreIo(e));
        }

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            remove_temp(&tmp).await;
            return Err(FeedError::StoreIo(e));
        }

        debug!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

impl FileStorage {
    async fn load_legacy(&self) -> FeedResult<Vec<Row>> {
        let Some(csv_path) = &self.legacy_csv else {
            debug!("Feed file {} does not exist yet", self.path.display());
            return Ok(Vec::new());
        };

        match read_if_exists(csv_path).await? {
            Some(raw) => {
                let rows = legacy_csv::parse(&raw)?;
                info!(
                    "Read {} legacy rows from {}; they move to {} on the next write",
                    rows.len(),
                    csv_path.display(),
                    self.path.display()
                );
                Ok(rows)
            }
            None => {
                debug!(
                    "Neither {} nor {} exists yet",
                    self.path.display(),
                    csv_path.display()
                );
                Ok(Vec::new())
            }
        }
    }
}

async fn read_if_exists(path: &Path) -> FeedResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FeedError::StoreIo(e)),
    }
}

async fn remove_temp(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await {
        warn!("Failed to remove temp file {}: {}", tmp.display(), e);
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

/// Scalar cells are accepted as text; null reads as an empty cell
fn parse_line(line: &str, line_no: usize) -> FeedResult<Row> {
    let cells: Vec<Value> = serde_json::from_str(line).map_err(|e| FeedError::Corrupt {
        line: line_no,
        reason: e.to_string(),
    })?;

    cells
        .into_iter()
        .map(|cell| match cell {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(FeedError::Corrupt {
                line: line_no,
                reason: format!("unexpected cell {}", other),
            }),
        })
        .collect()
}

// ============================================
// In-memory storage
// ============================================

/// Collection held in memory; same contract as `FileStorage`
#[derive(Debug, Default)]
pub struct MemoryStorage {
    rows: RwLock<Vec<Row>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with pre-existing rows, e.g. records from an older schema
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl PostStorage for MemoryStorage {
    async fn load(&self) -> FeedResult<Vec<Row>> {
        Ok(self.rows.read().await.clone())
    }

    async fn replace(&self, rows: &[Row]) -> FeedResult<()> {
        *self.rows.write().await = rows.to_vec();
        Ok(())
    }
}
