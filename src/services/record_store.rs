//! Timer record persistence
//!
//! Records are the provisioning-time identity of a timer. Live countdown
//! state is never written here.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    fs,
    sync::{Mutex, RwLock},
};
use tracing::{debug, info};

use crate::{error::PersistenceError, state::INITIAL_SECONDS};

/// Stored identity and initial configuration of a timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub unique_id: String,
    pub time: u32,
    pub is_running: bool,
}

impl TimerRecord {
    /// Record with the default countdown configuration
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            time: INITIAL_SECONDS,
            is_running: false,
        }
    }
}

/// Key-value store for timer records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a default record; fails if `unique_id` is taken
    async fn create(&self, unique_id: &str) -> Result<TimerRecord, PersistenceError>;

    /// Look up a record; `Ok(None)` when absent
    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<TimerRecord>, PersistenceError>;

    async fn count(&self) -> Result<usize, PersistenceError>;
}

/// Records kept in process memory only
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, TimerRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, unique_id: &str) -> Result<TimerRecord, PersistenceError> {
        let mut records = self.records.write().await;
        if records.contains_key(unique_id) {
            return Err(PersistenceError::DuplicateId(unique_id.to_string()));
        }
        let record = TimerRecord::new(unique_id);
        records.insert(unique_id.to_string(), record.clone());
        Ok(record)
    }

    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<TimerRecord>, PersistenceError> {
        Ok(self.records.read().await.get(unique_id).cloned())
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.records.read().await.len())
    }
}

/// Records persisted as a JSON array, rewritten on every create
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    records: Mutex<HashMap<String, TimerRecord>>,
}

impl JsonFileRecordStore {
    /// Open `path`, loading existing records; a missing file starts empty
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str::<Vec<TimerRecord>>(&contents)?
                .into_iter()
                .map(|record| (record.unique_id.clone(), record))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Loaded {} timer record(s) from {}", records.len(), path.display());
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn persist(&self, records: &HashMap<String, TimerRecord>) -> Result<(), PersistenceError> {
        let mut sorted: Vec<&TimerRecord> = records.values().collect();
        sorted.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));
        let json = serde_json::to_vec_pretty(&sorted)?;

        let tmp_path = staging_path(&self.path);
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!("Wrote {} timer record(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Sibling of `path` used for atomic replacement; never equal to `path`
fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    PathBuf::from(staged)
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn create(&self, unique_id: &str) -> Result<TimerRecord, PersistenceError> {
        let mut records = self.records.lock().await;
        if records.contains_key(unique_id) {
            return Err(PersistenceError::DuplicateId(unique_id.to_string()));
        }

        let record = TimerRecord::new(unique_id);
        records.insert(unique_id.to_string(), record.clone());
        if let Err(e) = self.persist(&records).await {
            records.remove(unique_id);
            return Err(e);
        }
        Ok(record)
    }

    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<TimerRecord>, PersistenceError> {
        Ok(self.records.lock().await.get(unique_id).cloned())
    }

    async fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.records.lock().await.len())
    }
}
