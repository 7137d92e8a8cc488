use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::state::model::CrossState;
use crate::state::repository::CrossStateRepository;

/// Human-readable JSON file holding every symbol's record.
///
/// The whole map is rewritten on each mutation through a temp file and a
/// rename, so a crash leaves either the old or the new file. A missing file
/// is an empty store; deleting it forces every symbol to re-seed.
pub struct JsonFileRepository {
    path: PathBuf,
    records: Mutex<BTreeMap<String, CrossState>>,
}

impl JsonFileRepository {
    #[instrument(target = "store", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let records = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => {
                let mut records: BTreeMap<String, CrossState> = serde_json::from_str(&raw)?;
                for (symbol, state) in records.iter_mut() {
                    state.symbol = symbol.clone();
                }
                records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no state file yet; starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        debug!(records = records.len(), "cross state loaded");

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &BTreeMap<String, CrossState>) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(|source| {
            warn!(target: "store", error = %source, "state file rename failed");
            io_err(source)
        })
    }
}

impl CrossStateRepository for JsonFileRepository {
    fn get(&self, symbol: &str) -> Result<Option<CrossState>, StoreError> {
        Ok(self.records.lock().get(symbol).cloned())
    }

    fn put(&self, symbol: &str, state: &CrossState) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let mut record = state.clone();
        record.symbol = symbol.to_string();
        records.insert(symbol.to_string(), record);
        self.write_all(&records)
    }

    fn remove(&self, symbol: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock();
        if records.remove(symbol).is_none() {
            return Ok(false);
        }
        self.write_all(&records)?;
        info!(target: "store", symbol, "cross state reset");
        Ok(true)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        records.clear();
        self.write_all(&records)?;
        info!(target: "store", "all cross state cleared");
        Ok(())
    }

    fn list(&self) -> Result<Vec<CrossState>, StoreError> {
        Ok(self.records.lock().values().cloned().collect())
    }
}
