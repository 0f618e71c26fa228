use {
    super::AccessError,
    async_trait::async_trait,
    std::{
        collections::HashMap,
        fs,
        path::{Path, PathBuf},
    },
    tokio::sync::{Mutex, RwLock},
};

/// Key → boolean store backing the access gate
///
/// Keys are already normalised (lowercased) by the gate.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// `None` when no record exists for `key`
    async fn get(&self, key: &str) -> Result<Option<bool>, AccessError>;

    async fn set(&self, key: &str, unlocked: bool) -> Result<(), AccessError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryAccessStore {
    records: RwLock<HashMap<String, bool>>,
}

impl MemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessStore for MemoryAccessStore {
    async fn get(&self, key: &str) -> Result<Option<bool>, AccessError> {
        Ok(self.records.read().await.get(key).copied())
    }

    async fn set(&self, key: &str, unlocked: bool) -> Result<(), AccessError> {
        self.records.write().await.insert(key.to_string(), unlocked);
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

/// JSON object on disk, `{ "<identity>": true, ... }`
///
/// The file is re-read on every lookup so edits made by another process
/// show up without a restart. Writes go through a temp file and a rename.
pub struct JsonFileAccessStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileAccessStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AccessError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn load(&self) -> Result<HashMap<String, bool>, AccessError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&json)?)
    }
}

#[async_trait]
impl AccessStore for JsonFileAccessStore {
    async fn get(&self, key: &str) -> Result<Option<bool>, AccessError> {
        Ok(self.load()?.get(key).copied())
    }

    async fn set(&self, key: &str, unlocked: bool) -> Result<(), AccessError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load()?;
        records.insert(key.to_string(), unlocked);

        let json = serde_json::to_string_pretty(&records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        log::debug!("Saved {} access records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "json"
    }
}
