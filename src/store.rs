use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    pub interests: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize user list: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Flat-file user list. `load` never fails: an unreadable or corrupt
/// document is treated as an empty store. `append` rereads the whole
/// document, adds one record, and rewrites it; concurrent writers race
/// with last-writer-wins, which the product accepts.
pub trait UserStore: Send + Sync {
    fn load(&self) -> Vec<UserRecord>;
    fn append(&self, user: UserRecord) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct StoredDocument<'a> {
    version: u32,
    users: &'a [UserRecord],
}

/// Files written before the envelope was introduced hold a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoadedDocument {
    Versioned {
        #[allow(dead_code)]
        version: u32,
        users: Vec<UserRecord>,
    },
    Legacy(Vec<UserRecord>),
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl UserStore for JsonFileStore {
    fn load(&self) -> Vec<UserRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "store unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<LoadedDocument>(&contents) {
            Ok(LoadedDocument::Versioned { users, .. }) => users,
            Ok(LoadedDocument::Legacy(users)) => users,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "store corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    fn append(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut users = self.load();
        users.push(user);
        let document = StoredDocument {
            version: DOCUMENT_VERSION,
            users: &users,
        };
        // serde_json leaves non-ASCII unescaped, keeping the file readable.
        let serialized = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, serialized).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
pub struct MemoryStore {
    users: std::sync::Mutex<Vec<UserRecord>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl UserStore for MemoryStore {
    fn load(&self) -> Vec<UserRecord> {
        self.users.lock().unwrap().clone()
    }

    fn append(&self, user: UserRecord) -> Result<(), StoreError> {
        self.users.lock().unwrap().push(user);
        Ok(())
    }
}
