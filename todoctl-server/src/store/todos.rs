//! Todo document store
//!
//! The whole collection lives in one JSON array on disk. Every operation
//! reloads it, and every mutation rewrites it in full. There is no
//! in-memory cache and no lock: two mutations racing on the same load can
//! lose an update or hand out the same id (last writer wins).

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::fs;

use crate::models::Todo;

/// Document store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: todo '{id}'")]
    NotFound { id: i64 },

    #[error("no todo id left after {max}")]
    IdsExhausted { max: i64 },

    #[error("storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One entry of the document.
///
/// Fields other than `id` and `content` are carried through rewrites
/// untouched but never reach the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    id: i64,
    content: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Record {
    fn to_todo(&self) -> Todo {
        Todo {
            id: self.id,
            content: self.content.clone(),
        }
    }
}

/// File-backed todo collection
#[derive(Debug, Clone)]
pub struct TodoStore {
    path: PathBuf,
}

impl TodoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All todos in document order.
    pub async fn get_all(&self) -> Vec<Todo> {
        self.load().await.iter().map(Record::to_todo).collect()
    }

    /// First todo with the given id.
    pub async fn get(&self, id: i64) -> Result<Todo, StoreError> {
        let items = self.load().await;
        find(&items, id).map(Record::to_todo)
    }

    /// Append a todo with id `max(ids) + 1` (1 for an empty collection).
    pub async fn create(&self, content: String) -> Result<Todo, StoreError> {
        let mut items = self.load().await;

        let max = items.iter().map(|t| t.id).max().unwrap_or(0);
        let id = max
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted { max })?;
        items.push(Record {
            id,
            content,
            extra: Map::new(),
        });
        let created = items[items.len() - 1].to_todo();
        self.save(&items).await?;

        tracing::debug!(id, "todo created");
        Ok(created)
    }

    /// Replace the content of an existing todo, keeping its id.
    pub async fn update(&self, id: i64, content: String) -> Result<Todo, StoreError> {
        let mut items = self.load().await;

        find(&items, id)?;
        for item in items.iter_mut().filter(|t| t.id == id) {
            item.content = content.clone();
        }
        self.save(&items).await?;

        Ok(Todo { id, content })
    }

    /// Remove an existing todo.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut items = self.load().await;

        find(&items, id)?;
        items.retain(|t| t.id != id);
        self.save(&items).await?;

        tracing::debug!(id, "todo deleted");
        Ok(true)
    }

    /// Number of todos in the collection.
    pub async fn count(&self) -> usize {
        self.load().await.len()
    }

    /// Load the collection, treating any read failure as empty.
    ///
    /// A missing document is the normal first-run state. A document that
    /// exists but cannot be read or parsed is logged and also read as
    /// empty; the next mutation overwrites it.
    async fn load(&self) -> Vec<Record> {
        match self.read_records().await {
            Ok(Some(items)) => items,
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "todo document absent, starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Treating todo document as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Read and parse the document. `Ok(None)` means it does not exist.
    pub async fn read_document(&self) -> Result<Option<Vec<Todo>>, StoreError> {
        let records = self.read_records().await?;
        Ok(records.map(|items| items.iter().map(Record::to_todo).collect()))
    }

    async fn read_records(&self) -> Result<Option<Vec<Record>>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::StorageUnavailable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Overwrite the document with `items`.
    ///
    /// Each save writes its own temp file next to the document and renames
    /// it into place, so readers never see a partial document and
    /// concurrent saves resolve to last writer wins.
    async fn save(&self, items: &[Record]) -> Result<(), StoreError> {
        let unavailable = |source: io::Error| StoreError::StorageUnavailable {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await.map_err(unavailable)?;

        let json = serde_json::to_vec_pretty(items)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)
        .and_then(|written| written)
        .map_err(unavailable)
    }
}

fn find(items: &[Record], id: i64) -> Result<&Record, StoreError> {
    items
        .iter()
        .find(|t| t.id == id)
        .ok_or(StoreError::NotFound { id })
}
