//! # Revocation Registry
//!
//! Authoritative answer to "is credential X revoked, and why". Storage is a
//! keyed `get`/`set` contract over `revoked:<credential_id> → reason`,
//! implemented by [`FileRevocationStore`], [`MemoryRevocationStore`], and
//! [`crate::HttpRevocationStore`].
//!
//! `revoke` returns only after the store has acknowledged the write, so the
//! revocation is visible to every later lookup, across restarts. A store
//! failure surfaces as [`RevocationError`], never as "not revoked".
//!
//! `revoke` is serialized per registry and writes through
//! [`RevocationStore::set_if_absent`], so concurrent revocations of one id
//! produce exactly one `newly_revoked` outcome. The file store applies that
//! check under a file lock, which extends the guarantee to every process
//! sharing the file.
//!
//! A local cache holds positive entries only. Revocation is permanent, so a
//! cached "revoked" can never go stale; a miss always asks the store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use urk_core::persist::{lock_exclusive, write_atomic};

pub const KEY_PREFIX: &str = "revoked:";
pub const DEFAULT_REASON: &str = "UNSPECIFIED";

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error("credential id must be non-empty")]
    EmptyId,

    /// The revocation service could not be reached.
    #[error("revocation store request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The revocation service answered with an unexpected status.
    #[error("revocation store at {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("revocation store file {path} is unreadable: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("revocation store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("revocation store serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("revocation store task failed: {0}")]
    Blocking(String),
}

/// Keyed storage behind the registry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RevocationError>;

    /// Durable once this returns `Ok`.
    async fn set(&self, key: &str, value: &str) -> Result<(), RevocationError>;

    /// Store `value` unless `key` already has one, and return the value that
    /// was already there. Durable once this returns `Ok(None)`.
    ///
    /// The default is a plain `get` then `set`, which is only atomic within
    /// one registry. Stores that can do better override it.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<Option<String>, RevocationError> {
        if let Some(existing) = self.get(key).await? {
            return Ok(Some(existing));
        }
        self.set(key, value).await?;
        Ok(None)
    }
}

/// JSON object on disk, shared by every process that opens the same path.
///
/// Nothing is held in memory: `get` reads the file, and writes take the
/// file lock, re-read, merge, and replace the file atomically. File access
/// runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct FileRevocationStore {
    path: PathBuf,
}

impl FileRevocationStore {
    /// Open the store, checking that an existing file parses.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RevocationError> {
        let path = path.into();
        read_entries(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, RevocationError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, RevocationError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || f(&path))
            .await
            .map_err(|e| RevocationError::Blocking(e.to_string()))?
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, RevocationError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| RevocationError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Apply `update` to the on-disk map under the file lock. The file is only
/// rewritten when `update` returns `true`.
fn update_entries<T>(
    path: &Path,
    update: impl FnOnce(&mut BTreeMap<String, String>) -> (bool, T),
) -> Result<T, RevocationError> {
    let _file_lock = lock_exclusive(path)?;
    let mut entries = read_entries(path)?;
    let (changed, result) = update(&mut entries);
    if changed {
        let json = serde_json::to_vec_pretty(&entries)?;
        write_atomic(path, &json, false)?;
    }
    Ok(result)
}

#[async_trait]
impl RevocationStore for FileRevocationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RevocationError> {
        let key = key.to_string();
        self.blocking(move |path| Ok(read_entries(path)?.remove(&key))).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RevocationError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.blocking(move |path| {
            update_entries(path, |entries| {
                entries.insert(key, value);
                (true, ())
            })
        })
        .await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<Option<String>, RevocationError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.blocking(move |path| {
            update_entries(path, |entries| match entries.get(&key) {
                Some(existing) => (false, Some(existing.clone())),
                None => {
                    entries.insert(key, value);
                    (true, None)
                }
            })
        })
        .await
    }
}

#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    entries: Mutex<BTreeMap<String, String>>,
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RevocationError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RevocationError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<Option<String>, RevocationError> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(key) {
            return Ok(Some(existing.clone()));
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationOutcome {
    pub credential_id: String,
    /// The reason on record. For a repeat revocation this is the original one.
    pub reason: String,
    pub newly_revoked: bool,
}

pub struct RevocationRegistry {
    store: Arc<dyn RevocationStore>,
    cache: DashMap<String, String>,
    /// Serializes `revoke` so only one caller can see an id as new.
    writer: tokio::sync::Mutex<()>,
}

impl RevocationRegistry {
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryRevocationStore::default()))
    }

    pub async fn is_revoked(&self, credential_id: &str) -> Result<bool, RevocationError> {
        Ok(self.reason(credential_id).await?.is_some())
    }

    pub async fn reason(&self, credential_id: &str) -> Result<Option<String>, RevocationError> {
        if credential_id.is_empty() {
            return Err(RevocationError::EmptyId);
        }
        if let Some(reason) = self.cache.get(credential_id) {
            return Ok(Some(reason.clone()));
        }
        let reason = self.store.get(&store_key(credential_id)).await?;
        if let Some(reason) = &reason {
            self.cache.insert(credential_id.to_string(), reason.clone());
        }
        Ok(reason)
    }

    /// Revoke `credential_id`. Idempotent: an already-revoked id keeps its
    /// original reason, and exactly one caller sees `newly_revoked`.
    pub async fn revoke(
        &self,
        credential_id: &str,
        reason: Option<&str>,
    ) -> Result<RevocationOutcome, RevocationError> {
        if credential_id.is_empty() {
            return Err(RevocationError::EmptyId);
        }
        let _writer = self.writer.lock().await;

        if let Some(existing) = self.cache.get(credential_id).map(|r| r.clone()) {
            return Ok(RevocationOutcome {
                credential_id: credential_id.to_string(),
                reason: existing,
                newly_revoked: false,
            });
        }
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASON);

        let existing = self.store.set_if_absent(&store_key(credential_id), reason).await?;
        let newly_revoked = existing.is_none();
        let reason = existing.unwrap_or_else(|| reason.to_string());
        self.cache.insert(credential_id.to_string(), reason.clone());
        if newly_revoked {
            tracing::info!(credential_id, reason = %reason, "credential revoked");
        }
        Ok(RevocationOutcome {
            credential_id: credential_id.to_string(),
            reason,
            newly_revoked,
        })
    }
}

impl std::fmt::Debug for RevocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationRegistry")
            .field("cached", &self.cache.len())
            .finish()
    }
}

fn store_key(credential_id: &str) -> String {
    format!("{KEY_PREFIX}{credential_id}")
}
