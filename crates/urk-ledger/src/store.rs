//! Ledger persistence: one JSON array of blocks, rewritten atomically under
//! the ledger's file lock.

use std::path::{Path, PathBuf};

use urk_core::persist::{lock_exclusive, write_atomic, FileLock, FileStamp};

use crate::block::LedgerBlock;
use crate::error::LedgerError;

#[derive(Debug)]
pub(crate) enum LedgerStore {
    File(PathBuf),
    Memory,
}

impl LedgerStore {
    /// `Ok(None)` when there is nothing persisted yet.
    pub(crate) fn load(&self) -> Result<Option<Vec<LedgerBlock>>, LedgerError> {
        let path = match self {
            Self::File(path) => path,
            Self::Memory => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let blocks: Vec<LedgerBlock> = serde_json::from_str(&raw).map_err(|e| LedgerError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if blocks.is_empty() {
            return Ok(None);
        }
        Ok(Some(blocks))
    }

    pub(crate) fn save(&self, blocks: &[LedgerBlock]) -> Result<(), LedgerError> {
        match self {
            Self::File(path) => {
                let json = serde_json::to_vec_pretty(blocks)?;
                write_atomic(path, &json, false)?;
                Ok(())
            }
            Self::Memory => Ok(()),
        }
    }

    /// Cross-process write lock. `None` for the in-memory store.
    pub(crate) fn lock(&self) -> Result<Option<FileLock>, LedgerError> {
        match self {
            Self::File(path) => Ok(Some(lock_exclusive(path)?)),
            Self::Memory => Ok(None),
        }
    }

    pub(crate) fn stamp(&self) -> Option<FileStamp> {
        match self {
            Self::File(path) => FileStamp::of(path),
            Self::Memory => None,
        }
    }

    pub(crate) fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory => None,
        }
    }
}
