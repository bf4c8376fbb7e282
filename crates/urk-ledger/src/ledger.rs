//! # Compliance Ledger
//!
//! An arena of [`LedgerBlock`]s indexed by sequence number, guarded by one
//! mutex. `append` holds the mutex across read-tip, persist, and advance,
//! so two concurrent appends can never both link to the same tip.
//!
//! A file-backed ledger may be shared with other processes, such as the
//! node and the operator CLI. `append` also holds the file lock and re-reads
//! the file first, so it always links to the newest tip on disk. Reads pick
//! up blocks written by other handles whenever the file has changed. The
//! file must verify and must extend every block this handle has already
//! seen; anything else is [`LedgerError::Corruption`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use urk_core::persist::FileStamp;
use urk_core::{sha256_hex, CanonicalBytes, JurisdictionId, Timestamp};

use crate::block::{EventType, LedgerBlock, GENESIS_SENTINEL};
use crate::error::LedgerError;
use crate::store::LedgerStore;

/// Result of a full chain recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub valid: bool,
    pub length: usize,
    pub tip: String,
    pub first_violation: Option<u64>,
}

#[derive(Debug)]
struct Chain {
    blocks: Vec<LedgerBlock>,
    /// File state the blocks were last read from or written to.
    stamp: Option<FileStamp>,
}

#[derive(Debug)]
pub struct ComplianceLedger {
    store: LedgerStore,
    chain: Mutex<Chain>,
}

impl ComplianceLedger {
    /// Open a file-backed ledger, creating it with a genesis block if absent.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Corruption`] if the persisted chain does not verify.
    /// The file is left untouched.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let store = LedgerStore::File(path.into());
        let (blocks, stamp) = {
            let _file_lock = store.lock()?;
            let blocks = match store.load()? {
                Some(blocks) => {
                    if let Some(sequence) = verify_blocks(&blocks) {
                        tracing::error!(sequence, "ledger chain verification failed at load");
                        return Err(LedgerError::Corruption { sequence });
                    }
                    blocks
                }
                None => {
                    let genesis = vec![LedgerBlock::genesis()];
                    store.save(&genesis)?;
                    genesis
                }
            };
            (blocks, store.stamp())
        };
        tracing::debug!(blocks = blocks.len(), "ledger opened");
        Ok(Self {
            store,
            chain: Mutex::new(Chain { blocks, stamp }),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: LedgerStore::Memory,
            chain: Mutex::new(Chain {
                blocks: vec![LedgerBlock::genesis()],
                stamp: None,
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.store.path()
    }

    /// Append an event and return the new block hash.
    ///
    /// Only the SHA-256 of the canonical `payload` is stored. The block is
    /// persisted before it becomes the tip; on a failed write the chain is
    /// unchanged.
    ///
    /// This blocks on file I/O. Async callers use [`Self::append_async`].
    pub fn append(
        &self,
        event_type: EventType,
        payload: &impl Serialize,
        jurisdiction: Option<&JurisdictionId>,
    ) -> Result<String, LedgerError> {
        let data_hash = sha256_hex(&CanonicalBytes::new(payload)?);

        let mut chain = self.chain.lock();
        let _file_lock = self.store.lock()?;
        self.sync(&mut chain)?;

        let (sequence, previous_hash) = match chain.blocks.last() {
            Some(tip) => (tip.sequence + 1, tip.block_hash.clone()),
            None => (0, GENESIS_SENTINEL.to_string()),
        };
        let block = LedgerBlock::seal(
            sequence,
            Timestamp::now(),
            event_type,
            jurisdiction.map(|j| j.to_string()),
            data_hash,
            previous_hash,
        );
        let block_hash = block.block_hash.clone();

        chain.blocks.push(block);
        if let Err(e) = self.store.save(&chain.blocks) {
            chain.blocks.pop();
            tracing::error!(error = %e, %event_type, "ledger append not persisted");
            return Err(e);
        }
        chain.stamp = self.store.stamp();

        tracing::info!(sequence, %event_type, block_hash = %block_hash, "ledger block appended");
        Ok(block_hash)
    }

    /// [`Self::append`] on the blocking thread pool.
    pub async fn append_async<P>(
        self: Arc<Self>,
        event_type: EventType,
        payload: P,
        jurisdiction: Option<JurisdictionId>,
    ) -> Result<String, LedgerError>
    where
        P: Serialize + Send + 'static,
    {
        tokio::task::spawn_blocking(move || self.append(event_type, &payload, jurisdiction.as_ref()))
            .await
            .map_err(|e| LedgerError::Blocking(e.to_string()))?
    }

    /// First sequence number that fails verification, if any.
    pub fn verify_chain(&self) -> Option<u64> {
        let (chain, violation) = self.refreshed();
        violation.or_else(|| verify_blocks(&chain.blocks))
    }

    pub fn report(&self) -> ChainReport {
        let (chain, violation) = self.refreshed();
        let first_violation = violation.or_else(|| verify_blocks(&chain.blocks));
        ChainReport {
            valid: first_violation.is_none(),
            length: chain.blocks.len(),
            tip: chain.blocks.last().map(|b| b.block_hash.clone()).unwrap_or_default(),
            first_violation,
        }
    }

    /// Snapshot of every block.
    pub fn blocks(&self) -> Vec<LedgerBlock> {
        self.refreshed().0.blocks.clone()
    }

    pub fn len(&self) -> usize {
        self.refreshed().0.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refreshed().0.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<LedgerBlock> {
        self.refreshed().0.blocks.last().cloned()
    }

    /// Adopt blocks another handle wrote to the file since we last looked.
    fn sync(&self, chain: &mut Chain) -> Result<(), LedgerError> {
        if !self.store.is_file() {
            return Ok(());
        }
        // Stamp before load: a rewrite in between only causes a second reload.
        let stamp = self.store.stamp();
        if stamp.is_some() && stamp == chain.stamp {
            return Ok(());
        }
        let disk = self.store.load()?.unwrap_or_default();
        let seen = chain.blocks.len();
        if let Some(sequence) = diverges(&chain.blocks, &disk).or_else(|| verify_from(&disk, seen)) {
            tracing::error!(sequence, "ledger file does not extend the known chain");
            return Err(LedgerError::Corruption { sequence });
        }
        if disk.len() > seen {
            tracing::debug!(adopted = disk.len() - seen, "ledger picked up external blocks");
        }
        chain.blocks = disk;
        chain.stamp = stamp;
        Ok(())
    }

    /// The chain after a sync, plus the violation the sync ran into, if any.
    /// An unreadable file reports sequence 0.
    fn refreshed(&self) -> (MutexGuard<'_, Chain>, Option<u64>) {
        let mut chain = self.chain.lock();
        let violation = match self.sync(&mut chain) {
            Ok(()) => None,
            Err(LedgerError::Corruption { sequence }) => Some(sequence),
            Err(e) => {
                tracing::error!(error = %e, "ledger file unreadable");
                Some(0)
            }
        };
        (chain, violation)
    }

    #[cfg(test)]
    fn tamper(&self, f: impl FnOnce(&mut Vec<LedgerBlock>)) {
        f(&mut self.chain.lock().blocks);
    }
}

/// Recompute every hash and link. Returns the first bad sequence position.
pub fn verify_blocks(blocks: &[LedgerBlock]) -> Option<u64> {
    if blocks.is_empty() {
        return Some(0);
    }
    verify_from(blocks, 0)
}

/// Like [`verify_blocks`], skipping hash checks for `blocks[..start]`.
fn verify_from(blocks: &[LedgerBlock], start: usize) -> Option<u64> {
    for (i, block) in blocks.iter().enumerate().skip(start) {
        let position = i as u64;
        if block.sequence != position || block.compute_hash() != block.block_hash {
            return Some(position);
        }
        let linked = if i == 0 {
            *block == LedgerBlock::genesis()
        } else {
            block.previous_hash == blocks[i - 1].block_hash
        };
        if !linked {
            return Some(position);
        }
    }
    None
}

/// First position where `disk` drops or rewrites a block of `known`.
fn diverges(known: &[LedgerBlock], disk: &[LedgerBlock]) -> Option<u64> {
    known
        .iter()
        .enumerate()
        .find(|(i, block)| disk.get(*i) != Some(*block))
        .map(|(i, _)| i as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sg() -> JurisdictionId {
        JurisdictionId::new("SG").unwrap()
    }

    #[test]
    fn test_new_ledger_has_genesis() {
        let ledger = ComplianceLedger::in_memory();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.tip().unwrap(), LedgerBlock::genesis());
        assert_eq!(ledger.verify_chain(), None);
    }

    #[test]
    fn test_append_links_to_tip() {
        let ledger = ComplianceLedger::in_memory();
        let genesis_hash = ledger.tip().unwrap().block_hash;
        let h1 = ledger
            .append(EventType::IssuanceAttempt, &serde_json::json!({"issuer": "did:web:a.sg"}), Some(&sg()))
            .unwrap();
        let blocks = ledger.blocks();
        assert_eq!(blocks[1].previous_hash, genesis_hash);
        assert_eq!(blocks[1].block_hash, h1);
        assert_eq!(blocks[1].jurisdiction.as_deref(), Some("SG"));
        assert_eq!(blocks[1].sequence, 1);
    }

    #[test]
    fn test_payload_is_hashed_not_stored() {
        let ledger = ComplianceLedger::in_memory();
        let payload = serde_json::json!({"subject": "did:example:alice", "legalName": "Alice Tan"});
        ledger.append(EventType::IssuanceAttempt, &payload, None).unwrap();
        let block = ledger.tip().unwrap();
        assert_eq!(block.data_hash, sha256_hex(&CanonicalBytes::new(&payload).unwrap()));
        let json = serde_json::to_string(&ledger.blocks()).unwrap();
        assert!(!json.contains("Alice"));
    }

    #[test]
    fn test_float_payload_rejected_without_append() {
        let ledger = ComplianceLedger::in_memory();
        let err = ledger
            .append(EventType::Verification, &serde_json::json!({"p": 0.1}), None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Canonicalization(_)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_tampered_data_hash_detected_at_block() {
        let ledger = ComplianceLedger::in_memory();
        for i in 0..5 {
            ledger.append(EventType::Verification, &serde_json::json!({"n": i}), None).unwrap();
        }
        ledger.tamper(|chain| chain[3].data_hash = "f".repeat(64));
        assert_eq!(ledger.verify_chain(), Some(3));
        let report = ledger.report();
        assert!(!report.valid);
        assert_eq!(report.first_violation, Some(3));
    }

    #[test]
    fn test_rehashed_block_breaks_next_link() {
        let ledger = ComplianceLedger::in_memory();
        for i in 0..4 {
            ledger.append(EventType::Verification, &serde_json::json!({"n": i}), None).unwrap();
        }
        ledger.tamper(|chain| {
            chain[2].data_hash = "0".repeat(64);
            chain[2].block_hash = chain[2].compute_hash();
        });
        assert_eq!(ledger.verify_chain(), Some(3));
    }

    #[test]
    fn test_removed_block_detected() {
        let ledger = ComplianceLedger::in_memory();
        for i in 0..3 {
            ledger.append(EventType::Verification, &serde_json::json!({"n": i}), None).unwrap();
        }
        ledger.tamper(|chain| {
            chain.remove(1);
        });
        assert_eq!(ledger.verify_chain(), Some(1));
    }

    #[test]
    fn test_file_ledger_reopens_with_same_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let tip = {
            let ledger = ComplianceLedger::open(&path).unwrap();
            ledger.append(EventType::IssuanceAttempt, &serde_json::json!({"a": 1}), Some(&sg())).unwrap()
        };
        let reopened = ComplianceLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.tip().unwrap().block_hash, tip);
    }

    #[test]
    fn test_corrupt_file_blocks_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        {
            let ledger = ComplianceLedger::open(&path).unwrap();
            ledger.append(EventType::Verification, &serde_json::json!({"a": 1}), None).unwrap();
            ledger.append(EventType::Verification, &serde_json::json!({"a": 2}), None).unwrap();
        }
        let mut blocks: Vec<LedgerBlock> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        blocks[1].event_type = EventType::Revocation;
        std::fs::write(&path, serde_json::to_string(&blocks).unwrap()).unwrap();

        match ComplianceLedger::open(&path) {
            Err(LedgerError::Corruption { sequence }) => assert_eq!(sequence, 1),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_file_blocks_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();
        assert!(matches!(ComplianceLedger::open(&path), Err(LedgerError::Unreadable { .. })));
    }

    #[test]
    fn test_two_handles_on_one_file_both_keep_their_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let node = ComplianceLedger::open(&path).unwrap();
        let operator = ComplianceLedger::open(&path).unwrap();

        let revoked = operator
            .append(EventType::Revocation, &serde_json::json!({"credential_id": "urn:uuid:1"}), None)
            .unwrap();
        assert_eq!(node.len(), 2);

        let verified = node
            .append(EventType::Verification, &serde_json::json!({"credential_id": "urn:uuid:2"}), Some(&sg()))
            .unwrap();

        let reopened = ComplianceLedger::open(&path).unwrap();
        let blocks = reopened.blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].block_hash, revoked);
        assert_eq!(blocks[2].block_hash, verified);
        assert_eq!(blocks[2].previous_hash, revoked);
        assert_eq!(reopened.verify_chain(), None);
        assert_eq!(operator.tip().unwrap().block_hash, verified);
    }

    #[test]
    fn test_interleaved_handles_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let handles: Vec<_> = (0..4)
            .map(|_| Arc::new(ComplianceLedger::open(&path).unwrap()))
            .collect();
        let threads: Vec<_> = handles
            .iter()
            .enumerate()
            .map(|(t, ledger)| {
                let ledger = Arc::clone(ledger);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        ledger
                            .append(EventType::Verification, &serde_json::json!({"t": t, "i": i}), None)
                            .unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let reopened = ComplianceLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 1 + 4 * 10);
        assert_eq!(reopened.verify_chain(), None);
    }

    #[test]
    fn test_truncated_file_is_corruption_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let ledger = ComplianceLedger::open(&path).unwrap();
        ledger.append(EventType::Verification, &serde_json::json!({"a": 1}), None).unwrap();
        ledger.append(EventType::Verification, &serde_json::json!({"a": 2}), None).unwrap();

        let mut blocks: Vec<LedgerBlock> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        blocks.truncate(2);
        let truncated = serde_json::to_string_pretty(&blocks).unwrap();
        std::fs::write(&path, &truncated).unwrap();

        let err = ledger
            .append(EventType::Verification, &serde_json::json!({"a": 3}), None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Corruption { sequence: 2 }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), truncated);
        assert!(!ledger.report().valid);
    }

    #[tokio::test]
    async fn test_append_async_runs_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(ComplianceLedger::open(dir.path().join("ledger.json")).unwrap());
        let hash = Arc::clone(&ledger)
            .append_async(EventType::Verification, serde_json::json!({"n": 1}), Some(sg()))
            .await
            .unwrap();
        assert_eq!(ledger.tip().unwrap().block_hash, hash);
        assert_eq!(ledger.tip().unwrap().jurisdiction.as_deref(), Some("SG"));
    }

    #[test]
    fn test_concurrent_appends_never_fork() {
        let ledger = Arc::new(ComplianceLedger::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        ledger
                            .append(EventType::Verification, &serde_json::json!({"t": t, "i": i}), None)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ledger.len(), 1 + 8 * 25);
        assert_eq!(ledger.verify_chain(), None);
    }
}
