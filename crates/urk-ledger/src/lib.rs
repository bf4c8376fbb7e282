//! # urk-ledger — Compliance Ledger
//!
//! The only durable, tamper-evident record of credential lifecycle events.
//! Each [`LedgerBlock`] commits to a hash of its event payload (never the
//! payload itself) and to the hash of the block before it. The chain is
//! valid iff every block hash recomputes, every `previous_hash` links, and
//! sequence numbers run contiguously from the genesis block at 0.
//!
//! Appends are serialized process-wide and persisted before the chain tip
//! advances.

pub mod block;
pub mod error;
pub mod ledger;
mod store;

pub use block::{EventType, LedgerBlock, GENESIS_SENTINEL};
pub use error::LedgerError;
pub use ledger::{ChainReport, ComplianceLedger};
