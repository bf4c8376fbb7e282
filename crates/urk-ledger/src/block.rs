//! Ledger block layout and hashing.

use serde::{Deserialize, Serialize};
use urk_core::{sha256_text, Timestamp};

/// `previous_hash` of the genesis block: 64 ASCII zeros.
pub const GENESIS_SENTINEL: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Lifecycle event recorded in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Genesis,
    IssuanceAttempt,
    Verification,
    AuditSamplingVerified,
    Revocation,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genesis => "GENESIS",
            Self::IssuanceAttempt => "ISSUANCE_ATTEMPT",
            Self::Verification => "VERIFICATION",
            Self::AuditSamplingVerified => "AUDIT_SAMPLING_VERIFIED",
            Self::Revocation => "REVOCATION",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBlock {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    /// SHA-256 of the canonical event payload.
    pub data_hash: String,
    pub previous_hash: String,
    pub block_hash: String,
}

impl LedgerBlock {
    /// The fixed first block every ledger starts from.
    pub fn genesis() -> Self {
        Self::seal(
            0,
            Timestamp::unix_epoch(),
            EventType::Genesis,
            None,
            GENESIS_SENTINEL.to_string(),
            GENESIS_SENTINEL.to_string(),
        )
    }

    /// Build a block and compute its hash.
    pub fn seal(
        sequence: u64,
        timestamp: Timestamp,
        event_type: EventType,
        jurisdiction: Option<String>,
        data_hash: String,
        previous_hash: String,
    ) -> Self {
        let mut block = Self {
            sequence,
            timestamp,
            event_type,
            jurisdiction,
            data_hash,
            previous_hash,
            block_hash: String::new(),
        };
        block.block_hash = block.compute_hash();
        block
    }

    /// SHA-256(sequence ‖ timestamp ‖ event_type ‖ jurisdiction ‖ data_hash ‖ previous_hash).
    /// An absent jurisdiction contributes the empty string.
    pub fn compute_hash(&self) -> String {
        let input = format!(
            "{}{}{}{}{}{}",
            self.sequence,
            self.timestamp.to_iso8601(),
            self.event_type.as_str(),
            self.jurisdiction.as_deref().unwrap_or(""),
            self.data_hash,
            self.previous_hash,
        );
        sha256_text(&input)
    }
}
