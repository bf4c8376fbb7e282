//! Risk-weighted audit sampling.
//!
//! Lower trust scores are audited more often. Draws come from the operating
//! system CSPRNG so that a subject cannot predict which presentations are
//! sampled.

use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SamplingDecision {
    pub triggered: bool,
    /// Audit probability in percent.
    pub probability: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Rate {
    #[default]
    RiskWeighted,
    Fixed(u8),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditSampler {
    rate: Rate,
}

impl AuditSampler {
    /// Risk-weighted by trust score, see [`Self::threshold_percent`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Same rate for every score. `fixed(0)` never samples, `fixed(100)`
    /// always does.
    pub fn fixed(percent: u8) -> Self {
        Self {
            rate: Rate::Fixed(percent.min(100)),
        }
    }

    /// Score below 50 → 20%, below 80 → 10%, otherwise 5%.
    pub fn threshold_percent(trust_score: i64) -> u8 {
        if trust_score < 50 {
            20
        } else if trust_score < 80 {
            10
        } else {
            5
        }
    }

    pub fn sample(&self, trust_score: i64) -> SamplingDecision {
        let probability = match self.rate {
            Rate::RiskWeighted => Self::threshold_percent(trust_score),
            Rate::Fixed(percent) => percent,
        };
        let draw: u8 = OsRng.gen_range(0..100);
        SamplingDecision {
            triggered: draw < probability,
            probability,
        }
    }

    pub fn should_trigger(&self, trust_score: i64) -> bool {
        self.sample(trust_score).triggered
    }
}
