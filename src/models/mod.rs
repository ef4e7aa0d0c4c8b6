use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One slogan up for election. Immutable after the catalog is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Stable numeric identifier from the source file. Positive, unique.
    pub id: u32,
    pub text: String,
}

/// One voter's recorded selections plus finalization state.
///
/// Once `finalized` is true the ballot is immutable for that voter; only an
/// administrative delete clears it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ballot {
    pub voter: String,
    pub selected: BTreeSet<u32>,
    pub finalized: bool,
    pub updated_at: DateTime<Utc>,
}

impl Ballot {
    pub fn new(voter: String, selected: BTreeSet<u32>, finalized: bool) -> Self {
        Self {
            voter,
            selected,
            finalized,
            updated_at: Utc::now(),
        }
    }

    pub fn is_draft(&self) -> bool {
        !self.finalized
    }
}

/// One row of the ranked tally. Derived, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallyEntry {
    /// 1-based rank. Candidates with equal vote counts share a rank.
    pub rank: u32,
    pub candidate_id: u32,
    pub text: String,
    pub votes: u64,
    /// Fraction of finalized voters who picked this candidate.
    pub share: f64,
}

/// Participation counters shown on the admin surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallySummary {
    pub finalized_voters: usize,
    pub draft_voters: usize,
    pub total_selections: usize,
}

impl TallySummary {
    /// Mean selections per finalized voter, 0.0 when nobody finalized.
    pub fn mean_selections(&self) -> f64 {
        if self.finalized_voters == 0 {
            0.0
        } else {
            self.total_selections as f64 / self.finalized_voters as f64
        }
    }
}
