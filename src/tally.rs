//! Vote tallying over finalized ballots.
//!
//! Pure read-then-compute: nothing here touches the store or blocks a
//! writer. Draft ballots are never counted; they only show up in the
//! participation summary.

use crate::catalog::Catalog;
use crate::models::{Ballot, TallyEntry, TallySummary};
use log::warn;
use std::collections::{BTreeMap, HashMap};

/// Rank every candidate that received at least one finalized vote.
///
/// Ordering is descending vote count with ascending candidate id inside a
/// count; candidates on the same count share a rank. `limit` keeps only the
/// top entries without reordering the retained prefix.
pub fn compute(
    catalog: &Catalog,
    ballots: &BTreeMap<String, Ballot>,
    limit: Option<usize>,
) -> Vec<TallyEntry> {
    let mut counts: HashMap<u32, u64> = HashMap::new();
    let mut finalized_voters = 0u64;

    for ballot in ballots.values().filter(|b| b.finalized) {
        finalized_voters += 1;
        for &id in &ballot.selected {
            if catalog.contains(id) {
                *counts.entry(id).or_insert(0) += 1;
            } else {
                // A ballot can outlive a catalog refresh that dropped a row.
                warn!("ballot for {:?} names unknown candidate {id}", ballot.voter);
            }
        }
    }

    let mut ordered: Vec<(u32, u64)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut entries = Vec::with_capacity(ordered.len());
    let mut rank = 0u32;
    let mut previous_votes = None;
    for (position, (id, votes)) in ordered.into_iter().enumerate() {
        if previous_votes != Some(votes) {
            rank = position as u32 + 1;
            previous_votes = Some(votes);
        }
        let text = catalog
            .get(id)
            .map(|c| c.text.clone())
            .unwrap_or_default();
        entries.push(TallyEntry {
            rank,
            candidate_id: id,
            text,
            votes,
            share: votes as f64 / finalized_voters as f64,
        });
    }

    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Participation counters across all ballots, drafts included.
pub fn summarize(ballots: &BTreeMap<String, Ballot>) -> TallySummary {
    let mut summary = TallySummary::default();
    for ballot in ballots.values() {
        if ballot.finalized {
            summary.finalized_voters += 1;
            summary.total_selections += ballot.selected.len();
        } else {
            summary.draft_voters += 1;
        }
    }
    summary
}
