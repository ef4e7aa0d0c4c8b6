//! Per-voter selection session.
//!
//! The session is an explicit object hydrated from the ballot store, not
//! ambient process state. All mutation goes through it; the store only ever
//! sees a whole ballot. The finalized flag in the store, not the session,
//! is what makes a submitted ballot immutable: every request re-hydrates
//! before mutating.

use crate::config::SelectionRules;
use crate::db::BallotStore;
use crate::errors::{Result, ValidationError};
use crate::models::Ballot;
use log::info;
use std::collections::BTreeSet;

/// Outcome of a toggle, for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug)]
pub struct VoterSession {
    voter: String,
    selected: BTreeSet<u32>,
    max_selections: usize,
    finalized: bool,
}

impl VoterSession {
    /// Start or resume a session for the given display name.
    ///
    /// The name is trimmed; an empty result is rejected. A name whose ballot
    /// is already finalized is rejected with an error distinct from the
    /// draft case; a draft is resumed with its saved selections.
    pub fn login(
        name: &str,
        existing: Option<&Ballot>,
        rules: &SelectionRules,
    ) -> Result<VoterSession> {
        let voter = name.trim();
        if voter.is_empty() {
            return Err(ValidationError::EmptyVoterName.into());
        }

        match existing {
            Some(ballot) if ballot.finalized => Err(ValidationError::AlreadyFinalized {
                voter: voter.to_string(),
            }
            .into()),
            Some(draft) => Ok(Self {
                voter: voter.to_string(),
                selected: draft.selected.clone(),
                max_selections: rules.max_selections,
                finalized: false,
            }),
            None => Ok(Self {
                voter: voter.to_string(),
                selected: BTreeSet::new(),
                max_selections: rules.max_selections,
                finalized: false,
            }),
        }
    }

    pub fn voter(&self) -> &str {
        &self.voter
    }

    pub fn selected(&self) -> &BTreeSet<u32> {
        &self.selected
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Add the candidate if absent, remove it if present. Adding past the
    /// capacity limit is rejected and leaves the working set unchanged.
    pub fn toggle(&mut self, candidate_id: u32) -> Result<Toggle> {
        self.reject_if_finalized()?;
        if self.selected.remove(&candidate_id) {
            return Ok(Toggle::Removed);
        }
        if self.selected.len() >= self.max_selections {
            return Err(ValidationError::SelectionLimit {
                max: self.max_selections,
            }
            .into());
        }
        self.selected.insert(candidate_id);
        Ok(Toggle::Added)
    }

    /// Persist the working set as an editable draft. On failure the working
    /// set stays intact so the voter can retry.
    pub async fn save_draft(&self, store: &BallotStore) -> Result<()> {
        self.reject_if_finalized()?;
        self.reject_over_capacity()?;
        let ballot = Ballot::new(self.voter.clone(), self.selected.clone(), false);
        store.upsert(&ballot).await?;
        info!(
            "saved draft for {} ({} selections)",
            self.voter,
            self.selected.len()
        );
        Ok(())
    }

    /// Persist the working set as the voter's final ballot. Requires at
    /// least one selection. The session flips to read-only only after the
    /// write succeeds, so a failed submit can be retried as-is.
    pub async fn submit_final(&mut self, store: &BallotStore) -> Result<()> {
        self.reject_if_finalized()?;
        self.reject_over_capacity()?;
        if self.selected.is_empty() {
            return Err(ValidationError::EmptyBallot.into());
        }
        let ballot = Ballot::new(self.voter.clone(), self.selected.clone(), true);
        store.upsert(&ballot).await?;
        self.finalized = true;
        info!(
            "finalized ballot for {} ({} selections)",
            self.voter,
            self.selected.len()
        );
        Ok(())
    }

    fn reject_if_finalized(&self) -> Result<()> {
        if self.finalized {
            return Err(ValidationError::AlreadyFinalized {
                voter: self.voter.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn reject_over_capacity(&self) -> Result<()> {
        if self.selected.len() > self.max_selections {
            return Err(ValidationError::SelectionLimit {
                max: self.max_selections,
            }
            .into());
        }
        Ok(())
    }
}
